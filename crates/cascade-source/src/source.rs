//! [`Source`], [`SourceFeature`] and the weighted [`SourceList`].

use std::sync::Mutex;

use cascade_core::{Candidate, ParticleState, SourceError, SourceInterface};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::random::rand_bin;

/// One aspect of a fresh primary, applied in order by a [`Source`].
pub trait SourceFeature: Send + Sync {
    /// Prepare the particle state the candidate is emitted with.
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        rng: &mut dyn RngCore,
    ) -> Result<(), SourceError>;

    /// Prepare the whole candidate.
    ///
    /// The default prepares the `source` snapshot and then copies it into
    /// `created`, `current` and `previous`, so later features see the
    /// accumulated state. Features that set candidate-level data
    /// (e.g. redshift) override this.
    fn prepare_candidate(
        &self,
        candidate: &mut Candidate,
        rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        let mut state = candidate.source;
        self.prepare_particle(&mut state, rng)?;
        candidate.source = state;
        candidate.created = state;
        candidate.current = state;
        candidate.previous = state;
        Ok(())
    }

    /// Human-readable identity.
    fn description(&self) -> String;
}

/// A candidate factory assembled from [`SourceFeature`]s.
///
/// The generator is a seeded `ChaCha8Rng` behind a mutex so that
/// `candidate()` can be called from every worker of a population run.
/// With a fixed seed and a single worker the emitted sequence is
/// reproducible; with several workers the interleaving is not.
pub struct Source {
    features: Vec<Box<dyn SourceFeature>>,
    rng: Mutex<ChaCha8Rng>,
}

impl Default for Source {
    fn default() -> Self {
        Self::new()
    }
}

impl Source {
    /// An empty source seeded from the operating system.
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            rng: Mutex::new(ChaCha8Rng::from_os_rng()),
        }
    }

    /// An empty source with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            features: Vec::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Append a feature.
    pub fn add(&mut self, feature: impl SourceFeature + 'static) {
        self.features.push(Box::new(feature));
    }

    /// Builder-style [`add`](Source::add).
    pub fn with(mut self, feature: impl SourceFeature + 'static) -> Self {
        self.add(feature);
        self
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no features are configured.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl SourceInterface for Source {
    fn candidate(&self) -> Result<Candidate, SourceError> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut candidate = Candidate::default();
        for feature in &self.features {
            feature.prepare_candidate(&mut candidate, &mut *rng)?;
        }
        Ok(candidate)
    }

    fn description(&self) -> String {
        let mut s = String::from("Particle source\n");
        for feature in &self.features {
            s.push_str("    ");
            s.push_str(&feature.description());
            s.push('\n');
        }
        s
    }
}

/// Several sources chosen between by relative weight.
pub struct SourceList {
    sources: Vec<Box<dyn SourceInterface>>,
    cdf: Vec<f64>,
    rng: Mutex<ChaCha8Rng>,
}

impl Default for SourceList {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceList {
    /// An empty list seeded from the operating system.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cdf: Vec::new(),
            rng: Mutex::new(ChaCha8Rng::from_os_rng()),
        }
    }

    /// An empty list with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            sources: Vec::new(),
            cdf: Vec::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Add a source with a relative weight.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidParameter`] for negative or
    /// non-finite weights.
    pub fn add(
        &mut self,
        source: impl SourceInterface + 'static,
        weight: f64,
    ) -> Result<(), SourceError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(SourceError::InvalidParameter {
                reason: format!("source weight must be finite and >= 0, got {weight}"),
            });
        }
        let cumulative = self.cdf.last().copied().unwrap_or(0.0) + weight;
        self.sources.push(Box::new(source));
        self.cdf.push(cumulative);
        Ok(())
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceInterface for SourceList {
    fn candidate(&self) -> Result<Candidate, SourceError> {
        let total = match self.cdf.last() {
            Some(&total) => total,
            None => return Err(SourceError::NoSources),
        };
        if total <= 0.0 {
            return Err(SourceError::InvalidParameter {
                reason: "all source weights are zero".into(),
            });
        }
        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rand_bin(&self.cdf, &mut *rng)
        };
        self.sources[index].candidate()
    }

    fn description(&self) -> String {
        let mut s = String::from("List of particle sources\n");
        for source in &self.sources {
            s.push_str("  ");
            s.push_str(&source.description());
        }
        s
    }
}
