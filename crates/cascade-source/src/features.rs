//! Concrete [`SourceFeature`]s.

use cascade_core::{Candidate, ParticleState, SourceError, Vector3};
use rand::RngCore;

use crate::random::{rand_bin, rand_power_law, rand_unit_vector};
use crate::source::SourceFeature;

/// Emit a fixed particle type.
#[derive(Clone, Debug)]
pub struct SourceParticleType {
    id: i32,
}

impl SourceParticleType {
    /// Emit particles with PDG id `id`.
    pub fn new(id: i32) -> Self {
        Self { id }
    }
}

impl SourceFeature for SourceParticleType {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        _rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        state.set_id(self.id);
        Ok(())
    }

    fn description(&self) -> String {
        format!("SourceParticleType: {}", self.id)
    }
}

/// Emit one of several particle types, chosen by relative abundance.
#[derive(Clone, Debug, Default)]
pub struct SourceMultipleParticleTypes {
    ids: Vec<i32>,
    cdf: Vec<f64>,
}

impl SourceMultipleParticleTypes {
    /// No types configured yet; sampling fails until one is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a particle type with relative abundance `weight`.
    pub fn add(&mut self, id: i32, weight: f64) {
        let cumulative = self.cdf.last().copied().unwrap_or(0.0) + weight;
        self.ids.push(id);
        self.cdf.push(cumulative);
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, id: i32, weight: f64) -> Self {
        self.add(id, weight);
        self
    }
}

impl SourceFeature for SourceMultipleParticleTypes {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        if self.ids.is_empty() {
            return Err(SourceError::NoParticleTypes);
        }
        state.set_id(self.ids[rand_bin(&self.cdf, rng)]);
        Ok(())
    }

    fn description(&self) -> String {
        let ids: Vec<String> = self.ids.iter().map(|id| id.to_string()).collect();
        format!(
            "SourceMultipleParticleTypes: random particle type [{}]",
            ids.join(", ")
        )
    }
}

/// Emit at a fixed energy.
#[derive(Clone, Debug)]
pub struct SourceEnergy {
    energy: f64,
}

impl SourceEnergy {
    /// Emit every particle with `energy`.
    pub fn new(energy: f64) -> Self {
        Self { energy }
    }
}

impl SourceFeature for SourceEnergy {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        _rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        state.set_energy(self.energy);
        Ok(())
    }

    fn description(&self) -> String {
        format!("SourceEnergy: {}", self.energy)
    }
}

/// Emit with energies drawn from `dN/dE ~ E^index` on `[e_min, e_max]`.
#[derive(Clone, Debug)]
pub struct SourcePowerLawSpectrum {
    e_min: f64,
    e_max: f64,
    index: f64,
}

impl SourcePowerLawSpectrum {
    /// Validate the energy range and build the feature.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidParameter`] unless `0 < e_min < e_max` and
    /// `index` is finite.
    pub fn new(e_min: f64, e_max: f64, index: f64) -> Result<Self, SourceError> {
        if !(e_min > 0.0 && e_max > e_min && e_max.is_finite()) {
            return Err(SourceError::InvalidParameter {
                reason: format!("power-law range must satisfy 0 < e_min < e_max, got [{e_min}, {e_max}]"),
            });
        }
        if !index.is_finite() {
            return Err(SourceError::InvalidParameter {
                reason: format!("power-law index must be finite, got {index}"),
            });
        }
        Ok(Self {
            e_min,
            e_max,
            index,
        })
    }
}

impl SourceFeature for SourcePowerLawSpectrum {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        state.set_energy(rand_power_law(self.index, self.e_min, self.e_max, rng));
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "SourcePowerLawSpectrum: random energy E = {} - {}, dN/dE ~ E^{}",
            self.e_min, self.e_max, self.index
        )
    }
}

/// Emit from a fixed point.
#[derive(Clone, Debug)]
pub struct SourcePosition {
    position: Vector3,
}

impl SourcePosition {
    /// Emit every particle at `position`.
    pub fn new(position: Vector3) -> Self {
        Self { position }
    }
}

impl SourceFeature for SourcePosition {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        _rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        state.set_position(self.position);
        Ok(())
    }

    fn description(&self) -> String {
        format!("SourcePosition: {}", self.position)
    }
}

/// Emit along a fixed direction.
#[derive(Clone, Debug)]
pub struct SourceDirection {
    direction: Vector3,
}

impl SourceDirection {
    /// Emit every particle along `direction` (normalized).
    pub fn new(direction: Vector3) -> Self {
        Self {
            direction: direction.normalized(),
        }
    }
}

impl SourceFeature for SourceDirection {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        _rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        state.set_direction(self.direction);
        Ok(())
    }

    fn description(&self) -> String {
        format!("SourceDirection: {}", self.direction)
    }
}

/// Emit in directions drawn uniformly from the unit sphere.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceIsotropicEmission;

impl SourceFeature for SourceIsotropicEmission {
    fn prepare_particle(
        &self,
        state: &mut ParticleState,
        rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        state.set_direction(rand_unit_vector(rng));
        Ok(())
    }

    fn description(&self) -> String {
        "SourceIsotropicEmission: random isotropic direction".to_string()
    }
}

/// Emit at a fixed redshift.
///
/// Sets candidate-level data, so it overrides
/// [`prepare_candidate`](SourceFeature::prepare_candidate) and leaves
/// the particle snapshots untouched.
#[derive(Clone, Debug)]
pub struct SourceRedshift {
    z: f64,
}

impl SourceRedshift {
    /// Emit every candidate at redshift `z`.
    pub fn new(z: f64) -> Self {
        Self { z }
    }
}

impl SourceFeature for SourceRedshift {
    fn prepare_particle(
        &self,
        _state: &mut ParticleState,
        _rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        Ok(())
    }

    fn prepare_candidate(
        &self,
        candidate: &mut Candidate,
        _rng: &mut dyn RngCore,
    ) -> Result<(), SourceError> {
        candidate.redshift = self.z;
        Ok(())
    }

    fn description(&self) -> String {
        format!("SourceRedshift: z = {}", self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use cascade_core::SourceInterface;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn multiple_types_without_entries_fail() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut state = ParticleState::default();
        let err = SourceMultipleParticleTypes::new()
            .prepare_particle(&mut state, &mut rng)
            .unwrap_err();
        assert_eq!(err, SourceError::NoParticleTypes);
    }

    #[test]
    fn multiple_types_picks_configured_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let feature = SourceMultipleParticleTypes::new()
            .with(1000010010, 1.0)
            .with(1000260560, 1.0);
        let mut state = ParticleState::default();
        for _ in 0..50 {
            feature.prepare_particle(&mut state, &mut rng).unwrap();
            assert!([1000010010, 1000260560].contains(&state.id()));
        }
    }

    #[test]
    fn power_law_rejects_inverted_range() {
        assert!(SourcePowerLawSpectrum::new(10.0, 1.0, -2.0).is_err());
        assert!(SourcePowerLawSpectrum::new(0.0, 1.0, -2.0).is_err());
        assert!(SourcePowerLawSpectrum::new(1.0, 10.0, f64::NAN).is_err());
        assert!(SourcePowerLawSpectrum::new(1.0, 10.0, -2.0).is_ok());
    }

    #[test]
    fn redshift_sets_candidate_not_state() {
        let source = Source::with_seed(0)
            .with(SourceEnergy::new(3.0))
            .with(SourceRedshift::new(0.5));
        let c = source.candidate().unwrap();
        assert_eq!(c.redshift, 0.5);
        assert_eq!(c.current.energy(), 3.0);
    }

    #[test]
    fn direction_is_normalized() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut state = ParticleState::default();
        SourceDirection::new(Vector3::new(0.0, 2.0, 0.0))
            .prepare_particle(&mut state, &mut rng)
            .unwrap();
        assert_eq!(state.direction(), Vector3::new(0.0, 1.0, 0.0));
    }
}
