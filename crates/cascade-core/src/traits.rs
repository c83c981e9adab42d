//! The [`Module`] and [`SourceInterface`] traits.
//!
//! These are the only two capabilities the engine depends on. The engine
//! has no knowledge of what a module does; physical processes, geometric
//! boundaries and output sinks all look the same to it.

use crate::candidate::Candidate;
use crate::error::{ModuleError, SourceError};

/// One pipeline stage applied to a candidate at every step.
///
/// # Contract
///
/// - `process()` may mutate `candidate.current`, deactivate the candidate,
///   and append secondaries. It never removes secondaries.
/// - The pipeline applies every module in sequence even after an earlier
///   module deactivated the candidate. A module that must not act on an
///   inactive candidate checks [`Candidate::is_active`] itself.
/// - `&self`: the same instance is shared by every worker thread during a
///   population run. Modules accumulating cross-candidate state (counters,
///   output buffers) synchronize internally.
///
/// # Object safety
///
/// This trait is object-safe; the engine stores modules as
/// `Vec<Box<dyn Module>>`.
///
/// # Examples
///
/// ```
/// use cascade_core::{Candidate, Module, ModuleError, ParticleState};
///
/// /// Deactivates candidates below an energy threshold.
/// struct Cutoff(f64);
///
/// impl Module for Cutoff {
///     fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
///         if candidate.current.energy() < self.0 {
///             candidate.set_active(false);
///         }
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         format!("Cutoff: {}", self.0)
///     }
/// }
///
/// let mut c = Candidate::new(ParticleState::new(22, 1.0));
/// Cutoff(10.0).process(&mut c).unwrap();
/// assert!(!c.is_active());
/// ```
pub trait Module: Send + Sync {
    /// Apply this stage to one candidate.
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError>;

    /// Human-readable identity, used in pipeline descriptions and logs.
    fn description(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("Module")
            .to_string()
    }
}

/// Factory for fresh primary candidates.
///
/// Called concurrently from every worker of a source-driven population
/// run, hence `&self` and `Sync`.
pub trait SourceInterface: Send + Sync {
    /// Manufacture a newly owned candidate.
    fn candidate(&self) -> Result<Candidate, SourceError>;

    /// Human-readable identity.
    fn description(&self) -> String;
}

impl<M: Module + ?Sized> Module for Box<M> {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        (**self).process(candidate)
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

impl<M: Module + ?Sized> Module for std::sync::Arc<M> {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        (**self).process(candidate)
    }

    fn description(&self) -> String {
        (**self).description()
    }
}
