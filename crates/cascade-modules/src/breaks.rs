//! Break conditions: modules that end a candidate's propagation.

use cascade_core::{Candidate, Module, ModuleError};

/// Deactivates candidates whose trajectory has reached `max_length`, and
/// otherwise keeps the next step from overshooting it.
#[derive(Clone, Debug)]
pub struct MaximumTrajectoryLength {
    max_length: f64,
}

impl MaximumTrajectoryLength {
    /// Break at `max_length`.
    pub fn new(max_length: f64) -> Self {
        Self { max_length }
    }

    /// The configured maximum.
    pub fn max_length(&self) -> f64 {
        self.max_length
    }
}

impl Module for MaximumTrajectoryLength {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        if !candidate.is_active() {
            return Ok(());
        }
        let remaining = self.max_length - candidate.trajectory_length;
        if remaining <= 0.0 {
            candidate.set_active(false);
        } else {
            candidate.limit_next_step(remaining);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Maximum trajectory length: {}", self.max_length)
    }
}

/// Deactivates candidates whose energy has fallen below `min_energy`.
#[derive(Clone, Debug)]
pub struct MinimumEnergy {
    min_energy: f64,
}

impl MinimumEnergy {
    /// Break below `min_energy`.
    pub fn new(min_energy: f64) -> Self {
        Self { min_energy }
    }

    /// The configured threshold.
    pub fn min_energy(&self) -> f64 {
        self.min_energy
    }
}

impl Module for MinimumEnergy {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        let energy = candidate.current.energy();
        if energy.is_nan() {
            return Err(ModuleError::InvalidState {
                reason: format!("candidate {} has NaN energy", candidate.current.id()),
            });
        }
        if energy < self.min_energy {
            candidate.set_active(false);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Minimum energy: {}", self.min_energy)
    }
}
