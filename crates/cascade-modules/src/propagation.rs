//! Straight-line propagation with a bounded step.
//!
//! # Semantics
//!
//! - The step taken is the candidate's proposed `next_step` clamped to
//!   `[min_step, max_step]`.
//! - `previous` receives the pre-step state; `current.position` advances
//!   along `current.direction`.
//! - `next_step` is reset to `max_step`; break conditions later in the
//!   pipeline may shrink it again.
//! - Inactive candidates are left untouched.
//!
//! # Construction
//!
//! ```
//! use cascade_modules::SimplePropagation;
//!
//! let prop = SimplePropagation::new(0.1, 10.0).unwrap();
//! assert_eq!(prop.max_step(), 10.0);
//! ```

use cascade_core::{Candidate, Module, ModuleError};

/// Rectilinear propagation with `min_step <= step <= max_step`.
#[derive(Clone, Debug)]
pub struct SimplePropagation {
    min_step: f64,
    max_step: f64,
}

impl SimplePropagation {
    /// Create a propagator with the given step bounds.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidState` if either bound is not finite,
    /// `min_step` is negative, or `min_step > max_step`.
    pub fn new(min_step: f64, max_step: f64) -> Result<Self, ModuleError> {
        if !min_step.is_finite() || !max_step.is_finite() {
            return Err(ModuleError::InvalidState {
                reason: format!("step bounds must be finite, got [{min_step}, {max_step}]"),
            });
        }
        if min_step < 0.0 || min_step > max_step {
            return Err(ModuleError::InvalidState {
                reason: format!("invalid step bounds [{min_step}, {max_step}]"),
            });
        }
        Ok(Self { min_step, max_step })
    }

    /// Smallest step ever taken.
    pub fn min_step(&self) -> f64 {
        self.min_step
    }

    /// Largest step ever taken.
    pub fn max_step(&self) -> f64 {
        self.max_step
    }
}

impl Module for SimplePropagation {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        if !candidate.is_active() {
            return Ok(());
        }

        let step = candidate.next_step.clamp(self.min_step, self.max_step);
        candidate.previous = candidate.current;

        let position = candidate.current.position() + candidate.current.direction() * step;
        candidate.current.set_position(position);

        candidate.current_step = step;
        candidate.trajectory_length += step;
        candidate.next_step = self.max_step;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "SimplePropagation: step between {} and {}",
            self.min_step, self.max_step
        )
    }
}
