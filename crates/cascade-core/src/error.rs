//! Error types raised by the engine's two extension points.
//!
//! [`ModuleError`] is returned by [`Module::process`](crate::Module::process),
//! [`SourceError`] by [`SourceInterface::candidate`](crate::SourceInterface::candidate).
//! The engine never retries either; it logs them at the iteration boundary.

use std::error::Error;
use std::fmt;

/// Errors from a single module step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleError {
    /// The module's step failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The candidate was in a state the module cannot handle
    /// (e.g. non-finite energy).
    InvalidState {
        /// Description of the offending state.
        reason: String,
    },
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::InvalidState { reason } => write!(f, "invalid candidate state: {reason}"),
        }
    }
}

impl Error for ModuleError {}

/// Errors from manufacturing a fresh candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// A source list has no sources to choose from.
    NoSources,
    /// A multi-type feature has no particle types configured.
    NoParticleTypes,
    /// A feature was configured with an unusable parameter.
    InvalidParameter {
        /// Description of the parameter problem.
        reason: String,
    },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSources => write!(f, "source list has no sources"),
            Self::NoParticleTypes => write!(f, "no particle types configured"),
            Self::InvalidParameter { reason } => write!(f, "invalid source parameter: {reason}"),
        }
    }
}

impl Error for SourceError {}
