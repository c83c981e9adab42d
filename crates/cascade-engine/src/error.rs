//! Error types for pipeline editing and candidate propagation.

use std::error::Error;
use std::fmt;

use cascade_core::{ModuleError, SourceError};

/// Contract violations when editing a [`ModuleList`](crate::ModuleList).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// `remove()` was called with an index past the end.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of modules at the time of the call.
        len: usize,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "module index {index} out of range for list of {len}")
            }
        }
    }
}

impl Error for PipelineError {}

/// Failure of one iteration of a run.
///
/// Population runs catch these at the iteration boundary and log them;
/// lineage runs return them to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// A module returned an error.
    ModuleFailed {
        /// Position of the module in the list.
        index: usize,
        /// The module's description.
        name: String,
        /// The underlying module error.
        reason: ModuleError,
    },
    /// The source could not manufacture a candidate.
    Source(SourceError),
    /// Something in the iteration panicked.
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleFailed {
                index,
                name,
                reason,
            } => write!(f, "module {index} '{name}' failed: {reason}"),
            Self::Source(e) => write!(f, "source failed: {e}"),
            Self::Panicked { message } => write!(f, "iteration panicked: {message}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ModuleFailed { reason, .. } => Some(reason),
            Self::Source(e) => Some(e),
            Self::Panicked { .. } => None,
        }
    }
}

impl From<SourceError> for RunError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
