//! Population run configuration and validation.
//!
//! [`RunConfig`] controls the worker pool (thread count, chunk size), the
//! failure policy, signal handling and progress reporting for one
//! population run. [`validate()`](RunConfig::validate) runs before any
//! work is dispatched.

use std::error::Error;
use std::fmt;

/// Default number of consecutive indices handed to a worker at once.
///
/// Large enough to amortize dispatch, small enough that a few expensive
/// candidates do not leave the other workers idle.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Upper bound applied to explicit thread counts.
pub const MAX_THREADS: usize = 256;

// ── ErrorPolicy ────────────────────────────────────────────────────

/// What a population run does after an iteration fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Mark the token failed immediately. No new iterations start, and
    /// lineages in flight stop at their next step boundary.
    #[default]
    Halt,
    /// Log the failure and keep dispatching. The token is marked failed
    /// once the pool has drained, so callers still see that the run was
    /// partial.
    Continue,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`RunConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `chunk_size` is zero.
    ZeroChunkSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroChunkSize => write!(f, "chunk_size must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

// ── RunConfig ──────────────────────────────────────────────────────

/// Configuration for one population run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Number of worker threads. `None` = `available_parallelism`.
    pub threads: Option<usize>,
    /// Consecutive indices per chunk. Default: [`DEFAULT_CHUNK_SIZE`].
    pub chunk_size: usize,
    /// Failure handling. Default: [`ErrorPolicy::Halt`].
    pub on_error: ErrorPolicy,
    /// Translate SIGINT/SIGTERM into cancellation for the duration of the
    /// run and re-raise afterwards. Default: `true`.
    pub handle_signals: bool,
    /// Override the module list's progress flag for this run.
    pub show_progress: Option<bool>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_error: ErrorPolicy::Halt,
            handle_signals: true,
            show_progress: None,
        }
    }
}

impl RunConfig {
    /// Resolve the worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, MAX_THREADS]`.
    pub fn resolved_threads(&self) -> usize {
        match self.threads {
            Some(n) => n.clamp(1, MAX_THREADS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(())
    }

    /// Set an explicit worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the failure policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Enable or disable signal handling.
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Force progress reporting on or off for this run.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = Some(show);
        self
    }
}
