//! Execution engine for Cascade simulations.
//!
//! [`ModuleList`] is the pipeline: an ordered list of
//! [`Module`](cascade_core::Module)s applied to a candidate at every step.
//! On top of single-step application it provides
//!
//! - lineage propagation ([`ModuleList::run_candidate`]): drive one
//!   candidate, and optionally its secondaries, to a terminal state;
//! - population runs ([`ModuleList::run_candidates`],
//!   [`ModuleList::run_shared`], [`ModuleList::run_source`]): a fixed
//!   worker pool over a statically chunked index space, with cooperative
//!   cancellation through a [`CancelToken`] and per-iteration fault
//!   isolation.
//!
//! During a population run the engine temporarily owns SIGINT/SIGTERM
//! delivery ([`SignalGuard`]), turning a signal into a token write. After
//! the pool drains the previous handlers are restored and the signal is
//! re-raised, so the host still sees its usual termination behavior.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod lineage;
pub mod pipeline;
pub mod population;
pub mod progress;
pub mod runner;
#[allow(unsafe_code)]
pub mod signal;

pub use cancel::{CancelState, CancelToken};
pub use config::{ConfigError, ErrorPolicy, RunConfig};
pub use error::{PipelineError, RunError};
pub use lineage::Propagation;
pub use pipeline::ModuleList;
pub use population::{RunSummary, SharedCandidate};
pub use progress::{ProgressBar, ProgressReporter};
pub use runner::ModuleListRunner;
pub use signal::SignalGuard;
