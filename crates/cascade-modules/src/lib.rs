//! Reference modules for the Cascade simulation framework.
//!
//! Small, production-quality modules that exercise the full engine:
//! straight-line propagation, two break conditions, and a channel-backed
//! output sink.
//!
//! # Typical pipeline order
//!
//! 1. [`SimplePropagation`]: advance position, update path length
//! 2. [`MaximumTrajectoryLength`] / [`MinimumEnergy`]: deactivate, limit next step
//! 3. [`ChannelOutput`]: emit a record per observed candidate

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod breaks;
pub mod output;
pub mod propagation;

pub use breaks::{MaximumTrajectoryLength, MinimumEnergy};
pub use output::{ChannelOutput, OutputRecord, OutputTrigger};
pub use propagation::SimplePropagation;
