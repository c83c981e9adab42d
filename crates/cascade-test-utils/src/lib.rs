//! Test utilities and mock types for Cascade development.
//!
//! Provides fixture [`Module`](cascade_core::Module)s and
//! [`SourceInterface`](cascade_core::SourceInterface)s with observable,
//! deterministic behavior, plus helpers for building populations.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    generation, population, steps, CountingModule, FailingModule, FailingSource, Recorder,
    SequentialSource, Spawner, StepLimit, TriggerAfter, Visit, GENERATION, STEPS,
};
