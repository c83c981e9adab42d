//! Cascade: a parallel particle-cascade simulation framework.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Cascade sub-crates. For most users, adding `cascade` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cascade::prelude::*;
//!
//! // A minimal module that ends every candidate after one step.
//! struct OneStep;
//! impl Module for OneStep {
//!     fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
//!         candidate.set_active(false);
//!         Ok(())
//!     }
//! }
//!
//! let list = ModuleList::new()
//!     .with(SimplePropagation::new(0.1, 1.0).unwrap())
//!     .with(OneStep);
//!
//! let mut candidates: Vec<Candidate> = (0..100)
//!     .map(|id| Candidate::new(ParticleState::new(id, 1.0)))
//!     .collect();
//! let config = RunConfig::default().with_signal_handling(false);
//! let summary = list
//!     .run_candidates(&mut candidates, Propagation::default(), &config, &CancelToken::new())
//!     .unwrap();
//! assert!(summary.is_complete());
//! assert!(candidates.iter().all(|c| c.trajectory_length == 0.1));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cascade-core` | Candidate data model, `Module` and `SourceInterface` traits |
//! | [`source`] | `cascade-source` | Sources, source features, sampling helpers |
//! | [`modules`] | `cascade-modules` | Reference modules (propagation, breaks, output) |
//! | [`engine`] | `cascade-engine` | `ModuleList`, lineage and population runs, cancellation |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core data model and extension traits (`cascade-core`).
///
/// Contains [`types::Candidate`], [`types::ParticleState`], the
/// [`types::Module`] and [`types::SourceInterface`] traits, and their
/// error types.
pub use cascade_core as types;

/// Candidate sources (`cascade-source`).
pub use cascade_source as source;

/// Reference modules (`cascade-modules`).
pub use cascade_modules as modules;

/// Pipeline execution engine (`cascade-engine`).
///
/// [`engine::ModuleList`] is the entry point for both single-lineage and
/// parallel population runs.
pub use cascade_engine as engine;

/// Common imports for typical Cascade usage.
///
/// ```rust
/// use cascade::prelude::*;
/// ```
pub mod prelude {
    // Data model and traits
    pub use cascade_core::{
        Candidate, Module, ModuleError, ParticleState, Property, SourceError, SourceInterface,
        Vector3,
    };

    // Sources
    pub use cascade_source::{Source, SourceFeature, SourceList};

    // Reference modules
    pub use cascade_modules::{
        ChannelOutput, MaximumTrajectoryLength, MinimumEnergy, OutputTrigger, SimplePropagation,
    };

    // Engine
    pub use cascade_engine::{
        CancelState, CancelToken, ErrorPolicy, ModuleList, ModuleListRunner, Propagation,
        RunConfig, RunError, RunSummary,
    };
}
