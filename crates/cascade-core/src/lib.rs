//! Core types and traits for the Cascade particle simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the particle data model ([`Candidate`], [`ParticleState`], [`Vector3`]),
//! the two extension traits consumed by the engine ([`Module`] and
//! [`SourceInterface`]), and their error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod candidate;
pub mod error;
pub mod traits;
pub mod vector;

pub use candidate::{Candidate, ParticleState, Property};
pub use error::{ModuleError, SourceError};
pub use traits::{Module, SourceInterface};
pub use vector::Vector3;
