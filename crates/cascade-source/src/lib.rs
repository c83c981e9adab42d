//! Candidate sources for the Cascade particle simulation framework.
//!
//! A [`Source`] is an ordered list of [`SourceFeature`]s, each preparing
//! one aspect of a fresh primary (particle type, energy, position,
//! direction, redshift). A [`SourceList`] picks between several sources
//! by relative weight. Both implement
//! [`SourceInterface`](cascade_core::SourceInterface), so either can
//! drive a source-based population run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod features;
pub mod random;
pub mod source;

pub use features::{
    SourceDirection, SourceEnergy, SourceIsotropicEmission, SourceMultipleParticleTypes,
    SourceParticleType, SourcePosition, SourcePowerLawSpectrum, SourceRedshift,
};
pub use source::{Source, SourceFeature, SourceList};
