//! Benchmark profiles and utilities for the Cascade simulation framework.
//!
//! Provides pre-built pipelines and sources for benchmarks and examples:
//!
//! - [`reference_source`]: power-law primaries with isotropic emission
//! - [`reference_list`]: propagation with trajectory and energy breaks
//! - [`shower_list`]: [`reference_list`] plus energy splitting, so every
//!   primary grows a secondary tree

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cascade_core::{Candidate, Module, ModuleError, ParticleState, Property, SourceError, Vector3};
use cascade_engine::ModuleList;
use cascade_modules::{MaximumTrajectoryLength, MinimumEnergy, SimplePropagation};
use cascade_source::{
    Source, SourceIsotropicEmission, SourceParticleType, SourcePosition, SourcePowerLawSpectrum,
};

/// Build the reference source: particle id 22, energies in `[1, 1000]`
/// with spectral index -2, emitted isotropically from the origin.
pub fn reference_source(seed: u64) -> Result<Source, SourceError> {
    Ok(Source::with_seed(seed)
        .with(SourceParticleType::new(22))
        .with(SourcePowerLawSpectrum::new(1.0, 1000.0, -2.0)?)
        .with(SourcePosition::new(Vector3::zero()))
        .with(SourceIsotropicEmission))
}

/// Build the reference pipeline: unit steps, a 100-unit trajectory cap
/// and a unit energy floor.
pub fn reference_list() -> Result<ModuleList, ModuleError> {
    Ok(ModuleList::new()
        .with(SimplePropagation::new(0.1, 1.0)?)
        .with(MaximumTrajectoryLength::new(100.0))
        .with(MinimumEnergy::new(1.0)))
}

/// [`reference_list`] with [`Splitting`] appended.
pub fn shower_list(split_every: f64) -> Result<ModuleList, ModuleError> {
    Ok(reference_list()?.with(Splitting::new(split_every)))
}

/// Toy shower process: once a candidate has travelled `interval` since
/// its creation, it ends and hands its energy to two secondaries.
#[derive(Clone, Debug)]
pub struct Splitting {
    interval: f64,
}

impl Splitting {
    /// Split after every `interval` of path length.
    pub fn new(interval: f64) -> Self {
        Self { interval }
    }
}

impl Module for Splitting {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        if !candidate.is_active() {
            return Ok(());
        }
        let origin = candidate
            .property(ORIGIN_LENGTH)
            .and_then(Property::as_float)
            .unwrap_or(0.0);
        let length = candidate.trajectory_length;
        if length - origin < self.interval {
            return Ok(());
        }

        let weight = candidate.weight / 2.0;
        let mut state = candidate.current;
        state.set_energy(state.energy() / 2.0);
        for _ in 0..2 {
            candidate
                .add_secondary_weighted(state, weight)
                .set_property(ORIGIN_LENGTH, length);
        }
        candidate.set_active(false);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Splitting: every {}", self.interval)
    }
}

/// Trajectory length at which a split secondary was created.
const ORIGIN_LENGTH: &str = "origin_length";

/// `n` primaries at `energy` along the x axis.
pub fn beam(n: usize, energy: f64) -> Vec<Candidate> {
    (0..n)
        .map(|_| {
            let mut state = ParticleState::new(22, energy);
            state.set_direction(Vector3::new(1.0, 0.0, 0.0));
            Candidate::new(state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitting_halves_energy_and_weight() {
        let m = Splitting::new(1.0);
        let mut c = Candidate::new(ParticleState::new(22, 8.0));
        c.trajectory_length = 1.0;
        m.process(&mut c).unwrap();
        assert!(!c.is_active());
        assert_eq!(c.secondary_count(), 2);
        for s in &c.secondaries {
            assert_eq!(s.current.energy(), 4.0);
            assert_eq!(s.weight, 0.5);
        }
    }

    #[test]
    fn shower_settles() {
        let list = shower_list(10.0).unwrap();
        let mut primaries = beam(1, 64.0);
        list.run(&mut primaries[0]).unwrap();
        assert!(!primaries[0].is_active());
        // 64 -> 32 -> ... -> 1 under a 100-unit cap: a full binary tree.
        assert!(primaries[0].total_candidates() > 1);
    }

    #[test]
    fn reference_source_builds() {
        assert!(reference_source(1).is_ok());
    }
}
