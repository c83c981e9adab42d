//! Sampling helpers shared by the source features.
//!
//! All helpers take `&mut dyn RngCore` so features stay object-safe; the
//! concrete generator is the seeded [`ChaCha8Rng`](rand_chacha::ChaCha8Rng)
//! owned by each [`Source`](crate::Source).

use cascade_core::Vector3;
use rand::{Rng, RngCore};

/// Draw a bin index from a cumulative weight table.
///
/// `cdf` must be non-empty and non-decreasing. Returns the first index
/// whose cumulative weight exceeds a uniform draw in `[0, cdf.last())`.
pub fn rand_bin(cdf: &[f64], rng: &mut dyn RngCore) -> usize {
    debug_assert!(!cdf.is_empty());
    let total = cdf[cdf.len() - 1];
    let r = rng.random::<f64>() * total;
    cdf.partition_point(|&c| c <= r).min(cdf.len() - 1)
}

/// Draw from a power law `dN/dx ~ x^index` on `[min, max]`.
pub fn rand_power_law(index: f64, min: f64, max: f64, rng: &mut dyn RngCore) -> f64 {
    let u = rng.random::<f64>();
    let a = index + 1.0;
    if a.abs() < f64::EPSILON {
        // index == -1: uniform in log space
        (min.ln() + u * (max.ln() - min.ln())).exp()
    } else {
        let lo = min.powf(a);
        let hi = max.powf(a);
        (lo + u * (hi - lo)).powf(1.0 / a)
    }
}

/// A direction drawn uniformly from the unit sphere.
pub fn rand_unit_vector(rng: &mut dyn RngCore) -> Vector3 {
    let z = rng.random_range(-1.0..=1.0f64);
    let phi = rng.random_range(0.0..std::f64::consts::TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}
