//! Probabilistic collapse of amplitude vectors

use rand::Rng;

use super::error::QuantumError;
use super::matrix::Matrix;

/// Pick one basis index of `amplitudes` with probability proportional to its
/// squared modulus.
///
/// Draws `r` uniformly from `[0, S)` where `S` is the total weight, then
/// subtracts weights in index order until `r` drops to zero or below. Basis
/// states with zero weight are never chosen. If rounding leaves `r` positive
/// after the last weight, the vector is reported as not normalizable.
pub fn collapse<R: Rng + ?Sized>(amplitudes: &Matrix, rng: &mut R) -> Result<usize, QuantumError> {
    let weights = amplitudes.weights();
    let total: f64 = weights.iter().sum();

    if !total.is_finite() || total <= 0.0 {
        return Err(QuantumError::Normalization(total));
    }

    let mut remaining = rng.gen_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if *weight == 0.0 {
            continue;
        }
        remaining -= weight;
        if remaining <= 0.0 {
            return Ok(index);
        }
    }

    Err(QuantumError::Normalization(total))
}
