//! Quantum state representations
//!
//! A single qubit's local state is a `2 x 1` column vector `α|0⟩ + β|1⟩`.
//! A joint state over N qubits is a `2^N x 1` column vector whose basis index
//! reads the first qubit as the most significant bit.

use num_complex::Complex64;

use super::matrix::{real, tensor, Matrix};

const NORMALIZATION_TOLERANCE: f64 = 1e-10;

/// The |0⟩ state
pub fn zero() -> Matrix {
    Matrix::column_vector(&[real(1.0), real(0.0)])
}

/// The |1⟩ state
pub fn one() -> Matrix {
    Matrix::column_vector(&[real(0.0), real(1.0)])
}

/// The |+⟩ state
pub fn plus() -> Matrix {
    let amp = 1.0 / 2.0_f64.sqrt();
    Matrix::column_vector(&[real(amp), real(amp)])
}

/// The |-⟩ state
pub fn minus() -> Matrix {
    let amp = 1.0 / 2.0_f64.sqrt();
    Matrix::column_vector(&[real(amp), real(-amp)])
}

/// The |0⟩ or |1⟩ state for a classical bit
pub fn from_bit(bit: bool) -> Matrix {
    if bit { one() } else { zero() }
}

/// One-hot column vector of length `size` with a 1 at `index`
pub fn basis(size: usize, index: usize) -> Matrix {
    let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
    if index < size {
        amplitudes[index] = real(1.0);
    }
    Matrix::column_vector(&amplitudes)
}

/// Joint state of several separable qubits, first qubit most significant
pub fn joint<'a, I>(locals: I) -> Matrix
where
    I: IntoIterator<Item = &'a Matrix>,
{
    tensor(locals)
}

/// Check that a column vector has unit total probability
pub fn is_normalized(state: &Matrix) -> bool {
    let norm_sqr: f64 = state.weights().iter().sum();
    (norm_sqr - 1.0).abs() < NORMALIZATION_TOLERANCE
}

/// Interpret a collapsed single-qubit vector: true only for exactly |1⟩
pub fn bool_for(state: &Matrix) -> bool {
    state.shape() == (2, 1)
        && state.get(0, 0) == Complex64::new(0.0, 0.0)
        && state.get(1, 0) == real(1.0)
}

/// Bits of a basis index over `width` qubits, most significant first
pub fn index_bits(index: usize, width: usize) -> Vec<bool> {
    (0..width)
        .map(|position| (index >> (width - 1 - position)) & 1 == 1)
        .collect()
}

/// Render bits as a `0`/`1` string
pub fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_states_are_normalized() {
        for state in [zero(), one(), plus(), minus()] {
            assert!(is_normalized(&state));
        }
        assert!(!is_normalized(&Matrix::column_vector(&[real(1.0), real(1.0)])));
    }

    #[test]
    fn test_joint_state_orders_first_qubit_most_significant() {
        let state = joint([&one(), &zero()]);
        assert_eq!(state, basis(4, 2));
    }

    #[test]
    fn test_index_bits() {
        assert_eq!(index_bits(6, 3), vec![true, true, false]);
        assert_eq!(index_bits(1, 3), vec![false, false, true]);
        assert_eq!(bit_string(&index_bits(5, 4)), "0101");
    }

    #[test]
    fn test_bool_for_only_accepts_exact_one() {
        assert!(bool_for(&one()));
        assert!(!bool_for(&zero()));
        assert!(!bool_for(&plus()));
        assert!(!bool_for(&basis(4, 1)));
    }
}
