//! Errors raised by the simulation engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantumError {
    #[error("Shape mismatch: cannot combine {left_rows}x{left_cols} with {right_rows}x{right_cols}")]
    Shape {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("Ragged matrix: row {row} has {got} entries, expected {expected}")]
    RaggedRows { row: usize, expected: usize, got: usize },

    #[error("Amplitudes are not normalized (total weight {0})")]
    Normalization(f64),

    #[error("Gate {gate} acts on {expected} qubits, but {got} were given")]
    Arity {
        gate: String,
        expected: usize,
        got: usize,
    },

    #[error("Qubit {0} appears more than once in a single gate application")]
    DuplicateQubit(usize),

    #[error("Qubit {0} does not belong to this circuit")]
    UnknownQubit(usize),
}
