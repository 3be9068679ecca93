//! Quantum gate library
//!
//! Every gate the engine knows about is a [`GateKind`]. The unitary for a kind
//! is a pure function of the kind; nothing is looked up by name at runtime.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::matrix::{real, Matrix};

/// Common complex numbers used in quantum gates
pub mod constants {
    use num_complex::Complex64;

    /// The imaginary unit i
    pub const I: Complex64 = Complex64::new(0.0, 1.0);

    /// 0
    pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);

    /// 1
    pub const ONE: Complex64 = Complex64::new(1.0, 0.0);
}

use constants::{I, ONE, ZERO};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// Pauli-X (NOT)
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
    /// Hadamard
    H,
    /// π/8 gate, diag(1, e^{iπ/4})
    T,
    /// Adjoint of T
    TDagger,
    /// Square root of X
    SqrtX,
    /// Z·X: X followed by Z
    ZX,
    /// Phase rotation diag(1, e^{iφ})
    Phase(f64),
    Swap,
    SqrtSwap,
    /// Controlled-X, control first
    Cnot,
    /// Doubly-controlled X, controls first
    Toffoli,
    /// Fredkin gate, control first
    ControlledSwap,
}

impl GateKind {
    /// Number of qubits this gate acts on
    pub fn qubit_count(&self) -> usize {
        match self {
            GateKind::X
            | GateKind::Y
            | GateKind::Z
            | GateKind::H
            | GateKind::T
            | GateKind::TDagger
            | GateKind::SqrtX
            | GateKind::ZX
            | GateKind::Phase(_) => 1,
            GateKind::Swap | GateKind::SqrtSwap | GateKind::Cnot => 2,
            GateKind::Toffoli | GateKind::ControlledSwap => 3,
        }
    }

    pub fn is_single_qubit(&self) -> bool {
        self.qubit_count() == 1
    }

    /// QASM mnemonic for this gate
    pub fn mnemonic(&self) -> &'static str {
        match self {
            GateKind::X => "X",
            GateKind::Y => "Y",
            GateKind::Z => "Z",
            GateKind::H => "H",
            GateKind::T => "T",
            GateKind::TDagger => "TDG",
            GateKind::SqrtX => "SQRTX",
            GateKind::ZX => "ZX",
            GateKind::Phase(_) => "R",
            GateKind::Swap => "SWAP",
            GateKind::SqrtSwap => "SQRTSWAP",
            GateKind::Cnot => "CNOT",
            GateKind::Toffoli => "CCNOT",
            GateKind::ControlledSwap => "CSWAP",
        }
    }

    /// Look up a parameterless gate by its QASM mnemonic
    pub fn from_mnemonic(mnemonic: &str) -> Option<GateKind> {
        let gate = match mnemonic {
            "X" => GateKind::X,
            "Y" => GateKind::Y,
            "Z" => GateKind::Z,
            "H" => GateKind::H,
            "T" => GateKind::T,
            "TDG" => GateKind::TDagger,
            "SQRTX" => GateKind::SqrtX,
            "ZX" => GateKind::ZX,
            "SWAP" => GateKind::Swap,
            "SQRTSWAP" => GateKind::SqrtSwap,
            "CNOT" => GateKind::Cnot,
            "CCNOT" => GateKind::Toffoli,
            "CSWAP" => GateKind::ControlledSwap,
            _ => return None,
        };
        Some(gate)
    }

    /// The unitary of this gate over exactly `qubit_count()` wires
    pub fn matrix(&self) -> Matrix {
        match self {
            GateKind::X => square(&[[ZERO, ONE], [ONE, ZERO]]),
            GateKind::Y => square(&[[ZERO, -I], [I, ZERO]]),
            GateKind::Z => square(&[[ONE, ZERO], [ZERO, -ONE]]),
            GateKind::H => {
                let h = real(FRAC_1_SQRT_2);
                square(&[[h, h], [h, -h]])
            }
            GateKind::T => phase(PI / 4.0),
            GateKind::TDagger => phase(-PI / 4.0),
            GateKind::SqrtX => {
                let p = Complex64::new(0.5, 0.5);
                let m = Complex64::new(0.5, -0.5);
                square(&[[p, m], [m, p]])
            }
            GateKind::ZX => square(&[[ZERO, ONE], [-ONE, ZERO]]),
            GateKind::Phase(phi) => phase(*phi),
            GateKind::Swap => permutation(4, &[(1, 2)]),
            GateKind::SqrtSwap => {
                let p = Complex64::new(0.5, 0.5);
                let m = Complex64::new(0.5, -0.5);
                square(&[
                    [ONE, ZERO, ZERO, ZERO],
                    [ZERO, p, m, ZERO],
                    [ZERO, m, p, ZERO],
                    [ZERO, ZERO, ZERO, ONE],
                ])
            }
            GateKind::Cnot => permutation(4, &[(2, 3)]),
            GateKind::Toffoli => permutation(8, &[(6, 7)]),
            GateKind::ControlledSwap => permutation(8, &[(5, 6)]),
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateKind::Phase(phi) => write!(f, "R({})", phi),
            other => write!(f, "{}", other.mnemonic()),
        }
    }
}

fn square<const N: usize>(rows: &[[Complex64; N]; N]) -> Matrix {
    let data = ndarray::Array2::from_shape_fn((N, N), |(i, j)| rows[i][j]);
    Matrix::from_array(data)
}

fn phase(phi: f64) -> Matrix {
    square(&[[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, phi)]])
}

/// Identity of the given size with the listed basis states exchanged
fn permutation(size: usize, swaps: &[(usize, usize)]) -> Matrix {
    let mut image: Vec<usize> = (0..size).collect();
    for &(a, b) in swaps {
        image.swap(a, b);
    }
    let data = ndarray::Array2::from_shape_fn((size, size), |(row, col)| {
        if image[col] == row { ONE } else { ZERO }
    });
    Matrix::from_array(data)
}
