//! QASM: a tiny register machine that drives a [`Circuit`](crate::quantum::Circuit)
//!
//! Pipeline: source text → [`compile`] → [`Program`] → [`Executor::run`] →
//! [`Environment`] (classical memory snapshot).

pub mod instruction;
pub mod compiler;
pub mod environment;
pub mod vm;

use std::time::Duration;

use thiserror::Error;

use crate::quantum::QuantumError;

pub use compiler::{compile, compile_lines};
pub use environment::{Cell, CellKind, Environment, Registers};
pub use instruction::{AllocKind, AluOp, Instruction, JumpCondition, Operand, Program};
pub use vm::{execute, execute_seeded, Executor};

/// Errors raised while compiling or executing a QASM program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QasmError {
    #[error("Invalid qasm instruction '{0}'")]
    Syntax(String),

    #[error("Address {address} is outside the allocated memory of {size} cells")]
    AddressOutOfRange { address: usize, size: usize },

    #[error("Address {address} holds {found}, expected {expected}")]
    WrongCell {
        address: usize,
        expected: CellKind,
        found: CellKind,
    },

    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    #[error("Conditional jump to '{0}' before any cmp instruction")]
    NoComparison(String),

    #[error("Division by zero writing cell {0}")]
    DivisionByZero(usize),

    #[error("Arithmetic overflow writing cell {0}")]
    Overflow(usize),

    #[error("Execution was cancelled at instruction {0}")]
    Cancelled(usize),

    #[error("Execution took more than {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Quantum(#[from] QuantumError),
}
