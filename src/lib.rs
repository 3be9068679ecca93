//! quasm: a lazily-entangling qubit simulator driven by a small QASM register machine
//!
//! Qubits stay separable until a multi-qubit gate touches them. Gates on
//! entangled qubits are recorded against their entanglement group and only
//! evaluated, over the group's joint state, when one of its members is
//! measured. On top of the circuit sits a QASM compiler and virtual machine,
//! a shot runner that averages classical memory over repeated runs, and a
//! request/response boundary with a wall-clock bound.

pub mod quantum;
pub mod qasm;
pub mod config;
pub mod simulators;
pub mod service;
pub mod arithmetic;

pub mod prelude {
    pub use crate::arithmetic::QInteger;
    pub use crate::config::ExecutionConfig;
    pub use crate::qasm::{compile, compile_lines, execute, execute_seeded, Program, QasmError};
    pub use crate::quantum::prelude::*;
    pub use crate::service::{ExecuteRequest, ExecuteResponse, Service};
    pub use crate::simulators::{ShotRunner, ShotSummary};
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
