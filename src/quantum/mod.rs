// src/quantum/mod.rs
//! Quantum state simulation
//!
//! Dense complex algebra, the fixed gate library, synthesis of wide gates, and
//! the [`Circuit`] that tracks entanglement lazily and collapses it on
//! measurement.

pub mod error;
pub mod matrix;
pub mod state;
pub mod gate;
pub mod synthesis;
pub mod measurement;
pub mod circuit;

pub use error::QuantumError;
pub use matrix::{tensor, Matrix};
pub use gate::GateKind;
pub use circuit::{Circuit, EntanglementStep, GroupId, QubitId, StepFunction};
pub use measurement::collapse;

/// Re-export commonly used types
pub mod prelude {
    pub use super::{Circuit, GateKind, Matrix, QubitId, QuantumError};
    pub use super::state;
}
