//! Program-level simulation drivers
//!
//! Runs compiled QASM programs for many shots and aggregates their classical
//! memory.

pub mod shots;

pub use shots::{ShotRunner, ShotSummary};
