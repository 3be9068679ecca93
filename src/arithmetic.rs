//! Quantum integers
//!
//! [`QInteger`] holds a classical bit pattern and adds two patterns with a
//! reversible ripple-carry adder built only from CNOT and CCNOT on a
//! [`Circuit`].

use std::fmt;

use tracing::debug;

use crate::quantum::{Circuit, QuantumError, QubitId};

/// An unsigned integer as a most-significant-bit-first bit pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QInteger {
    bits: Vec<bool>,
}

impl QInteger {
    /// Wrap a bit pattern, most significant bit first
    pub fn from_bits(bits: Vec<bool>) -> Self {
        QInteger { bits }
    }

    /// Binary representation without leading zeros (`0` is a single bit)
    pub fn from_int(value: u64) -> Self {
        let width = (u64::BITS - value.leading_zeros()).max(1) as usize;
        let bits = (0..width).rev().map(|i| (value >> i) & 1 == 1).collect();
        QInteger { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn to_int(&self) -> u64 {
        self.bits
            .iter()
            .fold(0u64, |total, &bit| (total << 1) | u64::from(bit))
    }

    /// Bit of weight `2^index`
    fn bit(&self, index: usize) -> bool {
        index < self.bits.len() && self.bits[self.bits.len() - 1 - index]
    }

    /// Sum on a fresh circuit seeded from entropy
    pub fn add(&self, other: &QInteger) -> Result<QInteger, QuantumError> {
        self.add_on(other, &mut Circuit::new())
    }

    /// Sum of `self` and `other`, one bit wider than the wider operand.
    ///
    /// Allocates `3n + 1` qubits on `circuit`: `a` (n), `b` (n + 1, receives
    /// the sum) and the carry line `c` (n).
    pub fn add_on(&self, other: &QInteger, circuit: &mut Circuit) -> Result<QInteger, QuantumError> {
        let n = self.width().max(other.width()).max(1);
        let register = circuit.create_qubits(3 * n + 1);
        let (a, rest) = register.split_at(n);
        let (b, c) = rest.split_at(n + 1);

        for i in 0..n {
            if self.bit(i) {
                circuit.x(a[i])?;
            }
            if other.bit(i) {
                circuit.x(b[i])?;
            }
        }

        for i in 0..n - 1 {
            carry(circuit, c[i], a[i], b[i], c[i + 1])?;
        }
        carry(circuit, c[n - 1], a[n - 1], b[n - 1], b[n])?;
        circuit.cnot(c[n - 1], b[n - 1])?;

        for i in (0..n - 1).rev() {
            uncarry(circuit, c[i], a[i], b[i], c[i + 1])?;
            sum(circuit, c[i], a[i], b[i])?;
        }

        let mut bits = Vec::with_capacity(n + 1);
        for &qubit in b.iter().rev() {
            bits.push(circuit.measure(qubit)?);
        }
        let result = QInteger { bits };
        debug!(left = %self, right = %other, sum = %result, "ripple-carry addition");
        Ok(result)
    }
}

/// `out ^= maj(carry_in, a, b)`, leaving `b = a ^ b`
fn carry(circuit: &mut Circuit, carry_in: QubitId, a: QubitId, b: QubitId, out: QubitId) -> Result<(), QuantumError> {
    circuit.toffoli(a, b, out)?;
    circuit.cnot(a, b)?;
    circuit.toffoli(carry_in, b, out)
}

/// Inverse of [`carry`]
fn uncarry(circuit: &mut Circuit, carry_in: QubitId, a: QubitId, b: QubitId, out: QubitId) -> Result<(), QuantumError> {
    circuit.toffoli(carry_in, b, out)?;
    circuit.cnot(a, b)?;
    circuit.toffoli(a, b, out)
}

/// `b ^= carry_in ^ a`
fn sum(circuit: &mut Circuit, carry_in: QubitId, a: QubitId, b: QubitId) -> Result<(), QuantumError> {
    circuit.cnot(carry_in, b)?;
    circuit.cnot(a, b)
}

impl fmt::Display for QInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
