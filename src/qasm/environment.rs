//! Execution environment of one QASM run
//!
//! Flat memory of typed cells, the program counter, the label table and the
//! compare registers. The environment owns the [`Circuit`] its qubit cells
//! point into.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::instruction::{AllocKind, Operand};
use super::QasmError;
use crate::quantum::{Circuit, QubitId};

/// One memory cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Qubit(QubitId),
    Integer(i64),
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Empty => CellKind::Empty,
            Cell::Qubit(_) => CellKind::Qubit,
            Cell::Integer(_) => CellKind::Integer,
        }
    }
}

/// Tag of a [`Cell`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Qubit,
    Integer,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Empty => write!(f, "an empty cell"),
            CellKind::Qubit => write!(f, "a qubit"),
            CellKind::Integer => write!(f, "an integer"),
        }
    }
}

/// Operands of the last `cmp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug)]
pub struct Environment {
    memory: Vec<Cell>,
    pub pc: usize,
    labels: HashMap<String, usize>,
    pub registers: Option<Registers>,
    circuit: Circuit,
}

impl Environment {
    pub fn new(size: usize, rng: StdRng) -> Self {
        Environment {
            memory: vec![Cell::Empty; size],
            pc: 0,
            labels: HashMap::new(),
            registers: None,
            circuit: Circuit::with_rng(rng),
        }
    }

    pub fn size(&self) -> usize {
        self.memory.len()
    }

    pub fn memory(&self) -> &[Cell] {
        &self.memory
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn define_label(&mut self, name: &str, index: usize) {
        self.labels.insert(name.to_string(), index);
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn cell(&self, address: usize) -> Result<Cell, QasmError> {
        self.memory.get(address).copied().ok_or(QasmError::AddressOutOfRange {
            address,
            size: self.memory.len(),
        })
    }

    fn cell_mut(&mut self, address: usize) -> Result<&mut Cell, QasmError> {
        let size = self.memory.len();
        self.memory
            .get_mut(address)
            .ok_or(QasmError::AddressOutOfRange { address, size })
    }

    /// Integer stored at `address`
    pub fn integer_at(&self, address: usize) -> Result<i64, QasmError> {
        match self.cell(address)? {
            Cell::Integer(value) => Ok(value),
            other => Err(QasmError::WrongCell {
                address,
                expected: CellKind::Integer,
                found: other.kind(),
            }),
        }
    }

    pub fn qubit_at(&self, address: usize) -> Result<QubitId, QasmError> {
        match self.cell(address)? {
            Cell::Qubit(qubit) => Ok(qubit),
            other => Err(QasmError::WrongCell {
                address,
                expected: CellKind::Qubit,
                found: other.kind(),
            }),
        }
    }

    pub fn read_operand(&self, operand: Operand) -> Result<i64, QasmError> {
        match operand {
            Operand::Literal(value) => Ok(value),
            Operand::Cell(address) => self.integer_at(address),
        }
    }

    /// Overwrite an existing integer cell
    pub fn set_integer(&mut self, address: usize, value: i64) -> Result<(), QasmError> {
        self.integer_at(address)?;
        *self.cell_mut(address)? = Cell::Integer(value);
        Ok(())
    }

    /// Write an integer into an empty or integer cell
    pub fn store(&mut self, address: usize, value: i64) -> Result<(), QasmError> {
        let cell = self.cell_mut(address)?;
        if let Cell::Qubit(_) = cell {
            return Err(QasmError::WrongCell {
                address,
                expected: CellKind::Integer,
                found: CellKind::Qubit,
            });
        }
        *cell = Cell::Integer(value);
        Ok(())
    }

    /// Fill `[address, address + count)` with fresh qubits or zero integers
    pub fn overwrite(&mut self, address: usize, count: usize, kind: AllocKind) -> Result<(), QasmError> {
        let size = self.memory.len();
        let end = address
            .checked_add(count)
            .filter(|end| *end <= size)
            .ok_or(QasmError::AddressOutOfRange {
                address: address.saturating_add(count).saturating_sub(1),
                size,
            })?;

        for index in address..end {
            self.memory[index] = match kind {
                AllocKind::Qubits => Cell::Qubit(self.circuit.create_qubit()),
                AllocKind::Integers => Cell::Integer(0),
            };
        }
        Ok(())
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.memory.iter().filter(|cell| cell.kind() == kind).count()
    }

    /// One entry per address: the integer value, or `None` for qubit and empty cells
    pub fn snapshot(&self) -> Vec<Option<i64>> {
        self.memory
            .iter()
            .map(|cell| match cell {
                Cell::Integer(value) => Some(*value),
                _ => None,
            })
            .collect()
    }
}
