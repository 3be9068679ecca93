//! Compiled QASM instructions
//!
//! One enum variant per instruction kind, carrying parsed operands. The
//! `Display` impl renders valid QASM, so a compiled program can be printed and
//! compiled again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quantum::GateKind;

/// What a typed `alloc` line fills its range with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocKind {
    /// `Q` suffix: fresh |0⟩ qubits
    Qubits,
    /// `b` suffix: zero-valued integers
    Integers,
}

impl AllocKind {
    pub fn suffix(&self) -> char {
        match self {
            AllocKind::Qubits => 'Q',
            AllocKind::Integers => 'b',
        }
    }
}

/// Source operand of a classical instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// `N`
    Literal(i64),
    /// `Nb`: the integer stored at address N
    Cell(usize),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Cell(address) => write!(f, "{}b", address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mov,
}

impl AluOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            AluOp::Add => "add",
            AluOp::Sub => "sub",
            AluOp::Mul => "mul",
            AluOp::Div => "div",
            AluOp::Mov => "mov",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<AluOp> {
        match mnemonic {
            "add" => Some(AluOp::Add),
            "sub" => Some(AluOp::Sub),
            "mul" => Some(AluOp::Mul),
            "div" => Some(AluOp::Div),
            "mov" => Some(AluOp::Mov),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpCondition {
    Always,
    Greater,
    Less,
    Equal,
    NotEqual,
    LessOrEqual,
    GreaterOrEqual,
}

impl JumpCondition {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            JumpCondition::Always => "jmp",
            JumpCondition::Greater => "jgt",
            JumpCondition::Less => "jlt",
            JumpCondition::Equal => "je",
            JumpCondition::NotEqual => "jne",
            JumpCondition::LessOrEqual => "jle",
            JumpCondition::GreaterOrEqual => "jge",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<JumpCondition> {
        let condition = match mnemonic {
            "jmp" => JumpCondition::Always,
            "jgt" => JumpCondition::Greater,
            "jlt" => JumpCondition::Less,
            "je" => JumpCondition::Equal,
            "jne" => JumpCondition::NotEqual,
            "jle" => JumpCondition::LessOrEqual,
            "jge" => JumpCondition::GreaterOrEqual,
            _ => return None,
        };
        Some(condition)
    }

    /// Whether the jump is taken for registers `(a, b)`
    pub fn holds(&self, a: i64, b: i64) -> bool {
        match self {
            JumpCondition::Always => true,
            JumpCondition::Greater => a > b,
            JumpCondition::Less => a < b,
            JumpCondition::Equal => a == b,
            JumpCondition::NotEqual => a != b,
            JumpCondition::LessOrEqual => a <= b,
            JumpCondition::GreaterOrEqual => a >= b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// `alloc N` sizes memory; `alloc NQ(a)` / `alloc Nb(a)` fill `[a, a+N)`
    Alloc {
        size: usize,
        region: Option<(AllocKind, usize)>,
    },
    /// `.name:`
    Label(String),
    /// `M aQ, outb`
    Measure { qubit: usize, output: usize },
    /// `G aQ` and `R aQ, φb`
    SingleGate { gate: GateKind, qubit: usize },
    /// `CNOT aQ,bQ`, `CCNOT aQ,bQ,cQ`, ...
    MultiGate { gate: GateKind, qubits: Vec<usize> },
    /// `add|sub|mul|div|mov X, Yb`
    Alu { op: AluOp, source: Operand, target: usize },
    /// `cmp X, Yb`
    Compare { source: Operand, target: usize },
    /// `jmp|jgt|jlt|je|jne|jle|jge .name`
    Jump { condition: JumpCondition, label: String },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloc { size, region: None } => write!(f, "alloc {}", size),
            Instruction::Alloc { size, region: Some((kind, address)) } => {
                write!(f, "alloc {}{}({})", size, kind.suffix(), address)
            }
            Instruction::Label(name) => write!(f, "{}:", name),
            Instruction::Measure { qubit, output } => write!(f, "M {}Q, {}b", qubit, output),
            Instruction::SingleGate { gate: GateKind::Phase(phi), qubit } => {
                write!(f, "R {}Q, {}b", qubit, phi)
            }
            Instruction::SingleGate { gate, qubit } => write!(f, "{} {}Q", gate.mnemonic(), qubit),
            Instruction::MultiGate { gate, qubits } => {
                let operands: Vec<String> = qubits.iter().map(|q| format!("{}Q", q)).collect();
                write!(f, "{} {}", gate.mnemonic(), operands.join(", "))
            }
            Instruction::Alu { op, source, target } => {
                write!(f, "{} {}, {}b", op.mnemonic(), source, target)
            }
            Instruction::Compare { source, target } => write!(f, "cmp {}, {}b", source, target),
            Instruction::Jump { condition, label } => write!(f, "{} {}", condition.mnemonic(), label),
        }
    }
}

/// An ordered list of compiled instructions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}
