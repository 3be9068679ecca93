//! QASM compiler
//!
//! Each instruction kind owns one line pattern. Lines are matched against the
//! grammar table in order and the first rule that produces an instruction
//! wins. A line no rule accepts aborts compilation with
//! [`QasmError::Syntax`] naming the line as written.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use super::instruction::{AllocKind, AluOp, Instruction, JumpCondition, Operand, Program};
use super::QasmError;
use crate::quantum::GateKind;

/// One grammar rule: a full-line pattern and the constructor for its captures.
///
/// Constructors return `None` when a captured number does not fit its type,
/// which sends the line on to the next rule.
struct Rule {
    name: &'static str,
    pattern: Regex,
    build: fn(&Captures<'_>) -> Option<Instruction>,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: fn(&Captures<'_>) -> Option<Instruction>) -> Self {
        Rule {
            name,
            // Patterns are literals in this file
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("bad {} pattern: {}", name, e)),
            build,
        }
    }

    fn parse(&self, line: &str) -> Option<Instruction> {
        let captures = self.pattern.captures(line)?;
        (self.build)(&captures)
    }
}

lazy_static! {
    static ref GRAMMAR: Vec<Rule> = vec![
        Rule::new("alloc", r"^alloc ([0-9]+)(?:(Q|b)\(([0-9]+)\))?$", build_alloc),
        Rule::new("measure", r"^M ([0-9]+)Q,\s*([0-9]+)b$", build_measure),
        Rule::new("label", r"^(\.[a-zA-Z_0-9]+):$", build_label),
        Rule::new("gate", r"^(X|Y|Z|H|T|TDG|SQRTX|ZX) ([0-9]+)Q$", build_single_gate),
        Rule::new("rotation", r"^R ([0-9]+)Q,\s*(-?[0-9.]+)b$", build_rotation),
        Rule::new("gate2", r"^(CNOT|SWAP|SQRTSWAP) \s*([0-9]+)Q,\s*([0-9]+)Q$", build_multi_gate),
        Rule::new(
            "gate3",
            r"^(CCNOT|CSWAP) \s*([0-9]+)Q,\s*([0-9]+)Q,\s*([0-9]+)Q$",
            build_multi_gate,
        ),
        Rule::new("alu", r"^(add|sub|mul|div|mov) (-?[0-9]+b?),\s*([0-9]+)b$", build_alu),
        Rule::new("cmp", r"^cmp (-?[0-9]+b?),\s*([0-9]+)b$", build_compare),
        Rule::new("jump", r"^(jmp|jgt|jlt|je|jne|jle|jge) (\.[a-zA-Z_0-9]+)$", build_jump),
    ];
}

fn number<T: std::str::FromStr>(captures: &Captures<'_>, group: usize) -> Option<T> {
    captures.get(group)?.as_str().parse().ok()
}

fn build_alloc(c: &Captures<'_>) -> Option<Instruction> {
    let size = number(c, 1)?;
    let region = match c.get(2).map(|m| m.as_str()) {
        None => None,
        Some("Q") => Some((AllocKind::Qubits, number(c, 3)?)),
        Some(_) => Some((AllocKind::Integers, number(c, 3)?)),
    };
    Some(Instruction::Alloc { size, region })
}

fn build_measure(c: &Captures<'_>) -> Option<Instruction> {
    Some(Instruction::Measure {
        qubit: number(c, 1)?,
        output: number(c, 2)?,
    })
}

fn build_label(c: &Captures<'_>) -> Option<Instruction> {
    Some(Instruction::Label(c.get(1)?.as_str().to_string()))
}

fn build_single_gate(c: &Captures<'_>) -> Option<Instruction> {
    Some(Instruction::SingleGate {
        gate: GateKind::from_mnemonic(c.get(1)?.as_str())?,
        qubit: number(c, 2)?,
    })
}

fn build_rotation(c: &Captures<'_>) -> Option<Instruction> {
    let phi: f64 = number(c, 2)?;
    if !phi.is_finite() {
        return None;
    }
    Some(Instruction::SingleGate {
        gate: GateKind::Phase(phi),
        qubit: number(c, 1)?,
    })
}

fn build_multi_gate(c: &Captures<'_>) -> Option<Instruction> {
    let gate = GateKind::from_mnemonic(c.get(1)?.as_str())?;
    let qubits = (2..c.len())
        .map(|group| number(c, group))
        .collect::<Option<Vec<usize>>>()?;
    Some(Instruction::MultiGate { gate, qubits })
}

fn operand(text: &str) -> Option<Operand> {
    match text.strip_suffix('b') {
        Some(address) => address.parse().ok().map(Operand::Cell),
        None => text.parse().ok().map(Operand::Literal),
    }
}

fn build_alu(c: &Captures<'_>) -> Option<Instruction> {
    Some(Instruction::Alu {
        op: AluOp::from_mnemonic(c.get(1)?.as_str())?,
        source: operand(c.get(2)?.as_str())?,
        target: number(c, 3)?,
    })
}

fn build_compare(c: &Captures<'_>) -> Option<Instruction> {
    Some(Instruction::Compare {
        source: operand(c.get(1)?.as_str())?,
        target: number(c, 2)?,
    })
}

fn build_jump(c: &Captures<'_>) -> Option<Instruction> {
    Some(Instruction::Jump {
        condition: JumpCondition::from_mnemonic(c.get(1)?.as_str())?,
        label: c.get(2)?.as_str().to_string(),
    })
}

/// Parse one non-blank, comment-free line
fn parse_line(line: &str) -> Option<Instruction> {
    GRAMMAR.iter().find_map(|rule| {
        let instruction = rule.parse(line)?;
        tracing::trace!(rule = rule.name, %instruction, "matched");
        Some(instruction)
    })
}

/// Compile newline-delimited QASM source
pub fn compile(source: &str) -> Result<Program, QasmError> {
    compile_lines(source.lines())
}

/// Compile QASM given as separate lines
pub fn compile_lines<I, S>(lines: I) -> Result<Program, QasmError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut instructions = Vec::new();

    for raw in lines {
        let raw = raw.as_ref();
        let code = raw.split('#').next().unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }

        match parse_line(code) {
            Some(instruction) => instructions.push(instruction),
            None => return Err(QasmError::Syntax(raw.to_string())),
        }
    }

    debug!(instructions = instructions.len(), "compiled qasm program");
    Ok(Program::new(instructions))
}
