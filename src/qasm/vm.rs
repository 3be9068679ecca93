//! QASM virtual machine
//!
//! A fetch-execute loop over a compiled [`Program`]. Setup sizes memory from
//! the last untyped `alloc` and records every label, then instructions run
//! until the program counter walks off the end. A taken jump sets the counter
//! to the label's index and the usual increment moves past it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use super::environment::{Environment, Registers};
use super::instruction::{AluOp, Instruction, JumpCondition, Operand, Program};
use super::QasmError;
use crate::quantum::{GateKind, QubitId};

/// Runs programs, optionally watching a cancellation flag
#[derive(Debug, Clone, Default)]
pub struct Executor {
    cancel: Option<Arc<AtomicBool>>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop with [`QasmError::Cancelled`] once `flag` is raised
    pub fn with_cancel_flag(flag: Arc<AtomicBool>) -> Self {
        Executor { cancel: Some(flag) }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Execute `program` in a fresh environment whose circuit draws from `rng`
    pub fn run(&self, program: &Program, rng: StdRng) -> Result<Environment, QasmError> {
        let mut env = setup(program, rng);
        debug!(
            instructions = program.len(),
            memory = env.size(),
            "executing qasm program"
        );

        while let Some(instruction) = program.get(env.pc) {
            if self.cancelled() {
                return Err(QasmError::Cancelled(env.pc));
            }
            trace!(pc = env.pc, %instruction, "dispatch");
            step(&mut env, instruction)?;
            env.pc += 1;
        }

        debug!(
            qubits = env.circuit().qubit_count(),
            live_groups = env.circuit().live_group_count(),
            "qasm program finished"
        );
        Ok(env)
    }
}

fn setup(program: &Program, rng: StdRng) -> Environment {
    let size = program
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::Alloc { size, region: None } => Some(*size),
            _ => None,
        })
        .last()
        .unwrap_or(0);

    let mut env = Environment::new(size, rng);
    for (index, instruction) in program.iter().enumerate() {
        if let Instruction::Label(name) = instruction {
            env.define_label(name, index);
        }
    }
    env
}

fn step(env: &mut Environment, instruction: &Instruction) -> Result<(), QasmError> {
    match instruction {
        Instruction::Alloc { region: None, .. } | Instruction::Label(_) => Ok(()),
        Instruction::Alloc { size, region: Some((kind, address)) } => env.overwrite(*address, *size, *kind),
        Instruction::Measure { qubit, output } => {
            let qubit = env.qubit_at(*qubit)?;
            let bit = env.circuit_mut().measure(qubit)?;
            env.store(*output, i64::from(bit))
        }
        Instruction::SingleGate { gate, qubit } => apply(env, *gate, std::slice::from_ref(qubit)),
        Instruction::MultiGate { gate, qubits } => apply(env, *gate, qubits),
        Instruction::Alu { op, source, target } => alu(env, *op, *source, *target),
        Instruction::Compare { source, target } => {
            let a = env.read_operand(*source)?;
            let b = env.integer_at(*target)?;
            env.registers = Some(Registers { a, b });
            Ok(())
        }
        Instruction::Jump { condition, label } => jump(env, *condition, label),
    }
}

fn apply(env: &mut Environment, gate: GateKind, addresses: &[usize]) -> Result<(), QasmError> {
    let qubits = addresses
        .iter()
        .map(|&address| env.qubit_at(address))
        .collect::<Result<Vec<QubitId>, _>>()?;
    env.circuit_mut().apply_gate(gate, &qubits)?;
    Ok(())
}

fn alu(env: &mut Environment, op: AluOp, source: Operand, target: usize) -> Result<(), QasmError> {
    let value = env.read_operand(source)?;
    if op == AluOp::Mov {
        return env.store(target, value);
    }

    let current = env.integer_at(target)?;
    let result = match op {
        AluOp::Add => current.checked_add(value),
        AluOp::Sub => current.checked_sub(value),
        AluOp::Mul => current.checked_mul(value),
        AluOp::Div if value == 0 => return Err(QasmError::DivisionByZero(target)),
        AluOp::Div => current.checked_div(value),
        AluOp::Mov => Some(value),
    };
    let result = result.ok_or(QasmError::Overflow(target))?;
    env.set_integer(target, result)
}

fn jump(env: &mut Environment, condition: JumpCondition, label: &str) -> Result<(), QasmError> {
    let taken = match condition {
        JumpCondition::Always => true,
        _ => {
            let registers = env
                .registers
                .ok_or_else(|| QasmError::NoComparison(label.to_string()))?;
            condition.holds(registers.a, registers.b)
        }
    };

    if taken {
        let target = env
            .label(label)
            .ok_or_else(|| QasmError::UnknownLabel(label.to_string()))?;
        trace!(label, target, "jump taken");
        env.pc = target;
    }
    Ok(())
}

/// Execute `program` with a circuit seeded from system entropy
pub fn execute(program: &Program) -> Result<Environment, QasmError> {
    Executor::new().run(program, StdRng::from_entropy())
}

/// Execute `program` reproducibly
pub fn execute_seeded(program: &Program, seed: u64) -> Result<Environment, QasmError> {
    Executor::new().run(program, StdRng::seed_from_u64(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qasm::compile;

    fn run(source: &str) -> Result<Vec<Option<i64>>, QasmError> {
        let program = compile(source)?;
        execute_seeded(&program, 11).map(|env| env.snapshot())
    }

    #[test]
    fn test_empty_program() {
        let env = execute_seeded(&Program::default(), 0).unwrap();
        assert_eq!(env.size(), 0);
        assert!(env.snapshot().is_empty());
    }

    #[test]
    fn test_last_alloc_sizes_memory() {
        assert_eq!(run("alloc 5\nalloc 2\nalloc 2b(0)"), Ok(vec![Some(0), Some(0)]));
    }

    #[test]
    fn test_arithmetic() {
        let source = "alloc 3\nalloc 3b(0)\nmov 7, 0b\nadd 5, 0b\nmov 0b, 1b\nsub 20, 1b\nmul -3, 1b\ndiv 4, 1b\nmov 2, 2b";
        assert_eq!(run(source), Ok(vec![Some(12), Some(6), Some(2)]));
    }

    #[test]
    fn test_mov_into_empty_cell() {
        assert_eq!(run("alloc 2\nmov 4, 1b"), Ok(vec![None, Some(4)]));
    }

    #[test]
    fn test_division_errors() {
        assert_eq!(
            run("alloc 1\nalloc 1b(0)\ndiv 0, 0b"),
            Err(QasmError::DivisionByZero(0))
        );
        assert_eq!(
            run("alloc 1\nmov -9223372036854775808, 0b\ndiv -1, 0b"),
            Err(QasmError::Overflow(0))
        );
    }

    #[test]
    fn test_countdown_loop() {
        let source = "alloc 2\nalloc 2b(0)\nmov 10, 0b\n.loop:\nsub 1, 0b\nadd 1, 1b\ncmp 0, 0b\njne .loop";
        assert_eq!(run(source), Ok(vec![Some(0), Some(10)]));
    }

    #[test]
    fn test_jump_lands_after_label() {
        let source = "alloc 1\nalloc 1b(0)\njmp .skip\nadd 100, 0b\n.skip:\nadd 1, 0b";
        assert_eq!(run(source), Ok(vec![Some(1)]));
    }

    #[test]
    fn test_jump_errors() {
        assert_eq!(
            run("alloc 1\njgt .x\n.x:"),
            Err(QasmError::NoComparison(".x".to_string()))
        );
        assert_eq!(run("jmp .missing"), Err(QasmError::UnknownLabel(".missing".to_string())));
        // An untaken jump never resolves its label
        assert_eq!(run("alloc 1\nalloc 1b(0)\ncmp 1, 0b\nje .missing"), Ok(vec![Some(0)]));
    }

    #[test]
    fn test_later_duplicate_label_wins() {
        let source = "alloc 1\nalloc 1b(0)\ncmp 0, 0b\nje .l\n.l:\nadd 1, 0b\n.l:\nadd 10, 0b";
        assert_eq!(run(source), Ok(vec![Some(10)]));
    }

    #[test]
    fn test_address_errors() {
        assert_eq!(
            run("alloc 1\nX 4Q"),
            Err(QasmError::AddressOutOfRange { address: 4, size: 1 })
        );
        assert!(matches!(run("alloc 1\nalloc 1b(0)\nX 0Q"), Err(QasmError::WrongCell { .. })));
        assert!(matches!(run("alloc 1\nalloc 1Q(0)\nadd 1, 0b"), Err(QasmError::WrongCell { .. })));
        assert!(matches!(run("alloc 2\nalloc 1Q(0)\nM 0Q, 0b"), Err(QasmError::WrongCell { .. })));
    }

    #[test]
    fn test_quantum_errors_propagate() {
        assert!(matches!(
            run("alloc 1\nalloc 1Q(0)\nCNOT 0Q, 0Q"),
            Err(QasmError::Quantum(_))
        ));
    }

    #[test]
    fn test_measure_writes_bits() {
        let source = "alloc 4\nalloc 2Q(0)\nX 1Q\nCNOT 1Q, 0Q\nM 0Q, 2b\nM 1Q, 3b";
        assert_eq!(run(source), Ok(vec![None, None, Some(1), Some(1)]));
    }

    #[test]
    fn test_cancel_flag_stops_execution() {
        let program = compile(".l:\njmp .l").unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let result = Executor::with_cancel_flag(flag).run(&program, StdRng::seed_from_u64(0));
        assert_eq!(result.map(|env| env.pc), Err(QasmError::Cancelled(0)));
    }
}
