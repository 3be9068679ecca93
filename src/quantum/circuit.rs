//! Circuits with lazily evaluated entanglement
//!
//! A [`Circuit`] owns its qubits and a set of entanglement groups. A gate on
//! a single free qubit is applied straight to its local 2-vector. A gate that
//! touches several qubits does not touch any amplitudes: it groups the qubits
//! (merging existing groups where needed) and appends a [`StepFunction`] to
//! the group's pending program. The program is only evaluated, over the joint
//! state of the whole group, when one of its members is measured.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

use super::error::QuantumError;
use super::gate::GateKind;
use super::matrix::Matrix;
use super::measurement::collapse;
use super::state;
use super::synthesis;

static NEXT_CIRCUIT: AtomicUsize = AtomicUsize::new(0);

/// Handle to a qubit owned by a [`Circuit`]
///
/// The handle remembers which circuit issued it. A clone of a circuit accepts
/// the handles of the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QubitId {
    circuit: usize,
    index: usize,
}

impl QubitId {
    /// Position of the qubit in its circuit, in creation order
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a live entanglement group of a [`Circuit`]
///
/// Slots of measured or absorbed groups are reused, so a handle is only
/// meaningful until its group is measured or merged away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

#[derive(Debug, Clone)]
enum QubitState {
    /// Separable, with a valid normalized local vector
    Free(Matrix),
    /// Part of an entanglement group; the local vector is not meaningful
    Grouped(GroupId),
}

/// One pending gate application inside an entanglement group
#[derive(Debug, Clone, PartialEq)]
pub struct StepFunction {
    pub gate: GateKind,
    /// Positions within the owning group's member list
    pub operands: Vec<usize>,
}

/// A set of entangled qubits and the gates recorded against them
#[derive(Debug, Clone)]
pub struct EntanglementStep {
    members: Vec<QubitId>,
    /// Local vectors of the members at the moment they joined
    initial: Vec<Matrix>,
    steps: Vec<StepFunction>,
}

impl EntanglementStep {
    pub fn members(&self) -> &[QubitId] {
        &self.members
    }

    pub fn steps(&self) -> &[StepFunction] {
        &self.steps
    }

    pub fn width(&self) -> usize {
        self.members.len()
    }

    fn position(&self, qubit: QubitId) -> Option<usize> {
        self.members.iter().position(|&m| m == qubit)
    }

    /// Evaluate the pending program over the joint state of all members
    fn replay(&self) -> Result<Matrix, QuantumError> {
        let mut joint = state::joint(&self.initial);
        for step in &self.steps {
            joint = synthesis::apply(step.gate, &step.operands, &joint)?;
        }
        Ok(joint)
    }

    /// Append another group, shifting its operand indices past our members
    fn absorb(&mut self, other: EntanglementStep) {
        let offset = self.members.len();
        self.members.extend(other.members);
        self.initial.extend(other.initial);
        self.steps.extend(other.steps.into_iter().map(|mut step| {
            for operand in &mut step.operands {
                *operand += offset;
            }
            step
        }));
    }
}

/// A simulated register of qubits with deferred entanglement
#[derive(Debug, Clone)]
pub struct Circuit {
    id: usize,
    qubits: Vec<QubitState>,
    groups: Vec<Option<EntanglementStep>>,
    /// Empty slots of `groups`, reused before the arena grows
    vacant: Vec<usize>,
    rng: StdRng,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Create an empty circuit drawing randomness from system entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty circuit with a reproducible random source
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Circuit {
            id: NEXT_CIRCUIT.fetch_add(1, Ordering::Relaxed),
            qubits: Vec::new(),
            groups: Vec::new(),
            vacant: Vec::new(),
            rng,
        }
    }

    /// Add a qubit in the |0⟩ state
    pub fn create_qubit(&mut self) -> QubitId {
        self.push_qubit(state::zero())
    }

    /// Add `count` qubits in the |0⟩ state
    pub fn create_qubits(&mut self, count: usize) -> Vec<QubitId> {
        (0..count).map(|_| self.create_qubit()).collect()
    }

    /// Add a qubit in the given normalized `2 x 1` state
    pub fn create_qubit_in(&mut self, initial: Matrix) -> Result<QubitId, QuantumError> {
        if initial.shape() != (2, 1) {
            return Err(QuantumError::Shape {
                left_rows: 2,
                left_cols: 1,
                right_rows: initial.rows(),
                right_cols: initial.cols(),
            });
        }
        if !state::is_normalized(&initial) {
            let total = initial.weights().iter().sum();
            return Err(QuantumError::Normalization(total));
        }
        Ok(self.push_qubit(initial))
    }

    fn push_qubit(&mut self, initial: Matrix) -> QubitId {
        self.qubits.push(QubitState::Free(initial));
        QubitId {
            circuit: self.id,
            index: self.qubits.len() - 1,
        }
    }

    pub fn qubit_count(&self) -> usize {
        self.qubits.len()
    }

    /// State slot of `qubit`, if this circuit issued it
    fn slot(&self, qubit: QubitId) -> Option<&QubitState> {
        if qubit.circuit != self.id {
            return None;
        }
        self.qubits.get(qubit.index)
    }

    /// Local state of a free qubit; `None` while it is entangled
    pub fn local_state(&self, qubit: QubitId) -> Option<&Matrix> {
        match self.slot(qubit)? {
            QubitState::Free(local) => Some(local),
            QubitState::Grouped(_) => None,
        }
    }

    pub fn group_of(&self, qubit: QubitId) -> Option<GroupId> {
        match self.slot(qubit)? {
            QubitState::Grouped(group) => Some(*group),
            QubitState::Free(_) => None,
        }
    }

    pub fn is_entangled(&self, qubit: QubitId) -> bool {
        self.group_of(qubit).is_some()
    }

    /// Members of a live group, in tensor order
    pub fn group_members(&self, group: GroupId) -> Option<&[QubitId]> {
        self.group(group).map(|g| g.members())
    }

    /// Gates recorded against a live group and not yet evaluated
    pub fn pending_steps(&self, group: GroupId) -> Option<&[StepFunction]> {
        self.group(group).map(|g| g.steps())
    }

    pub fn live_group_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_some()).count()
    }

    fn group(&self, group: GroupId) -> Option<&EntanglementStep> {
        self.groups.get(group.0).and_then(|g| g.as_ref())
    }

    fn check_operands(&self, gate: GateKind, qubits: &[QubitId]) -> Result<(), QuantumError> {
        if qubits.len() != gate.qubit_count() {
            return Err(QuantumError::Arity {
                gate: gate.to_string(),
                expected: gate.qubit_count(),
                got: qubits.len(),
            });
        }
        for (i, qubit) in qubits.iter().enumerate() {
            if self.slot(*qubit).is_none() {
                return Err(QuantumError::UnknownQubit(qubit.index));
            }
            if qubits[..i].contains(qubit) {
                return Err(QuantumError::DuplicateQubit(qubit.index));
            }
        }
        Ok(())
    }

    /// Apply `gate` to `qubits`, in operand order.
    ///
    /// A single free qubit is updated immediately. Anything else is recorded
    /// on the entanglement group that covers all of `qubits`.
    pub fn apply_gate(&mut self, gate: GateKind, qubits: &[QubitId]) -> Result<(), QuantumError> {
        self.check_operands(gate, qubits)?;

        let mut touched: Vec<GroupId> = Vec::new();
        for &qubit in qubits {
            if let Some(group) = self.group_of(qubit) {
                if !touched.contains(&group) {
                    touched.push(group);
                }
            }
        }

        if touched.is_empty() && qubits.len() == 1 {
            let qubit = qubits[0];
            if let QubitState::Free(local) = &self.qubits[qubit.index] {
                let updated = gate.matrix().dot(local)?;
                self.qubits[qubit.index] = QubitState::Free(updated);
            }
            return Ok(());
        }

        let target = match touched.split_first() {
            None => self.open_group(),
            Some((&receiver, absorbed)) => {
                for &group in absorbed {
                    self.merge(receiver, group);
                }
                receiver
            }
        };

        let mut operands = Vec::with_capacity(qubits.len());
        for &qubit in qubits {
            operands.push(self.enlist(target, qubit));
        }

        trace!(%gate, ?operands, group = target.0, "recording entangled gate");
        if let Some(group) = self.groups[target.0].as_mut() {
            group.steps.push(StepFunction { gate, operands });
        }
        Ok(())
    }

    fn open_group(&mut self) -> GroupId {
        let group = Some(EntanglementStep {
            members: Vec::new(),
            initial: Vec::new(),
            steps: Vec::new(),
        });
        match self.vacant.pop() {
            Some(slot) => {
                self.groups[slot] = group;
                GroupId(slot)
            }
            None => {
                self.groups.push(group);
                GroupId(self.groups.len() - 1)
            }
        }
    }

    /// Empty a group's slot and make it available to `open_group`
    fn close_group(&mut self, group: GroupId) -> Option<EntanglementStep> {
        let entry = self.groups.get_mut(group.0)?.take()?;
        self.vacant.push(group.0);
        Some(entry)
    }

    /// Fold `absorbed` into `receiver` and invalidate the absorbed handle
    fn merge(&mut self, receiver: GroupId, absorbed: GroupId) {
        let Some(other) = self.close_group(absorbed) else {
            return;
        };
        trace!(receiver = receiver.0, absorbed = absorbed.0, "merging entanglement groups");
        for &member in &other.members {
            self.qubits[member.index] = QubitState::Grouped(receiver);
        }
        if let Some(group) = self.groups[receiver.0].as_mut() {
            group.absorb(other);
        }
    }

    /// Position of `qubit` in `group`, adding it as a new member if it is free
    fn enlist(&mut self, group: GroupId, qubit: QubitId) -> usize {
        let Some(entry) = self.groups[group.0].as_mut() else {
            return 0;
        };
        if let Some(position) = entry.position(qubit) {
            return position;
        }
        let local = match std::mem::replace(&mut self.qubits[qubit.index], QubitState::Grouped(group)) {
            QubitState::Free(local) => local,
            QubitState::Grouped(_) => state::zero(),
        };
        entry.members.push(qubit);
        entry.initial.push(local);
        entry.members.len() - 1
    }

    /// Measure `qubit` in the computational basis.
    ///
    /// Measuring any member of an entanglement group evaluates the group,
    /// collapses the joint state, and leaves every member free in the basis
    /// state it collapsed to.
    pub fn measure(&mut self, qubit: QubitId) -> Result<bool, QuantumError> {
        if self.slot(qubit).is_none() {
            return Err(QuantumError::UnknownQubit(qubit.index));
        }

        match &self.qubits[qubit.index] {
            QubitState::Free(local) => {
                let outcome = collapse(local, &mut self.rng)? == 1;
                self.qubits[qubit.index] = QubitState::Free(state::from_bit(outcome));
                trace!(qubit = qubit.index, outcome, "collapsed free qubit");
                Ok(outcome)
            }
            QubitState::Grouped(group) => {
                let group = *group;
                let joint = self
                    .group(group)
                    .ok_or(QuantumError::UnknownQubit(qubit.index))?
                    .replay()?;
                let index = collapse(&joint, &mut self.rng)?;
                let entry = self
                    .close_group(group)
                    .ok_or(QuantumError::UnknownQubit(qubit.index))?;
                let bits = state::index_bits(index, entry.width());
                trace!(
                    group = group.0,
                    width = entry.width(),
                    outcome = %state::bit_string(&bits),
                    "collapsed entanglement group"
                );

                let mut result = false;
                for (member, bit) in entry.members.iter().zip(bits) {
                    self.qubits[member.index] = QubitState::Free(state::from_bit(bit));
                    if *member == qubit {
                        result = bit;
                    }
                }
                Ok(result)
            }
        }
    }

    /// Measure `qubits` in order and concatenate the outcomes, first qubit
    /// most significant
    pub fn measure_many(&mut self, qubits: &[QubitId]) -> Result<String, QuantumError> {
        let mut bits = Vec::with_capacity(qubits.len());
        for &qubit in qubits {
            bits.push(self.measure(qubit)?);
        }
        Ok(state::bit_string(&bits))
    }

    pub fn x(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::X, &[qubit])
    }

    pub fn y(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::Y, &[qubit])
    }

    pub fn z(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::Z, &[qubit])
    }

    pub fn h(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::H, &[qubit])
    }

    pub fn t(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::T, &[qubit])
    }

    pub fn sqrt_x(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::SqrtX, &[qubit])
    }

    pub fn zx(&mut self, qubit: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::ZX, &[qubit])
    }

    pub fn phase(&mut self, qubit: QubitId, phi: f64) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::Phase(phi), &[qubit])
    }

    pub fn cnot(&mut self, control: QubitId, target: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::Cnot, &[control, target])
    }

    pub fn toffoli(&mut self, first: QubitId, second: QubitId, target: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::Toffoli, &[first, second, target])
    }

    pub fn swap(&mut self, a: QubitId, b: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::Swap, &[a, b])
    }

    pub fn sqrt_swap(&mut self, a: QubitId, b: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::SqrtSwap, &[a, b])
    }

    pub fn cswap(&mut self, control: QubitId, a: QubitId, b: QubitId) -> Result<(), QuantumError> {
        self.apply_gate(GateKind::ControlledSwap, &[control, a, b])
    }
}
