//! Gate synthesis over arbitrary-width joint states
//!
//! Entanglement groups grow at runtime, so a gate recorded against a group of
//! `width` qubits has to act on a `2^width` joint vector when the group is
//! finally evaluated. Wide gates are first broken into a sequence of
//! [`WiredGate`]s (single-qubit gates, controlled-X, or a fixed matrix on its
//! own wires). [`apply`] streams that sequence over the joint vector by index
//! arithmetic, touching only `2^width` amplitudes per step. The dense lifts
//! ([`embed`], [`controlled_x`], [`operators_for`]) remain for inspection.

use ndarray::Array2;
use num_complex::Complex64;

use super::error::QuantumError;
use super::gate::GateKind;
use super::matrix::{tensor, Matrix};
use super::state;

/// An elementary gate bound to wires of a joint register
#[derive(Debug, Clone, PartialEq)]
pub struct WiredGate {
    pub gate: GateKind,
    pub wires: Vec<usize>,
}

impl WiredGate {
    pub fn new(gate: GateKind, wires: &[usize]) -> Self {
        Self { gate, wires: wires.to_vec() }
    }

    /// The dense `2^width` operator of this gate
    pub fn lift(&self, width: usize) -> Result<Matrix, QuantumError> {
        match (self.gate, self.wires.as_slice()) {
            (GateKind::Cnot, &[control, target]) => controlled_x(control, target, width),
            (g, &[wire]) if g.is_single_qubit() => Ok(embed(&g.matrix(), wire, width)),
            (g, wires) => Ok(embed_operands(&g.matrix(), wires, width)),
        }
    }

    /// Apply to a joint column vector without building the dense operator
    pub fn apply_to(&self, joint: &Matrix) -> Result<Matrix, QuantumError> {
        let operator = self.gate.matrix();
        let dim = joint.rows();
        let width = dim.trailing_zeros() as usize;
        let fits = joint.is_column_vector()
            && dim.is_power_of_two()
            && operator.rows() == 1 << self.wires.len()
            && self.wires.iter().all(|&wire| wire < width);
        if !fits {
            return Err(QuantumError::Shape {
                left_rows: operator.rows(),
                left_cols: operator.cols(),
                right_rows: joint.rows(),
                right_cols: joint.cols(),
            });
        }

        let masks = wire_masks(&self.wires, width);
        let operand_mask = masks.iter().fold(0, |acc, mask| acc | mask);
        let input = joint.data();
        let mut output: Array2<Complex64> = Array2::zeros((dim, 1));
        let mut indices = vec![0usize; operator.rows()];

        for base in (0..dim).filter(|index| index & operand_mask == 0) {
            for (local, index) in indices.iter_mut().enumerate() {
                *index = scatter(base, local, &masks);
            }
            for (row, &target) in indices.iter().enumerate() {
                output[[target, 0]] = indices
                    .iter()
                    .enumerate()
                    .map(|(col, &source)| operator.get(row, col) * input[[source, 0]])
                    .sum();
            }
        }

        Ok(Matrix::from_array(output))
    }
}

/// Bit of each wire in a basis index, first wire most significant
fn wire_masks(wires: &[usize], width: usize) -> Vec<usize> {
    wires.iter().map(|&wire| 1 << (width - 1 - wire)).collect()
}

/// Spread the bits of `local` over `masks` on top of `base`
fn scatter(base: usize, local: usize, masks: &[usize]) -> usize {
    let k = masks.len();
    masks.iter().enumerate().fold(base, |acc, (i, &mask)| {
        if (local >> (k - 1 - i)) & 1 == 1 {
            acc | mask
        } else {
            acc
        }
    })
}

/// `I ⊗ … ⊗ U ⊗ … ⊗ I` with the single-qubit `operator` at `position`
pub fn embed(operator: &Matrix, position: usize, width: usize) -> Matrix {
    let identity = Matrix::identity(2);
    let factors: Vec<&Matrix> = (0..width)
        .map(|wire| if wire == position { operator } else { &identity })
        .collect();
    tensor(factors)
}

/// `P0(control) ⊗ I + P1(control) ⊗ X(target)` padded to `width` wires
pub fn controlled_x(control: usize, target: usize, width: usize) -> Result<Matrix, QuantumError> {
    let identity = Matrix::identity(2);
    let p0 = state::zero().projection();
    let p1 = state::one().projection();
    let x = GateKind::X.matrix();

    let idle: Vec<&Matrix> = (0..width)
        .map(|wire| if wire == control { &p0 } else { &identity })
        .collect();
    let active: Vec<&Matrix> = (0..width)
        .map(|wire| {
            if wire == control {
                &p1
            } else if wire == target {
                &x
            } else {
                &identity
            }
        })
        .collect();

    tensor(idle).add(&tensor(active))
}

/// Toffoli as a sequence of H, T, T† and controlled-X
pub fn toffoli_sequence(first: usize, second: usize, target: usize) -> Vec<WiredGate> {
    use GateKind::{Cnot, TDagger, H, T};

    vec![
        WiredGate::new(H, &[target]),
        WiredGate::new(Cnot, &[second, target]),
        WiredGate::new(TDagger, &[target]),
        WiredGate::new(Cnot, &[first, target]),
        WiredGate::new(T, &[target]),
        WiredGate::new(Cnot, &[second, target]),
        WiredGate::new(TDagger, &[target]),
        WiredGate::new(Cnot, &[first, target]),
        WiredGate::new(T, &[second]),
        WiredGate::new(T, &[target]),
        WiredGate::new(H, &[target]),
        WiredGate::new(Cnot, &[first, second]),
        WiredGate::new(T, &[first]),
        WiredGate::new(TDagger, &[second]),
        WiredGate::new(Cnot, &[first, second]),
    ]
}

/// Lift a multi-qubit `operator` onto `operands` (in operand order) of a
/// `width`-wire register
pub fn embed_operands(operator: &Matrix, operands: &[usize], width: usize) -> Matrix {
    let dim = 1usize << width;
    let masks = wire_masks(operands, width);
    let operand_mask = masks.iter().fold(0, |acc, mask| acc | mask);
    let mut result: Array2<Complex64> = Array2::zeros((dim, dim));

    for base in (0..dim).filter(|index| index & operand_mask == 0) {
        for sub_col in 0..operator.cols() {
            let col = scatter(base, sub_col, &masks);
            for sub_row in 0..operator.rows() {
                result[[scatter(base, sub_row, &masks), col]] = operator.get(sub_row, sub_col);
            }
        }
    }

    Matrix::from_array(result)
}

fn check_arity(gate: GateKind, operands: &[usize]) -> Result<(), QuantumError> {
    if operands.len() != gate.qubit_count() {
        return Err(QuantumError::Arity {
            gate: gate.to_string(),
            expected: gate.qubit_count(),
            got: operands.len(),
        });
    }
    Ok(())
}

fn in_place(operands: &[usize], width: usize) -> bool {
    width == operands.len() && operands.iter().enumerate().all(|(i, &o)| i == o)
}

/// The elementary gates that make up `gate` on `operands`, in application order
pub fn sequence_for(gate: GateKind, operands: &[usize]) -> Result<Vec<WiredGate>, QuantumError> {
    check_arity(gate, operands)?;

    Ok(match (gate, operands) {
        (GateKind::Toffoli, &[a, b, target]) => toffoli_sequence(a, b, target),
        (GateKind::Swap, &[p, q]) => vec![
            WiredGate::new(GateKind::Cnot, &[p, q]),
            WiredGate::new(GateKind::Cnot, &[q, p]),
            WiredGate::new(GateKind::Cnot, &[p, q]),
        ],
        (GateKind::ControlledSwap, &[control, p, q]) => {
            let mut gates = vec![WiredGate::new(GateKind::Cnot, &[q, p])];
            gates.extend(toffoli_sequence(control, p, q));
            gates.push(WiredGate::new(GateKind::Cnot, &[q, p]));
            gates
        }
        (g, wires) => vec![WiredGate::new(g, wires)],
    })
}

/// The dense operators that apply `gate` to `operands` of a `width`-qubit
/// joint state, in application order
pub fn operators_for(
    gate: GateKind,
    operands: &[usize],
    width: usize,
) -> Result<Vec<Matrix>, QuantumError> {
    check_arity(gate, operands)?;
    if in_place(operands, width) {
        return Ok(vec![gate.matrix()]);
    }

    sequence_for(gate, operands)?
        .iter()
        .map(|wired| wired.lift(width))
        .collect()
}

/// Apply `gate` on `operands` to a joint column vector
pub fn apply(
    gate: GateKind,
    operands: &[usize],
    joint: &Matrix,
) -> Result<Matrix, QuantumError> {
    check_arity(gate, operands)?;
    let width = joint.rows().trailing_zeros() as usize;
    if in_place(operands, width) {
        return gate.matrix().dot(joint);
    }

    sequence_for(gate, operands)?
        .iter()
        .try_fold(joint.clone(), |current, wired| wired.apply_to(&current))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(ops: &[Matrix]) -> Matrix {
        let dim = ops[0].rows();
        ops.iter()
            .fold(Matrix::identity(dim), |acc, op| op.dot(&acc).unwrap())
    }

    fn lift_all(gates: &[WiredGate], width: usize) -> Vec<Matrix> {
        gates.iter().map(|g| g.lift(width).unwrap()).collect()
    }

    #[test]
    fn test_projector_cnot_matches_fixed_matrix() {
        let built = controlled_x(0, 1, 2).unwrap();
        assert!(built.approx_eq(&GateKind::Cnot.matrix(), 1e-12));
    }

    #[test]
    fn test_toffoli_sequence_matches_fixed_matrix() {
        let ops = lift_all(&toffoli_sequence(0, 1, 2), 3);
        assert_eq!(ops.len(), 15);
        assert!(compose(&ops).approx_eq(&GateKind::Toffoli.matrix(), 1e-10));
    }

    #[test]
    fn test_swap_and_fredkin_sequences_match_fixed_matrices() {
        let swap = lift_all(&sequence_for(GateKind::Swap, &[0, 1]).unwrap(), 2);
        assert_eq!(swap.len(), 3);
        assert!(compose(&swap).approx_eq(&GateKind::Swap.matrix(), 1e-12));

        let fredkin = lift_all(&sequence_for(GateKind::ControlledSwap, &[0, 1, 2]).unwrap(), 3);
        assert_eq!(fredkin.len(), 17);
        assert!(compose(&fredkin).approx_eq(&GateKind::ControlledSwap.matrix(), 1e-10));
    }

    #[test]
    fn test_toffoli_with_permuted_wires() {
        // controls on wires 2 and 0, target on wire 1
        let joint = state::joint([&state::one(), &state::zero(), &state::one()]);
        let out = apply(GateKind::Toffoli, &[2, 0, 1], &joint).unwrap();
        let expected = state::joint([&state::one(), &state::one(), &state::one()]);
        assert!(out.approx_eq(&expected, 1e-10));
    }

    #[test]
    fn test_embed_operands_agrees_with_synthesis() {
        for operands in [[0usize, 2], [2, 0], [1, 2]] {
            let by_embedding = embed_operands(&GateKind::Cnot.matrix(), &operands, 3);
            let by_projectors = controlled_x(operands[0], operands[1], 3).unwrap();
            assert!(by_embedding.approx_eq(&by_projectors, 1e-12));
        }
    }

    #[test]
    fn test_streamed_gates_agree_with_dense_lifts() {
        let joint = state::joint([&state::plus(), &state::one(), &state::minus(), &state::plus()]);
        for (gate, operands) in [
            (GateKind::Toffoli, vec![3, 0, 2]),
            (GateKind::ControlledSwap, vec![1, 3, 0]),
            (GateKind::SqrtSwap, vec![2, 1]),
            (GateKind::Phase(0.3), vec![1]),
        ] {
            let dense = operators_for(gate, &operands, 4)
                .unwrap()
                .iter()
                .fold(joint.clone(), |acc, op| op.dot(&acc).unwrap());
            let streamed = apply(gate, &operands, &joint).unwrap();
            assert!(streamed.approx_eq(&dense, 1e-10), "{} on {:?}", gate, operands);
        }
    }

    #[test]
    fn test_wide_register_stays_linear_in_state_size() {
        // 2^16 amplitudes; a dense lift would need 2^32 entries per operator
        let width = 16;
        let mut bits = vec![false; width];
        bits[0] = true;
        bits[7] = true;
        let locals: Vec<Matrix> = bits.iter().map(|&b| state::from_bit(b)).collect();
        let joint = state::joint(&locals);

        let out = apply(GateKind::Toffoli, &[0, 7, 15], &joint).unwrap();
        bits[15] = true;
        let index = bits.iter().fold(0, |acc, &b| (acc << 1) | b as usize);
        assert!(out.approx_eq(&state::basis(1 << width, index), 1e-10));
    }

    #[test]
    fn test_wired_gate_rejects_foreign_shapes() {
        let joint = state::joint([&state::zero(), &state::zero()]);
        assert!(matches!(
            WiredGate::new(GateKind::Cnot, &[0, 2]).apply_to(&joint),
            Err(QuantumError::Shape { .. })
        ));
        assert!(matches!(
            WiredGate::new(GateKind::X, &[0]).apply_to(&GateKind::Cnot.matrix()),
            Err(QuantumError::Shape { .. })
        ));
    }

    #[test]
    fn test_single_qubit_embedding_flips_only_its_wire() {
        let joint = state::joint([&state::zero(), &state::zero(), &state::zero()]);
        let out = apply(GateKind::X, &[1], &joint).unwrap();
        assert!(out.approx_eq(&state::basis(8, 2), 1e-12));
    }

    #[test]
    fn test_operators_for_rejects_wrong_arity() {
        assert!(matches!(
            operators_for(GateKind::Cnot, &[0], 2),
            Err(QuantumError::Arity { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            apply(GateKind::Toffoli, &[0, 1], &state::basis(4, 0)),
            Err(QuantumError::Arity { expected: 3, got: 2, .. })
        ));
    }
}
