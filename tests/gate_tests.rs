use num_complex::Complex64;
use std::f64::consts::PI;

use quasm::quantum::gate::constants::{I, ONE, ZERO};
use quasm::quantum::synthesis;
use quasm::quantum::{state, GateKind, Matrix};

const EPSILON: f64 = 1e-10;

/// Helper function for comparing complex numbers with tolerance
fn complex_approx_eq(a: Complex64, b: Complex64, epsilon: f64) -> bool {
    (a - b).norm() < epsilon
}

/// Joint basis vector, first bit most significant
fn basis(bits: &[bool]) -> Matrix {
    let locals: Vec<Matrix> = bits.iter().map(|&b| state::from_bit(b)).collect();
    state::joint(&locals)
}

#[test]
fn test_pauli_matrices() {
    let y = GateKind::Y.matrix();
    assert!(complex_approx_eq(y.get(0, 1), -I, EPSILON));
    assert!(complex_approx_eq(y.get(1, 0), I, EPSILON));

    let z = GateKind::Z.matrix();
    assert!(complex_approx_eq(z.get(0, 0), ONE, EPSILON));
    assert!(complex_approx_eq(z.get(1, 1), -ONE, EPSILON));

    let xyz = GateKind::X.matrix().dot(&GateKind::Y.matrix()).unwrap();
    assert!(xyz.approx_eq(&GateKind::Z.matrix().scale(I), EPSILON));
}

#[test]
fn test_hadamard_maps_zero_to_plus() {
    let plus = GateKind::H.matrix().dot(&state::zero()).unwrap();
    assert!(plus.approx_eq(&state::plus(), EPSILON));

    let minus = GateKind::H.matrix().dot(&state::one()).unwrap();
    assert!(minus.approx_eq(&state::minus(), EPSILON));
}

#[test]
fn test_phase_rotation() {
    let r = GateKind::Phase(PI).matrix();
    assert!(r.approx_eq(&GateKind::Z.matrix(), EPSILON));

    let r = GateKind::Phase(PI / 4.0).matrix();
    assert!(r.approx_eq(&GateKind::T.matrix(), EPSILON));

    let undo = GateKind::T.matrix().dot(&GateKind::TDagger.matrix()).unwrap();
    assert!(undo.approx_eq(&Matrix::identity(2), EPSILON));
    assert!(complex_approx_eq(GateKind::Phase(0.0).matrix().get(0, 1), ZERO, EPSILON));
}

#[test]
fn test_cnot_on_every_basis_state() {
    let cnot = GateKind::Cnot.matrix();
    for (input, output) in [
        ([false, false], [false, false]),
        ([false, true], [false, true]),
        ([true, false], [true, true]),
        ([true, true], [true, false]),
    ] {
        let result = cnot.dot(&basis(&input)).unwrap();
        assert!(result.approx_eq(&basis(&output), EPSILON), "{:?}", input);
    }
}

#[test]
fn test_synthesised_toffoli_on_every_basis_state() {
    for index in 0..8 {
        let bits = state::index_bits(index, 3);
        let result = synthesis::apply(GateKind::Toffoli, &[0, 1, 2], &basis(&bits)).unwrap();

        let expected = [bits[0], bits[1], bits[2] ^ (bits[0] && bits[1])];
        assert!(result.approx_eq(&basis(&expected), EPSILON), "input {:?}", bits);
    }
}

#[test]
fn test_cnot_between_distant_wires() {
    // control on wire 3, target on wire 0, wires 1 and 2 untouched
    let input = basis(&[false, true, false, true]);
    let result = synthesis::apply(GateKind::Cnot, &[3, 0], &input).unwrap();
    assert!(result.approx_eq(&basis(&[true, true, false, true]), EPSILON));
}

#[test]
fn test_controlled_swap_needs_control() {
    let idle = basis(&[false, true, false]);
    let result = synthesis::apply(GateKind::ControlledSwap, &[0, 1, 2], &idle).unwrap();
    assert!(result.approx_eq(&idle, EPSILON));

    let active = basis(&[true, true, false]);
    let result = synthesis::apply(GateKind::ControlledSwap, &[0, 1, 2], &active).unwrap();
    assert!(result.approx_eq(&basis(&[true, false, true]), EPSILON));
}

#[test]
fn test_gate_serde_round_trip() {
    for gate in [GateKind::SqrtX, GateKind::Phase(0.75), GateKind::ControlledSwap] {
        let json = serde_json::to_string(&gate).unwrap();
        let back: GateKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, gate);
    }
}
