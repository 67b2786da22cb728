//! Property-based tests for the Clifford reduction passes.
//!
//! Random Clifford+T circuits with free rotations are reduced and checked
//! against the dense simulator. The unitary must survive up to the reported
//! permutation and the entangling gate count may never grow. A second run
//! of either pass must find nothing left to do.

mod common;

use bubble_compile::passes::agnostic::clifford::{
    CliffordConfig, CliffordReduction, CliffordSimp, singleq_clifford_sweep,
};
use bubble_ir::{Circuit, QubitId};
use proptest::prelude::*;

use common::{assert_same_unitary, assert_same_unitary_permuted, count_multi_qubit, unitary};

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    S(u32),
    Sdg(u32),
    SX(u32),
    X(u32),
    Z(u32),
    T(u32),
    Rx(f64, u32),
    Ry(f64, u32),
    Rz(f64, u32),
    CX(u32, u32),
    CZ(u32, u32),
    CY(u32, u32),
    ZZMax(u32, u32),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        let _ = match self {
            GateOp::H(q) => circuit.h(QubitId(q)),
            GateOp::S(q) => circuit.s(QubitId(q)),
            GateOp::Sdg(q) => circuit.sdg(QubitId(q)),
            GateOp::SX(q) => circuit.sx(QubitId(q)),
            GateOp::X(q) => circuit.x(QubitId(q)),
            GateOp::Z(q) => circuit.z(QubitId(q)),
            GateOp::T(q) => circuit.t(QubitId(q)),
            GateOp::Rx(theta, q) => circuit.rx(theta, QubitId(q)),
            GateOp::Ry(theta, q) => circuit.ry(theta, QubitId(q)),
            GateOp::Rz(theta, q) => circuit.rz(theta, QubitId(q)),
            GateOp::CX(c, t) => circuit.cx(QubitId(c), QubitId(t)),
            GateOp::CZ(c, t) => circuit.cz(QubitId(c), QubitId(t)),
            GateOp::CY(c, t) => circuit.cy(QubitId(c), QubitId(t)),
            GateOp::ZZMax(a, b) => circuit.zzmax(QubitId(a), QubitId(b)),
        };
    }
}

/// Generate a random gate operation for a circuit with given number of qubits.
fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let pair = (0..num_qubits, 0..num_qubits)
        .prop_filter("Operands must differ", |(a, b)| a != b);
    prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::S),
        (0..num_qubits).prop_map(GateOp::Sdg),
        (0..num_qubits).prop_map(GateOp::SX),
        (0..num_qubits).prop_map(GateOp::X),
        (0..num_qubits).prop_map(GateOp::Z),
        (0..num_qubits).prop_map(GateOp::T),
        (-3.0_f64..3.0, 0..num_qubits).prop_map(|(theta, q)| GateOp::Rx(theta, q)),
        (-3.0_f64..3.0, 0..num_qubits).prop_map(|(theta, q)| GateOp::Ry(theta, q)),
        (-3.0_f64..3.0, 0..num_qubits).prop_map(|(theta, q)| GateOp::Rz(theta, q)),
        (0..num_qubits).prop_map(|q| GateOp::Ry(std::f64::consts::FRAC_PI_2, q)),
        pair.clone().prop_map(|(c, t)| GateOp::CX(c, t)),
        pair.clone().prop_map(|(c, t)| GateOp::CX(c, t)),
        pair.clone().prop_map(|(c, t)| GateOp::CZ(c, t)),
        pair.clone().prop_map(|(c, t)| GateOp::CY(c, t)),
        pair.prop_map(|(a, b)| GateOp::ZZMax(a, b)),
    ]
}

/// Generate a random circuit on 2-4 qubits.
fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=4).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 1..=24).prop_map(move |ops| {
            let mut circuit = Circuit::with_size("random", num_qubits, 0);
            for op in ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sweep_preserves_unitary(circuit in arb_circuit()) {
        let mut dag = circuit.into_dag();
        let before = unitary(&dag);

        singleq_clifford_sweep(&mut dag).unwrap();
        dag.verify_integrity().unwrap();
        assert_same_unitary(&before, &dag);
    }

    #[test]
    fn reduction_preserves_unitary(circuit in arb_circuit(), allow_swaps in any::<bool>()) {
        let mut dag = circuit.into_dag();
        let before = unitary(&dag);

        let config = CliffordConfig::default().with_allow_swaps(allow_swaps);
        let outcome = CliffordReduction::with_config(config).reduce(&mut dag).unwrap();
        dag.verify_integrity().unwrap();
        if !allow_swaps {
            prop_assert!(outcome.permutation.is_identity());
        }
        assert_same_unitary_permuted(&before, &dag, &outcome.permutation);
    }

    #[test]
    fn reduction_never_adds_entanglers(circuit in arb_circuit(), allow_swaps in any::<bool>()) {
        let mut dag = circuit.into_dag();
        let entanglers_before = count_multi_qubit(&dag);

        let config = CliffordConfig::default().with_allow_swaps(allow_swaps);
        CliffordReduction::with_config(config).reduce(&mut dag).unwrap();
        prop_assert!(count_multi_qubit(&dag) <= entanglers_before);
    }

    #[test]
    fn reduction_is_idempotent(circuit in arb_circuit()) {
        let mut dag = circuit.into_dag();
        let reduction = CliffordReduction::new();

        reduction.reduce(&mut dag).unwrap();
        let ops = dag.num_ops();
        let again = reduction.reduce(&mut dag).unwrap();
        prop_assert!(!again.report.changed);
        prop_assert_eq!(again.report.replacements, 0);
        prop_assert_eq!(dag.num_ops(), ops);
    }

    #[test]
    fn simp_preserves_unitary(circuit in arb_circuit()) {
        let mut dag = circuit.into_dag();
        let before = unitary(&dag);

        let config = CliffordConfig::default().with_allow_swaps(true);
        let outcome = CliffordSimp::with_config(config).simplify(&mut dag).unwrap();
        dag.verify_integrity().unwrap();
        assert_same_unitary_permuted(&before, &dag, &outcome.permutation);
    }

    // Simp may lengthen single-qubit runs into normal form, so only the
    // entangler count is bounded. The op count is pinned by the second run.
    #[test]
    fn simp_settles_without_adding_entanglers(
        circuit in arb_circuit(),
        allow_swaps in any::<bool>(),
    ) {
        let mut dag = circuit.into_dag();
        let before = unitary(&dag);
        let entanglers_before = count_multi_qubit(&dag);

        let config = CliffordConfig::default().with_allow_swaps(allow_swaps);
        let simp = CliffordSimp::with_config(config);
        let outcome = simp.simplify(&mut dag).unwrap();
        prop_assert!(count_multi_qubit(&dag) <= entanglers_before);
        let ops = dag.num_ops();

        let again = simp.simplify(&mut dag).unwrap();
        prop_assert!(!again.report.changed);
        prop_assert_eq!(again.report.replacements, 0);
        prop_assert!(again.permutation.is_identity());
        prop_assert_eq!(dag.num_ops(), ops);
        assert_same_unitary_permuted(&before, &dag, &outcome.permutation);
    }
}
