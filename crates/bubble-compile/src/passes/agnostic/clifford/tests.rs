//! Tests for the Clifford reduction passes.

use bubble_ir::{Circuit, CircuitDag, ParameterExpression, QubitId, StandardGate};

use super::{
    CliffordConfig, CliffordReduction, CliffordReport, InteractionGate,
    MultiQubitCliffordReplacement, SingleQubitCliffordSweep, commuting_pauli,
    multiq_clifford_replacement, single_qubit_clifford, singleq_clifford_sweep, snap_phase,
};
use crate::pass::Pass;
use crate::passes::agnostic::clifford::pauli::Pauli;
use crate::property::PropertySet;
use crate::unitary::Unitary2x2;

fn q(i: u32) -> QubitId {
    QubitId(i)
}

/// Gate names on one wire, in order.
fn wire_gates(dag: &CircuitDag, qubit: QubitId) -> Vec<String> {
    dag.wire_ops(qubit)
        .into_iter()
        .filter_map(|node| dag.get_instruction(node))
        .map(|inst| inst.name().to_string())
        .collect()
}

fn count(dag: &CircuitDag, name: &str) -> usize {
    dag.topological_ops()
        .unwrap()
        .into_iter()
        .filter(|(_, inst)| inst.name() == name)
        .count()
}

#[test]
fn test_standard_form_is_left_alone() {
    let mut circuit = Circuit::with_size("std", 2, 0);
    circuit
        .z(q(0))
        .unwrap()
        .sx(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .z(q(1))
        .unwrap()
        .x(q(1))
        .unwrap()
        .s(q(1))
        .unwrap()
        .sx(q(1))
        .unwrap()
        .s(q(1))
        .unwrap()
        .cx(q(0), q(1))
        .unwrap()
        .sx(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .rz(0.31, q(1))
        .unwrap();
    let mut dag = circuit.into_dag();
    let before: Vec<_> = (0..2).map(|i| wire_gates(&dag, q(i))).collect();

    assert!(!singleq_clifford_sweep(&mut dag).unwrap());
    let after: Vec<_> = (0..2).map(|i| wire_gates(&dag, q(i))).collect();
    assert_eq!(before, after);
    assert!(dag.global_phase().abs() < 1e-12);
}

#[test]
fn test_quarter_turn_u_gates_become_normal_form() {
    use std::f64::consts::{FRAC_PI_2, PI};

    let mut circuit = Circuit::with_size("u", 2, 0);
    circuit
        .u(FRAC_PI_2, PI, 0.0, q(0))
        .unwrap()
        .cx(q(0), q(1))
        .unwrap()
        .u(FRAC_PI_2, 0.0, FRAC_PI_2, q(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(singleq_clifford_sweep(&mut dag).unwrap());
    assert_eq!(wire_gates(&dag, q(0)), ["z", "x", "s", "sx", "s", "cx", "sx", "s"]);
    assert_eq!(wire_gates(&dag, q(1)), ["cx"]);
}

#[test]
fn test_every_quarter_turn_u_gate_becomes_short_normal_form() {
    use num_complex::Complex64;
    use std::f64::consts::{FRAC_PI_2, PI};

    let quarter_turns = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2];
    for theta in quarter_turns {
        for phi in quarter_turns {
            for lambda in quarter_turns {
                let mut circuit = Circuit::with_size("u", 1, 0);
                circuit.u(theta, phi, lambda, q(0)).unwrap();
                let mut dag = circuit.into_dag();

                singleq_clifford_sweep(&mut dag).unwrap();

                let case = format!("U({theta}, {phi}, {lambda})");
                let rebuilt = dag
                    .wire_ops(q(0))
                    .into_iter()
                    .filter_map(|node| dag.get_instruction(node))
                    .filter_map(|inst| inst.standard_gate().and_then(Unitary2x2::from_gate))
                    .fold(Unitary2x2::identity(), |acc, u| u.mul(&acc))
                    .scale(Complex64::from_polar(1.0, dag.global_phase()));
                assert!(
                    rebuilt.approx_eq(&Unitary2x2::u(theta, phi, lambda), 1e-9),
                    "{case}"
                );

                assert!(count(&dag, "s") + count(&dag, "sx") <= 3, "{case}");
                assert!(count(&dag, "z") <= 1, "{case}");
                assert!(count(&dag, "x") <= 1, "{case}");
                assert!(dag.num_ops() <= 5, "{case}");
            }
        }
    }
}

#[test]
fn test_paulis_copy_through_control() {
    let mut circuit = Circuit::with_size("control", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .z(q(0))
        .unwrap()
        .x(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .sx(q(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(singleq_clifford_sweep(&mut dag).unwrap());
    assert_eq!(wire_gates(&dag, q(0)), ["z", "x", "s", "cx", "sx"]);
    assert_eq!(wire_gates(&dag, q(1)), ["x", "cx"]);
}

#[test]
fn test_paulis_copy_through_target() {
    let mut circuit = Circuit::with_size("target", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .z(q(1))
        .unwrap()
        .x(q(1))
        .unwrap()
        .sx(q(1))
        .unwrap()
        .s(q(1))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(singleq_clifford_sweep(&mut dag).unwrap());
    assert_eq!(wire_gates(&dag, q(0)), ["z", "cx"]);
    assert_eq!(wire_gates(&dag, q(1)), ["z", "x", "sx", "cx", "s"]);
}

#[test]
fn test_copied_paulis_cancel() {
    let mut circuit = Circuit::with_size("mixture", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .z(q(0))
        .unwrap()
        .z(q(1))
        .unwrap()
        .x(q(1))
        .unwrap()
        .sx(q(1))
        .unwrap()
        .s(q(1))
        .unwrap()
        .s(q(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(singleq_clifford_sweep(&mut dag).unwrap());
    assert_eq!(wire_gates(&dag, q(0)), ["s", "cx"]);
    assert_eq!(wire_gates(&dag, q(1)), ["z", "x", "sx", "cx", "s"]);
}

#[test]
fn test_identity_run_is_removed() {
    let mut circuit = Circuit::with_size("cancel", 1, 0);
    circuit
        .h(q(0))
        .unwrap()
        .h(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .sdg(q(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(singleq_clifford_sweep(&mut dag).unwrap());
    assert_eq!(dag.num_ops(), 0);
    assert!(dag.global_phase().abs() < 1e-9);
}

#[test]
fn test_sweep_records_phase() {
    // Rz(π/2) = e^{-iπ/4} S
    let mut circuit = Circuit::with_size("phase", 1, 0);
    circuit.rz(std::f64::consts::FRAC_PI_2, q(0)).unwrap();
    let mut dag = circuit.into_dag();

    assert!(singleq_clifford_sweep(&mut dag).unwrap());
    assert_eq!(wire_gates(&dag, q(0)), ["s"]);
    assert!((dag.global_phase() + std::f64::consts::FRAC_PI_4).abs() < 1e-9);
}

#[test]
fn test_sweep_pass_wrapper() {
    let mut circuit = Circuit::with_size("wrapper", 1, 0);
    circuit.x(q(0)).unwrap().x(q(0)).unwrap();
    let mut dag = circuit.into_dag();
    let mut props = PropertySet::new();

    SingleQubitCliffordSweep::new().run(&mut dag, &mut props).unwrap();
    assert_eq!(dag.num_ops(), 0);
}

#[test]
fn test_four_cx_v_pairs_merge() {
    let mut circuit = Circuit::with_size("rewrite", 2, 0);
    for _ in 0..4 {
        circuit.cx(q(0), q(1)).unwrap().sx(q(0)).unwrap();
    }
    let mut dag = circuit.into_dag();

    assert!(multiq_clifford_replacement(&mut dag, false).unwrap());
    assert!(count(&dag, "cx") < 4);
    dag.verify_integrity().unwrap();
}

#[test]
fn test_replacement_one() {
    let mut circuit = Circuit::with_size("rep1", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .sx(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .cx(q(1), q(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(multiq_clifford_replacement(&mut dag, false).unwrap());
    assert_eq!(count(&dag, "cx"), 1);
}

#[test]
fn test_replacement_three_is_local() {
    let mut circuit = Circuit::with_size("rep3", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .sx(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .s(q(1))
        .unwrap()
        .sx(q(1))
        .unwrap()
        .cx(q(1), q(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    assert!(multiq_clifford_replacement(&mut dag, false).unwrap());
    assert_eq!(count(&dag, "cx"), 0);
}

#[test]
fn test_replacement_pass_publishes_report() {
    let mut circuit = Circuit::with_size("report", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .s(q(1))
        .unwrap()
        .cx(q(0), q(1))
        .unwrap();
    let mut dag = circuit.into_dag();
    let mut props = PropertySet::new();

    MultiQubitCliffordReplacement::new(false)
        .run(&mut dag, &mut props)
        .unwrap();
    let report = props.get::<CliffordReport>().unwrap();
    assert!(report.changed);
    assert_eq!(report.replacements, 1);
    assert!(props.permutation().unwrap().is_identity());
}

#[test]
fn test_reduction_emits_configured_gate() {
    let mut circuit = Circuit::with_size("gate", 2, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .s(q(1))
        .unwrap()
        .cx(q(0), q(1))
        .unwrap();

    let mut dag = circuit.dag().clone();
    let outcome = CliffordReduction::new().reduce(&mut dag).unwrap();
    assert!(outcome.report.changed);
    assert_eq!(count(&dag, "zzmax"), 1);
    assert_eq!(count(&dag, "cx"), 0);

    let mut dag = circuit.into_dag();
    let config = CliffordConfig::default().with_interaction_gate(InteractionGate::Cx);
    CliffordReduction::with_config(config).reduce(&mut dag).unwrap();
    assert_eq!(count(&dag, "zzmax"), 0);
    assert_eq!(count(&dag, "cx"), 1);
}

#[test]
fn test_zero_rounds_is_rejected() {
    let mut dag = Circuit::with_size("empty", 1, 0).into_dag();
    let config = CliffordConfig::default().with_max_rounds(0);
    assert!(CliffordReduction::with_config(config).reduce(&mut dag).is_err());
}

#[test]
fn test_config_serde_defaults() {
    let config: CliffordConfig = serde_json::from_str(r#"{"allow_swaps": true}"#).unwrap();
    assert!(config.allow_swaps);
    assert_eq!(config.max_rounds, 100);
    assert_eq!(config.interaction_gate, InteractionGate::ZzMax);

    let json = serde_json::to_string(&config.with_interaction_gate(InteractionGate::Cx)).unwrap();
    assert!(json.contains("\"cx\""));
}

#[test]
fn test_single_qubit_clifford_classification() {
    use bubble_ir::Instruction;

    let clifford = Instruction::single_qubit_gate(StandardGate::H, q(0));
    assert!(single_qubit_clifford(&clifford).is_some());
    let t = Instruction::single_qubit_gate(StandardGate::T, q(0));
    assert!(single_qubit_clifford(&t).is_none());
    let cx = Instruction::two_qubit_gate(StandardGate::CX, q(0), q(1));
    assert!(single_qubit_clifford(&cx).is_none());
}

#[test]
fn test_commuting_pauli_per_operand() {
    use bubble_ir::Instruction;

    let cx = Instruction::two_qubit_gate(StandardGate::CX, q(0), q(1));
    assert_eq!(commuting_pauli(&cx, q(0)), Some(Pauli::Z));
    assert_eq!(commuting_pauli(&cx, q(1)), Some(Pauli::X));
    assert_eq!(commuting_pauli(&cx, q(2)), None);

    let ry = StandardGate::Ry(ParameterExpression::constant(0.4));
    let ry = Instruction::single_qubit_gate(ry, q(0));
    assert_eq!(commuting_pauli(&ry, q(0)), Some(Pauli::Y));
    let h = Instruction::single_qubit_gate(StandardGate::H, q(0));
    assert_eq!(commuting_pauli(&h, q(0)), None);
}

#[test]
fn test_snap_phase() {
    let quarter = std::f64::consts::FRAC_PI_4;
    assert_eq!(snap_phase(quarter + 1e-12), quarter);
    assert_eq!(snap_phase(0.3), 0.3);
}
