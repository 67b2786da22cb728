//! Single-qubit Clifford normal-form sweep.

use bubble_ir::{CircuitDag, Instruction, NodeIndex, QubitId};
use tracing::{debug, info, warn};

use super::clifford1::{Clifford1, Generator};
use super::interaction::{instruction_form, on_operand};
use super::{broken, single_qubit_clifford, snap_phase};
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::agnostic::optimization::rewrite_run;
use crate::property::PropertySet;
use crate::unitary::{Unitary2x2, Unitary4x4};

const PASS: &str = "SingleQubitCliffordSweep";

/// Upper bound on sweeps before giving up on a fixpoint.
const MAX_SWEEPS: usize = 1000;

/// Reduce runs of single-qubit Cliffords to normal form.
///
/// Each maximal run becomes `Z? X? R`. When a run directly follows a
/// two-qubit interaction, its Pauli part and any leading generators that
/// commute with the interaction are moved in front of it, which may copy a
/// Pauli onto the partner wire. Repeats until nothing changes and returns
/// whether anything did.
pub fn singleq_clifford_sweep(dag: &mut CircuitDag) -> CompileResult<bool> {
    let mut changed = false;
    for sweep in 0..MAX_SWEEPS {
        if !sweep_once(dag)? {
            dag.verify_integrity().map_err(broken(PASS))?;
            return Ok(changed);
        }
        debug!("Clifford sweep {} changed the circuit", sweep + 1);
        changed = true;
    }
    warn!("Clifford sweep did not settle after {MAX_SWEEPS} sweeps");
    dag.verify_integrity().map_err(broken(PASS))?;
    Ok(changed)
}

/// Maximal runs of single-qubit Cliffords on `qubit`, in wire order.
fn clifford_runs(dag: &CircuitDag, qubit: QubitId) -> Vec<Vec<NodeIndex>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for node in dag.wire_ops(qubit) {
        if dag
            .get_instruction(node)
            .and_then(single_qubit_clifford)
            .is_some()
        {
            current.push(node);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn sweep_once(dag: &mut CircuitDag) -> CompileResult<bool> {
    let mut changed = false;
    for qubit in dag.qubits() {
        for run in clifford_runs(dag, qubit) {
            changed |= reduce_run(dag, qubit, &run)?;
        }
    }
    Ok(changed)
}

/// The exact product of a run, applied in time order.
fn run_matrix(dag: &CircuitDag, run: &[NodeIndex]) -> Unitary2x2 {
    run.iter()
        .filter_map(|&node| dag.get_instruction(node))
        .filter_map(|inst| inst.standard_gate().and_then(Unitary2x2::from_gate))
        .fold(Unitary2x2::identity(), |acc, u| u * acc)
}

/// Product of generators in time order.
fn generators_matrix(gates: &[Generator]) -> Unitary2x2 {
    gates
        .iter()
        .fold(Unitary2x2::identity(), |acc, g| g.matrix() * acc)
}

/// A part of a run moved in front of the interaction before it.
struct Pushed {
    /// Clifford to insert before the interaction on each operand.
    locals: [(Clifford1, QubitId); 2],
    /// Generators left behind, as a Clifford.
    rest: Clifford1,
    /// Phase picked up by the move.
    phase: f64,
}

/// Split the part of `element` that can move through the interaction at
/// `node` off the front of the run.
///
/// The Pauli part always moves. Leading generators of the coset
/// representative follow while they commute with the interaction's Pauli
/// on `qubit`.
fn push_through(
    dag: &CircuitDag,
    node: NodeIndex,
    qubit: QubitId,
    element: Clifford1,
) -> Option<Pushed> {
    let inst = dag.get_instruction(node)?;
    let form = instruction_form(inst)?;
    let position = inst.qubit_position(qubit)?;
    let gate = Unitary4x4::from_gate(inst.standard_gate()?)?;

    let rep = element.coset_rep().gates();
    let moved = rep
        .iter()
        .take_while(|g| g.commutes_with(form.paulis[position]))
        .count();
    if element.pauli_part().is_identity() && moved == 0 {
        return None;
    }

    let pushed = generators_matrix(&rep[..moved]) * element.pauli_part().matrix();
    let conjugated = gate
        .dagger()
        .mul(&on_operand(&pushed, position))
        .mul(&gate);
    let (first, second) = conjugated.split_tensor()?;
    let (c0, p0) = Clifford1::from_unitary(&first)?;
    let (c1, p1) = Clifford1::from_unitary(&second)?;
    let (rest, pr) = Clifford1::from_unitary(&generators_matrix(&rep[moved..]))?;

    Some(Pushed {
        locals: [(c0, inst.qubits[0]), (c1, inst.qubits[1])],
        rest,
        phase: p0 + p1 + pr,
    })
}

/// Reduce one run. Returns whether the circuit changed.
fn reduce_run(dag: &mut CircuitDag, qubit: QubitId, run: &[NodeIndex]) -> CompileResult<bool> {
    let Some((element, mut phase)) = Clifford1::from_unitary(&run_matrix(dag, run)) else {
        return Err(CompileError::invariant(
            PASS,
            format!("run on {qubit} starting at node {} is not Clifford", run[0].index()),
        ));
    };

    let mut remaining = element;
    let mut pushed = false;
    let before = run.first().and_then(|&first| dag.wire_predecessor(first, qubit));
    if let Some(interaction) = before {
        if let Some(moved) = push_through(dag, interaction, qubit, element) {
            for (local, operand) in moved.locals {
                for inst in local.instructions(operand) {
                    dag.insert_before(interaction, inst)?;
                }
            }
            debug!(
                "Moved {} gates on {} before node {}",
                element.gate_count() - moved.rest.gate_count(),
                qubit,
                interaction.index()
            );
            remaining = moved.rest;
            phase += moved.phase;
            pushed = true;
        }
    }

    let replacement: Vec<Instruction> = remaining.instructions(qubit).collect();
    let unchanged = !pushed
        && replacement.len() == run.len()
        && run
            .iter()
            .zip(&replacement)
            .all(|(&node, new)| dag.get_instruction(node) == Some(new));
    if unchanged {
        return Ok(false);
    }

    rewrite_run(dag, qubit, run, replacement)?;
    dag.add_global_phase(snap_phase(phase));
    Ok(true)
}

/// Pass wrapper for [`singleq_clifford_sweep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleQubitCliffordSweep;

impl SingleQubitCliffordSweep {
    /// Create the pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for SingleQubitCliffordSweep {
    fn name(&self) -> &'static str {
        PASS
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, _properties: &mut PropertySet) -> CompileResult<()> {
        let changed = singleq_clifford_sweep(dag)?;
        info!("Clifford sweep finished, changed: {changed}");
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        dag.num_ops() > 0
    }
}
