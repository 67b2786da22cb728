//! Single-qubit gate fusion.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use bubble_ir::CircuitDag;
use bubble_ir::dag::NodeIndex;
use bubble_ir::gate::StandardGate;
use bubble_ir::instruction::Instruction;
use bubble_ir::parameter::ParameterExpression;
use bubble_ir::qubit::QubitId;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::agnostic::clifford::{Clifford1, single_qubit_clifford};
use crate::property::PropertySet;
use crate::unitary::Unitary2x2;

use super::EPSILON;

/// Which runs of single-qubit gates a fusion may rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FusionScope {
    /// Every run of two or more gates.
    #[default]
    AllRuns,
    /// Only runs containing at least one non-Clifford gate. Pure Clifford
    /// runs are left to the Clifford normal form.
    NonCliffordRuns,
}

/// Single-qubit gate optimization pass.
///
/// Merges consecutive single-qubit gates on the same qubit and decomposes
/// them back into `Rz · Ry · Rz` via the ZYZ decomposition. A run is only
/// rewritten if that shortens it. The global phase of the circuit is kept
/// exact.
#[derive(Debug, Default)]
pub struct Optimize1qGates {
    scope: FusionScope,
}

impl Optimize1qGates {
    /// Create a fusion pass over all runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fusion pass restricted to `scope`.
    pub fn with_scope(scope: FusionScope) -> Self {
        Self { scope }
    }
}

/// The matrix of a fusable gate: a constant single-qubit standard gate.
fn fusable(inst: &Instruction) -> Option<Unitary2x2> {
    if inst.qubits.len() != 1 || !inst.clbits.is_empty() {
        return None;
    }
    inst.standard_gate().and_then(Unitary2x2::from_gate)
}

/// Runs of consecutive fusable gates, per wire in wire order.
fn find_1q_runs(dag: &CircuitDag) -> Vec<(QubitId, Vec<NodeIndex>)> {
    let mut runs = Vec::new();
    for qubit in dag.qubits() {
        let mut current: Vec<NodeIndex> = Vec::new();
        for node in dag.wire_ops(qubit) {
            if dag.get_instruction(node).and_then(fusable).is_some() {
                current.push(node);
            } else if !current.is_empty() {
                runs.push((qubit, std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            runs.push((qubit, current));
        }
    }
    runs
}

/// Fold `angle` into `(-π, π]`, returning the folded angle and the phase
/// the fold introduces on an `Rz` or `Ry` rotation.
fn fold_rotation(angle: f64) -> (f64, f64) {
    let folded = Unitary2x2::normalize_angle(angle);
    let turns = ((angle - folded) / (2.0 * PI)).round();
    // R(θ + 2π) = -R(θ)
    (folded, PI * turns)
}

/// ZYZ gates for `unitary` in time order, and the phase they leave out.
fn decompose_unitary(unitary: &Unitary2x2) -> (Vec<StandardGate>, f64) {
    let (alpha, beta, gamma, phase) = unitary.zyz_decomposition();
    let (alpha, pa) = fold_rotation(alpha);
    let (beta, pb) = fold_rotation(beta);
    let (gamma, pg) = fold_rotation(gamma);

    let mut gates = Vec::with_capacity(3);
    if gamma.abs() > EPSILON {
        gates.push(StandardGate::Rz(ParameterExpression::constant(gamma)));
    }
    if beta.abs() > EPSILON {
        gates.push(StandardGate::Ry(ParameterExpression::constant(beta)));
    }
    if alpha.abs() > EPSILON {
        gates.push(StandardGate::Rz(ParameterExpression::constant(alpha)));
    }
    (gates, phase + pa + pb + pg)
}

/// A stretch of a decomposition on its way to the Clifford normal form.
#[derive(Debug, Clone)]
enum Piece {
    /// A non-Clifford rotation.
    Rotation(StandardGate),
    /// Consecutive Clifford rotations, multiplied out.
    Clifford(Unitary2x2),
    /// A Clifford stretch in normal form.
    Normal(Clifford1),
}

impl Piece {
    fn rz_angle(&self) -> Option<f64> {
        match self {
            Piece::Rotation(StandardGate::Rz(angle)) => angle.as_f64(),
            _ => None,
        }
    }
}

/// `Sdg^k`.
fn sdg_power(k: u8) -> Unitary2x2 {
    (0..k).fold(Unitary2x2::identity(), |acc, _| acc.mul(&Unitary2x2::sdg()))
}

/// Write `c = S^k2 · rest · S^k1` with the shortest normal form for `rest`.
///
/// `k1` only moves off zero when `absorb_before` holds, `k2` likewise with
/// `absorb_after`. Returns `(k1, k2, rest, phase)` with
/// `rest = e^{i·phase} · element.matrix()`.
fn split_diagonal_edges(
    c: &Unitary2x2,
    absorb_before: bool,
    absorb_after: bool,
) -> Option<(u8, u8, Clifford1, f64)> {
    let mut best: Option<(u8, u8, Clifford1, f64)> = None;
    for k1 in 0..if absorb_before { 4 } else { 1 } {
        for k2 in 0..if absorb_after { 4 } else { 1 } {
            let rest = sdg_power(k2).mul(c).mul(&sdg_power(k1));
            let (element, phase) = Clifford1::from_unitary(&rest)?;
            if best.is_none_or(|(_, _, b, _)| element.gate_count() < b.gate_count()) {
                best = Some((k1, k2, element, phase));
            }
        }
    }
    best
}

/// `Rz(angle + k·π/2)` folded, with the phase `S^k` carries.
fn shifted_rz(angle: f64, k: u8) -> (Piece, f64) {
    let (folded, fold_phase) = fold_rotation(angle + f64::from(k) * FRAC_PI_2);
    let gate = StandardGate::Rz(ParameterExpression::constant(folded));
    (Piece::Rotation(gate), fold_phase + f64::from(k) * FRAC_PI_4)
}

/// ZYZ decomposition of `unitary` in the form the Clifford sweep keeps.
///
/// Consecutive Clifford rotations become one Clifford normal form, and
/// `S` powers at the edges of such a stretch are folded into a
/// neighbouring non-Clifford `Rz` when that shortens the stretch. The
/// sweep leaves the result untouched, so fusing a run this way twice gives
/// the same length.
fn clifford_aware_decomposition(
    unitary: &Unitary2x2,
    qubit: QubitId,
) -> Option<(Vec<Instruction>, f64)> {
    let (gates, mut phase) = decompose_unitary(unitary);

    let mut pieces: Vec<Piece> = Vec::with_capacity(gates.len());
    for gate in gates {
        let u = Unitary2x2::from_gate(&gate)?;
        if Clifford1::from_unitary(&u).is_none() {
            pieces.push(Piece::Rotation(gate));
        } else if let Some(Piece::Clifford(acc)) = pieces.last_mut() {
            *acc = u * *acc;
        } else {
            pieces.push(Piece::Clifford(u));
        }
    }

    for i in 0..pieces.len() {
        let Piece::Clifford(c) = pieces[i] else {
            continue;
        };
        let before = i.checked_sub(1).and_then(|j| pieces[j].rz_angle());
        let after = pieces.get(i + 1).and_then(Piece::rz_angle);
        let (k1, k2, element, rest_phase) =
            split_diagonal_edges(&c, before.is_some(), after.is_some())?;
        phase += rest_phase;
        if let Some(angle) = before {
            let (piece, shift_phase) = shifted_rz(angle, k1);
            pieces[i - 1] = piece;
            phase += shift_phase;
        }
        if let Some(angle) = after {
            let (piece, shift_phase) = shifted_rz(angle, k2);
            pieces[i + 1] = piece;
            phase += shift_phase;
        }
        pieces[i] = Piece::Normal(element);
    }

    let mut instructions = Vec::with_capacity(pieces.len() + 2);
    for piece in pieces {
        match piece {
            Piece::Rotation(gate) => {
                instructions.push(Instruction::single_qubit_gate(gate, qubit));
            }
            Piece::Normal(element) => instructions.extend(element.instructions(qubit)),
            Piece::Clifford(_) => return None,
        }
    }
    Some((instructions, phase))
}

/// Replace the gates of a run on `qubit` with `replacement`, in time order.
///
/// The first nodes are rewritten in place, surplus nodes are removed, and
/// missing ones are inserted after the last node of the run.
pub(crate) fn rewrite_run(
    dag: &mut CircuitDag,
    qubit: QubitId,
    nodes: &[NodeIndex],
    replacement: Vec<Instruction>,
) -> CompileResult<()> {
    let keep = replacement.len().min(nodes.len());
    let mut replacement = replacement.into_iter();
    for &node in &nodes[..keep] {
        if let (Some(slot), Some(inst)) = (dag.get_instruction_mut(node), replacement.next()) {
            *slot = inst;
        }
    }
    for &node in &nodes[keep..] {
        dag.remove_op(node).map_err(CompileError::Ir)?;
    }
    if let Some(&last) = nodes[..keep].last() {
        let mut anchor = last;
        for inst in replacement {
            debug_assert_eq!(inst.qubits, [qubit]);
            anchor = dag.insert_after(anchor, inst)?;
        }
    }
    Ok(())
}

/// Fuse single-qubit runs within `scope`. Returns whether any run changed.
pub(crate) fn fuse_single_qubit_runs(
    dag: &mut CircuitDag,
    scope: FusionScope,
) -> CompileResult<bool> {
    let mut changed = false;
    for (qubit, nodes) in find_1q_runs(dag) {
        if nodes.len() < 2 {
            continue;
        }

        let mut combined = Unitary2x2::identity();
        let mut has_non_clifford = false;
        for &node in &nodes {
            if let Some(inst) = dag.get_instruction(node) {
                if let Some(u) = fusable(inst) {
                    combined = u * combined;
                }
                has_non_clifford |= single_qubit_clifford(inst).is_none();
            }
        }
        if scope == FusionScope::NonCliffordRuns && !has_non_clifford {
            continue;
        }

        let decomposed = match scope {
            FusionScope::AllRuns => {
                let (gates, phase) = decompose_unitary(&combined);
                let insts = gates
                    .into_iter()
                    .map(|g| Instruction::single_qubit_gate(g, qubit))
                    .collect::<Vec<_>>();
                Some((insts, phase))
            }
            FusionScope::NonCliffordRuns => clifford_aware_decomposition(&combined, qubit),
        };
        let Some((replacement, phase)) = decomposed else {
            continue;
        };
        if replacement.len() >= nodes.len() {
            continue;
        }
        debug!(
            "Fusing {} gates on {} into {}",
            nodes.len(),
            qubit,
            replacement.len()
        );
        rewrite_run(dag, qubit, &nodes, replacement)?;
        dag.add_global_phase(phase);
        changed = true;
    }
    Ok(changed)
}

impl Pass for Optimize1qGates {
    fn name(&self) -> &'static str {
        "Optimize1qGates"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, _properties: &mut PropertySet) -> CompileResult<()> {
        fuse_single_qubit_runs(dag, self.scope)?;
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        // Only run if there are operations to optimize
        dag.num_ops() > 1
    }
}
