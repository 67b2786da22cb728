//! Multi-qubit Clifford replacement.
//!
//! Two consecutive interactions on the same pair of wires are moved
//! towards each other through everything they commute with. Where they
//! meet at a causally valid pair of edges, their product is a two-qubit
//! Clifford that is resynthesised with at most one entangling gate, or
//! with one entangling gate and a SWAP absorbed into the wire labels.
//! With swaps allowed, SWAP gates already in the circuit are absorbed into
//! the wire labels first, so interactions on either side of them can meet.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use bubble_ir::{CircuitDag, EdgeIndex, Instruction, NodeIndex, QubitId, StandardGate};
use tracing::{debug, info, trace};

use super::clifford1::Clifford1;
use super::insertion::valid_insertion_point;
use super::interaction::{
    InteractionForm, instruction_form, interaction_matrix, interaction_sequences, meeting_points,
    next_shared_op,
};
use super::pauli::SignedPauli;
use super::reduction::ReductionOutcome;
use super::{
    CliffordConfig, CliffordReport, InteractionGate, ReductionContext, broken, snap_phase,
};
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;
use crate::unitary::Unitary4x4;

const PASS: &str = "MultiQubitCliffordReplacement";

/// Merge pairs of consecutive interactions, emitting CX.
///
/// Runs one round over every wire pair. Returns whether any replacement
/// happened. With `allow_swaps`, replacements may leave the outputs
/// permuted; use [`MultiQubitCliffordReplacement::replace`] to get the
/// permutation back.
pub fn multiq_clifford_replacement(dag: &mut CircuitDag, allow_swaps: bool) -> CompileResult<bool> {
    let outcome = MultiQubitCliffordReplacement::new(allow_swaps).replace(dag)?;
    Ok(outcome.report.changed)
}

/// Pass form of [`multiq_clifford_replacement`].
#[derive(Debug, Clone, Copy)]
pub struct MultiQubitCliffordReplacement {
    config: CliffordConfig,
}

impl MultiQubitCliffordReplacement {
    /// Create the pass, emitting CX.
    pub fn new(allow_swaps: bool) -> Self {
        Self {
            config: CliffordConfig::default()
                .with_allow_swaps(allow_swaps)
                .with_interaction_gate(InteractionGate::Cx),
        }
    }

    /// Create the pass from a full configuration.
    pub fn with_config(config: CliffordConfig) -> Self {
        Self { config }
    }

    /// Run one replacement round and report what it did.
    pub fn replace(&self, dag: &mut CircuitDag) -> CompileResult<ReductionOutcome> {
        self.config.validate()?;
        let mut ctx = ReductionContext::new();
        ctx.begin_round();
        let changed = replacement_round(dag, &mut ctx, &self.config)?;
        Ok(ReductionOutcome {
            report: CliffordReport {
                changed,
                replacements: ctx.replacements,
                rounds: 1,
            },
            permutation: ctx.permutation,
        })
    }
}

impl Pass for MultiQubitCliffordReplacement {
    fn name(&self) -> &'static str {
        PASS
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let outcome = self.replace(dag)?;
        info!(
            "Clifford replacement merged {} interaction pairs",
            outcome.report.replacements
        );
        properties.record_permutation(&outcome.permutation);
        properties.insert(outcome.report);
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        dag.num_qubits() > 1
    }
}

/// Wire pairs `(a, b)` with `a < b` that share an interaction.
fn interacting_pairs(dag: &CircuitDag) -> CompileResult<BTreeSet<(QubitId, QubitId)>> {
    let mut pairs = BTreeSet::new();
    for (_, inst) in dag.topological_ops().map_err(broken(PASS))? {
        if instruction_form(inst).is_some() {
            let (p, q) = (inst.qubits[0], inst.qubits[1]);
            pairs.insert((p.min(q), p.max(q)));
        }
    }
    Ok(pairs)
}

/// One pass over every interacting wire pair. Returns whether anything
/// was replaced.
pub(crate) fn replacement_round(
    dag: &mut CircuitDag,
    ctx: &mut ReductionContext,
    config: &CliffordConfig,
) -> CompileResult<bool> {
    let mut changed = config.allow_swaps && absorb_swap_gates(dag, ctx)?;
    for (a, b) in interacting_pairs(dag)? {
        while replace_next(dag, a, b, ctx, config)? {
            changed = true;
        }
    }
    if changed {
        dag.verify_integrity().map_err(broken(PASS))?;
    }
    Ok(changed)
}

/// Remove every SWAP gate by exchanging the wires after it, recording the
/// exchange in the permutation. Returns whether there was any.
fn absorb_swap_gates(dag: &mut CircuitDag, ctx: &mut ReductionContext) -> CompileResult<bool> {
    let swaps: Vec<NodeIndex> = dag
        .topological_ops()
        .map_err(broken(PASS))?
        .into_iter()
        .filter(|(_, inst)| inst.standard_gate() == Some(&StandardGate::Swap))
        .map(|(node, _)| node)
        .collect();

    for &node in &swaps {
        // Earlier absorptions may have relabelled this gate's operands.
        let Some(inst) = dag.get_instruction(node) else {
            continue;
        };
        let (a, b) = (inst.qubits[0], inst.qubits[1]);
        dag.exchange_wires_after(node, a, b).map_err(broken(PASS))?;
        dag.remove_op(node).map_err(CompileError::Ir)?;
        ctx.permutation.swap(a, b);
        debug!("Absorbed SWAP node {} on ({}, {})", node.index(), a, b);
    }
    Ok(!swaps.is_empty())
}

/// Try consecutive interaction pairs on `(a, b)` until one is replaced.
fn replace_next(
    dag: &mut CircuitDag,
    a: QubitId,
    b: QubitId,
    ctx: &mut ReductionContext,
    config: &CliffordConfig,
) -> CompileResult<bool> {
    let (seq, _) = interaction_sequences(dag, a, b, &ctx.consumed);
    for pair in seq.points.windows(2) {
        let (v1, v2) = (pair[0].source, pair[1].source);
        if next_shared_op(dag, v1, a, b) != Some(v2) {
            continue;
        }
        if try_replace(dag, v1, v2, a, b, ctx, config)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// A resynthesis of a two-qubit Clifford.
#[derive(Debug, Clone, Copy)]
struct Synthesis {
    /// Locals before the entangling gate, on `(a, b)`.
    pre: Option<[Clifford1; 2]>,
    /// Locals after the entangling gate (or alone, without one).
    post: [Clifford1; 2],
    swap: bool,
}

impl Synthesis {
    fn entanglers(&self) -> usize {
        usize::from(self.pre.is_some())
    }

    fn local_gates(&self) -> usize {
        let pre = self.pre.map_or(0, |[c, d]| c.gate_count() + d.gate_count());
        pre + self.post[0].gate_count() + self.post[1].gate_count()
    }

    fn cost(&self) -> (usize, bool, usize) {
        (self.entanglers(), self.swap, self.local_gates())
    }

    fn matrix(&self, gate: InteractionGate) -> Unitary4x4 {
        let post = Unitary4x4::kron(&self.post[0].matrix(), &self.post[1].matrix());
        let Some([c, d]) = self.pre else {
            return post;
        };
        let pre = Unitary4x4::kron(&c.matrix(), &d.matrix());
        let middle = if self.swap {
            Unitary4x4::swap().mul(&gate.matrix())
        } else {
            gate.matrix()
        };
        post.mul(&middle).mul(&pre)
    }
}

/// Products `C ⊗ D` of every pair of single-qubit Cliffords.
static LOCAL_PAIRS: LazyLock<Vec<([Clifford1; 2], Unitary4x4)>> = LazyLock::new(|| {
    Clifford1::all()
        .flat_map(|c| Clifford1::all().map(move |d| [c, d]))
        .map(|[c, d]| ([c, d], Unitary4x4::kron(&c.matrix(), &d.matrix())))
        .collect()
});

/// Split a 4x4 matrix into two Clifford locals.
fn split_locals(m: &Unitary4x4) -> Option<[Clifford1; 2]> {
    let (first, second) = m.split_tensor()?;
    let (c0, _) = Clifford1::from_unitary(&first)?;
    let (c1, _) = Clifford1::from_unitary(&second)?;
    Some([c0, c1])
}

/// The cheapest way to write `target` with the gates `config` allows.
fn synthesize(target: &Unitary4x4, config: &CliffordConfig) -> Option<Synthesis> {
    if let Some(post) = split_locals(target) {
        return Some(Synthesis {
            pre: None,
            post,
            swap: false,
        });
    }

    let gate_dag = config.interaction_gate.matrix().dagger();
    let swap_options: &[bool] = if config.allow_swaps {
        &[false, true]
    } else {
        &[false]
    };

    let mut best: Option<Synthesis> = None;
    for &swap in swap_options {
        // (A⊗B)·[SWAP]·G·(C⊗D) = U, so A⊗B = U·(C⊗D)†·G†·[SWAP].
        for (pre, local) in LOCAL_PAIRS.iter() {
            let mut rest = target.mul(&local.dagger()).mul(&gate_dag);
            if swap {
                rest = rest.mul(&Unitary4x4::swap());
            }
            let Some(post) = split_locals(&rest) else {
                continue;
            };
            let candidate = Synthesis {
                pre: Some(*pre),
                post,
                swap,
            };
            if best.is_none_or(|b| candidate.cost() < b.cost()) {
                best = Some(candidate);
            }
        }
        // Non-permuting wins whenever it exists.
        if best.is_some() {
            break;
        }
    }
    best
}

/// The exponential of an interaction at a meeting point, from its frames.
fn moved_interaction(form: &InteractionForm, frames: [SignedPauli; 2]) -> Unitary4x4 {
    let negative = form.negative ^ frames[0].negative ^ frames[1].negative;
    interaction_matrix(frames[0].pauli, frames[1].pauli, negative)
}

fn try_replace(
    dag: &mut CircuitDag,
    v1: NodeIndex,
    v2: NodeIndex,
    a: QubitId,
    b: QubitId,
    ctx: &mut ReductionContext,
    config: &CliffordConfig,
) -> CompileResult<bool> {
    let (Some(first), Some(second)) = (dag.get_instruction(v1), dag.get_instruction(v2)) else {
        return Ok(false);
    };
    let (Some(form1), Some(form2)) = (instruction_form(first), instruction_form(second)) else {
        return Ok(false);
    };
    let (first, second) = (first.clone(), second.clone());

    let ma = meeting_points(dag, v1, v2, a, &ctx.consumed);
    let mb = meeting_points(dag, v1, v2, b, &ctx.consumed);
    if ma.sequence.is_empty() || mb.sequence.is_empty() {
        trace!("no meeting point for nodes {} and {}", v1.index(), v2.index());
        return Ok(false);
    }
    let Some((i, j)) = valid_insertion_point(dag, &ma.sequence.points, &mb.sequence.points) else {
        trace!(
            "meeting points of nodes {} and {} are causally entangled",
            v1.index(),
            v2.index()
        );
        return Ok(false);
    };

    let earlier = moved_interaction(
        form1,
        [ma.sequence.points[i].frame(), mb.sequence.points[j].frame()],
    );
    let later = moved_interaction(form2, [ma.later_frames[i], mb.later_frames[j]]);
    let target = later.mul(&earlier);

    let Some(synthesis) = synthesize(&target, config) else {
        trace!(
            "product of nodes {} and {} needs two interactions",
            v1.index(),
            v2.index()
        );
        return Ok(false);
    };
    let emitted = synthesis.matrix(config.interaction_gate);
    let Some(psi) = target.phase_relative(&emitted) else {
        return Err(CompileError::invariant(
            PASS,
            format!(
                "resynthesis of nodes {} and {} is not proportional to their product",
                v1.index(),
                v2.index()
            ),
        ));
    };

    let block_edges = [ma.sequence.points[i].edge, mb.sequence.points[j].edge];
    let created = splice(
        dag,
        v1,
        v2,
        (&first, &second),
        [a, b],
        block_edges,
        &synthesis,
        config.interaction_gate,
    )?;

    dag.add_global_phase(snap_phase(form1.phase + form2.phase + psi));
    ctx.consumed.extend(created);
    ctx.replacements += 1;
    debug!(
        "Merged nodes {} and {} on ({}, {}) into {} interactions{}",
        v1.index(),
        v2.index(),
        a,
        b,
        synthesis.entanglers(),
        if synthesis.swap { " and a SWAP" } else { "" }
    );
    if synthesis.swap {
        ctx.permutation.swap(a, b);
    }
    Ok(true)
}

/// Rewrite the DAG: emit the synthesised block at `edges`, then replace the
/// two interactions by their locals. Returns the created nodes.
#[allow(clippy::too_many_arguments)]
fn splice(
    dag: &mut CircuitDag,
    v1: NodeIndex,
    v2: NodeIndex,
    (first, second): (&Instruction, &Instruction),
    wires: [QubitId; 2],
    edges: [EdgeIndex; 2],
    synthesis: &Synthesis,
    gate: InteractionGate,
) -> CompileResult<Vec<NodeIndex>> {
    let mut created = Vec::new();

    let mut before = Vec::with_capacity(2);
    let mut after = Vec::with_capacity(2);
    for &wire in &wires {
        let missing = || CompileError::invariant(PASS, format!("wire {wire} is broken"));
        before.push(dag.wire_predecessor(v1, wire).ok_or_else(missing)?);
        after.push(dag.wire_successor(v2, wire).ok_or_else(missing)?);
    }

    let mut cursor = edges;
    let mut entangler = None;
    if let Some(pre) = synthesis.pre {
        emit_locals(dag, wires, &mut cursor, &mut created, pre)?;
        let inst = Instruction::two_qubit_gate(gate.standard_gate(), wires[0], wires[1]);
        let node = dag.insert_on_edges(inst, &cursor)?;
        for (k, &wire) in wires.iter().enumerate() {
            cursor[k] = edge_after(dag, node, wire)?;
        }
        created.push(node);
        entangler = Some(node);
    }
    emit_locals(dag, wires, &mut cursor, &mut created, synthesis.post)?;

    dag.remove_op(v1).map_err(CompileError::Ir)?;
    for (k, &wire) in wires.iter().enumerate() {
        let Some(local) = local_at(first, wire) else {
            continue;
        };
        for inst in local.instructions(wire).collect::<Vec<_>>().into_iter().rev() {
            let edge = edge_after(dag, before[k], wire)?;
            created.push(dag.insert_on_edges(inst, &[edge])?);
        }
    }

    dag.remove_op(v2).map_err(CompileError::Ir)?;
    for (k, &wire) in wires.iter().enumerate() {
        let Some(local) = local_at(second, wire) else {
            continue;
        };
        for inst in local.instructions(wire) {
            let edge = edge_before(dag, after[k], wire)?;
            created.push(dag.insert_on_edges(inst, &[edge])?);
        }
    }

    if synthesis.swap {
        if let Some(node) = entangler {
            dag.exchange_wires_after(node, wires[0], wires[1])
                .map_err(broken(PASS))?;
        }
    }
    Ok(created)
}

/// The edge leaving `node` on `wire`.
fn edge_after(dag: &CircuitDag, node: NodeIndex, wire: QubitId) -> CompileResult<EdgeIndex> {
    dag.out_edge_on_wire(node, wire).ok_or_else(|| {
        CompileError::invariant(PASS, format!("wire {wire} is broken at node {}", node.index()))
    })
}

/// The edge entering `node` on `wire`.
fn edge_before(dag: &CircuitDag, node: NodeIndex, wire: QubitId) -> CompileResult<EdgeIndex> {
    dag.in_edge_on_wire(node, wire).ok_or_else(|| {
        CompileError::invariant(PASS, format!("wire {wire} is broken at node {}", node.index()))
    })
}

/// Emit `locals` on `wires` at the cursor edges, advancing the cursors.
fn emit_locals(
    dag: &mut CircuitDag,
    wires: [QubitId; 2],
    cursor: &mut [EdgeIndex; 2],
    created: &mut Vec<NodeIndex>,
    locals: [Clifford1; 2],
) -> CompileResult<()> {
    for (k, local) in locals.into_iter().enumerate() {
        for inst in local.instructions(wires[k]) {
            let node = dag.insert_on_edges(inst, &[cursor[k]])?;
            cursor[k] = edge_after(dag, node, wires[k])?;
            created.push(node);
        }
    }
    Ok(())
}

/// The non-trivial local of `inst`'s interaction on `wire`.
fn local_at(inst: &Instruction, wire: QubitId) -> Option<Clifford1> {
    let form = instruction_form(inst)?;
    let local = form.locals[inst.qubit_position(wire)?];
    (!local.is_identity()).then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unitary::Unitary2x2;

    #[test]
    fn test_local_product_needs_no_interaction() {
        let target = Unitary4x4::kron(&Unitary2x2::s(), &Unitary2x2::sx());
        let synthesis = synthesize(&target, &CliffordConfig::default()).unwrap();
        assert_eq!(synthesis.entanglers(), 0);
        assert!(
            target
                .phase_relative(&synthesis.matrix(InteractionGate::ZzMax))
                .is_some()
        );
    }

    #[test]
    fn test_cx_resynthesised_with_zzmax() {
        let synthesis = synthesize(&Unitary4x4::cx(), &CliffordConfig::default()).unwrap();
        assert_eq!(synthesis.entanglers(), 1);
        assert!(!synthesis.swap);
        let emitted = synthesis.matrix(InteractionGate::ZzMax);
        assert!(Unitary4x4::cx().phase_relative(&emitted).is_some());
    }

    #[test]
    fn test_swap_needs_permutation() {
        let target = Unitary4x4::cx().mul(&Unitary4x4::cx().reversed());
        let config = CliffordConfig::default().with_interaction_gate(InteractionGate::Cx);
        assert!(synthesize(&target, &config).is_none());

        let synthesis = synthesize(&target, &config.with_allow_swaps(true)).unwrap();
        assert!(synthesis.swap);
        let emitted = synthesis.matrix(InteractionGate::Cx);
        assert!(target.phase_relative(&emitted).is_some());
    }

    #[test]
    fn test_moved_interaction_sign() {
        let form = super::super::interaction::interaction_form(&bubble_ir::StandardGate::CX)
            .unwrap();
        let plain = moved_interaction(
            form,
            [
                SignedPauli::positive(form.paulis[0]),
                SignedPauli::positive(form.paulis[1]),
            ],
        );
        let flipped = moved_interaction(
            form,
            [
                SignedPauli::negated(form.paulis[0]),
                SignedPauli::positive(form.paulis[1]),
            ],
        );
        assert!(plain.mul(&flipped).phase_relative(&Unitary4x4::identity()).is_some());
    }

    #[test]
    fn test_swap_gates_become_wire_labels() {
        let mut circuit = bubble_ir::Circuit::with_size("relabel", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.swap(QubitId(0), QubitId(1)).unwrap();
        circuit.t(QubitId(1)).unwrap();
        circuit.swap(QubitId(1), QubitId(2)).unwrap();
        circuit.x(QubitId(2)).unwrap();

        let mut dag = circuit.dag().clone();
        let kept = MultiQubitCliffordReplacement::new(false).replace(&mut dag).unwrap();
        assert!(!kept.report.changed);
        assert_eq!(dag.num_ops(), 5);

        let mut dag = circuit.into_dag();
        let outcome = MultiQubitCliffordReplacement::new(true).replace(&mut dag).unwrap();
        dag.verify_integrity().unwrap();
        assert!(outcome.report.changed);
        assert_eq!(outcome.report.replacements, 0);

        let names: Vec<_> = dag
            .wire_ops(QubitId(0))
            .into_iter()
            .filter_map(|node| dag.get_instruction(node))
            .map(|inst| inst.name().to_string())
            .collect();
        assert_eq!(names, ["h", "t", "x"]);
        assert_eq!(dag.num_ops(), 3);

        let perm = outcome.permutation;
        assert_eq!(perm.logical(QubitId(0)), QubitId(2));
        assert_eq!(perm.logical(QubitId(1)), QubitId(0));
        assert_eq!(perm.logical(QubitId(2)), QubitId(1));
    }
}
