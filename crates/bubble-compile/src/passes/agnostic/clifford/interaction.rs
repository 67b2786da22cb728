//! Two-qubit Clifford interactions and their Pauli frames.
//!
//! Each supported entangling gate `G` on operands `(q0, q1)` factors as
//!
//! ```text
//! G = e^{iφ} · (L0 ⊗ L1) · exp(-i·s·π/4 · P0⊗P1)
//! ```
//!
//! where the locals `L0`, `L1` are single-qubit Cliffords that commute
//! with the exponential. The factorisation is derived numerically once and
//! cached.
//!
//! Moving the exponential along a wire through a single-qubit Clifford
//! conjugates its Pauli on that wire; a sign flip on either side flips `s`.

use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::LazyLock;

use bubble_ir::{CircuitDag, EdgeIndex, Instruction, NodeIndex, QubitId, StandardGate};
use num_complex::Complex64;
use rustc_hash::{FxHashMap, FxHashSet};

use super::clifford1::Clifford1;
use super::pauli::{Pauli, SignedPauli};
use super::{commuting_pauli, single_qubit_clifford};
use crate::unitary::{Unitary2x2, Unitary4x4};

/// The factorised form of a two-qubit Clifford interaction gate.
#[derive(Debug, Clone, Copy)]
pub struct InteractionForm {
    /// Pauli of the exponential on each operand.
    pub paulis: [Pauli; 2],
    /// Whether `s = -1`.
    pub negative: bool,
    /// Local Cliffords applied after the exponential, per operand.
    pub locals: [Clifford1; 2],
    /// The global phase `φ`.
    pub phase: f64,
}

impl InteractionForm {
    fn derive(gate: &StandardGate, paulis: [Pauli; 2], negative: bool) -> Option<Self> {
        let g = Unitary4x4::from_gate(gate)?;
        let core = interaction_matrix(paulis[0], paulis[1], negative);
        let (a, b) = g.mul(&core.dagger()).split_tensor()?;
        let (l0, _) = Clifford1::from_unitary(&a)?;
        let (l1, _) = Clifford1::from_unitary(&b)?;
        let rebuilt = Unitary4x4::kron(&l0.matrix(), &l1.matrix()).mul(&core);
        let phase = g.phase_relative(&rebuilt)?;
        Some(Self {
            paulis,
            negative,
            locals: [l0, l1],
            phase,
        })
    }
}

static FORMS: LazyLock<Vec<(StandardGate, InteractionForm)>> = LazyLock::new(|| {
    [
        (StandardGate::CX, [Pauli::Z, Pauli::X], true),
        (StandardGate::CY, [Pauli::Z, Pauli::Y], true),
        (StandardGate::CZ, [Pauli::Z, Pauli::Z], true),
        (StandardGate::ZZMax, [Pauli::Z, Pauli::Z], false),
    ]
    .into_iter()
    .filter_map(|(gate, paulis, negative)| {
        InteractionForm::derive(&gate, paulis, negative).map(|form| (gate, form))
    })
    .collect()
});

/// The factorised form of `gate`, if it is a two-qubit Clifford interaction.
pub fn interaction_form(gate: &StandardGate) -> Option<&'static InteractionForm> {
    FORMS.iter().find(|(g, _)| g == gate).map(|(_, form)| form)
}

/// The form of an instruction acting as an interaction on two wires.
pub fn instruction_form(inst: &Instruction) -> Option<&'static InteractionForm> {
    if inst.qubits.len() != 2 || !inst.clbits.is_empty() {
        return None;
    }
    inst.standard_gate().and_then(interaction_form)
}

/// `exp(-i·s·π/4 · P⊗Q) = (I - i·s·P⊗Q)/√2`, with `s = -1` when `negative`.
pub fn interaction_matrix(p: Pauli, q: Pauli, negative: bool) -> Unitary4x4 {
    let s = if negative { 1.0 } else { -1.0 };
    let pq = Unitary4x4::kron(&p.matrix(), &q.matrix()).scale(Complex64::new(0.0, s));
    Unitary4x4::identity()
        .add(&pq)
        .scale(Complex64::new(FRAC_1_SQRT_2, 0.0))
}

/// The Pauli of `inst`'s interaction on `qubit`, if it is an interaction
/// acting on that wire.
pub fn pauli_on(inst: &Instruction, qubit: QubitId) -> Option<Pauli> {
    let form = instruction_form(inst)?;
    inst.qubit_position(qubit).map(|pos| form.paulis[pos])
}

/// The local Clifford of `inst`'s interaction on `qubit`.
pub fn local_on(inst: &Instruction, qubit: QubitId) -> Option<Clifford1> {
    let form = instruction_form(inst)?;
    inst.qubit_position(qubit).map(|pos| form.locals[pos])
}

/// The Pauli frame of an interaction on one wire at one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionPoint {
    /// Edge on the wire where the interaction sits.
    pub edge: EdgeIndex,
    /// Source vertex of `edge`.
    pub source: NodeIndex,
    /// Pauli the interaction carries on this wire.
    pub pauli: Pauli,
    /// Whether the Pauli picked up a sign on the way here.
    pub negate: bool,
    /// Whether a replacement in the current round already used this spot.
    pub consumed: bool,
}

impl InteractionPoint {
    /// The frame as a signed Pauli.
    pub fn frame(&self) -> SignedPauli {
        SignedPauli {
            pauli: self.pauli,
            negative: self.negate,
        }
    }
}

/// Time-ordered interaction points on one wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionSequence {
    /// The wire the points lie on.
    pub qubit: QubitId,
    /// Points in causal order.
    pub points: Vec<InteractionPoint>,
}

impl InteractionSequence {
    fn new(qubit: QubitId) -> Self {
        Self {
            qubit,
            points: Vec::new(),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn point(
    dag: &CircuitDag,
    edge: EdgeIndex,
    frame: SignedPauli,
    consumed: &FxHashSet<NodeIndex>,
) -> Option<InteractionPoint> {
    let (source, _) = dag.edge_endpoints(edge)?;
    Some(InteractionPoint {
        edge,
        source,
        pauli: frame.pauli,
        negate: frame.negative,
        consumed: consumed.contains(&source),
    })
}

/// The interactions shared by wires `a` and `b`, as one sequence per wire.
///
/// Each point sits on the edge leaving the interaction, so its source is
/// the interaction itself. Interactions in `consumed` are skipped. Both
/// sequences list the same vertices in the same order.
pub fn interaction_sequences(
    dag: &CircuitDag,
    a: QubitId,
    b: QubitId,
    consumed: &FxHashSet<NodeIndex>,
) -> (InteractionSequence, InteractionSequence) {
    let mut seq_a = InteractionSequence::new(a);
    let mut seq_b = InteractionSequence::new(b);
    for node in dag.wire_ops(a) {
        if consumed.contains(&node) {
            continue;
        }
        let Some(inst) = dag.get_instruction(node) else {
            continue;
        };
        if inst.qubit_position(b).is_none() {
            continue;
        }
        let (Some(pa), Some(pb)) = (pauli_on(inst, a), pauli_on(inst, b)) else {
            continue;
        };
        let ends = (dag.out_edge_on_wire(node, a), dag.out_edge_on_wire(node, b));
        let (Some(ea), Some(eb)) = ends else {
            continue;
        };
        if let (Some(p), Some(q)) = (
            point(dag, ea, SignedPauli::positive(pa), consumed),
            point(dag, eb, SignedPauli::positive(pb), consumed),
        ) {
            seq_a.points.push(p);
            seq_b.points.push(q);
        }
    }
    (seq_a, seq_b)
}

/// The next vertex after `node` on wire `a` that also acts on `b`.
pub fn next_shared_op(
    dag: &CircuitDag,
    node: NodeIndex,
    a: QubitId,
    b: QubitId,
) -> Option<NodeIndex> {
    let mut current = node;
    loop {
        let next = dag.wire_successor(current, a)?;
        let inst = dag.get_instruction(next)?;
        if inst.qubit_position(b).is_some() {
            return Some(next);
        }
        current = next;
    }
}

/// Where the interaction of `earlier` and the interaction of `later` can
/// both be moved to on one wire.
///
/// `earlier` and `later` are consecutive interactions on the wire of
/// `qubit`. The earlier one is pushed forward and the later one pulled
/// back through everything they commute with, conjugating through
/// single-qubit Cliffords. The result lists, in causal order, the edges
/// both reach: `sequence` carries the earlier interaction's frame at each
/// edge and `later_frames` the later one's.
#[derive(Debug, Clone)]
pub struct MeetingPoints {
    /// Shared edges with the earlier interaction's frame.
    pub sequence: InteractionSequence,
    /// The later interaction's frame at the same edges.
    pub later_frames: Vec<SignedPauli>,
}

/// Compute [`MeetingPoints`] for one wire.
pub fn meeting_points(
    dag: &CircuitDag,
    earlier: NodeIndex,
    later: NodeIndex,
    qubit: QubitId,
    consumed: &FxHashSet<NodeIndex>,
) -> MeetingPoints {
    let mut result = MeetingPoints {
        sequence: InteractionSequence::new(qubit),
        later_frames: Vec::new(),
    };
    let start = dag.get_instruction(earlier).and_then(|i| pauli_on(i, qubit));
    let end = dag.get_instruction(later).and_then(|i| pauli_on(i, qubit));
    let (Some(start), Some(end)) = (start, end) else {
        return result;
    };

    let backward = walk_backward(dag, later, earlier, qubit, SignedPauli::positive(end));
    for (edge, frame) in walk_forward(dag, earlier, later, qubit, SignedPauli::positive(start)) {
        if let Some(&later_frame) = backward.get(&edge) {
            if let Some(p) = point(dag, edge, frame, consumed) {
                result.sequence.points.push(p);
                result.later_frames.push(later_frame);
            }
        }
    }
    result
}

/// How a frame passes a vertex on one wire, or `None` if it cannot.
fn pass_through(
    inst: &Instruction,
    qubit: QubitId,
    frame: SignedPauli,
    forward: bool,
) -> Option<SignedPauli> {
    if let Some((c, _)) = single_qubit_clifford(inst) {
        return Some(if forward {
            c.conjugate(frame)
        } else {
            c.conjugate_inverse(frame)
        });
    }
    (commuting_pauli(inst, qubit) == Some(frame.pauli)).then_some(frame)
}

fn walk_forward(
    dag: &CircuitDag,
    from: NodeIndex,
    stop: NodeIndex,
    qubit: QubitId,
    mut frame: SignedPauli,
) -> Vec<(EdgeIndex, SignedPauli)> {
    let mut edges = Vec::new();
    let mut edge = dag.out_edge_on_wire(from, qubit);
    while let Some(e) = edge {
        edges.push((e, frame));
        let Some((_, target)) = dag.edge_endpoints(e) else {
            break;
        };
        if target == stop {
            break;
        }
        let Some(next) = dag
            .get_instruction(target)
            .and_then(|inst| pass_through(inst, qubit, frame, true))
        else {
            break;
        };
        frame = next;
        edge = dag.out_edge_on_wire(target, qubit);
    }
    edges
}

fn walk_backward(
    dag: &CircuitDag,
    from: NodeIndex,
    stop: NodeIndex,
    qubit: QubitId,
    mut frame: SignedPauli,
) -> FxHashMap<EdgeIndex, SignedPauli> {
    let mut edges = FxHashMap::default();
    let mut edge = dag.in_edge_on_wire(from, qubit);
    while let Some(e) = edge {
        edges.insert(e, frame);
        let Some((source, _)) = dag.edge_endpoints(e) else {
            break;
        };
        if source == stop {
            break;
        }
        let Some(next) = dag
            .get_instruction(source)
            .and_then(|inst| pass_through(inst, qubit, frame, false))
        else {
            break;
        };
        frame = next;
        edge = dag.in_edge_on_wire(source, qubit);
    }
    edges
}

/// Matrix of a product of two Paulis acting on `(a, b)` in that order.
pub(crate) fn pauli_pair_matrix(p: Pauli, q: Pauli) -> Unitary4x4 {
    Unitary4x4::kron(&p.matrix(), &q.matrix())
}

/// Write `m` as `e^{iθ}·(P ⊗ Q)`.
pub(crate) fn as_pauli_pair(m: &Unitary4x4) -> Option<(Pauli, Pauli, f64)> {
    Pauli::ALL.into_iter().find_map(|p| {
        Pauli::ALL.into_iter().find_map(|q| {
            m.phase_relative(&pauli_pair_matrix(p, q))
                .map(|theta| (p, q, theta))
        })
    })
}

/// The matrix of a single-qubit operator placed on one operand of a
/// two-qubit gate.
pub(crate) fn on_operand(m: &Unitary2x2, position: usize) -> Unitary4x4 {
    if position == 0 {
        Unitary4x4::kron(m, &Unitary2x2::identity())
    } else {
        Unitary4x4::kron(&Unitary2x2::identity(), m)
    }
}
