//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::stable_graph::{
    EdgeIndex as PetEdgeIndex, NodeIndex as PetNodeIndex, StableDiGraph,
};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
///
/// Indices are stable: removing a node never renumbers the others.
pub type NodeIndex = PetNodeIndex<u32>;

/// Edge index type for the circuit DAG.
pub type EdgeIndex = PetEdgeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }

    /// Get mutable reference to the instruction.
    #[inline]
    pub fn instruction_mut(&mut self) -> Option<&mut Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// DAG-based circuit representation.
///
/// The circuit is a directed acyclic graph where:
/// - Nodes are input nodes, output nodes, or operation nodes
/// - Edges are wire segments (quantum or classical)
/// - Each wire has exactly one input and one output node, and its edges
///   form a single path from the former to the latter
///
/// The graph is a [`StableDiGraph`], so node and edge indices held by a
/// pass stay valid while other nodes are removed.
///
/// A `wire_front` index maps each wire to the node just before its output
/// node, which keeps [`CircuitDag::apply`] O(1) per operand.
#[derive(Debug, Clone)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: StableDiGraph<DagNode, DagEdge, u32>,
    /// Map from qubit to its input node.
    qubit_inputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from qubit to its output node.
    qubit_outputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from classical bit to its input node.
    clbit_inputs: FxHashMap<ClbitId, NodeIndex>,
    /// Map from classical bit to its output node.
    clbit_outputs: FxHashMap<ClbitId, NodeIndex>,
    /// Node just before the output node, per wire.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Global phase of the circuit, in radians.
    global_phase: f64,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::default(),
            qubit_inputs: FxHashMap::default(),
            qubit_outputs: FxHashMap::default(),
            clbit_inputs: FxHashMap::default(),
            clbit_outputs: FxHashMap::default(),
            wire_front: FxHashMap::default(),
            global_phase: 0.0,
        }
    }

    /// Add a qubit to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.qubit_inputs.contains_key(&qubit) {
            return;
        }
        let (in_node, out_node) = self.add_wire(WireId::Qubit(qubit));
        self.qubit_inputs.insert(qubit, in_node);
        self.qubit_outputs.insert(qubit, out_node);
    }

    /// Add a classical bit to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.clbit_inputs.contains_key(&clbit) {
            return;
        }
        let (in_node, out_node) = self.add_wire(WireId::Clbit(clbit));
        self.clbit_inputs.insert(clbit, in_node);
        self.clbit_outputs.insert(clbit, out_node);
    }

    fn add_wire(&mut self, wire: WireId) -> (NodeIndex, NodeIndex) {
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.wire_front.insert(wire, in_node);
        (in_node, out_node)
    }

    /// Check arity, operand existence and operand uniqueness.
    #[allow(clippy::cast_possible_truncation)]
    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits() as usize;
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: expected as u32,
                    got: got as u32,
                });
            }
        }

        for &qubit in &instruction.qubits {
            if !self.qubit_inputs.contains_key(&qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if !self.clbit_inputs.contains_key(&clbit) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Append an instruction at the end of its wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;

        let wires: Vec<WireId> = instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();

        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for wire in wires {
            let out_node = self.output_node(wire)?;
            let prev_node = self.wire_front[&wire];

            let eid = self
                .graph
                .edges_directed(prev_node, Direction::Outgoing)
                .find(|e| e.weight().wire == wire && e.target() == out_node)
                .map(|e| e.id())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "missing edge from wire front to output on {wire:?}"
                    ))
                })?;
            self.graph.remove_edge(eid);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    fn output_node(&self, wire: WireId) -> IrResult<NodeIndex> {
        let node = match wire {
            WireId::Qubit(q) => self.qubit_outputs.get(&q),
            WireId::Clbit(c) => self.clbit_outputs.get(&c),
        };
        node.copied().ok_or(IrError::InvalidNode)
    }

    /// Insert a quantum instruction onto existing wire edges.
    ///
    /// `edges[i]` must carry the wire of `instruction.qubits[i]`. Each edge
    /// `s → t` is split into `s → new → t`. The caller is responsible for
    /// choosing edges whose combination keeps the graph acyclic; see
    /// [`CircuitDag::reachable`].
    pub fn insert_on_edges(
        &mut self,
        instruction: Instruction,
        edges: &[EdgeIndex],
    ) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;
        if !instruction.clbits.is_empty() {
            return Err(IrError::InvalidDag(
                "cannot splice an instruction with classical operands".into(),
            ));
        }
        if edges.len() != instruction.qubits.len() {
            return Err(IrError::InvalidDag(format!(
                "'{}' needs {} insertion edges, got {}",
                instruction.name(),
                instruction.qubits.len(),
                edges.len()
            )));
        }

        let mut endpoints = Vec::with_capacity(edges.len());
        for (&edge, &qubit) in edges.iter().zip(&instruction.qubits) {
            let wire = WireId::Qubit(qubit);
            match (self.graph.edge_weight(edge), self.graph.edge_endpoints(edge)) {
                (Some(weight), Some((source, target))) if weight.wire == wire => {
                    endpoints.push((edge, wire, source, target));
                }
                _ => {
                    return Err(IrError::WireEdgeMismatch {
                        edge: edge.index(),
                        qubit,
                    });
                }
            }
        }

        let op_node = self.graph.add_node(DagNode::Op(instruction));
        for (edge, wire, source, target) in endpoints {
            self.graph.remove_edge(edge);
            self.graph.add_edge(source, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, target, DagEdge { wire });
            if self.output_node(wire)? == target {
                self.wire_front.insert(wire, op_node);
            }
        }
        Ok(op_node)
    }

    /// Insert a single-qubit instruction directly before `node` on `qubit`.
    pub fn insert_before(
        &mut self,
        node: NodeIndex,
        instruction: Instruction,
    ) -> IrResult<NodeIndex> {
        let qubit = single_operand(&instruction)?;
        let edge = self
            .in_edge_on_wire(node, qubit)
            .ok_or(IrError::QubitNotFound {
                qubit,
                gate_name: Some(instruction.name().to_string()),
            })?;
        self.insert_on_edges(instruction, &[edge])
    }

    /// Insert a single-qubit instruction directly after `node` on `qubit`.
    pub fn insert_after(
        &mut self,
        node: NodeIndex,
        instruction: Instruction,
    ) -> IrResult<NodeIndex> {
        let qubit = single_operand(&instruction)?;
        let edge = self
            .out_edge_on_wire(node, qubit)
            .ok_or(IrError::QubitNotFound {
                qubit,
                gate_name: Some(instruction.name().to_string()),
            })?;
        self.insert_on_edges(instruction, &[edge])
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> IrResult<Vec<(NodeIndex, &Instruction)>> {
        let sorted = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            IrError::InvalidDag(format!(
                "cycle detected through node {}",
                cycle.node_id().index()
            ))
        })?;
        Ok(sorted
            .into_iter()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
            .collect())
    }

    /// Get a node by index.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(node)
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(|n| n.instruction())
    }

    /// Get a mutable instruction by node index.
    ///
    /// Changing the operand list through this reference breaks the wire
    /// structure; only the kind may be replaced.
    #[inline]
    pub fn get_instruction_mut(&mut self, node: NodeIndex) -> Option<&mut Instruction> {
        self.graph
            .node_weight_mut(node)
            .and_then(|n| n.instruction_mut())
    }

    /// Remove an operation node, reconnecting each of its wires.
    pub fn remove_op(&mut self, node: NodeIndex) -> IrResult<Instruction> {
        match self.graph.node_weight(node) {
            Some(DagNode::Op(_)) => {}
            Some(_) => {
                return Err(IrError::InvalidDag(
                    "Cannot remove non-operation node".into(),
                ));
            }
            None => return Err(IrError::InvalidNode),
        }

        let incoming: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight().wire))
            .collect();
        let outgoing: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().wire))
            .collect();

        for (pred, wire) in &incoming {
            if self.wire_front.get(wire) == Some(&node) {
                self.wire_front.insert(*wire, *pred);
            }
        }

        let Some(DagNode::Op(instruction)) = self.graph.remove_node(node) else {
            return Err(IrError::InvalidNode);
        };

        for (pred, wire) in &incoming {
            for (succ, succ_wire) in &outgoing {
                if wire == succ_wire {
                    self.graph.add_edge(*pred, *succ, DagEdge { wire: *wire });
                }
            }
        }

        Ok(instruction)
    }

    /// The edge entering `node` on the wire of `qubit`.
    pub fn in_edge_on_wire(&self, node: NodeIndex, qubit: QubitId) -> Option<EdgeIndex> {
        let wire = WireId::Qubit(qubit);
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.id())
    }

    /// The edge leaving `node` on the wire of `qubit`.
    pub fn out_edge_on_wire(&self, node: NodeIndex, qubit: QubitId) -> Option<EdgeIndex> {
        let wire = WireId::Qubit(qubit);
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.id())
    }

    /// The next node on the wire of `qubit` after `node` (possibly the
    /// wire's output node).
    pub fn wire_successor(&self, node: NodeIndex, qubit: QubitId) -> Option<NodeIndex> {
        self.out_edge_on_wire(node, qubit)
            .and_then(|e| self.graph.edge_endpoints(e))
            .map(|(_, target)| target)
    }

    /// The previous node on the wire of `qubit` before `node` (possibly the
    /// wire's input node).
    pub fn wire_predecessor(&self, node: NodeIndex, qubit: QubitId) -> Option<NodeIndex> {
        self.in_edge_on_wire(node, qubit)
            .and_then(|e| self.graph.edge_endpoints(e))
            .map(|(source, _)| source)
    }

    /// Source and target of an edge.
    #[inline]
    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// The wire an edge belongs to.
    #[inline]
    pub fn edge_wire(&self, edge: EdgeIndex) -> Option<WireId> {
        self.graph.edge_weight(edge).map(|w| w.wire)
    }

    /// Operation nodes on the wire of `qubit`, from input to output.
    pub fn wire_ops(&self, qubit: QubitId) -> Vec<NodeIndex> {
        let mut ops = Vec::new();
        let Some(&start) = self.qubit_inputs.get(&qubit) else {
            return ops;
        };
        let mut current = start;
        while let Some(next) = self.wire_successor(current, qubit) {
            if !self.graph[next].is_op() {
                break;
            }
            ops.push(next);
            current = next;
        }
        ops
    }

    /// Whether a directed path leads from `from` to `to`. A node reaches
    /// itself.
    pub fn reachable(&self, from: NodeIndex, to: NodeIndex) -> bool {
        petgraph::algo::has_path_connecting(&self.graph, from, to, None)
    }

    /// Exchange the roles of wires `a` and `b` downstream of `node`.
    ///
    /// `node` must act on both wires. Every later edge on `a` is relabelled
    /// `b` and vice versa, every later instruction has its operands
    /// exchanged, and the two output nodes trade places. The circuit after
    /// the call equals the old circuit with a SWAP of `a` and `b` placed
    /// directly after `node`, followed by a second SWAP of the two outputs.
    pub fn exchange_wires_after(
        &mut self,
        node: NodeIndex,
        a: QubitId,
        b: QubitId,
    ) -> IrResult<()> {
        let chain_a = self.wire_chain_after(node, a)?;
        let chain_b = self.wire_chain_after(node, b)?;

        let mut touched: Vec<NodeIndex> = Vec::new();
        let mut seen = FxHashSet::default();
        for &(_, target) in chain_a.iter().chain(&chain_b) {
            if self.graph[target].is_op() && seen.insert(target) {
                touched.push(target);
            }
        }

        for &(edge, _) in &chain_a {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.wire = WireId::Qubit(b);
            }
        }
        for &(edge, _) in &chain_b {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.wire = WireId::Qubit(a);
            }
        }
        for op in touched {
            if let Some(inst) = self.get_instruction_mut(op) {
                inst.exchange_qubits(a, b);
            }
        }

        let out_a = self.output_node(WireId::Qubit(a))?;
        let out_b = self.output_node(WireId::Qubit(b))?;
        self.graph[out_a] = DagNode::Out(WireId::Qubit(b));
        self.graph[out_b] = DagNode::Out(WireId::Qubit(a));
        self.qubit_outputs.insert(a, out_b);
        self.qubit_outputs.insert(b, out_a);

        let front_a = self.wire_front.get(&WireId::Qubit(a)).copied();
        let front_b = self.wire_front.get(&WireId::Qubit(b)).copied();
        if let (Some(front_a), Some(front_b)) = (front_a, front_b) {
            self.wire_front.insert(WireId::Qubit(a), front_b);
            self.wire_front.insert(WireId::Qubit(b), front_a);
        }
        Ok(())
    }

    /// Edges (with their targets) on the wire of `qubit` after `node`, up
    /// to and including the edge into the output node.
    fn wire_chain_after(
        &self,
        node: NodeIndex,
        qubit: QubitId,
    ) -> IrResult<Vec<(EdgeIndex, NodeIndex)>> {
        let mut chain = Vec::new();
        let mut current = node;
        let limit = self.graph.edge_count();
        loop {
            let edge = self
                .out_edge_on_wire(current, qubit)
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "wire {qubit} is broken after node {}",
                        current.index()
                    ))
                })?;
            let (_, target) = self.graph.edge_endpoints(edge).ok_or(IrError::InvalidNode)?;
            chain.push((edge, target));
            if !self.graph[target].is_op() {
                return Ok(chain);
            }
            if chain.len() > limit {
                return Err(IrError::InvalidDag(format!(
                    "wire {qubit} does not terminate"
                )));
            }
            current = target;
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubit_inputs.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbit_inputs.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        let io_nodes = 2 * (self.qubit_inputs.len() + self.clbit_inputs.len());
        self.graph.node_count().saturating_sub(io_nodes)
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> IrResult<usize> {
        let order = petgraph::algo::toposort(&self.graph, None)
            .map_err(|_| IrError::InvalidDag("Graph contains a cycle".into()))?;
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(order.len(), Default::default());

        let mut max_depth = 0usize;
        for node in order {
            let max_pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let node_depth = max_pred_depth + usize::from(self.graph[node].is_op());
            max_depth = max_depth.max(node_depth);
            depths.insert(node, node_depth);
        }
        Ok(max_depth)
    }

    /// Qubits of the circuit in ascending order.
    pub fn qubits(&self) -> Vec<QubitId> {
        let mut qubits: Vec<_> = self.qubit_inputs.keys().copied().collect();
        qubits.sort_unstable();
        qubits
    }

    /// Classical bits of the circuit in ascending order.
    pub fn clbits(&self) -> Vec<ClbitId> {
        let mut clbits: Vec<_> = self.clbit_inputs.keys().copied().collect();
        clbits.sort_unstable();
        clbits
    }

    /// Get the input node for a qubit.
    #[inline]
    pub fn qubit_input_node(&self, qubit: QubitId) -> Option<NodeIndex> {
        self.qubit_inputs.get(&qubit).copied()
    }

    /// Get the output node for a qubit.
    #[inline]
    pub fn qubit_output_node(&self, qubit: QubitId) -> Option<NodeIndex> {
        self.qubit_outputs.get(&qubit).copied()
    }

    /// Get the global phase, in radians.
    pub fn global_phase(&self) -> f64 {
        self.global_phase
    }

    /// Set the global phase.
    pub fn set_global_phase(&mut self, phase: f64) {
        self.global_phase = phase;
    }

    /// Add to the global phase, keeping it in `(-π, π]`.
    pub fn add_global_phase(&mut self, delta: f64) {
        use std::f64::consts::PI;
        let mut phase = (self.global_phase + delta).rem_euclid(2.0 * PI);
        if phase > PI {
            phase -= 2.0 * PI;
        }
        self.global_phase = phase;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &StableDiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - The graph is acyclic
    /// - Every wire has matching In and Out nodes, and its edges form one
    ///   path between them
    /// - Every operation has exactly one incoming and one outgoing edge per
    ///   operand wire, and no edges on other wires
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        for &qubit in self.qubit_inputs.keys() {
            if !self.qubit_outputs.contains_key(&qubit) {
                return Err(IrError::InvalidDag(format!(
                    "Qubit {qubit} has an In node but no Out node"
                )));
            }
        }
        for &clbit in self.clbit_inputs.keys() {
            if !self.clbit_outputs.contains_key(&clbit) {
                return Err(IrError::InvalidDag(format!(
                    "Clbit {clbit} has an In node but no Out node"
                )));
            }
        }

        let wires = self
            .qubit_inputs
            .iter()
            .map(|(&q, &n)| (WireId::Qubit(q), n))
            .chain(self.clbit_inputs.iter().map(|(&c, &n)| (WireId::Clbit(c), n)));
        for (wire, in_node) in wires {
            self.verify_wire(wire, in_node)?;
        }

        for node in self.graph.node_indices() {
            let DagNode::Op(inst) = &self.graph[node] else {
                continue;
            };
            let operand_wires: Vec<WireId> = inst
                .qubits
                .iter()
                .map(|&q| WireId::Qubit(q))
                .chain(inst.clbits.iter().map(|&c| WireId::Clbit(c)))
                .collect();
            for direction in [Direction::Incoming, Direction::Outgoing] {
                let mut wires: Vec<WireId> = self
                    .graph
                    .edges_directed(node, direction)
                    .map(|e| e.weight().wire)
                    .collect();
                if wires.len() != operand_wires.len()
                    || operand_wires.iter().any(|w| {
                        let pos = wires.iter().position(|x| x == w);
                        pos.map(|p| wires.swap_remove(p)).is_none()
                    })
                {
                    return Err(IrError::InvalidDag(format!(
                        "operation '{}' at node {} is not wired to exactly its operands",
                        inst.name(),
                        node.index()
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_wire(&self, wire: WireId, in_node: NodeIndex) -> IrResult<()> {
        let out_node = self.output_node(wire)?;
        if self.graph.node_weight(out_node) != Some(&DagNode::Out(wire)) {
            return Err(IrError::InvalidDag(format!(
                "output node of {wire:?} is labelled for another wire"
            )));
        }

        let mut current = in_node;
        let mut steps = 0;
        let max_steps = self.graph.node_count();
        while current != out_node {
            current = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Wire {wire:?} is broken: no outgoing edge from node {}",
                        current.index()
                    ))
                })?;
            steps += 1;
            if steps > max_steps {
                return Err(IrError::InvalidDag(format!(
                    "Wire {wire:?} has too many steps (possible infinite loop)"
                )));
            }
        }
        Ok(())
    }
}

fn single_operand(instruction: &Instruction) -> IrResult<QubitId> {
    match instruction.qubits.as_slice() {
        [q] => Ok(*q),
        other => Err(IrError::QubitCountMismatch {
            gate_name: instruction.name().to_string(),
            expected: 1,
            got: u32::try_from(other.len()).unwrap_or(u32::MAX),
        }),
    }
}

impl Default for CircuitDag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn two_qubit_dag() -> CircuitDag {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag
    }

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new();
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth().unwrap(), 0);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_bell_state_depth() {
        let mut dag = two_qubit_dag();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::two_qubit_gate(
            StandardGate::CX,
            QubitId(0),
            QubitId(1),
        ))
        .unwrap();

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth().unwrap(), 2);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_gate_arity_mismatch() {
        let mut dag = two_qubit_dag();
        let result = dag.apply(Instruction::gate(StandardGate::CX, [QubitId(0)]));
        match result {
            Err(IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }) => {
                assert_eq!(gate_name, "cx");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("Expected QubitCountMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn test_qubit_not_found_with_context() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(99));
        match dag.apply(inst) {
            Err(IrError::QubitNotFound { qubit, gate_name }) => {
                assert_eq!(qubit, QubitId(99));
                assert_eq!(gate_name, Some("cx".to_string()));
            }
            other => panic!("Expected QubitNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_indices_survive_removal() {
        let mut dag = two_qubit_dag();
        let h = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let cx = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        let s = dag
            .apply(Instruction::single_qubit_gate(StandardGate::S, QubitId(1)))
            .unwrap();

        dag.remove_op(h).unwrap();
        assert_eq!(dag.get_instruction(cx).unwrap().name(), "cx");
        assert_eq!(dag.get_instruction(s).unwrap().name(), "s");
        assert_eq!(dag.wire_ops(QubitId(0)), vec![cx]);
        assert_eq!(dag.wire_ops(QubitId(1)), vec![cx, s]);
        dag.verify_integrity().unwrap();

        dag.remove_op(s).unwrap();
        dag.apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(1)))
            .unwrap();
        assert_eq!(dag.wire_ops(QubitId(1)).len(), 2);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_wire_navigation() {
        let mut dag = two_qubit_dag();
        let h = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let cx = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();

        assert_eq!(dag.wire_successor(h, QubitId(0)), Some(cx));
        assert_eq!(dag.wire_predecessor(cx, QubitId(0)), Some(h));
        assert_eq!(
            dag.wire_predecessor(cx, QubitId(1)),
            dag.qubit_input_node(QubitId(1))
        );
        assert_eq!(
            dag.wire_successor(cx, QubitId(1)),
            dag.qubit_output_node(QubitId(1))
        );
        assert!(dag.wire_successor(h, QubitId(1)).is_none());

        let edge = dag.out_edge_on_wire(h, QubitId(0)).unwrap();
        assert_eq!(dag.edge_endpoints(edge), Some((h, cx)));
        assert_eq!(dag.edge_wire(edge), Some(WireId::Qubit(QubitId(0))));
    }

    #[test]
    fn test_insert_on_edges_splits_both_wires() {
        let mut dag = two_qubit_dag();
        let a = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let b = dag
            .apply(Instruction::single_qubit_gate(StandardGate::S, QubitId(1)))
            .unwrap();
        let e0 = dag.out_edge_on_wire(a, QubitId(0)).unwrap();
        let e1 = dag.in_edge_on_wire(b, QubitId(1)).unwrap();

        let cz = dag
            .insert_on_edges(
                Instruction::two_qubit_gate(StandardGate::CZ, QubitId(0), QubitId(1)),
                &[e0, e1],
            )
            .unwrap();

        assert_eq!(dag.wire_ops(QubitId(0)), vec![a, cz]);
        assert_eq!(dag.wire_ops(QubitId(1)), vec![cz, b]);
        dag.verify_integrity().unwrap();

        // Appending after a splice at the end of wire 0 must follow the new op.
        let x = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
            .unwrap();
        assert_eq!(dag.wire_ops(QubitId(0)), vec![a, cz, x]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_insert_on_edges_rejects_wrong_wire() {
        let mut dag = two_qubit_dag();
        let a = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let e0 = dag.out_edge_on_wire(a, QubitId(0)).unwrap();
        let result = dag.insert_on_edges(
            Instruction::single_qubit_gate(StandardGate::X, QubitId(1)),
            &[e0],
        );
        assert!(matches!(result, Err(IrError::WireEdgeMismatch { .. })));
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut dag = two_qubit_dag();
        let cx = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        let before = dag
            .insert_before(cx, Instruction::single_qubit_gate(StandardGate::S, QubitId(1)))
            .unwrap();
        let after = dag
            .insert_after(cx, Instruction::single_qubit_gate(StandardGate::Z, QubitId(0)))
            .unwrap();
        assert_eq!(dag.wire_ops(QubitId(1)), vec![before, cx]);
        assert_eq!(dag.wire_ops(QubitId(0)), vec![cx, after]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_reachability_follows_wires() {
        let mut dag = CircuitDag::new();
        for q in 0..3 {
            dag.add_qubit(QubitId(q));
        }
        let first = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        let second = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(1),
                QubitId(2),
            ))
            .unwrap();
        let lone = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();

        assert!(dag.reachable(first, second));
        assert!(!dag.reachable(second, first));
        assert!(dag.reachable(first, lone));
        assert!(!dag.reachable(lone, second));
        assert!(dag.reachable(lone, lone));
    }

    #[test]
    fn test_exchange_wires_after() {
        let mut dag = CircuitDag::new();
        for q in 0..3 {
            dag.add_qubit(QubitId(q));
        }
        let cx = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        let h = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let cz = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CZ,
                QubitId(1),
                QubitId(2),
            ))
            .unwrap();

        dag.exchange_wires_after(cx, QubitId(0), QubitId(1)).unwrap();
        dag.verify_integrity().unwrap();

        assert_eq!(dag.get_instruction(h).unwrap().qubits, vec![QubitId(1)]);
        assert_eq!(
            dag.get_instruction(cz).unwrap().qubits,
            vec![QubitId(0), QubitId(2)]
        );
        assert_eq!(dag.wire_ops(QubitId(0)), vec![cx, cz]);
        assert_eq!(dag.wire_ops(QubitId(1)), vec![cx, h]);

        // Appending still lands at the end of the relabelled wires.
        let x = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(1)))
            .unwrap();
        assert_eq!(dag.wire_ops(QubitId(1)), vec![cx, h, x]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_global_phase_wraps() {
        use std::f64::consts::PI;
        let mut dag = CircuitDag::new();
        dag.add_global_phase(0.75 * PI);
        dag.add_global_phase(0.5 * PI);
        assert!((dag.global_phase() + 0.75 * PI).abs() < 1e-12);
    }
}
