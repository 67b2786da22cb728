//! Verification passes for ensuring compilation correctness.
//!
//! These passes check that the rewrites before them left a well-formed
//! circuit behind: every wire a single path from its input to its output,
//! every operation wired to exactly its operands, and the wire order
//! consistent with one topological order of the whole DAG.

use rustc_hash::FxHashMap;
use tracing::debug;

use bubble_ir::{CircuitDag, DagNode, NodeIndex, WireId};
use petgraph::visit::EdgeRef;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

const PASS: &str = "integrity_verification";

/// Result of integrity verification.
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    /// Whether the verification passed.
    pub passed: bool,
    /// Number of qubit wires walked.
    pub qubits_checked: usize,
    /// Number of operations visited along those wires.
    pub ops_checked: usize,
}

/// Analysis pass that verifies the DAG is still a valid circuit.
///
/// Runs the structural check of [`CircuitDag::verify_integrity`] and then
/// walks each qubit wire from its input node, confirming that the
/// topological position of each operation increases along the wire and
/// that the global phase is finite.
///
/// This pass should be added after all optimization passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrityVerification;

impl IntegrityVerification {
    /// Create the pass.
    pub fn new() -> Self {
        Self
    }

    /// Check `dag` and return what was checked.
    pub fn verify(&self, dag: &CircuitDag) -> CompileResult<VerificationResult> {
        dag.verify_integrity()
            .map_err(|err| CompileError::invariant(PASS, err.to_string()))?;

        if !dag.global_phase().is_finite() {
            return Err(CompileError::invariant(
                PASS,
                format!("global phase is {}", dag.global_phase()),
            ));
        }

        let positions: FxHashMap<NodeIndex, usize> = dag
            .topological_ops()
            .map_err(|err| CompileError::invariant(PASS, err.to_string()))?
            .into_iter()
            .enumerate()
            .map(|(position, (node, _))| (node, position))
            .collect();

        let graph = dag.graph();
        let mut ops_checked = 0;
        let qubits = dag.qubits();
        for &qubit in &qubits {
            let wire = WireId::Qubit(qubit);
            let Some(mut current) = dag.qubit_input_node(qubit) else {
                return Err(CompileError::invariant(
                    PASS,
                    format!("qubit {qubit} has no input node"),
                ));
            };

            let mut prev_position: Option<usize> = None;
            while let Some(next) = graph
                .edges_directed(current, petgraph::Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target())
            {
                if let DagNode::Op(inst) = &graph[next] {
                    ops_checked += 1;
                    let position = positions.get(&next).copied();
                    if let (Some(prev), Some(curr)) = (prev_position, position) {
                        if curr < prev {
                            return Err(CompileError::invariant(
                                PASS,
                                format!(
                                    "'{}' at node {} on {} precedes its wire predecessor \
                                     in topological order",
                                    inst.name(),
                                    next.index(),
                                    qubit
                                ),
                            ));
                        }
                    }
                    prev_position = position;
                }
                current = next;
            }
        }

        debug!(
            "Integrity verification: {} qubits, {} operations checked",
            qubits.len(),
            ops_checked
        );
        Ok(VerificationResult {
            passed: true,
            qubits_checked: qubits.len(),
            ops_checked,
        })
    }
}

impl Pass for IntegrityVerification {
    fn name(&self) -> &'static str {
        PASS
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let result = self.verify(dag)?;
        properties.insert(result);
        Ok(())
    }
}
