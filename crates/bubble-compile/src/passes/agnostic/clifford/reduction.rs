//! Reduction drivers: the sweep/replacement loop and Clifford simp.

use bubble_ir::{CircuitDag, NodeIndex, QubitId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::replacement::replacement_round;
use super::sweep::singleq_clifford_sweep;
use super::{
    CliffordConfig, CliffordReport, ReductionContext, broken, commuting_pauli,
    single_qubit_clifford,
};
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::agnostic::optimization::{FusionScope, fuse_single_qubit_runs};
use crate::property::{PropertySet, QubitPermutation};

/// Upper bound on hyper-squash moves and on simp iterations.
const MAX_SQUASH_ITERATIONS: usize = 1000;

/// What a reduction did and how it left the wires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionOutcome {
    /// Summary counters.
    pub report: CliffordReport,
    /// The wire permutation absorbed by SWAP-aware replacements.
    pub permutation: QubitPermutation,
}

/// Alternate the single-qubit sweep and the multi-qubit replacement,
/// emitting ZZMax, until neither changes the circuit.
///
/// Returns whether the circuit changed. With `allow_swaps` the outputs may
/// end up permuted; [`CliffordReduction::reduce`] reports the permutation.
pub fn clifford_reduction(dag: &mut CircuitDag, allow_swaps: bool) -> CompileResult<bool> {
    let config = CliffordConfig::default().with_allow_swaps(allow_swaps);
    let outcome = CliffordReduction::with_config(config).reduce(dag)?;
    Ok(outcome.report.changed)
}

/// [`clifford_reduction`] interleaved with [`hyper_squash`].
pub fn clifford_simp(dag: &mut CircuitDag, allow_swaps: bool) -> CompileResult<bool> {
    let config = CliffordConfig::default().with_allow_swaps(allow_swaps);
    let outcome = CliffordSimp::with_config(config).simplify(dag)?;
    Ok(outcome.report.changed)
}

/// Fuse single-qubit runs that contain non-Clifford gates and move
/// single-qubit rotations backward through multi-qubit gates they commute
/// with. Returns whether anything changed.
pub fn hyper_squash(dag: &mut CircuitDag) -> CompileResult<bool> {
    let fused = fuse_single_qubit_runs(dag, FusionScope::NonCliffordRuns)?;

    let mut moved = false;
    let mut settled = false;
    for _ in 0..MAX_SQUASH_ITERATIONS {
        match next_commuting_rotation(dag)? {
            Some((node, qubit, before)) => {
                let inst = dag.remove_op(node).map_err(CompileError::Ir)?;
                debug!(
                    "Moving {} on {} before node {}",
                    inst.name(),
                    qubit,
                    before.index()
                );
                dag.insert_before(before, inst)?;
                moved = true;
            }
            None => {
                settled = true;
                break;
            }
        }
    }
    if !settled {
        warn!("Hyper squash did not settle after {MAX_SQUASH_ITERATIONS} moves");
    }
    if moved {
        dag.verify_integrity().map_err(broken("HyperSquash"))?;
    }
    Ok(fused || moved)
}

/// The first non-Clifford single-qubit gate sitting directly after a
/// multi-qubit gate it commutes with on its wire.
fn next_commuting_rotation(
    dag: &CircuitDag,
) -> CompileResult<Option<(NodeIndex, QubitId, NodeIndex)>> {
    for (node, inst) in dag.topological_ops().map_err(broken("HyperSquash"))? {
        if inst.qubits.len() != 1 || single_qubit_clifford(inst).is_some() {
            continue;
        }
        let qubit = inst.qubits[0];
        let Some(axis) = commuting_pauli(inst, qubit) else {
            continue;
        };
        let Some(before) = dag.wire_predecessor(node, qubit) else {
            continue;
        };
        let Some(pred) = dag.get_instruction(before) else {
            continue;
        };
        if pred.qubits.len() >= 2 && commuting_pauli(pred, qubit) == Some(axis) {
            return Ok(Some((node, qubit, before)));
        }
    }
    Ok(None)
}

/// The sweep/replacement loop as a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliffordReduction {
    config: CliffordConfig,
}

impl CliffordReduction {
    /// Create the pass with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the pass with the given options.
    pub fn with_config(config: CliffordConfig) -> Self {
        Self { config }
    }

    /// The pass options.
    pub fn config(&self) -> &CliffordConfig {
        &self.config
    }

    /// Run rounds until nothing changes or the round limit is reached.
    pub fn reduce(&self, dag: &mut CircuitDag) -> CompileResult<ReductionOutcome> {
        self.config.validate()?;
        let mut ctx = ReductionContext::new();
        let mut report = CliffordReport::default();
        let mut settled = false;

        while report.rounds < self.config.max_rounds {
            ctx.begin_round();
            report.rounds += 1;
            let swept = singleq_clifford_sweep(dag)?;
            let replaced = replacement_round(dag, &mut ctx, &self.config)?;
            debug!(
                "Reduction round {}: swept {}, replaced {}",
                report.rounds, swept, replaced
            );
            if !swept && !replaced {
                settled = true;
                break;
            }
            report.changed = true;
        }
        if !settled {
            warn!(
                "Clifford reduction stopped at the round limit of {}",
                self.config.max_rounds
            );
        }

        report.replacements = ctx.replacements;
        Ok(ReductionOutcome {
            report,
            permutation: ctx.permutation,
        })
    }
}

impl Pass for CliffordReduction {
    fn name(&self) -> &'static str {
        "CliffordReduction"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let outcome = self.reduce(dag)?;
        info!(
            "Clifford reduction: {} replacements in {} rounds",
            outcome.report.replacements, outcome.report.rounds
        );
        properties.record_permutation(&outcome.permutation);
        properties.insert(outcome.report);
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        dag.num_ops() > 0
    }
}

/// Clifford reduction with hyper squash in between, as a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliffordSimp {
    config: CliffordConfig,
}

impl CliffordSimp {
    /// Create the pass with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the pass with the given options.
    pub fn with_config(config: CliffordConfig) -> Self {
        Self { config }
    }

    /// Alternate hyper squash and reduction until neither changes.
    pub fn simplify(&self, dag: &mut CircuitDag) -> CompileResult<ReductionOutcome> {
        let reduction = CliffordReduction::with_config(self.config);
        let mut outcome = ReductionOutcome::default();

        for _ in 0..MAX_SQUASH_ITERATIONS {
            let squashed = hyper_squash(dag)?;
            let step = reduction.reduce(dag)?;
            outcome.report.rounds += step.report.rounds;
            outcome.report.replacements += step.report.replacements;
            outcome.permutation = outcome.permutation.then(&step.permutation);

            if !squashed && !step.report.changed {
                return Ok(outcome);
            }
            outcome.report.changed = true;
        }
        warn!("Clifford simp did not settle after {MAX_SQUASH_ITERATIONS} iterations");
        Ok(outcome)
    }
}

impl Pass for CliffordSimp {
    fn name(&self) -> &'static str {
        "CliffordSimp"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let outcome = self.simplify(dag)?;
        info!(
            "Clifford simp: {} replacements, changed: {}",
            outcome.report.replacements, outcome.report.changed
        );
        properties.record_permutation(&outcome.permutation);
        properties.insert(outcome.report);
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        dag.num_ops() > 0
    }
}
