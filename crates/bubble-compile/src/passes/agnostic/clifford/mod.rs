//! Clifford subcircuit reduction.
//!
//! Regions of Clifford gates are rewritten into canonical, cheaper
//! equivalents while the rest of the circuit is left in place:
//!
//! - [`singleq_clifford_sweep`] reduces every run of single-qubit Cliffords
//!   to the normal form `Z? X? R` and pushes Paulis and commuting
//!   generators backward through two-qubit interactions.
//! - [`multiq_clifford_replacement`] merges two consecutive interactions
//!   on the same wire pair into at most one, moving them through commuting
//!   gates to a causally valid meeting point.
//! - [`clifford_reduction`] alternates the two until nothing changes.
//! - [`clifford_simp`] adds a squash of non-Clifford rotations in between.
//!
//! The unitary of the circuit is preserved exactly: every rewrite adds its
//! phase correction to the DAG's global phase. With swaps allowed, the
//! outputs end up permuted as described by the returned
//! [`QubitPermutation`].
//!
//! # Example
//!
//! ```
//! use bubble_compile::passes::agnostic::clifford::clifford_reduction;
//! use bubble_ir::{Circuit, QubitId, StandardGate};
//!
//! let mut circuit = Circuit::with_size("pair", 2, 0);
//! circuit
//!     .cx(QubitId(0), QubitId(1)).unwrap()
//!     .sx(QubitId(0)).unwrap()
//!     .s(QubitId(0)).unwrap()
//!     .cx(QubitId(1), QubitId(0)).unwrap();
//!
//! let mut dag = circuit.into_dag();
//! assert!(clifford_reduction(&mut dag, false).unwrap());
//!
//! let entangling = dag
//!     .topological_ops()
//!     .unwrap()
//!     .into_iter()
//!     .filter(|(_, inst)| inst.qubits.len() == 2)
//!     .count();
//! assert_eq!(entangling, 1);
//! ```

pub mod clifford1;
pub mod insertion;
pub mod interaction;
pub mod pauli;
pub mod reduction;
pub mod replacement;
pub mod sweep;

#[cfg(test)]
mod tests;

use std::f64::consts::FRAC_PI_4;

use bubble_ir::{Instruction, NodeIndex, QubitId, StandardGate};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};
use crate::property::QubitPermutation;
use crate::unitary::Unitary4x4;

pub use clifford1::{Clifford1, Generator};
pub use insertion::valid_insertion_point;
pub use interaction::{InteractionForm, InteractionPoint, InteractionSequence};
pub use pauli::{Pauli, SignedPauli};
pub use reduction::{
    CliffordReduction, CliffordSimp, ReductionOutcome, clifford_reduction, clifford_simp,
    hyper_squash,
};
pub use replacement::{MultiQubitCliffordReplacement, multiq_clifford_replacement};
pub use sweep::{SingleQubitCliffordSweep, singleq_clifford_sweep};

/// Tolerance for identifying matrices as Clifford or Pauli.
pub(crate) const TOLERANCE: f64 = 1e-8;

/// Phases within this distance of a multiple of π/4 are snapped onto it.
const PHASE_SNAP: f64 = 1e-9;

/// The entangling gate a replacement emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionGate {
    /// Controlled-X.
    Cx,
    /// `exp(-iπ/4 Z⊗Z)`.
    #[default]
    ZzMax,
}

impl InteractionGate {
    /// The gate as a standard gate.
    pub fn standard_gate(self) -> StandardGate {
        match self {
            InteractionGate::Cx => StandardGate::CX,
            InteractionGate::ZzMax => StandardGate::ZZMax,
        }
    }

    /// The gate's matrix.
    pub fn matrix(self) -> Unitary4x4 {
        match self {
            InteractionGate::Cx => Unitary4x4::cx(),
            InteractionGate::ZzMax => Unitary4x4::zzmax(),
        }
    }
}

/// Options for the Clifford reduction passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliffordConfig {
    /// Allow a replacement to absorb a SWAP into the wire labels.
    pub allow_swaps: bool,
    /// Upper bound on sweep/replacement rounds per invocation.
    pub max_rounds: usize,
    /// Entangling gate emitted by replacements.
    pub interaction_gate: InteractionGate,
}

impl Default for CliffordConfig {
    fn default() -> Self {
        Self {
            allow_swaps: false,
            max_rounds: 100,
            interaction_gate: InteractionGate::ZzMax,
        }
    }
}

impl CliffordConfig {
    /// Set whether SWAPs may be absorbed.
    #[must_use]
    pub fn with_allow_swaps(mut self, allow_swaps: bool) -> Self {
        self.allow_swaps = allow_swaps;
        self
    }

    /// Set the round limit.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the emitted entangling gate.
    #[must_use]
    pub fn with_interaction_gate(mut self, gate: InteractionGate) -> Self {
        self.interaction_gate = gate;
        self
    }

    /// Reject settings no pass can run with.
    pub fn validate(&self) -> CompileResult<()> {
        if self.max_rounds == 0 {
            return Err(CompileError::InvalidConfiguration(
                "max_rounds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Summary of a reduction run, published to the property set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliffordReport {
    /// Whether the circuit changed.
    pub changed: bool,
    /// Number of two-interaction merges performed.
    pub replacements: usize,
    /// Number of sweep/replacement rounds run.
    pub rounds: usize,
}

/// State shared by the sub-passes of one invocation.
#[derive(Debug, Default)]
pub struct ReductionContext {
    /// Vertices created or touched by a replacement in the current round.
    pub consumed: FxHashSet<NodeIndex>,
    /// Net wire permutation from absorbed SWAPs.
    pub permutation: QubitPermutation,
    /// Number of merges performed so far.
    pub replacements: usize,
}

impl ReductionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the consumed marks at the start of a round.
    pub fn begin_round(&mut self) {
        self.consumed.clear();
    }
}

/// Snap `phase` onto the nearest multiple of π/4 when within tolerance.
pub fn snap_phase(phase: f64) -> f64 {
    let steps = (phase / FRAC_PI_4).round();
    let snapped = steps * FRAC_PI_4;
    if (phase - snapped).abs() < PHASE_SNAP {
        snapped
    } else {
        phase
    }
}

/// The Clifford element and phase of a single-qubit Clifford instruction.
///
/// Covers unconditioned one-qubit standard gates with constant parameters
/// whose matrix is Clifford, so `Rz(π/2)` qualifies and `T` does not.
pub fn single_qubit_clifford(inst: &Instruction) -> Option<(Clifford1, f64)> {
    if inst.qubits.len() != 1 || !inst.clbits.is_empty() {
        return None;
    }
    let gate = inst.standard_gate()?;
    if gate.num_qubits() != 1 {
        return None;
    }
    Clifford1::from_gate(gate)
}

/// The Pauli an instruction commutes with on `qubit`, if any.
///
/// This is the axis the gate is diagonal in on that wire: `Z` for phase
/// rotations and controls, `X` or `Y` for the matching rotations and
/// targets. Non-gate instructions, conditioned gates and gates with no
/// single axis on the wire return `None`.
pub fn commuting_pauli(inst: &Instruction, qubit: QubitId) -> Option<Pauli> {
    let position = inst.qubit_position(qubit)?;
    let gate = inst.standard_gate()?;
    let axis = match (gate, position) {
        (
            StandardGate::Z
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::Rz(_)
            | StandardGate::P(_),
            0,
        ) => Pauli::Z,
        (StandardGate::X | StandardGate::SX | StandardGate::SXdg | StandardGate::Rx(_), 0) => {
            Pauli::X
        }
        (StandardGate::Y | StandardGate::Ry(_), 0) => Pauli::Y,

        (
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CSwap,
            0,
        ) => Pauli::Z,
        (StandardGate::CX | StandardGate::CRx(_), 1) => Pauli::X,
        (StandardGate::CY | StandardGate::CRy(_), 1) => Pauli::Y,
        (
            StandardGate::CZ
            | StandardGate::ZZMax
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RZZ(_),
            _,
        ) => Pauli::Z,
        (StandardGate::RXX(_), _) => Pauli::X,
        (StandardGate::RYY(_), _) => Pauli::Y,
        (StandardGate::CCX, 0 | 1) => Pauli::Z,
        (StandardGate::CCX, _) => Pauli::X,
        _ => return None,
    };
    Some(axis)
}

/// Map an IR failure to an invariant violation of `pass`.
pub(crate) fn broken(pass: &str) -> impl Fn(bubble_ir::IrError) -> CompileError + '_ {
    move |err| CompileError::invariant(pass, err.to_string())
}
