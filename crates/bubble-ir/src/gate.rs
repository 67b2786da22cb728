//! Gates the Clifford passes know how to read.
//!
//! The set is closed: every gate here has a fixed matrix once its angles
//! are constant, and the passes decide per variant whether it is a
//! Clifford, an interaction, or something to leave alone.

use serde::{Deserialize, Serialize};

use crate::parameter::ParameterExpression;

/// A gate with fixed semantics.
///
/// Operands are listed control first, so `CX` acts on `[control, target]`.
/// `SX` is the `V` generator of the single-qubit Clifford normal form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Paulis
    X,
    Y,
    Z,

    // Quarter turns and their inverses
    H,
    S,
    Sdg,
    SX,
    SXdg,

    // Eighth turns and free angles. Clifford only at quarter-turn angles.
    T,
    Tdg,
    Rx(ParameterExpression),
    Ry(ParameterExpression),
    Rz(ParameterExpression),
    /// `diag(1, e^{iθ})`.
    P(ParameterExpression),
    /// `U(θ, φ, λ) = Rz(φ)·Ry(θ)·Rz(λ)` up to the phase `e^{i(φ+λ)/2}`.
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    // Two-qubit interactions the reduction merges
    CX,
    CY,
    CZ,
    /// `exp(-iπ/4 Z⊗Z)`, the default entangler the reduction emits.
    ZZMax,

    // Two-qubit gates the reduction only looks through
    CH,
    Swap,
    CRx(ParameterExpression),
    CRy(ParameterExpression),
    CRz(ParameterExpression),
    CP(ParameterExpression),
    RXX(ParameterExpression),
    RYY(ParameterExpression),
    RZZ(ParameterExpression),

    // Three-qubit
    CCX,
    CSwap,
}

impl StandardGate {
    /// Lower-case mnemonic, as used in gate counts.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(..) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::ZZMax => "zzmax",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Arity.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CCX | StandardGate::CSwap => 3,
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::ZZMax
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_) => 2,
            _ => 1,
        }
    }
}

/// Run-time condition on a classical register. A conditioned gate is
/// opaque to every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalCondition {
    pub register: String,
    pub value: u64,
}

impl ClassicalCondition {
    pub fn new(register: impl Into<String>, value: u64) -> Self {
        Self {
            register: register.into(),
            value,
        }
    }
}

/// A standard gate, possibly conditioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub gate: StandardGate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Gate {
    /// An unconditioned gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            gate,
            condition: None,
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// The gate, unless a classical condition guards it.
    pub fn as_unconditioned_standard(&self) -> Option<&StandardGate> {
        match self.condition {
            None => Some(&self.gate),
            Some(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        self.gate.name()
    }

    pub fn num_qubits(&self) -> u32 {
        self.gate.num_qubits()
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}
