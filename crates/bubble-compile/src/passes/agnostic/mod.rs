//! Target-agnostic compilation passes.
//!
//! These passes operate purely on the DAG structure without consulting
//! target-specific properties. They are safe to run on any circuit.

pub mod clifford;
pub mod optimization;
pub mod verification;

pub use clifford::{
    CliffordReduction, CliffordSimp, MultiQubitCliffordReplacement, SingleQubitCliffordSweep,
};
pub use optimization::{FusionScope, Optimize1qGates};
pub use verification::{IntegrityVerification, VerificationResult};
