//! Built-in compilation passes.
//!
//! All passes live in [`agnostic`]: they operate purely on DAG structure
//! and need no hardware properties.

pub mod agnostic;

pub use agnostic::{
    CliffordReduction, CliffordSimp, IntegrityVerification, MultiQubitCliffordReplacement,
    Optimize1qGates, SingleQubitCliffordSweep, VerificationResult,
};
