//! Optimization passes.

mod optimize_1q;


pub use optimize_1q::{FusionScope, Optimize1qGates};

pub(crate) use optimize_1q::{fuse_single_qubit_runs, rewrite_run};

/// Tolerance for angle comparisons.
pub(super) const EPSILON: f64 = 1e-10;
