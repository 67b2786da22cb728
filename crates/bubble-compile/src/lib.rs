//! Bubble Compilation Framework
//!
//! This crate provides the pass infrastructure for rewriting quantum
//! circuits and the Clifford subcircuit reduction built on it.
//!
//! # Overview
//!
//! A circuit is converted to a [`CircuitDag`](bubble_ir::CircuitDag) and
//! handed to a [`PassManager`], which runs each scheduled [`Pass`] in turn.
//! Passes rewrite the DAG in place and publish what they did through the
//! [`PropertySet`].
//!
//! The reduction passes shrink Clifford regions while leaving the rest of
//! the circuit alone:
//! 1. **Sweep**: bring single-qubit Clifford runs to a normal form and push
//!    Paulis backward through two-qubit gates
//! 2. **Replacement**: merge pairs of interactions on the same qubit pair
//!    into at most one entangling gate
//! 3. **Squash**: fuse runs holding non-Clifford rotations and move those
//!    rotations through gates they commute with
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ◄── PropertySet (permutation, report)
//! └─────────────┘
//!       │
//!       ├── Optimize1qGates
//!       ├── CliffordReduction / CliffordSimp
//!       └── IntegrityVerification
//!       │
//!       ▼
//! Output Circuit (same unitary, up to a recorded wire permutation)
//! ```
//!
//! # Example: Reduction Through the Pass Manager
//!
//! ```rust
//! use bubble_compile::{CliffordReport, PassManagerBuilder};
//! use bubble_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("pair", 2, 0);
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.s(QubitId(1)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_optimization_level(2)
//!     .build();
//!
//! let mut dag = circuit.into_dag();
//! pm.run(&mut dag, &mut props).unwrap();
//!
//! let report = props.get::<CliffordReport>().unwrap();
//! assert_eq!(report.replacements, 1);
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | None |
//! | 1 | 1q fusion + integrity verification |
//! | 2 | + Clifford reduction |
//! | 3 | Clifford simp instead of reduction |
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to create custom compilation passes:
//!
//! ```rust
//! use bubble_compile::{Pass, PassKind, CompileResult, PropertySet};
//! use bubble_ir::CircuitDag;
//!
//! struct MyCustomPass;
//!
//! impl Pass for MyCustomPass {
//!     fn name(&self) -> &str { "my_custom_pass" }
//!     fn kind(&self) -> PassKind { PassKind::Transformation }
//!
//!     fn run(&self, dag: &mut CircuitDag, props: &mut PropertySet) -> CompileResult<()> {
//!         // Your pass logic here
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod manager;
pub mod pass;
pub mod property;
pub mod unitary;

// Built-in passes
pub mod passes;

pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use passes::agnostic::clifford::{
    CliffordConfig, CliffordReport, InteractionGate, ReductionOutcome, clifford_reduction,
    clifford_simp, hyper_squash, multiq_clifford_replacement, singleq_clifford_sweep,
};
pub use passes::{
    CliffordReduction, CliffordSimp, IntegrityVerification, MultiQubitCliffordReplacement,
    Optimize1qGates, SingleQubitCliffordSweep, VerificationResult,
};
pub use property::{PropertySet, QubitPermutation};
pub use unitary::{Unitary2x2, Unitary4x4};
