//! Bubble Circuit Intermediate Representation
//!
//! This crate provides the circuit data structures that the Bubble
//! optimization passes rewrite in place.
//!
//! # Overview
//!
//! Circuits are stored as a DAG ([`CircuitDag`]) whose edges are wire
//! segments. The graph keeps node indices stable across removals, so a
//! pass can hold on to indices while it splices gates in and out. The
//! high-level [`Circuit`] API is a builder on top of it.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`], optionally guarded by a
//!   [`ClassicalCondition`]
//! - **Parameters**: [`ParameterExpression`] for concrete or symbolic angles
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **DAG**: [`CircuitDag`] with wire navigation, edge insertion and a
//!   global phase
//!
//! # Example: Building a Circuit
//!
//! ```rust
//! use bubble_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth().unwrap(), 3);
//! ```
//!
//! # Example: Walking a Wire
//!
//! ```rust
//! use bubble_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("walk", 2, 0);
//! circuit.sx(QubitId(0)).unwrap().zzmax(QubitId(0), QubitId(1)).unwrap();
//!
//! let dag = circuit.dag();
//! let ops = dag.wire_ops(QubitId(0));
//! assert_eq!(ops.len(), 2);
//! assert_eq!(dag.wire_successor(ops[0], QubitId(0)), Some(ops[1]));
//! assert!(dag.reachable(ops[0], ops[1]));
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H`, `S`, `Sdg`, `SX`, `SXdg` | 1 | Clifford generators |
//! | `T`, `Tdg`, `Rx`, `Ry`, `Rz`, `P`, `U` | 1 | Non-Clifford rotations |
//! | `CX`, `CY`, `CZ` | 2 | Controlled Paulis |
//! | `ZZMax` | 2 | `exp(-iπ/4 Z⊗Z)` |
//! | `Swap`, `CH`, `CRx`.., `RXX`.. | 2 | Other two-qubit gates |
//! | `CCX`, `CSwap` | 3 | Toffoli and Fredkin |

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, DagEdge, DagNode, EdgeIndex, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, Gate, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{ClbitId, QubitId};
