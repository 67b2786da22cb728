//! Shared helpers for the integration tests: a dense unitary simulator and
//! gate counters.

#![allow(dead_code)]

use bubble_compile::{QubitPermutation, Unitary2x2, Unitary4x4};
use bubble_ir::{CircuitDag, Instruction, QubitId, StandardGate};
use num_complex::Complex64;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Tolerance for comparing simulated unitaries.
pub const TOLERANCE: f64 = 1e-8;

/// A dense row-major square matrix.
#[derive(Debug, Clone)]
pub struct Dense {
    pub dim: usize,
    pub data: Vec<Complex64>,
}

impl Dense {
    fn identity(dim: usize) -> Self {
        let mut data = vec![ZERO; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = ONE;
        }
        Self { dim, data }
    }

    fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    fn from_2x2(u: &Unitary2x2) -> Self {
        Self {
            dim: 2,
            data: u.data.to_vec(),
        }
    }

    fn from_4x4(u: &Unitary4x4) -> Self {
        Self {
            dim: 4,
            data: u.data.as_flattened().to_vec(),
        }
    }

    /// `|0⟩⟨0| ⊗ I + |1⟩⟨1| ⊗ self`, control on the first operand.
    fn controlled(&self) -> Self {
        let dim = 2 * self.dim;
        let mut out = Self::identity(dim);
        for r in 0..self.dim {
            for c in 0..self.dim {
                out.data[(self.dim + r) * dim + self.dim + c] = self.get(r, c);
            }
        }
        out
    }

    fn distance(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }
}

/// `exp(-i θ/2 P⊗P)` for a single-qubit Pauli matrix `p`.
fn pauli_rotation(p: &Unitary2x2, theta: f64) -> Dense {
    let pp = Unitary4x4::kron(p, p);
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    let scaled = Unitary4x4::identity().scale(c).add(&pp.scale(s));
    Dense::from_4x4(&scaled)
}

/// The matrix of a gate, operand 0 being the most significant bit.
fn gate_matrix(gate: &StandardGate) -> Dense {
    if let Some(u) = Unitary2x2::from_gate(gate) {
        return Dense::from_2x2(&u);
    }
    if let Some(u) = Unitary4x4::from_gate(gate) {
        return Dense::from_4x4(&u);
    }
    let angle = |p: &bubble_ir::ParameterExpression| p.as_f64().expect("constant parameter");
    match gate {
        StandardGate::CH => Dense::from_2x2(&Unitary2x2::h()).controlled(),
        StandardGate::CRx(p) => Dense::from_2x2(&Unitary2x2::rx(angle(p))).controlled(),
        StandardGate::CRy(p) => Dense::from_2x2(&Unitary2x2::ry(angle(p))).controlled(),
        StandardGate::CRz(p) => Dense::from_2x2(&Unitary2x2::rz(angle(p))).controlled(),
        StandardGate::CP(p) => Dense::from_2x2(&Unitary2x2::p(angle(p))).controlled(),
        StandardGate::RXX(p) => pauli_rotation(&Unitary2x2::x(), angle(p)),
        StandardGate::RYY(p) => pauli_rotation(&Unitary2x2::y(), angle(p)),
        StandardGate::RZZ(p) => pauli_rotation(&Unitary2x2::z(), angle(p)),
        StandardGate::CCX => Dense::from_4x4(&Unitary4x4::cx()).controlled(),
        StandardGate::CSwap => Dense::from_4x4(&Unitary4x4::swap()).controlled(),
        other => panic!("no matrix for {other:?}"),
    }
}

/// Apply `gate` on `qubits` to a state vector over `n` qubits, where qubit
/// `i` is bit `i` of the basis index.
fn apply(state: &mut [Complex64], gate: &Dense, qubits: &[QubitId]) {
    let m = qubits.len();
    let mask: usize = qubits.iter().map(|q| 1usize << q.0).sum();
    let offset = |sub: usize| -> usize {
        (0..m)
            .filter(|&j| (sub >> (m - 1 - j)) & 1 == 1)
            .map(|j| 1usize << qubits[j].0)
            .sum()
    };
    let offsets: Vec<usize> = (0..gate.dim).map(offset).collect();

    let mut amps = vec![ZERO; gate.dim];
    for base in 0..state.len() {
        if base & mask != 0 {
            continue;
        }
        for (sub, amp) in amps.iter_mut().enumerate() {
            *amp = state[base | offsets[sub]];
        }
        for row in 0..gate.dim {
            state[base | offsets[row]] = (0..gate.dim)
                .map(|col| gate.get(row, col) * amps[col])
                .sum();
        }
    }
}

/// Full unitary of a circuit including its global phase.
///
/// Panics on measurements, resets and other non-unitary operations;
/// barriers are skipped.
pub fn unitary(dag: &CircuitDag) -> Dense {
    let n = dag.num_qubits();
    let dim = 1usize << n;
    let ops: Vec<Instruction> = dag
        .topological_ops()
        .unwrap()
        .into_iter()
        .map(|(_, inst)| inst.clone())
        .filter(|inst| !inst.is_barrier())
        .collect();
    let gates: Vec<Dense> = ops
        .iter()
        .map(|inst| gate_matrix(inst.standard_gate().expect("unitary gate")))
        .collect();

    let phase = Complex64::from_polar(1.0, dag.global_phase());
    let mut out = Dense {
        dim,
        data: vec![ZERO; dim * dim],
    };
    for col in 0..dim {
        let mut state = vec![ZERO; dim];
        state[col] = ONE;
        for (inst, gate) in ops.iter().zip(&gates) {
            apply(&mut state, gate, &inst.qubits);
        }
        for (row, amp) in state.into_iter().enumerate() {
            out.data[row * dim + col] = amp * phase;
        }
    }
    out
}

/// Relabel the output wires of `u` the way `permutation` says the
/// rewritten circuit carries them.
pub fn permute_outputs(u: &Dense, permutation: &QubitPermutation, num_qubits: usize) -> Dense {
    let mut out = Dense {
        dim: u.dim,
        data: vec![ZERO; u.data.len()],
    };
    for row in 0..u.dim {
        let permuted: usize = (0..num_qubits)
            .filter(|&w| {
                let logical = permutation.logical(QubitId(w as u32));
                (row >> logical.0) & 1 == 1
            })
            .map(|w| 1usize << w)
            .sum();
        for col in 0..u.dim {
            out.data[permuted * u.dim + col] = u.get(row, col);
        }
    }
    out
}

/// Assert that two circuits have the same unitary, global phase included.
pub fn assert_same_unitary(before: &Dense, after: &CircuitDag) {
    let after = unitary(after);
    let distance = before.distance(&after);
    assert!(distance < TOLERANCE, "unitaries differ by {distance:e}");
}

/// Assert that `after` implements `before` with its outputs relabelled by
/// `permutation`.
pub fn assert_same_unitary_permuted(
    before: &Dense,
    after: &CircuitDag,
    permutation: &QubitPermutation,
) {
    let expected = permute_outputs(before, permutation, after.num_qubits());
    assert_same_unitary(&expected, after);
}

/// Count operations with the given name.
pub fn count(dag: &CircuitDag, name: &str) -> usize {
    dag.topological_ops()
        .unwrap()
        .into_iter()
        .filter(|(_, inst)| inst.name() == name)
        .count()
}

/// Count gates acting on two or more qubits.
pub fn count_multi_qubit(dag: &CircuitDag) -> usize {
    dag.topological_ops()
        .unwrap()
        .into_iter()
        .filter(|(_, inst)| inst.qubits.len() >= 2)
        .count()
}
