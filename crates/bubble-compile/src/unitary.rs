//! Unitary matrix utilities for gate optimization.
//!
//! Provides 2x2 and 4x4 unitary matrices for the gates the Clifford passes
//! rewrite, including the exact ZYZ decomposition, phase comparison and
//! tensor-product splitting.
//!
//! Two-qubit matrices index their basis as `2·bit(first) + bit(second)`,
//! where `first` is the gate's first operand.

use std::f64::consts::PI;
use std::sync::LazyLock;

use bubble_ir::gate::StandardGate;
use num_complex::Complex64;

/// Tolerance for floating point comparisons.
const EPSILON: f64 = 1e-10;

/// Tolerance for comparing matrices assembled from several products.
const MATRIX_TOLERANCE: f64 = 1e-8;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 unitary matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Create the identity matrix.
    pub fn identity() -> Self {
        Self::new(ONE, ZERO, ZERO, ONE)
    }

    /// Create a Hadamard matrix.
    pub fn h() -> Self {
        let s = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Self::new(s, s, s, -s)
    }

    /// Create a Pauli-X matrix.
    pub fn x() -> Self {
        Self::new(ZERO, ONE, ONE, ZERO)
    }

    /// Create a Pauli-Y matrix.
    pub fn y() -> Self {
        Self::new(ZERO, -I, I, ZERO)
    }

    /// Create a Pauli-Z matrix.
    pub fn z() -> Self {
        Self::new(ONE, ZERO, ZERO, -ONE)
    }

    /// Create an S gate (sqrt(Z)).
    pub fn s() -> Self {
        Self::new(ONE, ZERO, ZERO, I)
    }

    /// Create an S-dagger gate.
    pub fn sdg() -> Self {
        Self::new(ONE, ZERO, ZERO, -I)
    }

    /// Create a T gate (fourth root of Z).
    pub fn t() -> Self {
        Self::p(PI / 4.0)
    }

    /// Create a T-dagger gate.
    pub fn tdg() -> Self {
        Self::p(-PI / 4.0)
    }

    /// Create an SX gate (sqrt(X)).
    pub fn sx() -> Self {
        let half = Complex64::new(0.5, 0.0);
        let half_i = Complex64::new(0.0, 0.5);
        Self::new(half + half_i, half - half_i, half - half_i, half + half_i)
    }

    /// Create an SX-dagger gate.
    pub fn sxdg() -> Self {
        let half = Complex64::new(0.5, 0.0);
        let half_i = Complex64::new(0.0, 0.5);
        Self::new(half - half_i, half + half_i, half + half_i, half - half_i)
    }

    /// Create an RX rotation matrix.
    pub fn rx(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(0.0, -s),
            Complex64::new(0.0, -s),
            Complex64::new(c, 0.0),
        )
    }

    /// Create an RY rotation matrix.
    pub fn ry(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(c, 0.0),
        )
    }

    /// Create an RZ rotation matrix.
    pub fn rz(theta: f64) -> Self {
        Self::new(
            Complex64::from_polar(1.0, -theta / 2.0),
            ZERO,
            ZERO,
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// Create a phase gate P(lambda).
    pub fn p(lambda: f64) -> Self {
        Self::new(ONE, ZERO, ZERO, Complex64::from_polar(1.0, lambda))
    }

    /// Create a U gate U(theta, phi, lambda).
    pub fn u(theta: f64, phi: f64, lambda: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        )
    }

    /// The matrix of a single-qubit standard gate.
    ///
    /// Returns `None` for multi-qubit gates and for gates whose parameters
    /// are still symbolic. Constant gates come from matrices computed once.
    pub fn from_gate(gate: &StandardGate) -> Option<Self> {
        static U_X: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::x);
        static U_Y: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::y);
        static U_Z: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::z);
        static U_H: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::h);
        static U_S: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::s);
        static U_SDG: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::sdg);
        static U_T: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::t);
        static U_TDG: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::tdg);
        static U_SX: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::sx);
        static U_SXDG: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::sxdg);

        match gate {
            StandardGate::X => Some(*U_X),
            StandardGate::Y => Some(*U_Y),
            StandardGate::Z => Some(*U_Z),
            StandardGate::H => Some(*U_H),
            StandardGate::S => Some(*U_S),
            StandardGate::Sdg => Some(*U_SDG),
            StandardGate::T => Some(*U_T),
            StandardGate::Tdg => Some(*U_TDG),
            StandardGate::SX => Some(*U_SX),
            StandardGate::SXdg => Some(*U_SXDG),
            StandardGate::Rx(p) => p.as_f64().map(Unitary2x2::rx),
            StandardGate::Ry(p) => p.as_f64().map(Unitary2x2::ry),
            StandardGate::Rz(p) => p.as_f64().map(Unitary2x2::rz),
            StandardGate::P(p) => p.as_f64().map(Unitary2x2::p),
            StandardGate::U(theta, phi, lambda) => {
                Some(Unitary2x2::u(theta.as_f64()?, phi.as_f64()?, lambda.as_f64()?))
            }
            _ => None,
        }
    }

    /// Multiply this matrix by another: self * other.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Get the conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// Multiply every entry by `factor`.
    #[must_use]
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            data: self.data.map(|v| v * factor),
        }
    }

    /// Check if this is approximately identity (up to global phase).
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;
        if b.norm() > EPSILON || c.norm() > EPSILON {
            return false;
        }
        (a - d).norm() < EPSILON
    }

    /// The phase `φ` with `self = e^{iφ}·other`, or `None` if the two
    /// matrices are not proportional.
    pub fn phase_relative(&self, other: &Self) -> Option<f64> {
        phase_relative(&self.data, &other.data)
    }

    /// Entry-wise comparison including the global phase.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.data
            .iter()
            .zip(&other.data)
            .all(|(a, b)| (a - b).norm() < tolerance)
    }

    /// Get the global phase of this unitary.
    pub fn global_phase(&self) -> f64 {
        let det = self.data[0] * self.data[3] - self.data[1] * self.data[2];
        det.arg() / 2.0
    }

    /// Decompose into RZ(alpha) * RY(beta) * RZ(gamma) * `global_phase`.
    ///
    /// Returns (alpha, beta, gamma, `global_phase`). The product of the
    /// three rotations times `e^{i·global_phase}` reproduces the matrix
    /// exactly. When `beta` vanishes the whole Z angle is returned in
    /// `alpha` and `gamma` is zero.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let [a, b, c, d] = self.data;

        let det = a * d - b * c;
        let global_phase = det.arg() / 2.0;

        // Remove global phase to get an SU(2) matrix:
        // [[cos(β/2)e^{-i(α+γ)/2}, -sin(β/2)e^{-i(α-γ)/2}],
        //  [sin(β/2)e^{i(α-γ)/2},   cos(β/2)e^{i(α+γ)/2}]]
        let phase_factor = Complex64::from_polar(1.0, -global_phase);
        let a = a * phase_factor;
        let b = b * phase_factor;
        let c = c * phase_factor;

        // atan2 stays accurate near β = 0 where acos(|a|) loses half the digits.
        let beta = 2.0 * c.norm().atan2(a.norm());

        if beta.abs() < EPSILON {
            let alpha_plus_gamma = -2.0 * a.arg();
            return (alpha_plus_gamma, 0.0, 0.0, global_phase);
        }

        if (beta - PI).abs() < EPSILON {
            let alpha_minus_gamma = -2.0 * (-b).arg();
            return (alpha_minus_gamma, PI, 0.0, global_phase);
        }

        let alpha_plus_gamma = -2.0 * a.arg();
        let alpha_minus_gamma = 2.0 * c.arg();

        let alpha = f64::midpoint(alpha_plus_gamma, alpha_minus_gamma);
        let gamma = (alpha_plus_gamma - alpha_minus_gamma) / 2.0;

        (alpha, beta, gamma, global_phase)
    }

    /// Normalize angles to [-pi, pi].
    pub fn normalize_angle(angle: f64) -> f64 {
        if angle.is_nan() || angle.is_infinite() {
            return 0.0;
        }
        let mut a = angle.rem_euclid(2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        }
        a
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    #[allow(clippy::needless_pass_by_value)]
    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}

/// A 4x4 unitary matrix acting on an ordered pair of qubits.
#[derive(Debug, Clone, Copy)]
pub struct Unitary4x4 {
    /// Matrix rows.
    pub data: [[Complex64; 4]; 4],
}

impl Unitary4x4 {
    /// Create the identity matrix.
    pub fn identity() -> Self {
        let mut data = [[ZERO; 4]; 4];
        for (i, row) in data.iter_mut().enumerate() {
            row[i] = ONE;
        }
        Self { data }
    }

    fn permutation(targets: [usize; 4]) -> Self {
        let mut data = [[ZERO; 4]; 4];
        for (col, &row) in targets.iter().enumerate() {
            data[row][col] = ONE;
        }
        Self { data }
    }

    fn diagonal(entries: [Complex64; 4]) -> Self {
        let mut data = [[ZERO; 4]; 4];
        for (i, v) in entries.into_iter().enumerate() {
            data[i][i] = v;
        }
        Self { data }
    }

    /// `a ⊗ b`, with `a` on the first operand.
    pub fn kron(a: &Unitary2x2, b: &Unitary2x2) -> Self {
        let mut data = [[ZERO; 4]; 4];
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    for l in 0..2 {
                        data[2 * i + k][2 * j + l] = a.data[2 * i + j] * b.data[2 * k + l];
                    }
                }
            }
        }
        Self { data }
    }

    /// CX with the control on the first operand.
    pub fn cx() -> Self {
        Self::permutation([0, 1, 3, 2])
    }

    /// CY with the control on the first operand.
    pub fn cy() -> Self {
        let mut u = Self::diagonal([ONE, ONE, ZERO, ZERO]);
        u.data[2][3] = -I;
        u.data[3][2] = I;
        u
    }

    /// CZ.
    pub fn cz() -> Self {
        Self::diagonal([ONE, ONE, ONE, -ONE])
    }

    /// `exp(-iπ/4 Z⊗Z)`.
    pub fn zzmax() -> Self {
        let minus = Complex64::from_polar(1.0, -PI / 4.0);
        let plus = Complex64::from_polar(1.0, PI / 4.0);
        Self::diagonal([minus, plus, plus, minus])
    }

    /// SWAP.
    pub fn swap() -> Self {
        Self::permutation([0, 2, 1, 3])
    }

    /// The matrix of a two-qubit Clifford gate, or `None` for any other
    /// gate.
    pub fn from_gate(gate: &StandardGate) -> Option<Self> {
        static U_CX: LazyLock<Unitary4x4> = LazyLock::new(Unitary4x4::cx);
        static U_CY: LazyLock<Unitary4x4> = LazyLock::new(Unitary4x4::cy);
        static U_CZ: LazyLock<Unitary4x4> = LazyLock::new(Unitary4x4::cz);
        static U_ZZMAX: LazyLock<Unitary4x4> = LazyLock::new(Unitary4x4::zzmax);
        static U_SWAP: LazyLock<Unitary4x4> = LazyLock::new(Unitary4x4::swap);

        match gate {
            StandardGate::CX => Some(*U_CX),
            StandardGate::CY => Some(*U_CY),
            StandardGate::CZ => Some(*U_CZ),
            StandardGate::ZZMax => Some(*U_ZZMAX),
            StandardGate::Swap => Some(*U_SWAP),
            _ => None,
        }
    }

    /// Multiply this matrix by another: self * other.
    pub fn mul(&self, other: &Self) -> Self {
        let mut data = [[ZERO; 4]; 4];
        for (i, row) in data.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = (0..4).map(|k| self.data[i][k] * other.data[k][j]).sum();
            }
        }
        Self { data }
    }

    /// Get the conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        let mut data = [[ZERO; 4]; 4];
        for (i, row) in data.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = self.data[j][i].conj();
            }
        }
        Self { data }
    }

    /// Multiply every entry by `factor`.
    #[must_use]
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            data: self.data.map(|row| row.map(|v| v * factor)),
        }
    }

    /// Entry-wise sum.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let mut data = self.data;
        for (row, other_row) in data.iter_mut().zip(&other.data) {
            for (v, w) in row.iter_mut().zip(other_row) {
                *v += w;
            }
        }
        Self { data }
    }

    /// The same operator with its two operands exchanged.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let swap = Self::swap();
        swap.mul(self).mul(&swap)
    }

    /// The phase `φ` with `self = e^{iφ}·other`, or `None` if the two
    /// matrices are not proportional.
    pub fn phase_relative(&self, other: &Self) -> Option<f64> {
        phase_relative(self.data.as_flattened(), other.data.as_flattened())
    }

    /// Entry-wise comparison including the global phase.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.data
            .as_flattened()
            .iter()
            .zip(other.data.as_flattened())
            .all(|(a, b)| (a - b).norm() < tolerance)
    }

    /// Factor the matrix as `a ⊗ b`, or `None` if it is entangling.
    ///
    /// The split is unique up to moving a scalar between the factors; the
    /// returned pair reproduces the matrix exactly.
    pub fn split_tensor(&self) -> Option<(Unitary2x2, Unitary2x2)> {
        let block = |i: usize, j: usize| {
            Unitary2x2::new(
                self.data[2 * i][2 * j],
                self.data[2 * i][2 * j + 1],
                self.data[2 * i + 1][2 * j],
                self.data[2 * i + 1][2 * j + 1],
            )
        };
        let norm = |m: &Unitary2x2| m.data.iter().map(Complex64::norm_sqr).sum::<f64>();

        let (mut bi, mut bj, mut best) = (0, 0, 0.0);
        for i in 0..2 {
            for j in 0..2 {
                let n = norm(&block(i, j));
                if n > best {
                    (bi, bj, best) = (i, j, n);
                }
            }
        }
        if best < MATRIX_TOLERANCE {
            return None;
        }

        // A unitary factor has Frobenius norm √2.
        let b = block(bi, bj).scale(Complex64::new((2.0 / best).sqrt(), 0.0));
        let b_dag = b.dagger();
        let coefficient = |i: usize, j: usize| {
            let product = b_dag.mul(&block(i, j));
            (product.data[0] + product.data[3]) / 2.0
        };
        let a = Unitary2x2::new(
            coefficient(0, 0),
            coefficient(0, 1),
            coefficient(1, 0),
            coefficient(1, 1),
        );
        Self::kron(&a, &b)
            .approx_eq(self, MATRIX_TOLERANCE)
            .then_some((a, b))
    }
}

impl Default for Unitary4x4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary4x4 {
    type Output = Self;

    #[allow(clippy::needless_pass_by_value)]
    fn mul(self, rhs: Self) -> Self::Output {
        Unitary4x4::mul(&self, &rhs)
    }
}

fn phase_relative(lhs: &[Complex64], rhs: &[Complex64]) -> Option<f64> {
    let (pivot, _) = rhs
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))?;
    if rhs[pivot].norm() < MATRIX_TOLERANCE {
        return None;
    }
    let ratio = lhs[pivot] / rhs[pivot];
    if (ratio.norm() - 1.0).abs() > MATRIX_TOLERANCE {
        return None;
    }
    lhs.iter()
        .zip(rhs)
        .all(|(l, r)| (l - ratio * r).norm() < MATRIX_TOLERANCE)
        .then(|| ratio.arg())
}
