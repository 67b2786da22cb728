//! Single-qubit Pauli operators and their signed form.

use std::fmt;

use num_complex::Complex64;

use crate::unitary::Unitary2x2;

/// A single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pauli {
    /// Identity.
    I,
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
}

impl Pauli {
    /// All four Paulis, identity first.
    pub const ALL: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];

    /// The three non-identity Paulis.
    pub const NONTRIVIAL: [Pauli; 3] = [Pauli::X, Pauli::Y, Pauli::Z];

    /// Symplectic bits `(x, z)`; `Y` has both set.
    #[inline]
    pub fn bits(self) -> (bool, bool) {
        match self {
            Pauli::I => (false, false),
            Pauli::X => (true, false),
            Pauli::Y => (true, true),
            Pauli::Z => (false, true),
        }
    }

    /// The Pauli with the given symplectic bits.
    #[inline]
    pub fn from_bits(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (true, true) => Pauli::Y,
            (false, true) => Pauli::Z,
        }
    }

    /// Whether the two operators commute.
    #[inline]
    pub fn commutes_with(self, other: Pauli) -> bool {
        let (x1, z1) = self.bits();
        let (x2, z2) = other.bits();
        (x1 & z2) == (z1 & x2)
    }

    /// The product `self · other` as `(i^k, Pauli)`, with `k` in `0..4`.
    pub fn product(self, other: Pauli) -> (u8, Pauli) {
        let (x1, z1) = self.bits();
        let (x2, z2) = other.bits();
        let result = Pauli::from_bits(x1 ^ x2, z1 ^ z2);
        let power = match (self, other) {
            (Pauli::X, Pauli::Y) | (Pauli::Y, Pauli::Z) | (Pauli::Z, Pauli::X) => 1,
            (Pauli::Y, Pauli::X) | (Pauli::Z, Pauli::Y) | (Pauli::X, Pauli::Z) => 3,
            _ => 0,
        };
        (power, result)
    }

    /// The 2x2 matrix of this Pauli.
    pub fn matrix(self) -> Unitary2x2 {
        match self {
            Pauli::I => Unitary2x2::identity(),
            Pauli::X => Unitary2x2::x(),
            Pauli::Y => Unitary2x2::y(),
            Pauli::Z => Unitary2x2::z(),
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pauli::I => "I",
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        };
        f.write_str(name)
    }
}

/// A Pauli operator with a sign, `±P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedPauli {
    /// The operator.
    pub pauli: Pauli,
    /// Whether the operator is negated.
    pub negative: bool,
}

impl SignedPauli {
    /// `+P`.
    pub const fn positive(pauli: Pauli) -> Self {
        Self {
            pauli,
            negative: false,
        }
    }

    /// `-P`.
    pub const fn negated(pauli: Pauli) -> Self {
        Self {
            pauli,
            negative: true,
        }
    }

    /// The 2x2 matrix of `±P`.
    pub fn matrix(self) -> Unitary2x2 {
        let m = self.pauli.matrix();
        if self.negative {
            m.scale(Complex64::new(-1.0, 0.0))
        } else {
            m
        }
    }
}

impl fmt::Display for SignedPauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.pauli)
        } else {
            write!(f, "+{}", self.pauli)
        }
    }
}
