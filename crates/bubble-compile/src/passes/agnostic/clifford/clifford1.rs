//! The 24-element single-qubit Clifford group.
//!
//! Every element is stored in the normal form `Z? X? R` (time order), where
//! `R` is one of six coset representatives of the Pauli subgroup:
//! `[]`, `[S]`, `[V]`, `[S, V]`, `[V, S]`, `[S, V, S]`. The normal form
//! never uses more than three `S`/`V` generators.
//!
//! The table is built once. Conjugation images are derived exactly from the
//! generator rules; matrices are the product of the generator matrices, so
//! an element's gate list reproduces its matrix with no phase offset.

use std::sync::LazyLock;

use bubble_ir::{Instruction, QubitId, StandardGate};

use super::pauli::{Pauli, SignedPauli};
use super::TOLERANCE;
use crate::unitary::Unitary2x2;

/// A generator of the normal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    /// Pauli Z.
    Z,
    /// Pauli X.
    X,
    /// Phase gate, `S = diag(1, i)`.
    S,
    /// Square root of X, `V = SX`.
    V,
}

impl Generator {
    /// The gate emitted for this generator.
    pub fn standard_gate(self) -> StandardGate {
        match self {
            Generator::Z => StandardGate::Z,
            Generator::X => StandardGate::X,
            Generator::S => StandardGate::S,
            Generator::V => StandardGate::SX,
        }
    }

    /// The matrix of this generator.
    pub fn matrix(self) -> Unitary2x2 {
        match self {
            Generator::Z => Unitary2x2::z(),
            Generator::X => Unitary2x2::x(),
            Generator::S => Unitary2x2::s(),
            Generator::V => Unitary2x2::sx(),
        }
    }

    /// `g · P · g†`.
    pub fn conjugate(self, p: SignedPauli) -> SignedPauli {
        let (pauli, flip) = match (self, p.pauli) {
            (_, Pauli::I) => (Pauli::I, false),
            (Generator::Z, Pauli::Z) | (Generator::X, Pauli::X) => (p.pauli, false),
            (Generator::Z, other) | (Generator::X, other) => (other, true),
            (Generator::S, Pauli::X) => (Pauli::Y, false),
            (Generator::S, Pauli::Y) => (Pauli::X, true),
            (Generator::S, Pauli::Z) => (Pauli::Z, false),
            (Generator::V, Pauli::X) => (Pauli::X, false),
            (Generator::V, Pauli::Y) => (Pauli::Z, false),
            (Generator::V, Pauli::Z) => (Pauli::Y, true),
        };
        SignedPauli {
            pauli,
            negative: p.negative ^ flip,
        }
    }

    /// `g† · P · g`.
    pub fn conjugate_inverse(self, p: SignedPauli) -> SignedPauli {
        let (pauli, flip) = match (self, p.pauli) {
            (_, Pauli::I) => (Pauli::I, false),
            (Generator::Z | Generator::X, _) => return self.conjugate(p),
            (Generator::S, Pauli::X) => (Pauli::Y, true),
            (Generator::S, Pauli::Y) => (Pauli::X, false),
            (Generator::S, Pauli::Z) => (Pauli::Z, false),
            (Generator::V, Pauli::X) => (Pauli::X, false),
            (Generator::V, Pauli::Y) => (Pauli::Z, true),
            (Generator::V, Pauli::Z) => (Pauli::Y, false),
        };
        SignedPauli {
            pauli,
            negative: p.negative ^ flip,
        }
    }

    /// Whether the generator commutes with `p`.
    pub fn commutes_with(self, p: Pauli) -> bool {
        self.conjugate(SignedPauli::positive(p)) == SignedPauli::positive(p)
    }
}

const COSET_REPS: [&[Generator]; 6] = [
    &[],
    &[Generator::S],
    &[Generator::V],
    &[Generator::S, Generator::V],
    &[Generator::V, Generator::S],
    &[Generator::S, Generator::V, Generator::S],
];

#[derive(Debug)]
struct Entry {
    gates: Vec<Generator>,
    matrix: Unitary2x2,
    /// Images of I, X, Y, Z under `C · P · C†`.
    images: [SignedPauli; 4],
    /// Images of I, X, Y, Z under `C† · P · C`.
    inverse_images: [SignedPauli; 4],
}

static TABLE: LazyLock<Vec<Entry>> = LazyLock::new(build_table);

fn build_table() -> Vec<Entry> {
    let mut table = Vec::with_capacity(24);
    for rep in COSET_REPS {
        for x in [false, true] {
            for z in [false, true] {
                let mut gates = Vec::with_capacity(2 + rep.len());
                if z {
                    gates.push(Generator::Z);
                }
                if x {
                    gates.push(Generator::X);
                }
                gates.extend_from_slice(rep);

                let matrix = gates
                    .iter()
                    .fold(Unitary2x2::identity(), |m, g| g.matrix().mul(&m));
                let images = Pauli::ALL.map(|p| {
                    gates
                        .iter()
                        .fold(SignedPauli::positive(p), |acc, g| g.conjugate(acc))
                });
                let inverse_images = Pauli::ALL.map(|p| {
                    gates
                        .iter()
                        .rev()
                        .fold(SignedPauli::positive(p), |acc, g| g.conjugate_inverse(acc))
                });
                table.push(Entry {
                    gates,
                    matrix,
                    images,
                    inverse_images,
                });
            }
        }
    }
    table
}

fn pauli_index(p: Pauli) -> usize {
    match p {
        Pauli::I => 0,
        Pauli::X => 1,
        Pauli::Y => 2,
        Pauli::Z => 3,
    }
}

/// A single-qubit Clifford element, up to global phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Clifford1(u8);

impl Clifford1 {
    /// The identity element.
    pub const IDENTITY: Clifford1 = Clifford1(0);

    /// Number of elements in the group.
    pub const ORDER: usize = 24;

    /// All 24 elements in table order.
    pub fn all() -> impl Iterator<Item = Clifford1> {
        (0..24u8).map(Clifford1)
    }

    fn entry(self) -> &'static Entry {
        &TABLE[self.0 as usize]
    }

    /// Position of this element in the table.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The normal-form gate sequence, in time order.
    pub fn gates(self) -> &'static [Generator] {
        &self.entry().gates
    }

    /// Number of gates in the normal form.
    pub fn gate_count(self) -> usize {
        self.entry().gates.len()
    }

    /// The matrix of the normal-form gate sequence.
    pub fn matrix(self) -> Unitary2x2 {
        self.entry().matrix
    }

    /// Whether this is the identity.
    pub fn is_identity(self) -> bool {
        self.0 == 0
    }

    /// `C · P · C†`.
    pub fn conjugate(self, p: SignedPauli) -> SignedPauli {
        let image = self.entry().images[pauli_index(p.pauli)];
        SignedPauli {
            pauli: image.pauli,
            negative: image.negative ^ p.negative,
        }
    }

    /// `C† · P · C`.
    pub fn conjugate_inverse(self, p: SignedPauli) -> SignedPauli {
        let image = self.entry().inverse_images[pauli_index(p.pauli)];
        SignedPauli {
            pauli: image.pauli,
            negative: image.negative ^ p.negative,
        }
    }

    /// Whether this element commutes with `p`.
    pub fn commutes_with(self, p: Pauli) -> bool {
        self.conjugate(SignedPauli::positive(p)) == SignedPauli::positive(p)
    }

    /// The Pauli prefix `Z? X?` of the normal form.
    pub fn pauli_part(self) -> Clifford1 {
        Clifford1(self.0 % 4)
    }

    /// The coset representative `R` of the normal form.
    ///
    /// `self.matrix() == self.coset_rep().matrix() · self.pauli_part().matrix()`.
    pub fn coset_rep(self) -> Clifford1 {
        Clifford1(self.0 - self.0 % 4)
    }

    /// The element with the given images of X and Z.
    pub fn from_images(x_image: SignedPauli, z_image: SignedPauli) -> Option<Clifford1> {
        Self::all().find(|c| {
            let images = &c.entry().images;
            images[1] == x_image && images[3] == z_image
        })
    }

    /// Identify a unitary as a Clifford element.
    ///
    /// Returns the element and the phase `φ` with
    /// `u = e^{iφ} · element.matrix()`, or `None` if `u` does not map the
    /// Paulis onto signed Paulis.
    pub fn from_unitary(u: &Unitary2x2) -> Option<(Clifford1, f64)> {
        let u_dag = u.dagger();
        let image = |p: Pauli| signed_pauli_of(&u.mul(&p.matrix()).mul(&u_dag));
        let element = Self::from_images(image(Pauli::X)?, image(Pauli::Z)?)?;
        let phase = u.phase_relative(&element.matrix())?;
        Some((element, phase))
    }

    /// Identify a constant single-qubit gate as a Clifford element.
    pub fn from_gate(gate: &StandardGate) -> Option<(Clifford1, f64)> {
        Unitary2x2::from_gate(gate).and_then(|u| Self::from_unitary(&u))
    }

    /// The element applying `self` and then `next`, with the phase picked
    /// up by the normal forms.
    pub fn then(self, next: Clifford1) -> Option<(Clifford1, f64)> {
        Self::from_unitary(&next.matrix().mul(&self.matrix()))
    }

    /// The normal form as instructions on `qubit`, in time order.
    pub fn instructions(self, qubit: QubitId) -> impl Iterator<Item = Instruction> {
        self.gates()
            .iter()
            .map(move |g| Instruction::single_qubit_gate(g.standard_gate(), qubit))
    }
}

/// The signed Pauli equal to `m`, if any.
pub(crate) fn signed_pauli_of(m: &Unitary2x2) -> Option<SignedPauli> {
    Pauli::ALL.into_iter().find_map(|p| {
        [false, true].into_iter().find_map(|negative| {
            let candidate = SignedPauli { pauli: p, negative };
            candidate
                .matrix()
                .approx_eq(m, TOLERANCE)
                .then_some(candidate)
        })
    })
}
