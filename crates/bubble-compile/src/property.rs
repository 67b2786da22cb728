//! Property set for sharing data between passes.
//!
//! The [`PropertySet`] is a type-keyed store that passes write their
//! results into and later passes (or the caller) read back. The Clifford
//! passes publish two properties:
//!
//! - [`QubitPermutation`]: the wire permutation absorbed by SWAP-aware
//!   replacements, needed to interpret the rewritten circuit's outputs
//! - [`CliffordReport`](crate::CliffordReport): what the last reduction run
//!   did
//!
//! # Example: Custom Properties
//!
//! ```
//! use bubble_compile::PropertySet;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct GateTally {
//!     removed: usize,
//! }
//!
//! let mut props = PropertySet::new();
//! props.insert(GateTally { removed: 4 });
//!
//! let tally = props.get::<GateTally>().unwrap();
//! assert_eq!(tally.removed, 4);
//! ```
//!
//! # Example: Reading a Permutation
//!
//! ```
//! use bubble_compile::{PropertySet, QubitPermutation};
//! use bubble_ir::QubitId;
//!
//! let mut props = PropertySet::new();
//! let mut perm = QubitPermutation::identity();
//! perm.swap(QubitId(0), QubitId(1));
//! props.insert(perm);
//!
//! let perm = props.permutation().unwrap();
//! assert_eq!(perm.logical(QubitId(0)), QubitId(1));
//! assert_eq!(perm.logical(QubitId(2)), QubitId(2));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};

use bubble_ir::QubitId;

/// The logical qubit carried by each output wire.
///
/// A SWAP absorbed into the circuit structure leaves the two affected wires
/// carrying each other's state from that point on. This records the net
/// effect: `logical(w)` is the input qubit whose state ends up on wire `w`.
/// Wires that were never exchanged map to themselves and are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitPermutation {
    /// Map from output wire to logical qubit, identity entries omitted.
    wire_to_logical: FxHashMap<QubitId, QubitId>,
}

impl QubitPermutation {
    /// The permutation that leaves every wire in place.
    pub fn identity() -> Self {
        Self::default()
    }

    /// The logical qubit carried by `wire`.
    pub fn logical(&self, wire: QubitId) -> QubitId {
        self.wire_to_logical.get(&wire).copied().unwrap_or(wire)
    }

    /// The wire carrying `logical`.
    pub fn wire(&self, logical: QubitId) -> QubitId {
        self.wire_to_logical
            .iter()
            .find(|&(_, &l)| l == logical)
            .map_or(logical, |(&w, _)| w)
    }

    /// Exchange the contents of two wires.
    pub fn swap(&mut self, a: QubitId, b: QubitId) {
        if a == b {
            return;
        }
        let la = self.logical(a);
        let lb = self.logical(b);
        self.set(a, lb);
        self.set(b, la);
    }

    fn set(&mut self, wire: QubitId, logical: QubitId) {
        if wire == logical {
            self.wire_to_logical.remove(&wire);
        } else {
            self.wire_to_logical.insert(wire, logical);
        }
    }

    /// The permutation of running `self` and then `later`.
    #[must_use]
    pub fn then(&self, later: &QubitPermutation) -> Self {
        let mut combined = self.clone();
        for (wire, logical) in later.iter() {
            combined.set(wire, self.logical(logical));
        }
        // Wires `later` leaves alone keep what `self` put there.
        combined
    }

    /// Whether no wire has been exchanged.
    pub fn is_identity(&self) -> bool {
        self.wire_to_logical.is_empty()
    }

    /// Number of wires that carry a different qubit.
    pub fn len(&self) -> usize {
        self.wire_to_logical.len()
    }

    /// Check if the permutation is the identity.
    pub fn is_empty(&self) -> bool {
        self.is_identity()
    }

    /// Iterate over the non-trivial (wire, logical) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, QubitId)> + '_ {
        self.wire_to_logical.iter().map(|(&w, &l)| (w, l))
    }
}

/// Central storage for compilation properties.
///
/// Properties are keyed by their type, so each pass output is a distinct
/// struct and a reader asks for it with [`PropertySet::get`].
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wire permutation, replacing any previous one.
    #[must_use]
    pub fn with_permutation(mut self, permutation: QubitPermutation) -> Self {
        self.insert(permutation);
        self
    }

    /// The accumulated wire permutation, if a pass recorded one.
    pub fn permutation(&self) -> Option<&QubitPermutation> {
        self.get::<QubitPermutation>()
    }

    /// Fold `later` into the stored permutation.
    pub fn record_permutation(&mut self, later: &QubitPermutation) {
        let combined = match self.permutation() {
            Some(current) => current.then(later),
            None => later.clone(),
        };
        self.insert(combined);
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}
