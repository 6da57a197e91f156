//! Bonds of the molecular graph.

use super::ids::AtomId;

/// An undirected bond between two distinct atoms.
///
/// The constructor normalises the pair so `atom1 < atom2`, giving every
/// bond a single canonical representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: AtomId,
    pub atom2: AtomId,
}

impl Bond {
    pub fn new(atom1: AtomId, atom2: AtomId) -> Self {
        debug_assert_ne!(atom1, atom2);
        let (atom1, atom2) = if atom1 <= atom2 {
            (atom1, atom2)
        } else {
            (atom2, atom1)
        };
        Self { atom1, atom2 }
    }

    pub fn contains(&self, atom: AtomId) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }
}
