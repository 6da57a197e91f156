//! Dense integer identifiers for the molecular model.
//!
//! Every entity lives in an append-only array indexed by its id, and all
//! cross-references are by id, never by reference. "Unassigned" is
//! represented as `Option<Id>` rather than a sentinel value.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            /// The position of this entity in its owning array.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }
    };
}

define_id!(
    /// Identifies an atom in the molecular model.
    AtomId
);
define_id!(
    /// Identifies an undirected bond between two atoms.
    BondId
);
define_id!(
    /// Identifies a rigid cluster.
    ClusterId
);
define_id!(
    /// Identifies a rigid body of the host multibody engine.
    BodyId
);
define_id!(
    /// Identifies a force-field atom class.
    AtomClassId
);
define_id!(
    /// Identifies a charged atom type.
    ChargedTypeId
);
