#![forbid(unsafe_code)]

use std::fmt;

/// Identifies a function symbol in the symbol table of a [crate::TermStore].
///
/// An id is only meaningful for the store that returned it, and only while
/// that store holds a reference to the symbol. Constructing an id with
/// [SymbolId::from_index] is not a proof that it is valid, see
/// [crate::TermStore::symbol_valid].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

/// Identifies a term in the term table of a [crate::TermStore].
///
/// Because terms are maximally shared two terms are structurally equal iff
/// their ids are equal. An id is only meaningful for the store that returned
/// it, and only while that store holds a reference to the term.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

macro_rules! slot_id {
    ($id:ident, $kind:literal) => {
        impl $id {
            /// Returns the id of the given slot index.
            pub fn from_index(index: usize) -> Self {
                Self(
                    u32::try_from(index)
                        .unwrap_or_else(|_| panic!("The {} index {index} does not fit in 32 bits", $kind)),
                )
            }

            /// Returns the slot index of this id.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($id), self.0)
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

slot_id!(SymbolId, "symbol");
slot_id!(TermId, "term");
