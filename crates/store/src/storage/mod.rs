//! The tables underneath a [crate::TermStore]. Each of them maintains its own
//! reference counts, but the ownership relations between them, e.g. a term
//! owning its arguments, are maintained by the store.

mod root_registry;
mod symbol_table;
mod term_table;

pub use root_registry::*;
pub use symbol_table::*;
pub use term_table::*;
