#![forbid(unsafe_code)]

use crate::SymbolId;
use crate::TermId;
use crate::storage::SymbolTable;
use crate::storage::TermTable;

/// The name of the symbol of the term that marks undefined values.
pub const UNDEFINED_SYMBOL_NAME: &str = "<undefined_term>";

/// The name of the symbol that wraps integer leaves.
pub const INT_SYMBOL_NAME: &str = "<aterm_int>";

/// The name of the binary list constructor.
pub const CONS_SYMBOL_NAME: &str = "<list_constructor>";

/// The name of the constant that represents the empty list.
pub const EMPTY_LIST_SYMBOL_NAME: &str = "<empty_list>";

/// The symbols and terms that every store provides, interned once when the
/// store is created. The store holds one reference to each of them for its
/// entire lifetime, so these ids are always valid and they can never be
/// reclaimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Builtins {
    /// The constant `<undefined_term>`.
    pub undefined_symbol: SymbolId,
    /// The symbol `<aterm_int>` that is reported as head of integer leaves.
    pub int_symbol: SymbolId,
    /// The list constructor `<list_constructor>` with arity two.
    pub cons_symbol: SymbolId,
    /// The constant `<empty_list>`.
    pub empty_list_symbol: SymbolId,
    /// The term `<undefined_term>`.
    pub undefined_term: TermId,
    /// The term `<empty_list>`.
    pub empty_list_term: TermId,
}

impl Builtins {
    /// Interns the builtin symbols, in a fixed order, followed by the builtin terms.
    ///
    /// On empty tables the symbols receive the ids 0 to 3, which collaborators
    /// are allowed to rely on.
    pub(crate) fn install(symbols: &mut SymbolTable, terms: &mut TermTable) -> Builtins {
        let undefined_symbol = symbols.intern(UNDEFINED_SYMBOL_NAME, 0);
        let int_symbol = symbols.intern(INT_SYMBOL_NAME, 0);
        let cons_symbol = symbols.intern(CONS_SYMBOL_NAME, 2);
        let empty_list_symbol = symbols.intern(EMPTY_LIST_SYMBOL_NAME, 0);

        let undefined_term = terms.intern_application(symbols, undefined_symbol, &[]);
        let empty_list_term = terms.intern_application(symbols, empty_list_symbol, &[]);

        Builtins {
            undefined_symbol,
            int_symbol,
            cons_symbol,
            empty_list_symbol,
            undefined_term,
            empty_list_term,
        }
    }

    /// Returns the builtin symbols in the order in which they are interned.
    pub fn symbols(&self) -> [SymbolId; 4] {
        [
            self.undefined_symbol,
            self.int_symbol,
            self.cons_symbol,
            self.empty_list_symbol,
        ]
    }

    /// Returns true iff the symbol is one of the builtin symbols.
    pub fn is_builtin_symbol(&self, symbol: SymbolId) -> bool {
        self.symbols().contains(&symbol)
    }

    /// Returns true iff the term is one of the builtin terms.
    pub fn is_builtin_term(&self, term: TermId) -> bool {
        term == self.undefined_term || term == self.empty_list_term
    }
}
