#![forbid(unsafe_code)]

use std::hash::Hash;
use std::hash::Hasher;

use equivalent::Equivalent;

use rcterm_collections::SlotTable;
use rcterm_collections::TableConfig;
use rcterm_collections::TableMetrics;
use rcterm_utilities::debug_trace;

use crate::SymbolId;

/// Interns function symbols, i.e., pairs of a name and an arity, into small
/// dense [SymbolId]s. Two calls with the same name and arity yield the same id
/// as long as the symbol is referenced.
pub struct SymbolTable {
    table: SlotTable<SharedSymbol>,
}

/// A function symbol as it is stored in the [SymbolTable].
#[derive(Debug)]
pub struct SharedSymbol {
    name: Box<str>,
    arity: usize,
    /// The number of live terms with this symbol as head. These do not own a
    /// reference to the symbol, but the symbol may not be reclaimed before them.
    users: usize,
}

impl SharedSymbol {
    /// Returns the name of the function symbol.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arity of the function symbol.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// Only the name and arity determine the identity of a symbol.
impl PartialEq for SharedSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl Eq for SharedSymbol {}

/// This hash must be the same as the one of [SymbolLookup].
impl Hash for SharedSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.arity.hash(state);
    }
}

/// A cheap way to look up a [SharedSymbol] without allocating its name.
struct SymbolLookup<'a> {
    name: &'a str,
    arity: usize,
}

impl Hash for SymbolLookup<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.arity.hash(state);
    }
}

impl Equivalent<SharedSymbol> for SymbolLookup<'_> {
    fn equivalent(&self, other: &SharedSymbol) -> bool {
        *self.name == *other.name && self.arity == other.arity
    }
}

impl From<&SymbolLookup<'_>> for SharedSymbol {
    fn from(lookup: &SymbolLookup<'_>) -> Self {
        SharedSymbol {
            name: lookup.name.into(),
            arity: lookup.arity,
            users: 0,
        }
    }
}

impl SymbolTable {
    /// Creates an empty symbol table.
    pub(crate) fn new(config: TableConfig) -> Self {
        SymbolTable {
            table: SlotTable::new("symbol", config),
        }
    }

    /// Returns the id of the symbol with the given name and arity and adds a
    /// reference to it, creating the symbol when it does not exist.
    pub fn intern(&mut self, name: &str, arity: usize) -> SymbolId {
        let (index, _inserted) = self.table.intern(&SymbolLookup { name, arity });
        debug_trace!("Interned symbol {name}/{arity} as {index}, inserted {_inserted}");
        SymbolId::from_index(index)
    }

    /// Returns the id of the symbol with the given name and arity, without adding a reference.
    pub fn find(&self, name: &str, arity: usize) -> Option<SymbolId> {
        self.table.find(&SymbolLookup { name, arity }).map(SymbolId::from_index)
    }

    /// Adds a reference to the given symbol.
    pub fn acquire(&mut self, symbol: SymbolId) {
        self.table.acquire(symbol.index());
    }

    /// Removes a reference from the given symbol, the symbol is reclaimed when
    /// this was its last reference.
    ///
    /// Panics when the last reference is released while terms with this symbol as head are still live.
    pub fn release(&mut self, symbol: SymbolId) {
        if self.table.reference_count(symbol.index()) == Some(1) {
            let users = self.get(symbol).users;
            assert!(
                users == 0,
                "Cannot reclaim symbol {} since {users} live terms use it",
                self.display(symbol)
            );
        }

        if let Some(_shared) = self.table.release(symbol.index()) {
            debug_trace!("Reclaimed symbol {}/{}", _shared.name, _shared.arity);
        }
    }

    /// Returns true iff the id refers to a live symbol.
    pub fn valid(&self, symbol: SymbolId) -> bool {
        self.table.contains_index(symbol.index())
    }

    /// Returns the name of the given symbol.
    pub fn name(&self, symbol: SymbolId) -> &str {
        self.get(symbol).name()
    }

    /// Returns the arity of the given symbol.
    pub fn arity(&self, symbol: SymbolId) -> usize {
        self.get(symbol).arity()
    }

    /// Returns the number of references to the given symbol.
    pub fn reference_count(&self, symbol: SymbolId) -> usize {
        self.table
            .reference_count(symbol.index())
            .unwrap_or_else(|| panic!("Symbol {symbol} is not live"))
    }

    /// Returns the number of live symbols.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true iff there are no live symbols.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns an iterator over all live symbols.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SharedSymbol)> {
        self.table
            .iter()
            .map(|(index, shared)| (SymbolId::from_index(index), shared))
    }

    /// Returns the occupancy of the underlying table.
    pub fn metrics(&self) -> TableMetrics<'_, SharedSymbol, rustc_hash::FxBuildHasher> {
        self.table.metrics()
    }

    /// Returns the number of times that the symbol table has grown.
    pub fn growth_count(&self) -> usize {
        self.table.growth_count()
    }

    /// Returns the underlying table.
    pub(crate) fn table(&self) -> &SlotTable<SharedSymbol> {
        &self.table
    }

    /// Returns `name/arity` of the given symbol for diagnostics.
    pub(crate) fn display(&self, symbol: SymbolId) -> String {
        match self.table.get(symbol.index()) {
            Some(shared) => format!("{}/{}", shared.name, shared.arity),
            None => format!("<free symbol {symbol}>"),
        }
    }

    /// Returns the number of live terms with the given symbol as head.
    pub(crate) fn users(&self, symbol: SymbolId) -> usize {
        self.get(symbol).users
    }

    /// Records that a term with the given head symbol was created.
    pub(crate) fn add_user(&mut self, symbol: SymbolId) {
        self.get_mut(symbol).users += 1;
    }

    /// Records that a term with the given head symbol was reclaimed.
    pub(crate) fn remove_user(&mut self, symbol: SymbolId) {
        let shared = self.get_mut(symbol);
        debug_assert!(shared.users > 0, "Symbol {} has no users", shared.name);
        shared.users -= 1;
    }

    fn get(&self, symbol: SymbolId) -> &SharedSymbol {
        self.table
            .get(symbol.index())
            .unwrap_or_else(|| panic!("Symbol {symbol} is not live"))
    }

    fn get_mut(&mut self, symbol: SymbolId) -> &mut SharedSymbol {
        self.table
            .get_mut(symbol.index())
            .unwrap_or_else(|| panic!("Symbol {symbol} is not live"))
    }
}
