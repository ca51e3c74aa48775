#![forbid(unsafe_code)]

use std::hash::Hash;
use std::hash::Hasher;

use equivalent::Equivalent;
use smallvec::SmallVec;

use rcterm_collections::SlotTable;
use rcterm_collections::TableConfig;
use rcterm_collections::TableMetrics;

use crate::SymbolId;
use crate::TermId;
use crate::storage::SymbolTable;

/// The content of a term as it is stored in the [TermTable].
///
/// Arguments are referred to by their ids, since they are maximally shared
/// themselves. As such hashing and comparing a node costs time proportional to
/// its arity and not to the size of the term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermNode {
    /// The application of a function symbol to arguments, the number of which matches its arity.
    Application {
        symbol: SymbolId,
        arguments: SmallVec<[TermId; 2]>,
    },
    /// An integer leaf.
    Int(i64),
}

impl TermNode {
    /// Returns the arguments of this node, which is empty for integers.
    pub fn arguments(&self) -> &[TermId] {
        match self {
            TermNode::Application { arguments, .. } => arguments,
            TermNode::Int(_) => &[],
        }
    }

    fn lookup(&self) -> TermLookup<'_> {
        match self {
            TermNode::Application { symbol, arguments } => TermLookup::Application {
                symbol: *symbol,
                arguments,
            },
            TermNode::Int(value) => TermLookup::Int(*value),
        }
    }
}

/// This hash must be the same as the one of [TermLookup].
impl Hash for TermNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lookup().hash(state);
    }
}

/// A cheap reference to the content of a term that can be used to look up
/// terms without allocating.
#[derive(Hash, PartialEq, Eq)]
pub(crate) enum TermLookup<'a> {
    Application { symbol: SymbolId, arguments: &'a [TermId] },
    Int(i64),
}

impl Equivalent<TermNode> for TermLookup<'_> {
    fn equivalent(&self, other: &TermNode) -> bool {
        *self == other.lookup()
    }
}

impl From<&TermLookup<'_>> for TermNode {
    fn from(lookup: &TermLookup<'_>) -> Self {
        match lookup {
            TermLookup::Application { symbol, arguments } => TermNode::Application {
                symbol: *symbol,
                arguments: SmallVec::from_slice(arguments),
            },
            TermLookup::Int(value) => TermNode::Int(*value),
        }
    }
}

/// Stores terms maximally shared, such that no two live entries describe the
/// same head and arguments.
///
/// The table only maintains the ownership of a term over its direct arguments,
/// releasing a term that becomes garbage hands back its node so that the
/// caller can release its arguments in turn, see [crate::TermStore::release].
pub struct TermTable {
    table: SlotTable<TermNode>,
}

impl TermTable {
    /// Creates an empty term table.
    pub(crate) fn new(config: TableConfig) -> Self {
        TermTable {
            table: SlotTable::new("term", config),
        }
    }

    /// Returns the id of the application of the symbol to the given arguments
    /// and adds a reference to it. A newly created term adds a reference to
    /// each of its arguments and counts as a user of its head symbol.
    ///
    /// Panics when the number of arguments does not match the arity of the
    /// symbol, or when the symbol or an argument is not live.
    pub(crate) fn intern_application(
        &mut self,
        symbols: &mut SymbolTable,
        symbol: SymbolId,
        arguments: &[TermId],
    ) -> TermId {
        assert_eq!(
            symbols.arity(symbol),
            arguments.len(),
            "The number of arguments does not match the arity of symbol {}",
            symbols.display(symbol)
        );
        for argument in arguments {
            assert!(self.valid(*argument), "Argument {argument} is not a live term");
        }

        let (index, inserted) = self.table.intern(&TermLookup::Application { symbol, arguments });
        if inserted {
            for argument in arguments {
                self.table.acquire(argument.index());
            }
            symbols.add_user(symbol);
        }

        TermId::from_index(index)
    }

    /// Returns the id of the integer leaf with the given value and adds a reference to it.
    pub(crate) fn intern_int(&mut self, value: i64) -> TermId {
        let (index, _) = self.table.intern(&TermLookup::Int(value));
        TermId::from_index(index)
    }

    /// Adds a reference to the given term.
    pub(crate) fn acquire(&mut self, term: TermId) {
        self.table.acquire(term.index());
    }

    /// Removes a single reference from the given term, and returns its node
    /// when the term has been reclaimed. The arguments of the returned node
    /// still carry the references of the reclaimed term.
    pub(crate) fn release_one(&mut self, term: TermId) -> Option<TermNode> {
        self.table.release(term.index())
    }

    /// Returns true iff the id refers to a live term.
    pub fn valid(&self, term: TermId) -> bool {
        self.table.contains_index(term.index())
    }

    /// Returns the node of the given term.
    pub fn node(&self, term: TermId) -> &TermNode {
        self.table
            .get(term.index())
            .unwrap_or_else(|| panic!("Term {term} is not live"))
    }

    /// Returns the id of the term with the given head and arguments, without adding a reference.
    pub(crate) fn find_application(&self, symbol: SymbolId, arguments: &[TermId]) -> Option<TermId> {
        self.table
            .find(&TermLookup::Application { symbol, arguments })
            .map(TermId::from_index)
    }

    /// Returns the number of references to the given term.
    pub fn reference_count(&self, term: TermId) -> usize {
        self.table
            .reference_count(term.index())
            .unwrap_or_else(|| panic!("Term {term} is not live"))
    }

    /// Returns the number of references to the given term, or `None` when it is not live.
    pub(crate) fn try_reference_count(&self, term: TermId) -> Option<usize> {
        self.table.reference_count(term.index())
    }

    /// Returns the number of live terms.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true iff there are no live terms.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns an iterator over all live terms.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &TermNode)> {
        self.table.iter().map(|(index, node)| (TermId::from_index(index), node))
    }

    /// Returns the occupancy of the underlying table.
    pub fn metrics(&self) -> TableMetrics<'_, TermNode, rustc_hash::FxBuildHasher> {
        self.table.metrics()
    }

    /// Returns the number of times that the term table has grown.
    pub fn growth_count(&self) -> usize {
        self.table.growth_count()
    }

    /// Returns the underlying table.
    pub(crate) fn table(&self) -> &SlotTable<TermNode> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use rcterm_macros::rcterm_test;

    use super::*;

    fn config() -> TableConfig {
        TableConfig {
            size_class: 2,
            max_size_class: 20,
            max_load_percent: 80,
        }
    }

    #[rcterm_test]
    fn test_application_owns_arguments() {
        let mut symbols = SymbolTable::new(config());
        let mut terms = TermTable::new(config());

        let f = symbols.intern("f", 2);
        let one = terms.intern_int(1);
        let two = terms.intern_int(2);

        let t = terms.intern_application(&mut symbols, f, &[one, two]);
        assert_eq!(terms.reference_count(one), 2, "The new parent owns a reference");
        assert_eq!(symbols.users(f), 1);
        assert_eq!(symbols.reference_count(f), 1, "Terms do not own their head symbol");

        let t2 = terms.intern_application(&mut symbols, f, &[one, two]);
        assert_eq!(t, t2);
        assert_eq!(terms.reference_count(t), 2);
        assert_eq!(terms.reference_count(one), 2, "A shared term does not acquire its arguments again");
        assert_eq!(terms.find_application(f, &[one, two]), Some(t));
        assert_eq!(terms.find_application(f, &[two, one]), None);

        assert_eq!(terms.release_one(t), None);
        let node = terms.release_one(t).expect("The last reference reclaims the term");
        assert_eq!(node.arguments(), &[one, two]);
        assert!(!terms.valid(t));
    }

    #[rcterm_test]
    fn test_int_leaves() {
        let mut terms = TermTable::new(config());

        let a = terms.intern_int(-5);
        let b = terms.intern_int(-5);
        let c = terms.intern_int(5);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(terms.node(a), &TermNode::Int(-5));
        assert!(terms.node(a).arguments().is_empty());
        terms.table().verify();
    }

    #[rcterm_test]
    #[should_panic(expected = "does not match the arity")]
    fn test_arity_mismatch() {
        let mut symbols = SymbolTable::new(config());
        let mut terms = TermTable::new(config());

        let f = symbols.intern("f", 2);
        let one = terms.intern_int(1);
        terms.intern_application(&mut symbols, f, &[one]);
    }

    #[rcterm_test]
    #[should_panic(expected = "is not a live term")]
    fn test_dead_argument() {
        let mut symbols = SymbolTable::new(config());
        let mut terms = TermTable::new(config());

        let g = symbols.intern("g", 1);
        let one = terms.intern_int(1);
        terms.release_one(one);
        terms.intern_application(&mut symbols, g, &[one]);
    }
}
