#![forbid(unsafe_code)]

use std::fmt;

use log::debug;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use rcterm_utilities::LargeFormatter;
use rcterm_utilities::debug_trace;

use crate::Builtins;
use crate::ConfigError;
use crate::StoreConfig;
use crate::SymbolId;
use crate::TermId;
use crate::storage::RootIndex;
use crate::storage::RootRange;
use crate::storage::RootRegistry;
use crate::storage::SymbolTable;
use crate::storage::TermNode;
use crate::storage::TermTable;

/// A callback that is invoked with a term right before it is reclaimed.
type DeletionHook = Box<dyn FnMut(TermId) + Send>;

/// The kind of a term, as determined by its head symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// The application of a function symbol to zero or more arguments.
    Application,
    /// An integer leaf.
    Int,
    /// A list cell built with the list constructor.
    List,
    /// The empty list.
    EmptyList,
}

/// The store of maximally shared, reference counted terms and the function
/// symbols they are built from.
///
/// # Details
///
/// Every id that is returned by an intern operation is owned by the caller,
/// i.e., it carries one reference that must be given back by a matching
/// release. Terms own a reference to each of their arguments, but not to their
/// head symbol. Instead a symbol cannot be reclaimed while there are live
/// terms with it as head, and doing so anyway is a fatal error.
///
/// All misuse, e.g., releasing an id that is not live, is detected and results
/// in a panic instead of corrupting the tables.
pub struct TermStore {
    symbols: SymbolTable,
    terms: TermTable,
    builtins: Builtins,
    roots: RootRegistry,

    /// Callbacks for terms with a specific head symbol that are reclaimed.
    deletion_hooks: Vec<(SymbolId, DeletionHook)>,

    /// Applications of the list constructor whose tail is not a list.
    improper_lists: FxHashSet<TermId>,

    /// Reused to avoid allocating the work list of every release.
    release_stack: Vec<TermId>,
}

impl TermStore {
    /// Creates a store with the default configuration.
    pub fn new() -> TermStore {
        Self::build(StoreConfig::default())
    }

    /// Creates a store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Result<TermStore, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> TermStore {
        let mut symbols = SymbolTable::new(config.symbol_table());
        let mut terms = TermTable::new(config.term_table());
        let builtins = Builtins::install(&mut symbols, &mut terms);

        debug!(
            "Created term store with symbol size class {}, term size class {} and maximum load {}%",
            config.symbol_size_class, config.term_size_class, config.max_load_percent
        );

        TermStore {
            symbols,
            terms,
            builtins,
            roots: RootRegistry::new(),
            deletion_hooks: Vec::new(),
            improper_lists: FxHashSet::default(),
            release_stack: Vec::new(),
        }
    }

    /// Returns the builtin symbols and terms of this store.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Returns the symbol with the given name and arity, see [SymbolTable::intern].
    pub fn intern_symbol(&mut self, name: &str, arity: usize) -> SymbolId {
        #[cfg(feature = "rcterm_debug")]
        let growths = self.growth_count();

        let symbol = self.symbols.intern(name, arity);

        #[cfg(feature = "rcterm_debug")]
        self.verify_after_growth(growths);

        symbol
    }

    /// Returns the symbol with the given name and arity when it exists, without adding a reference.
    pub fn find_symbol(&self, name: &str, arity: usize) -> Option<SymbolId> {
        self.symbols.find(name, arity)
    }

    /// Adds a reference to the given symbol.
    pub fn acquire_symbol(&mut self, symbol: SymbolId) {
        self.symbols.acquire(symbol);
    }

    /// Removes a reference from the given symbol, which is reclaimed when this was its last reference.
    ///
    /// Panics when the symbol is not live, is still the head of a live term,
    /// or is a builtin symbol for which this would be the last reference.
    pub fn release_symbol(&mut self, symbol: SymbolId) {
        if self.builtins.is_builtin_symbol(symbol) {
            assert!(
                self.symbols.reference_count(symbol) > 1,
                "Cannot release the last reference of the builtin symbol {}",
                self.symbols.display(symbol)
            );
        }

        self.symbols.release(symbol);
    }

    /// Returns true iff the id refers to a live symbol.
    pub fn symbol_valid(&self, symbol: SymbolId) -> bool {
        self.symbols.valid(symbol)
    }

    /// Returns the application of the symbol to the given arguments.
    ///
    /// The caller keeps its references to the arguments, the new term adds its
    /// own. Panics when the number of arguments does not match the arity of the
    /// symbol, or when the symbol or one of the arguments is not live.
    pub fn intern_application(&mut self, symbol: SymbolId, arguments: &[TermId]) -> TermId {
        #[cfg(feature = "rcterm_debug")]
        let growths = self.growth_count();

        let term = self.terms.intern_application(&mut self.symbols, symbol, arguments);
        debug_trace!("Interned {term} with head {}", self.symbols.display(symbol));

        // The arity check guarantees that list cells have a tail.
        if symbol == self.builtins.cons_symbol && !self.is_list(arguments[1]) {
            self.improper_lists.insert(term);
        }

        #[cfg(feature = "rcterm_debug")]
        self.verify_after_growth(growths);

        term
    }

    /// Returns the integer leaf with the given value.
    pub fn intern_int(&mut self, value: i64) -> TermId {
        #[cfg(feature = "rcterm_debug")]
        let growths = self.growth_count();

        let term = self.terms.intern_int(value);

        #[cfg(feature = "rcterm_debug")]
        self.verify_after_growth(growths);

        term
    }

    /// Returns the term with the given head and arguments when it exists, without adding a reference.
    pub fn find_application(&self, symbol: SymbolId, arguments: &[TermId]) -> Option<TermId> {
        self.terms.find_application(symbol, arguments)
    }

    /// Returns the builtin term that marks undefined values. The store owns
    /// this term, so the caller must not release it.
    pub fn undefined(&self) -> TermId {
        self.builtins.undefined_term
    }

    /// Returns the builtin empty list. The store owns this term, so the caller
    /// must not release it, see [TermStore::nil] for an owned empty list.
    pub fn empty_list(&self) -> TermId {
        self.builtins.empty_list_term
    }

    /// Adds a reference to the given term.
    pub fn acquire(&mut self, term: TermId) {
        self.terms.acquire(term);
    }

    /// Removes a reference from the given term.
    ///
    /// When this was the last reference the term is reclaimed, which removes a
    /// reference from each of its arguments in turn. This uses an explicit
    /// work list, so the depth of the reclaimed term does not matter.
    pub fn release(&mut self, term: TermId) {
        let mut stack = std::mem::take(&mut self.release_stack);
        stack.push(term);

        while let Some(term) = stack.pop() {
            let count = self
                .terms
                .try_reference_count(term)
                .unwrap_or_else(|| panic!("Cannot release term {term}, it is not live"));

            if count == 1 {
                assert!(
                    !self.builtins.is_builtin_term(term),
                    "Cannot release the last reference of the builtin term {term}"
                );
                self.run_deletion_hooks(term);
            }

            if let Some(node) = self.terms.release_one(term) {
                debug_trace!("Reclaimed term {term}");
                if let TermNode::Application { symbol, arguments } = node {
                    if symbol == self.builtins.cons_symbol {
                        self.improper_lists.remove(&term);
                    }
                    self.symbols.remove_user(symbol);
                    stack.extend(arguments);
                }
            }
        }

        self.release_stack = stack;
    }

    /// Returns true iff the id refers to a live term.
    pub fn valid(&self, term: TermId) -> bool {
        self.terms.valid(term)
    }

    /// Protects the given terms until the returned root is unprotected. The
    /// registration counts as one additional owner of every term in the range.
    pub fn protect(&mut self, terms: &[TermId]) -> RootIndex {
        for term in terms {
            self.terms.acquire(*term);
        }

        let root = self.roots.register(RootRange::Terms(terms.into()));
        debug!(
            "Protected {} terms as root {root}, {} roots registered",
            terms.len(),
            self.roots.len()
        );
        root
    }

    /// Protects the given symbols until the returned root is unprotected.
    pub fn protect_symbols(&mut self, symbols: &[SymbolId]) -> RootIndex {
        for symbol in symbols {
            self.symbols.acquire(*symbol);
        }

        let root = self.roots.register(RootRange::Symbols(symbols.into()));
        debug!(
            "Protected {} symbols as root {root}, {} roots registered",
            symbols.len(),
            self.roots.len()
        );
        root
    }

    /// Removes the ownership of the registration over its range.
    ///
    /// Panics when the root was never protected or has already been unprotected.
    pub fn unprotect(&mut self, root: RootIndex) {
        let range = self.roots.unregister(root);
        debug!(
            "Unprotected {} ids of root {root}, {} roots registered",
            range.len(),
            self.roots.len()
        );

        match range {
            RootRange::Terms(terms) => {
                for term in terms.iter() {
                    self.release(*term);
                }
            }
            RootRange::Symbols(symbols) => {
                for symbol in symbols.iter() {
                    self.release_symbol(*symbol);
                }
            }
        }
    }

    /// Replaces the term at the given position of a protected range, the new
    /// term is protected before the old one is released.
    pub fn update_root(&mut self, root: RootIndex, position: usize, term: TermId) {
        self.terms.acquire(term);

        let old = match self.roots.get_mut(root) {
            RootRange::Terms(terms) => {
                assert!(
                    position < terms.len(),
                    "Position {position} is out of bounds for root {root} of {} terms",
                    terms.len()
                );
                std::mem::replace(&mut terms[position], term)
            }
            RootRange::Symbols(_) => panic!("Root {root} protects symbols and not terms"),
        };

        self.release(old);
    }

    /// Returns the currently registered roots.
    pub fn roots(&self) -> impl Iterator<Item = (RootIndex, &RootRange)> {
        self.roots.iter()
    }

    /// Registers a callback that is called with every term that has the given
    /// head symbol right before it is reclaimed. The registration holds a
    /// reference to the symbol for the lifetime of the store.
    pub fn register_deletion_hook(&mut self, symbol: SymbolId, hook: impl FnMut(TermId) + Send + 'static) {
        self.symbols.acquire(symbol);
        self.deletion_hooks.push((symbol, Box::new(hook)));
    }

    /// Returns the term equal to the given term except that the argument at
    /// the given index is replaced. The given term itself is unchanged.
    pub fn set_argument(&mut self, term: TermId, index: usize, argument: TermId) -> TermId {
        let TermNode::Application { symbol, arguments } = self.terms.node(term) else {
            panic!("Cannot replace argument {index} of the integer leaf {term}");
        };
        assert!(
            index < arguments.len(),
            "Argument index {index} is out of bounds for term {term} of arity {}",
            arguments.len()
        );

        let symbol = *symbol;
        let mut arguments: SmallVec<[TermId; 4]> = SmallVec::from_slice(arguments);
        arguments[index] = argument;
        self.intern_application(symbol, &arguments)
    }

    /// Returns the head symbol of the term, which is the builtin integer symbol for integer leaves.
    pub fn symbol_of(&self, term: TermId) -> SymbolId {
        match self.terms.node(term) {
            TermNode::Application { symbol, .. } => *symbol,
            TermNode::Int(_) => self.builtins.int_symbol,
        }
    }

    /// Returns the arguments of the term.
    pub fn arguments(&self, term: TermId) -> &[TermId] {
        self.terms.node(term).arguments()
    }

    /// Returns the number of arguments of the term.
    pub fn arity(&self, term: TermId) -> usize {
        self.arguments(term).len()
    }

    /// Returns the value of an integer leaf, and `None` for other terms.
    pub fn int_value(&self, term: TermId) -> Option<i64> {
        match self.terms.node(term) {
            TermNode::Int(value) => Some(*value),
            TermNode::Application { .. } => None,
        }
    }

    /// Returns the kind of the term. An application of the list constructor
    /// whose tail is not a list is an ordinary application.
    pub fn term_kind(&self, term: TermId) -> TermKind {
        match self.terms.node(term) {
            TermNode::Int(_) => TermKind::Int,
            TermNode::Application { symbol, .. } if *symbol == self.builtins.cons_symbol => {
                if self.improper_lists.contains(&term) {
                    TermKind::Application
                } else {
                    TermKind::List
                }
            }
            TermNode::Application { symbol, .. } if *symbol == self.builtins.empty_list_symbol => TermKind::EmptyList,
            TermNode::Application { .. } => TermKind::Application,
        }
    }

    /// Returns the name of the symbol.
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.symbols.name(symbol)
    }

    /// Returns the arity of the symbol.
    pub fn symbol_arity(&self, symbol: SymbolId) -> usize {
        self.symbols.arity(symbol)
    }

    /// Returns the number of references to the term.
    pub fn term_reference_count(&self, term: TermId) -> usize {
        self.terms.reference_count(term)
    }

    /// Returns the number of references to the symbol.
    pub fn symbol_reference_count(&self, symbol: SymbolId) -> usize {
        self.symbols.reference_count(symbol)
    }

    /// Returns the number of live terms, including the builtin terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Returns the number of live symbols, including the builtin symbols.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the symbol table.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Returns the term table.
    pub fn term_table(&self) -> &TermTable {
        &self.terms
    }

    /// Returns a value that prints the occupancy of the store.
    pub fn metrics(&self) -> StoreMetrics<'_> {
        StoreMetrics(self)
    }

    /// Checks the consistency of all tables, which takes time proportional to their size.
    ///
    /// Panics when the store is inconsistent.
    pub fn verify(&self) {
        self.symbols.table().verify();
        self.terms.table().verify();

        for symbol in self.builtins.symbols() {
            assert!(self.symbols.valid(symbol), "Builtin symbol {symbol} is not live");
        }
        for term in [self.builtins.undefined_term, self.builtins.empty_list_term] {
            assert!(self.terms.valid(term), "Builtin term {term} is not live");
        }

        // The references that every term should at least have.
        let mut owners: FxHashMap<TermId, usize> = FxHashMap::default();
        let mut users: FxHashMap<SymbolId, usize> = FxHashMap::default();

        for (term, node) in self.terms.iter() {
            if let TermNode::Application { symbol, arguments } = node {
                assert!(self.symbols.valid(*symbol), "Term {term} has the reclaimed head symbol {symbol}");
                assert_eq!(
                    self.symbols.arity(*symbol),
                    arguments.len(),
                    "Term {term} does not match the arity of its head {}",
                    self.symbols.display(*symbol)
                );
                *users.entry(*symbol).or_default() += 1;

                for argument in arguments {
                    assert!(self.terms.valid(*argument), "Term {term} has the reclaimed argument {argument}");
                    *owners.entry(*argument).or_default() += 1;
                }

                if *symbol == self.builtins.cons_symbol {
                    assert_eq!(
                        self.improper_lists.contains(&term),
                        !self.is_list(arguments[1]),
                        "List cell {term} is classified wrongly"
                    );
                }
            }
        }

        for (_, range) in self.roots.iter() {
            match range {
                RootRange::Terms(terms) => {
                    for term in terms.iter() {
                        assert!(self.terms.valid(*term), "Protected term {term} is not live");
                        *owners.entry(*term).or_default() += 1;
                    }
                }
                RootRange::Symbols(symbols) => {
                    for symbol in symbols.iter() {
                        assert!(self.symbols.valid(*symbol), "Protected symbol {symbol} is not live");
                    }
                }
            }
        }

        for term in &self.improper_lists {
            assert!(
                self.terms.valid(*term) && self.symbol_of(*term) == self.builtins.cons_symbol,
                "Improper list cell {term} is not a live application of the list constructor"
            );
        }

        for (term, count) in owners {
            assert!(
                self.terms.reference_count(term) >= count,
                "Term {term} has {} references, but {count} known owners",
                self.terms.reference_count(term)
            );
        }

        for (symbol, _) in self.symbols.iter() {
            let expected = users.get(&symbol).copied().unwrap_or_default();
            assert_eq!(
                self.symbols.users(symbol),
                expected,
                "Symbol {} is the head of {expected} terms, but records a different number",
                self.symbols.display(symbol)
            );
        }
    }

    /// Calls the deletion hooks that are registered for the head symbol of the term.
    fn run_deletion_hooks(&mut self, term: TermId) {
        if self.deletion_hooks.is_empty() {
            return;
        }

        let head = self.symbol_of(term);
        for (symbol, hook) in &mut self.deletion_hooks {
            if *symbol == head {
                hook(term);
            }
        }
    }

    #[cfg(feature = "rcterm_debug")]
    fn growth_count(&self) -> usize {
        self.symbols.growth_count() + self.terms.growth_count()
    }

    #[cfg(feature = "rcterm_debug")]
    fn verify_after_growth(&self, growths: usize) {
        if self.growth_count() != growths {
            self.verify();
        }
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TermStore {
    fn drop(&mut self) {
        debug!("Dropping term store, {}", self.metrics());
    }
}

/// Prints the occupancy of a [TermStore].
pub struct StoreMetrics<'a>(&'a TermStore);

impl fmt::Display for StoreMetrics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.0.symbols.metrics())?;
        writeln!(f, "{}", self.0.terms.metrics())?;
        write!(
            f,
            "{} protected roots, {} protections in total",
            LargeFormatter(self.0.roots.len()),
            LargeFormatter(self.0.roots.number_of_insertions())
        )
    }
}
