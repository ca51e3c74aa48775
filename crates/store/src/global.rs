//! The process-wide term store.
//!
//! The store must be created by [initialize] before any other function of this
//! module is used, and it is destroyed by [teardown]. Every function called
//! while there is no store panics. The store is protected by a mutex, but it is
//! meant to be used by a single writer, and a batch of operations should go
//! through [with_store] to take the lock once.
//!
//! Deletion hooks run while the lock is held, so they must not call the
//! functions of this module.

#![forbid(unsafe_code)]

use log::debug;
use parking_lot::Mutex;

use crate::ConfigError;
use crate::RootIndex;
use crate::StoreConfig;
use crate::SymbolId;
use crate::TermId;
use crate::TermKind;
use crate::TermStore;

static GLOBAL_STORE: Mutex<Option<TermStore>> = Mutex::new(None);

/// Creates the process-wide store with the default configuration.
///
/// Panics when the store is already initialized.
pub fn initialize() {
    install(TermStore::new());
}

/// Creates the process-wide store with the given configuration.
///
/// Panics when the store is already initialized.
pub fn initialize_with(config: StoreConfig) -> Result<(), ConfigError> {
    install(TermStore::with_config(config)?);
    Ok(())
}

fn install(store: TermStore) {
    let mut global = GLOBAL_STORE.lock();
    assert!(global.is_none(), "The store is already initialized, it must be torn down first");
    *global = Some(store);
    debug!("Initialized the global term store");
}

/// Destroys the process-wide store, after which every id it returned is meaningless.
///
/// Panics when the store is not initialized.
pub fn teardown() {
    let store = GLOBAL_STORE.lock().take();
    match store {
        Some(store) => {
            debug!("Tearing down the global term store");
            drop(store);
        }
        None => panic!("Cannot tear down, the store is not initialized"),
    }
}

/// Returns true iff the process-wide store is initialized.
pub fn is_initialized() -> bool {
    GLOBAL_STORE.lock().is_some()
}

/// Calls the function with exclusive access to the process-wide store.
///
/// Panics when the store is not initialized.
pub fn with_store<R>(f: impl FnOnce(&mut TermStore) -> R) -> R {
    let mut global = GLOBAL_STORE.lock();
    match global.as_mut() {
        Some(store) => f(store),
        None => panic!("Cannot access the term store, the store is not initialized"),
    }
}

/// See [TermStore::intern_symbol].
pub fn intern_symbol(name: &str, arity: usize) -> SymbolId {
    with_store(|store| store.intern_symbol(name, arity))
}

/// See [TermStore::find_symbol].
pub fn find_symbol(name: &str, arity: usize) -> Option<SymbolId> {
    with_store(|store| store.find_symbol(name, arity))
}

/// See [TermStore::acquire_symbol].
pub fn acquire_symbol(symbol: SymbolId) {
    with_store(|store| store.acquire_symbol(symbol))
}

/// See [TermStore::release_symbol].
pub fn release_symbol(symbol: SymbolId) {
    with_store(|store| store.release_symbol(symbol))
}

/// See [TermStore::symbol_valid].
pub fn symbol_valid(symbol: SymbolId) -> bool {
    with_store(|store| store.symbol_valid(symbol))
}

/// See [TermStore::intern_application].
pub fn intern_application(symbol: SymbolId, arguments: &[TermId]) -> TermId {
    with_store(|store| store.intern_application(symbol, arguments))
}

/// See [TermStore::intern_int].
pub fn intern_int(value: i64) -> TermId {
    with_store(|store| store.intern_int(value))
}

/// See [TermStore::cons].
pub fn cons(head: TermId, tail: TermId) -> TermId {
    with_store(|store| store.cons(head, tail))
}

/// See [TermStore::nil].
pub fn nil() -> TermId {
    with_store(|store| store.nil())
}

/// See [TermStore::undefined].
pub fn undefined() -> TermId {
    with_store(|store| store.undefined())
}

/// See [TermStore::empty_list].
pub fn empty_list() -> TermId {
    with_store(|store| store.empty_list())
}

/// See [TermStore::acquire].
pub fn acquire(term: TermId) {
    with_store(|store| store.acquire(term))
}

/// See [TermStore::release].
pub fn release(term: TermId) {
    with_store(|store| store.release(term))
}

/// See [TermStore::valid].
pub fn valid(term: TermId) -> bool {
    with_store(|store| store.valid(term))
}

/// See [TermStore::protect].
pub fn protect(terms: &[TermId]) -> RootIndex {
    with_store(|store| store.protect(terms))
}

/// See [TermStore::protect_symbols].
pub fn protect_symbols(symbols: &[SymbolId]) -> RootIndex {
    with_store(|store| store.protect_symbols(symbols))
}

/// See [TermStore::unprotect].
pub fn unprotect(root: RootIndex) {
    with_store(|store| store.unprotect(root))
}

/// See [TermStore::set_argument].
pub fn set_argument(term: TermId, index: usize, argument: TermId) -> TermId {
    with_store(|store| store.set_argument(term, index, argument))
}

/// See [TermStore::term_kind].
pub fn term_kind(term: TermId) -> TermKind {
    with_store(|store| store.term_kind(term))
}

/// See [TermStore::term_reference_count].
pub fn term_reference_count(term: TermId) -> usize {
    with_store(|store| store.term_reference_count(term))
}

/// See [TermStore::symbol_reference_count].
pub fn symbol_reference_count(symbol: SymbolId) -> usize {
    with_store(|store| store.symbol_reference_count(symbol))
}

/// Returns the textual form of the term, see [TermStore::display].
pub fn display(term: TermId) -> String {
    with_store(|store| store.display(term).to_string())
}
