#![forbid(unsafe_code)]

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::SymbolId;
use crate::TermId;
use crate::TermStore;

/// Creates a random term consisting of the given function symbols and
/// constants. Performs `iterations` constructions, where every construction
/// picks its arguments among the terms constructed before, so that subterms
/// are shared.
///
/// Returns an owned reference to the last constructed term, the intermediate
/// terms are only kept alive as subterms of the result. The caller must keep
/// the symbols alive for as long as the result is.
pub fn random_term(
    store: &mut TermStore,
    rng: &mut impl Rng,
    symbols: &[SymbolId],
    constants: &[SymbolId],
    iterations: usize,
) -> TermId {
    assert!(!constants.is_empty(), "We need constants to be able to create a term");

    // Every entry carries one reference.
    let mut subterms: Vec<TermId> = constants
        .iter()
        .map(|constant| store.intern_application(*constant, &[]))
        .collect();

    let mut arguments = Vec::new();
    for _ in 0..iterations {
        let Some(symbol) = symbols.choose(rng) else {
            break;
        };

        arguments.clear();
        for _ in 0..store.symbol_arity(*symbol) {
            if let Some(argument) = subterms.choose(rng) {
                arguments.push(*argument);
            }
        }

        // Make this term available as another subterm that can be used.
        let term = store.intern_application(*symbol, &arguments);
        subterms.push(term);
    }

    let Some(result) = subterms.pop() else {
        unreachable!("There is at least one constant");
    };
    for term in subterms {
        store.release(term);
    }

    result
}
