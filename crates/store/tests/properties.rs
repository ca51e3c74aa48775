use std::collections::HashMap;

use rand::Rng;

use rcterm_macros::rcterm_test;
use rcterm_store::StoreConfig;
use rcterm_store::SymbolId;
use rcterm_store::TermId;
use rcterm_store::TermStore;
use rcterm_store::random_term;
use rcterm_utilities::random_test;

#[rcterm_test]
fn test_hash_consing_scenario() {
    let mut store = TermStore::new();

    let f = store.intern_symbol("f", 2);
    assert_eq!(f.index(), 4, "The first user symbol follows the four builtin symbols");
    assert_eq!(store.symbol_reference_count(f), 1);

    assert_eq!(store.intern_symbol("f", 2), f);
    assert_eq!(store.symbol_reference_count(f), 2);

    let one = store.intern_int(1);
    let two = store.intern_int(2);
    let t = store.intern_application(f, &[one, two]);
    store.release(one);
    store.release(two);

    assert_eq!(store.term_reference_count(t), 1);
    assert_eq!(store.term_reference_count(one), 1);
    assert_eq!(store.term_reference_count(two), 1);

    store.release(t);
    assert!(!store.valid(t));
    assert!(!store.valid(one));
    assert!(!store.valid(two));
    assert_eq!(store.symbol_reference_count(f), 2, "Releasing a term does not touch its head symbol");

    store.release_symbol(f);
    assert!(store.symbol_valid(f));
    store.release_symbol(f);
    assert!(!store.symbol_valid(f));
    store.verify();
}

#[rcterm_test]
fn test_builtin_stability() {
    let store = TermStore::new();
    let builtins = store.builtins();

    assert_eq!(builtins.undefined_symbol, SymbolId::from_index(0));
    assert_eq!(builtins.int_symbol, SymbolId::from_index(1));
    assert_eq!(builtins.cons_symbol, SymbolId::from_index(2));
    assert_eq!(builtins.empty_list_symbol, SymbolId::from_index(3));
    assert_eq!(store.symbol_arity(builtins.cons_symbol), 2);
    assert_eq!(store.symbol_arity(builtins.empty_list_symbol), 0);
    assert!(store.valid(store.undefined()));
    assert!(store.valid(store.empty_list()));
}

#[rcterm_test]
fn test_symbol_reuse() {
    let mut store = TermStore::new();

    let g = store.intern_symbol("g", 1);
    store.release_symbol(g);
    assert!(!store.symbol_valid(g));

    let h = store.intern_symbol("h", 0);
    let g2 = store.intern_symbol("g", 1);
    assert!(store.symbol_valid(g2));
    assert_eq!(store.symbol_reference_count(g2), 1);
    assert_ne!(g2, h);
}

#[rcterm_test]
fn test_list_sharing() {
    let mut store = TermStore::new();

    let h = store.intern_int(1);
    let h2 = store.intern_int(2);

    let build = |store: &mut TermStore| {
        let nil = store.nil();
        let tail = store.cons(h2, nil);
        let list = store.cons(h, tail);
        store.release(tail);
        store.release(nil);
        list
    };

    let first = build(&mut store);
    let second = build(&mut store);
    assert_eq!(first, second);
    assert_eq!(store.nil(), store.nil());
    assert_eq!(store.display(first).to_string(), "[1, 2]");
}

#[rcterm_test]
#[cfg_attr(miri, ignore)]
fn test_deep_release() {
    let mut store = TermStore::new();

    let elements: Vec<TermId> = (0..100).map(|value| store.intern_int(value)).collect();
    let mut list = store.nil();
    for i in 0..100_000 {
        let next = store.cons(elements[i % elements.len()], list);
        store.release(list);
        list = next;
    }
    for element in elements {
        store.release(element);
    }

    assert_eq!(store.list_len(list), 100_000);
    assert_eq!(store.term_count(), 2 + 100 + 100_000);

    store.release(list);
    assert!(!store.valid(list));
    assert_eq!(store.term_count(), 2, "Every cell and element has been reclaimed");
    store.verify();
}

#[rcterm_test]
#[cfg_attr(miri, ignore)]
fn test_growth_transparency() {
    let mut store = TermStore::with_config(StoreConfig {
        symbol_size_class: 3,
        term_size_class: 4,
        ..StoreConfig::default()
    })
    .unwrap();

    let pair = store.intern_symbol("pair", 2);
    let mut terms = vec![store.intern_int(0)];
    for i in 1..5000 {
        let left = terms[i / 2];
        let right = terms[i - 1];
        terms.push(store.intern_application(pair, &[left, right]));
    }

    let growths = store.term_table().growth_count();
    assert!(growths >= 8, "The term table should have grown, but grew {growths} times");

    for term in &terms {
        assert!(store.valid(*term));
    }
    for i in 1..5000 {
        assert_eq!(store.intern_application(pair, &[terms[i / 2], terms[i - 1]]), terms[i]);
        store.release(terms[i]);
    }

    store.verify();
}

/// Applies random operations to a store and compares the reference counts with a model.
#[test]
#[cfg_attr(miri, ignore)]
fn test_random_reference_counting() {
    random_test(20, |rng| {
        let mut store = TermStore::with_config(StoreConfig {
            symbol_size_class: 2,
            term_size_class: 2,
            ..StoreConfig::default()
        })
        .unwrap();

        let symbols = [
            store.intern_symbol("f", 2),
            store.intern_symbol("g", 1),
            store.intern_symbol("h", 3),
        ];
        let constants = [store.intern_symbol("a", 0), store.intern_symbol("b", 0)];

        // The references owned by this test.
        let mut owned: HashMap<TermId, usize> = HashMap::new();

        for _ in 0..200 {
            match rng.random_range(0..4) {
                0 => {
                    let term = random_term(&mut store, rng, &symbols, &constants, 10);
                    *owned.entry(term).or_default() += 1;
                }
                1 if !owned.is_empty() => {
                    let term = *owned.keys().nth(rng.random_range(0..owned.len())).unwrap();
                    store.acquire(term);
                    *owned.entry(term).or_default() += 1;
                }
                2 if !owned.is_empty() => {
                    let term = *owned.keys().nth(rng.random_range(0..owned.len())).unwrap();
                    store.release(term);

                    let count = owned.get_mut(&term).unwrap();
                    *count -= 1;
                    if *count == 0 {
                        owned.remove(&term);
                    }
                }
                _ => {
                    let value = rng.random_range(0..10);
                    let term = store.intern_int(value);
                    *owned.entry(term).or_default() += 1;
                }
            }

            for (term, count) in &owned {
                assert!(store.valid(*term), "Owned term {term} has been reclaimed");
                assert!(store.term_reference_count(*term) >= *count);
            }
        }

        store.verify();

        for (term, count) in owned {
            for _ in 0..count {
                store.release(term);
            }
        }
        assert_eq!(store.term_count(), 2, "Releasing every owned reference reclaims everything");
    });
}
