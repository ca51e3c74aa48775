use std::hint::black_box;

use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rcterm_store::SymbolId;
use rcterm_store::TermId;
use rcterm_store::TermStore;
use rcterm_store::random_term;

/// Creates f_0 = c and f_i = f(f_{i-1}, f_{i-1}), which is a term of exponential
/// size that only consists of `depth + 1` shared subterms.
fn create_nested_function(store: &mut TermStore, f: SymbolId, c: SymbolId, depth: usize) -> TermId {
    let mut term = store.intern_application(c, &[]);
    for _ in 0..depth {
        let next = store.intern_application(f, &[term, term]);
        store.release(term);
        term = next;
    }

    term
}

/// Creates a list with the given number of distinct integer elements.
fn create_list(store: &mut TermStore, length: i64) -> TermId {
    let mut list = store.nil();
    for value in 0..length {
        let element = store.intern_int(value);
        let next = store.cons(element, list);
        store.release(element);
        store.release(list);
        list = next;
    }

    list
}

fn benchmark_shared_creation(c: &mut Criterion) {
    let _ = env_logger::try_init();

    c.bench_function("shared_creation", |b| {
        let mut store = TermStore::new();
        let f = store.intern_symbol("f", 2);
        let constant = store.intern_symbol("c", 0);

        b.iter(|| {
            let term = create_nested_function(&mut store, f, constant, 1000);
            store.release(black_box(term));
        });
    });
}

fn benchmark_shared_lookup(c: &mut Criterion) {
    let _ = env_logger::try_init();

    c.bench_function("shared_lookup", |b| {
        let mut store = TermStore::new();
        let f = store.intern_symbol("f", 2);
        let constant = store.intern_symbol("c", 0);
        let term = create_nested_function(&mut store, f, constant, 1000);

        // Every construction is now a lookup of an existing term.
        b.iter(|| {
            let again = create_nested_function(&mut store, f, constant, 1000);
            assert_eq!(again, term);
            store.release(black_box(again));
        });
    });
}

fn benchmark_list_creation(c: &mut Criterion) {
    let _ = env_logger::try_init();

    c.bench_function("list_creation_release", |b| {
        let mut store = TermStore::new();
        b.iter(|| {
            let list = create_list(&mut store, 100_000);
            store.release(black_box(list));
        });
    });
}

fn benchmark_list_inspect(c: &mut Criterion) {
    let _ = env_logger::try_init();

    c.bench_function("list_inspect", |b| {
        let mut store = TermStore::new();
        let list = create_list(&mut store, 100_000);

        b.iter(|| {
            let sum: i64 = store
                .list_iter(list)
                .filter_map(|element| store.int_value(element))
                .sum();
            black_box(sum)
        });
    });
}

fn benchmark_random_terms(c: &mut Criterion) {
    let _ = env_logger::try_init();

    c.bench_function("random_terms", |b| {
        let mut store = TermStore::new();
        let mut rng = StdRng::seed_from_u64(1234);

        let symbols = [store.intern_symbol("f", 2), store.intern_symbol("g", 1)];
        let constants = [store.intern_symbol("a", 0), store.intern_symbol("b", 0)];

        b.iter(|| {
            let term = random_term(&mut store, &mut rng, &symbols, &constants, 1000);
            store.release(black_box(term));
        });
    });
}

criterion_group!(
    benches,
    benchmark_shared_creation,
    benchmark_shared_lookup,
    benchmark_list_creation,
    benchmark_list_inspect,
    benchmark_random_terms,
);
criterion_main!(benches);
