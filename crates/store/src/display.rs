#![forbid(unsafe_code)]

use std::fmt;

use crate::TermId;
use crate::TermKind;
use crate::TermStore;

impl TermStore {
    /// Returns a value that prints the given term, e.g. `f(a, g(1), [b, c])`.
    pub fn display(&self, term: TermId) -> TermDisplay<'_> {
        TermDisplay { store: self, term }
    }
}

/// Prints a term in a human readable form, where lists are written as `[a, b]`
/// and integer leaves as their value. This is meant for diagnostics and it
/// cannot be parsed back.
pub struct TermDisplay<'a> {
    store: &'a TermStore,
    term: TermId,
}

/// The remaining work when printing a term.
enum Item {
    Term(TermId),
    Text(&'static str),
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store;
        let mut stack = vec![Item::Term(self.term)];

        while let Some(item) = stack.pop() {
            let term = match item {
                Item::Text(text) => {
                    write!(f, "{text}")?;
                    continue;
                }
                Item::Term(term) => term,
            };

            match store.term_kind(term) {
                TermKind::Int => {
                    if let Some(value) = store.int_value(term) {
                        write!(f, "{value}")?;
                    }
                }
                TermKind::EmptyList => write!(f, "[]")?,
                TermKind::List => {
                    write!(f, "[")?;
                    let elements: Vec<TermId> = store.list_iter(term).collect();
                    push_separated(&mut stack, &elements, "]");
                }
                TermKind::Application => {
                    write!(f, "{}", store.symbol_name(store.symbol_of(term)))?;

                    let arguments = store.arguments(term);
                    if !arguments.is_empty() {
                        write!(f, "(")?;
                        push_separated(&mut stack, arguments, ")");
                    }
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Pushes the terms separated by commas followed by the closing text, such
/// that they are popped in order.
fn push_separated(stack: &mut Vec<Item>, terms: &[TermId], close: &'static str) {
    stack.push(Item::Text(close));
    for (i, term) in terms.iter().enumerate().rev() {
        stack.push(Item::Term(*term));
        if i > 0 {
            stack.push(Item::Text(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use rcterm_macros::rcterm_test;

    use super::*;

    #[rcterm_test]
    fn test_display() {
        let mut store = TermStore::new();

        let f = store.intern_symbol("f", 2);
        let g = store.intern_symbol("g", 1);
        let a = store.intern_symbol("a", 0);

        let a = store.intern_application(a, &[]);
        let one = store.intern_int(-1);
        let g_one = store.intern_application(g, &[one]);
        let list = store.list_from_slice(&[a, g_one]);
        let t = store.intern_application(f, &[a, list]);

        assert_eq!(store.display(t).to_string(), "f(a, [a, g(-1)])");
        assert_eq!(store.display(store.empty_list()).to_string(), "[]");
        assert_eq!(store.display(store.undefined()).to_string(), "<undefined_term>");
    }

    #[rcterm_test]
    fn test_display_list_constructor_with_non_list_tail() {
        let mut store = TermStore::new();

        let cons = store.builtins().cons_symbol;
        let a = store.intern_int(1);
        let list = store.list_from_slice(&[a]);
        let cell = store.intern_application(cons, &[list, a]);

        assert_eq!(store.display(cell).to_string(), "<list_constructor>([1], 1)");
    }

    #[rcterm_test]
    fn test_display_deep_term() {
        let mut store = TermStore::new();

        let s = store.intern_symbol("s", 1);
        let mut term = store.intern_int(0);
        for _ in 0..100_000 {
            let next = store.intern_application(s, &[term]);
            store.release(term);
            term = next;
        }

        let text = store.display(term).to_string();
        assert!(text.starts_with("s(s(s("));
        assert_eq!(text.len(), 100_000 * 3 + 1);
    }
}
