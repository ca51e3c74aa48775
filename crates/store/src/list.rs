#![forbid(unsafe_code)]

use std::iter::FusedIterator;

use crate::TermId;
use crate::TermKind;
use crate::TermStore;

/// Lists are terms built from the builtin list constructor and empty list, so
/// common tails are shared like any other subterm.
impl TermStore {
    /// Returns the list with the given head in front of the given tail.
    ///
    /// Like [TermStore::intern_application] the caller keeps its references to
    /// the head and tail.
    pub fn cons(&mut self, head: TermId, tail: TermId) -> TermId {
        assert!(self.is_list(tail), "The tail {tail} of a list cell must be a list");

        let cons = self.builtins().cons_symbol;
        self.intern_application(cons, &[head, tail])
    }

    /// Returns an owned reference to the empty list.
    pub fn nil(&mut self) -> TermId {
        let empty = self.empty_list();
        self.acquire(empty);
        empty
    }

    /// Returns the list of the given elements, in the same order.
    pub fn list_from_slice(&mut self, elements: &[TermId]) -> TermId {
        let mut list = self.nil();
        for element in elements.iter().rev() {
            let next = self.cons(*element, list);
            self.release(list);
            list = next;
        }

        list
    }

    /// Returns the list with the elements in reverse order.
    pub fn list_reverse(&mut self, list: TermId) -> TermId {
        let elements: Vec<TermId> = self.list_iter(list).collect();

        let mut result = self.nil();
        for element in elements {
            let next = self.cons(element, result);
            self.release(result);
            result = next;
        }

        result
    }

    /// Returns the elements of `first` followed by those of `second`. The
    /// result shares `second` as its tail.
    pub fn list_concat(&mut self, first: TermId, second: TermId) -> TermId {
        assert!(self.is_list(second), "Term {second} is not a list");
        let elements: Vec<TermId> = self.list_iter(first).collect();

        self.acquire(second);
        let mut result = second;
        for element in elements.into_iter().rev() {
            let next = self.cons(element, result);
            self.release(result);
            result = next;
        }

        result
    }

    /// Returns an owned reference to the element at the given position.
    ///
    /// Panics when the index is out of bounds.
    pub fn list_element_at(&mut self, list: TermId, index: usize) -> TermId {
        let Some(element) = self.list_iter(list).nth(index) else {
            panic!("Index {index} is out of bounds for the list {list}");
        };

        self.acquire(element);
        element
    }

    /// Returns the position of the first occurrence of the element in the list.
    pub fn list_index_of(&self, list: TermId, element: TermId) -> Option<usize> {
        self.list_iter(list).position(|candidate| candidate == element)
    }

    /// Returns an iterator over the elements of the list.
    ///
    /// Panics when the term is not a list.
    pub fn list_iter(&self, list: TermId) -> ListIter<'_> {
        assert!(self.is_list(list), "Term {list} is not a list");
        ListIter { store: self, current: list }
    }

    /// Returns the number of elements of the list, which takes time proportional to its length.
    pub fn list_len(&self, list: TermId) -> usize {
        self.list_iter(list).count()
    }

    /// Returns true iff the term is a list cell or the empty list.
    pub fn is_list(&self, term: TermId) -> bool {
        matches!(self.term_kind(term), TermKind::List | TermKind::EmptyList)
    }

    /// Returns true iff the term is the empty list.
    pub fn is_empty_list(&self, term: TermId) -> bool {
        term == self.empty_list()
    }
}

/// Iterates over the elements of a list, from front to back.
pub struct ListIter<'a> {
    store: &'a TermStore,
    current: TermId,
}

impl Iterator for ListIter<'_> {
    type Item = TermId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.store.is_empty_list(self.current) {
            return None;
        }

        let [head, tail] = self.store.arguments(self.current) else {
            panic!("The list cell {} does not have two arguments", self.current);
        };
        self.current = *tail;
        Some(*head)
    }
}

impl FusedIterator for ListIter<'_> {}
