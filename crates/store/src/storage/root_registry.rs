#![forbid(unsafe_code)]

use std::fmt;

use crate::SymbolId;
use crate::TermId;

/// A contiguous range of ids that is protected as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootRange {
    Terms(Box<[TermId]>),
    Symbols(Box<[SymbolId]>),
}

impl RootRange {
    /// Returns the number of ids in the range.
    pub fn len(&self) -> usize {
        match self {
            RootRange::Terms(terms) => terms.len(),
            RootRange::Symbols(symbols) => symbols.len(),
        }
    }

    /// Returns true iff the range contains no ids.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Refers to a registration in the [RootRegistry]. The generation makes sure
/// that an index can be used to unprotect only once, even when its slot has
/// been reused by a later registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootIndex {
    index: usize,
    generation: u32,
}

impl fmt::Debug for RootIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootIndex({}, generation {})", self.index, self.generation)
    }
}

impl fmt::Display for RootIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

/// Keeps track of the ranges of ids that collaborators protect outside of the
/// ownership graph, for example ids stored in process-wide variables. Each
/// registration stands for one additional owner of every id in its range; the
/// reference counting itself is done by the [crate::TermStore].
#[derive(Debug, Default)]
pub struct RootRegistry {
    entries: Vec<Entry>,
    /// The first free entry.
    free: Option<usize>,
    len: usize,
    number_of_insertions: u64,
}

#[derive(Debug)]
enum Entry {
    Filled { range: RootRange, generation: u32 },
    Free { next: Option<usize>, generation: u32 },
}

impl RootRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered ranges.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true iff there are no registered ranges.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of registrations that have ever been made.
    pub fn number_of_insertions(&self) -> u64 {
        self.number_of_insertions
    }

    /// Registers the range and returns the index by which it can be unregistered.
    pub(crate) fn register(&mut self, range: RootRange) -> RootIndex {
        self.number_of_insertions += 1;
        self.len += 1;

        match self.free {
            Some(index) => {
                let Entry::Free { next, generation } = self.entries[index] else {
                    panic!("The free list of the root registry points to the filled entry {index}");
                };

                // Every reuse of an entry starts a new generation.
                let generation = generation.wrapping_add(1);
                self.free = next;
                self.entries[index] = Entry::Filled { range, generation };
                RootIndex { index, generation }
            }
            None => {
                self.entries.push(Entry::Filled { range, generation: 0 });
                RootIndex {
                    index: self.entries.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Removes the registration and returns its range.
    ///
    /// Panics when the index does not refer to a current registration, i.e.,
    /// when the range was never registered or has already been unregistered.
    pub(crate) fn unregister(&mut self, root: RootIndex) -> RootRange {
        self.check(root);

        let Entry::Filled { generation, .. } = self.entries[root.index] else {
            unreachable!("Checked that the entry is filled");
        };
        let entry = std::mem::replace(
            &mut self.entries[root.index],
            Entry::Free {
                next: self.free,
                generation,
            },
        );

        self.free = Some(root.index);
        self.len -= 1;

        match entry {
            Entry::Filled { range, .. } => range,
            Entry::Free { .. } => unreachable!("Checked that the entry is filled"),
        }
    }

    /// Returns the range of the given registration.
    pub fn get(&self, root: RootIndex) -> &RootRange {
        self.check(root);
        match &self.entries[root.index] {
            Entry::Filled { range, .. } => range,
            Entry::Free { .. } => unreachable!("Checked that the entry is filled"),
        }
    }

    /// Returns the range of the given registration mutably.
    pub(crate) fn get_mut(&mut self, root: RootIndex) -> &mut RootRange {
        self.check(root);
        match &mut self.entries[root.index] {
            Entry::Filled { range, .. } => range,
            Entry::Free { .. } => unreachable!("Checked that the entry is filled"),
        }
    }

    /// Returns true iff the index refers to a current registration.
    pub fn contains(&self, root: RootIndex) -> bool {
        matches!(
            self.entries.get(root.index),
            Some(Entry::Filled { generation, .. }) if *generation == root.generation
        )
    }

    /// Returns an iterator over all current registrations.
    pub fn iter(&self) -> impl Iterator<Item = (RootIndex, &RootRange)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| match entry {
            Entry::Filled { range, generation } => Some((
                RootIndex {
                    index,
                    generation: *generation,
                },
                range,
            )),
            Entry::Free { .. } => None,
        })
    }

    fn check(&self, root: RootIndex) {
        assert!(
            self.contains(root),
            "Root {root:?} is not registered, it was never protected or has already been unprotected"
        );
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use rcterm_utilities::random_test;

    use super::*;

    fn terms(ids: &[usize]) -> RootRange {
        RootRange::Terms(ids.iter().map(|index| TermId::from_index(*index)).collect())
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = RootRegistry::new();

        let a = registry.register(terms(&[1, 2, 3]));
        let b = registry.register(RootRange::Symbols(Box::new([SymbolId::from_index(4)])));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).len(), 3);
        assert_eq!(registry.unregister(a), terms(&[1, 2, 3]));
        assert!(!registry.contains(a));
        assert!(registry.contains(b));

        // The freed entry is reused with a new generation.
        let c = registry.register(terms(&[]));
        assert!(registry.contains(c));
        assert!(!registry.contains(a), "A stale index must not match the reused entry");
        assert_eq!(registry.iter().count(), 2);
        assert_eq!(registry.number_of_insertions(), 3);
    }

    #[test]
    #[should_panic(expected = "has already been unprotected")]
    fn test_unregister_twice() {
        let mut registry = RootRegistry::new();

        let a = registry.register(terms(&[1]));
        registry.unregister(a);
        registry.register(terms(&[2]));
        registry.unregister(a);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_random_registry() {
        random_test(50, |rng| {
            let mut registry = RootRegistry::new();
            let mut roots: Vec<(RootIndex, RootRange)> = Vec::new();

            for _ in 0..500 {
                if roots.is_empty() || rng.random_bool(0.6) {
                    let range = terms(&[rng.random_range(0..100)]);
                    roots.push((registry.register(range.clone()), range));
                } else {
                    let (root, range) = roots.swap_remove(rng.random_range(0..roots.len()));
                    assert_eq!(registry.unregister(root), range);
                }
            }

            assert_eq!(registry.len(), roots.len());
            for (root, range) in &roots {
                assert_eq!(registry.get(*root), range);
            }
        });
    }
}
