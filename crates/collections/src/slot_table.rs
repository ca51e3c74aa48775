use std::fmt;
use std::hash::BuildHasher;
use std::hash::Hash;
use std::ops::Index;

use equivalent::Equivalent;
use log::debug;
use rustc_hash::FxBuildHasher;

use rcterm_number::capacity_of_class;
use rcterm_number::class_of_capacity;
use rcterm_number::load_threshold;
use rcterm_utilities::LargeFormatter;
use rcterm_utilities::debug_trace;

/// The parameters of a [SlotTable].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// The initial capacity is `2^size_class`.
    pub size_class: u32,
    /// The table never grows beyond a capacity of `2^max_size_class`.
    pub max_size_class: u32,
    /// The occupancy, in percent of the capacity, at which the table grows.
    pub max_load_percent: u8,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            size_class: 10,
            max_size_class: 31,
            max_load_percent: 80,
        }
    }
}

/// A hash table in which every element occupies a slot with a stable index.
///
/// # Details
///
/// The slot array only ever grows by appending, and slots freed by [SlotTable::release]
/// are kept on an intrusive free list that is reused by the next insertion. As
/// such an index remains valid, and refers to the same element, until the
/// reference count of that element drops to zero.
///
/// Lookup goes through an array of `2^c` buckets, where `c` is the size class,
/// that point to a chain of slots linked through the slots themselves. Before
/// an insertion would push the number of live elements over the load threshold
/// the bucket array is doubled and every live slot is linked into its new
/// bucket. Growth never moves or renumbers slots.
///
/// Every slot carries a reference count. Interning an element that is already
/// present increments its count, and releasing the last reference removes the
/// element and hands it back to the caller, which can then release whatever
/// the element itself owned.
pub struct SlotTable<T, S = FxBuildHasher> {
    /// Name used in diagnostics, e.g. "term" or "symbol".
    name: &'static str,
    /// All slots, live or free, in index order.
    slots: Vec<Slot<T>>,
    /// The first slot of every hash chain.
    buckets: Vec<Option<usize>>,
    /// The first slot of the free list.
    free: Option<usize>,

    size_class: u32,
    max_size_class: u32,
    max_load_percent: u8,
    /// The number of live elements at which the next insertion grows the table.
    threshold: usize,

    /// The number of live elements.
    len: usize,
    /// The number of times the table has grown.
    growths: usize,
    /// The number of elements that have been reclaimed.
    reclaimed: u64,

    hasher: S,
}

/// A slot is either live, and then part of exactly one hash chain, or on the free list.
enum Slot<T> {
    Live(LiveSlot<T>),
    Free { next: Option<usize> },
}

struct LiveSlot<T> {
    value: T,
    hash: u64,
    count: usize,
    /// The next slot in the same hash chain.
    next: Option<usize>,
}

impl<T> SlotTable<T, FxBuildHasher> {
    /// Creates an empty table with the given configuration.
    pub fn new(name: &'static str, config: TableConfig) -> Self {
        Self::with_hasher(name, config, FxBuildHasher)
    }
}

impl<T, S> SlotTable<T, S> {
    /// Creates an empty table with the given configuration and hasher.
    pub fn with_hasher(name: &'static str, config: TableConfig, hasher: S) -> Self {
        assert!(
            config.size_class <= config.max_size_class,
            "The initial size class {} of the {name} table exceeds the maximum {}",
            config.size_class,
            config.max_size_class
        );
        assert!(
            (1..=100).contains(&config.max_load_percent),
            "The maximum load of the {name} table must be between 1 and 100 percent"
        );

        SlotTable {
            name,
            slots: Vec::new(),
            buckets: vec![None; capacity_of_class(config.size_class)],
            free: None,
            size_class: config.size_class,
            max_size_class: config.max_size_class,
            max_load_percent: config.max_load_percent,
            threshold: load_threshold(config.size_class, config.max_load_percent),
            len: 0,
            growths: 0,
            reclaimed: 0,
            hasher,
        }
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true iff there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity, which is always `2^size_class`.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current size class.
    pub fn size_class(&self) -> u32 {
        self.size_class
    }

    /// Returns the number of slots ever allocated, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of times that the table has grown.
    pub fn growth_count(&self) -> usize {
        self.growths
    }

    /// Returns the number of elements that have been reclaimed.
    pub fn reclaimed_count(&self) -> u64 {
        self.reclaimed
    }

    /// Returns true iff the index refers to a live element.
    pub fn contains_index(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Live(_)))
    }

    /// Returns the element at the given index, if it is live.
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Live(live)) => Some(&live.value),
            _ => None,
        }
    }

    /// Returns the element at the given index mutably, if it is live. The caller
    /// must not change anything that influences the hash or equality of the element.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(index) {
            Some(Slot::Live(live)) => Some(&mut live.value),
            _ => None,
        }
    }

    /// Returns the reference count of the element at the given index, if it is live.
    pub fn reference_count(&self, index: usize) -> Option<usize> {
        match self.slots.get(index) {
            Some(Slot::Live(live)) => Some(live.count),
            _ => None,
        }
    }

    /// Adds one reference to the element at the given index.
    ///
    /// Panics when the index does not refer to a live element, or when the
    /// reference count would overflow.
    pub fn acquire(&mut self, index: usize) {
        let name = self.name;
        let live = self.live_mut(index, "acquire");
        live.count = live
            .count
            .checked_add(1)
            .unwrap_or_else(|| panic!("Reference count overflow for {name} {index}"));
    }

    /// Removes one reference from the element at the given index. When this was
    /// the last reference the element is removed from the table, its slot is
    /// put on the free list and the element is returned.
    ///
    /// Panics when the index does not refer to a live element, which covers
    /// releasing an element twice.
    pub fn release(&mut self, index: usize) -> Option<T> {
        let live = self.live_mut(index, "release");
        if live.count > 1 {
            live.count -= 1;
            return None;
        }

        let Slot::Live(live) = std::mem::replace(&mut self.slots[index], Slot::Free { next: self.free }) else {
            unreachable!("The slot was checked to be live");
        };

        self.unlink(index, live.hash, live.next);
        self.free = Some(index);
        self.len -= 1;
        self.reclaimed += 1;

        debug_trace!("Reclaimed {} {index}", self.name);
        Some(live.value)
    }

    /// Returns an iterator over all live elements and their indices.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.slots.iter().enumerate(),
        }
    }

    /// Returns the metrics of this table, can be formatted and written to output.
    pub fn metrics(&self) -> TableMetrics<'_, T, S> {
        TableMetrics(self)
    }

    /// Returns the live slot at the given index, or panics with a message naming the operation.
    fn live_mut(&mut self, index: usize, operation: &str) -> &mut LiveSlot<T> {
        let name = self.name;
        let slot_count = self.slots.len();
        match self.slots.get_mut(index) {
            Some(Slot::Live(live)) => live,
            Some(Slot::Free { .. }) => panic!("Cannot {operation} {name} {index}, its slot is free"),
            None => panic!("Cannot {operation} {name} {index}, only {slot_count} slots exist"),
        }
    }

    fn bucket_of(&self, hash: u64) -> usize {
        // The capacity is a power of two so masking selects the low bits.
        (hash as usize) & (self.buckets.len() - 1)
    }

    /// Removes the slot at the given index from its hash chain. The slot itself
    /// has already been freed, its successor in the chain is `next`.
    fn unlink(&mut self, index: usize, hash: u64, next: Option<usize>) {
        let bucket = self.bucket_of(hash);
        if self.buckets[bucket] == Some(index) {
            self.buckets[bucket] = next;
            return;
        }

        let mut current = self.buckets[bucket];
        while let Some(position) = current {
            let Slot::Live(live) = &mut self.slots[position] else {
                panic!("The chain of {} bucket {bucket} contains the free slot {position}", self.name);
            };

            if live.next == Some(index) {
                live.next = next;
                return;
            }
            current = live.next;
        }

        panic!("The {} {index} does not occur in its hash chain", self.name);
    }

    /// Doubles the number of buckets and links every live slot into its new bucket.
    fn grow(&mut self) {
        if self.size_class >= self.max_size_class {
            panic!(
                "The {} table is full: it holds {} entries and cannot grow beyond size class {}",
                self.name, self.len, self.max_size_class
            );
        }

        let old_class = self.size_class;
        self.size_class += 1;
        self.threshold = load_threshold(self.size_class, self.max_load_percent);
        self.growths += 1;

        // The new bucket array is built completely before it replaces the old one.
        let mut buckets = vec![None; capacity_of_class(self.size_class)];
        let mask = buckets.len() - 1;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Live(live) = slot {
                let bucket = (live.hash as usize) & mask;
                live.next = buckets[bucket];
                buckets[bucket] = Some(index);
            }
        }
        self.buckets = buckets;

        debug!(
            "Grew the {} table from size class {old_class} to {} with {} live entries",
            self.name,
            self.size_class,
            LargeFormatter(self.len)
        );
    }

    /// Stores a new element with a reference count of one and returns its index.
    fn allocate(&mut self, value: T, hash: u64) -> usize {
        if self.len + 1 > self.threshold {
            self.grow();
        }

        let bucket = self.bucket_of(hash);
        let live = LiveSlot {
            value,
            hash,
            count: 1,
            next: self.buckets[bucket],
        };

        let index = match self.free {
            Some(first) => {
                let Slot::Free { next } = &self.slots[first] else {
                    panic!("The free list of the {} table points to live slot {first}", self.name);
                };

                self.free = *next;
                self.slots[first] = Slot::Live(live);
                first
            }
            None => {
                self.slots.push(Slot::Live(live));
                self.slots.len() - 1
            }
        };

        self.buckets[bucket] = Some(index);
        self.len += 1;
        index
    }
}

impl<T: Hash + Eq, S: BuildHasher> SlotTable<T, S> {
    /// Returns the index of the element equivalent to the given key, without
    /// changing any reference count.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: Hash + Equivalent<T> + ?Sized,
    {
        self.find_hashed(key, self.hasher.hash_one(key))
    }

    /// Returns the index of the element equivalent to the given key. When it is
    /// present its reference count is incremented, and otherwise the element is
    /// constructed from the key with a reference count of one.
    ///
    /// The boolean is true iff a new element was inserted.
    pub fn intern<'a, Q>(&mut self, key: &'a Q) -> (usize, bool)
    where
        Q: Hash + Equivalent<T> + ?Sized,
        T: From<&'a Q>,
    {
        let hash = self.hasher.hash_one(key);
        if let Some(index) = self.find_hashed(key, hash) {
            self.acquire(index);
            return (index, false);
        }

        let value = T::from(key);
        debug_assert_eq!(
            self.hasher.hash_one(&value),
            hash,
            "The hash of a key must equal the hash of the element constructed from it"
        );

        let index = self.allocate(value, hash);
        debug_trace!("Inserted {} {index}", self.name);
        (index, true)
    }

    /// Checks the internal consistency of the table, panics when it is violated.
    ///
    /// Every live slot must occur in the chain of its bucket, chains may only
    /// contain live slots, no two live elements may be equal, every live element
    /// must have a positive reference count and a hash that matches its value,
    /// and the free list must contain exactly the free slots.
    pub fn verify(&self) {
        assert_eq!(
            class_of_capacity(self.buckets.len()),
            self.size_class,
            "The {} bucket array does not match its size class",
            self.name
        );

        let mut in_chain = vec![false; self.slots.len()];
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut chain: Vec<usize> = Vec::new();
            let mut current = *head;
            while let Some(index) = current {
                let Slot::Live(live) = &self.slots[index] else {
                    panic!("The chain of {} bucket {bucket} contains free slot {index}", self.name);
                };

                assert_eq!(self.bucket_of(live.hash), bucket, "{} {index} is in the wrong bucket", self.name);
                assert_eq!(
                    self.hasher.hash_one(&live.value),
                    live.hash,
                    "The stored hash of {} {index} is stale",
                    self.name
                );
                assert!(live.count > 0, "{} {index} is live with a zero reference count", self.name);
                assert!(!in_chain[index], "{} {index} occurs twice in the chains", self.name);
                in_chain[index] = true;

                for other in &chain {
                    if let Slot::Live(other_live) = &self.slots[*other] {
                        assert!(
                            other_live.value != live.value,
                            "{} {index} and {other} are equal, violating maximal sharing",
                            self.name
                        );
                    }
                }

                chain.push(index);
                current = live.next;
            }
        }

        let mut live_count = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Live(_) = slot {
                live_count += 1;
                assert!(in_chain[index], "{} {index} is live but not in any chain", self.name);
            }
        }
        assert_eq!(live_count, self.len, "The {} table has an incorrect length", self.name);

        let mut free_count = 0;
        let mut current = self.free;
        while let Some(index) = current {
            let Slot::Free { next } = &self.slots[index] else {
                panic!("The free list of the {} table contains live slot {index}", self.name);
            };
            free_count += 1;
            assert!(free_count <= self.slots.len(), "The free list of the {} table has a cycle", self.name);
            current = *next;
        }
        assert_eq!(
            free_count + self.len,
            self.slots.len(),
            "The free list of the {} table does not contain every free slot",
            self.name
        );
    }

    fn find_hashed<Q>(&self, key: &Q, hash: u64) -> Option<usize>
    where
        Q: Equivalent<T> + ?Sized,
    {
        let mut current = self.buckets[self.bucket_of(hash)];
        while let Some(index) = current {
            match &self.slots[index] {
                Slot::Live(live) => {
                    if live.hash == hash && key.equivalent(&live.value) {
                        return Some(index);
                    }
                    current = live.next;
                }
                Slot::Free { .. } => panic!("A hash chain of the {} table contains free slot {index}", self.name),
            }
        }

        None
    }
}

impl<T, S> Index<usize> for SlotTable<T, S> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.slots.get(index) {
            Some(Slot::Live(live)) => &live.value,
            _ => panic!("{} {index} is not live", self.name),
        }
    }
}

/// An iterator over the live elements of a [SlotTable].
pub struct Iter<'a, T> {
    slots: std::iter::Enumerate<std::slice::Iter<'a, Slot<T>>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        for (index, slot) in self.slots.by_ref() {
            if let Slot::Live(live) = slot {
                return Some((index, &live.value));
            }
        }

        None
    }
}

/// Prints the occupancy of a [SlotTable].
pub struct TableMetrics<'a, T, S>(&'a SlotTable<T, S>);

impl<T, S> fmt::Display for TableMetrics<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} table: {} live of capacity {} (size class {}), {} slots, grown {} times, {} reclaimed",
            self.0.name,
            LargeFormatter(self.0.len),
            LargeFormatter(self.0.capacity()),
            self.0.size_class,
            LargeFormatter(self.0.slots.len()),
            self.0.growths,
            LargeFormatter(self.0.reclaimed)
        )
    }
}
