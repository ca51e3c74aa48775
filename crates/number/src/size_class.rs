//! A size class `c` describes a table capacity of `2^c` entries.

use crate::is_power_of_two;
use crate::round_up_to_power_of_two;

/// Returns the capacity `2^class`.
///
/// Panics when the capacity does not fit in a `usize`.
pub fn capacity_of_class(class: u32) -> usize {
    1usize
        .checked_shl(class)
        .unwrap_or_else(|| panic!("Size class {class} exceeds the address space"))
}

/// Returns the size class of the given capacity, which must be a power of two.
pub fn class_of_capacity(capacity: usize) -> u32 {
    assert!(
        is_power_of_two(capacity),
        "Capacity {capacity} is not a power of two"
    );
    capacity.trailing_zeros()
}

/// Returns the smallest size class whose capacity is at least `entries`.
pub fn class_for_entries(entries: usize) -> u32 {
    class_of_capacity(round_up_to_power_of_two(entries))
}

/// Returns the number of occupied entries that a table of the given size class
/// may hold before it must grow, for a maximum load given in percent.
///
/// The threshold is at least one so that even the smallest table admits an entry.
pub fn load_threshold(class: u32, max_load_percent: u8) -> usize {
    debug_assert!(
        (1..=100).contains(&max_load_percent),
        "The load percentage {max_load_percent} must be in 1..=100"
    );

    let capacity = capacity_of_class(class);
    // Divide first for large tables to avoid overflowing the multiplication.
    let threshold = if capacity >= usize::MAX / 100 {
        (capacity / 100) * max_load_percent as usize
    } else {
        (capacity * max_load_percent as usize) / 100
    };

    threshold.max(1)
}
