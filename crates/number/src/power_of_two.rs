//! Utilities for working with powers of two.

/// Returns true when exactly a single bit of the given value is one.
pub fn is_power_of_two<T>(value: T) -> bool
where
    T: num::PrimInt,
{
    !value.is_zero() && (value & (value - T::one())).is_zero()
}

/// Returns the smallest power of two that is larger than or equal to the given
/// value, where zero is rounded up to one.
///
/// # Examples
/// ```
/// use rcterm_number::round_up_to_power_of_two;
///
/// assert_eq!(round_up_to_power_of_two(3u32), 4);
/// assert_eq!(round_up_to_power_of_two(4u32), 4);
/// assert_eq!(round_up_to_power_of_two(5u32), 8);
/// ```
pub fn round_up_to_power_of_two<T>(value: T) -> T
where
    T: num::PrimInt,
{
    if value <= T::one() {
        return T::one();
    }

    // The number of bits needed to represent value - 1 is the exponent of the result.
    let bits = std::mem::size_of::<T>() * 8;
    let exponent = bits - (value - T::one()).leading_zeros() as usize;
    T::one() << exponent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_power_of_two() {
        for exponent in 0..32 {
            assert!(is_power_of_two(1u32 << exponent));
        }

        assert!(!is_power_of_two(0u32));
        assert!(!is_power_of_two(3u32));
        assert!(!is_power_of_two(6u64));
        assert!(!is_power_of_two(100usize));
    }

    #[test]
    fn test_round_up_to_power_of_two() {
        assert_eq!(round_up_to_power_of_two(0u32), 1);
        assert_eq!(round_up_to_power_of_two(1u32), 1);
        assert_eq!(round_up_to_power_of_two(2u32), 2);
        assert_eq!(round_up_to_power_of_two(7u8), 8);
        assert_eq!(round_up_to_power_of_two(9u16), 16);
        assert_eq!(round_up_to_power_of_two(16384usize), 16384);
        assert_eq!(round_up_to_power_of_two(16385usize), 32768);
    }
}
