//! Growth policy.

//  #   Why doubling?
//
//  Any geometric factor gives amortized O(1) appends. Doubling keeps the arithmetic trivial, and matches the
//  power-of-two friendly sizes most allocators favour.

use crate::utils::SequenceError;

/// Minimum capacity of a sequence which had to grow.
pub const MIN_NON_ZERO_CAPACITY: usize = 4;

/// Returns an error if `required` exceeds `max_size`.
#[inline]
pub const fn check_capacity(required: usize, max_size: usize) -> Result<(), SequenceError> {
    if required > max_size {
        Err(SequenceError::CapacityExceeded)
    } else {
        Ok(())
    }
}

/// Computes the new capacity of a sequence of capacity `old_capacity`, which requires at least `min_required` slots.
///
/// The result is guaranteed to be within `[min_required, max_size]`. If `min_required` exceeds `max_size`, returns
/// `CapacityExceeded`.
///
/// #   Examples
///
/// ```
/// #   use grow_array::utils::growth;
/// assert_eq!(Ok(12), growth::grow(6, 7, usize::MAX));
/// assert_eq!(Ok(20), growth::grow(6, 20, usize::MAX));
/// assert_eq!(Ok(8), growth::grow(6, 7, 8));
/// ```
#[inline]
pub const fn grow(old_capacity: usize, min_required: usize, max_size: usize) -> Result<usize, SequenceError> {
    //  FIXME: convert to `?` when it is const.
    if let Err(error) = check_capacity(min_required, max_size) {
        return Err(error);
    }

    let doubled = old_capacity.saturating_mul(2);

    let geometric = if doubled < MIN_NON_ZERO_CAPACITY {
        MIN_NON_ZERO_CAPACITY
    } else {
        doubled
    };

    let geometric = if geometric > max_size { max_size } else { geometric };

    if min_required >= geometric {
        Ok(min_required)
    } else {
        Ok(geometric)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn grow_from_empty() {
        assert_eq!(Ok(MIN_NON_ZERO_CAPACITY), grow(0, 1, usize::MAX));
        assert_eq!(Ok(9), grow(0, 9, usize::MAX));
    }

    #[test]
    fn grow_doubles() {
        assert_eq!(Ok(12), grow(6, 7, usize::MAX));
        assert_eq!(Ok(64), grow(32, 33, usize::MAX));
    }

    #[test]
    fn grow_exact_when_step_insufficient() {
        assert_eq!(Ok(100), grow(6, 100, usize::MAX));
    }

    #[test]
    fn grow_clamped() {
        assert_eq!(Ok(10), grow(6, 7, 10));
        assert_eq!(Ok(7), grow(6, 7, 7));
    }

    #[test]
    fn grow_capacity_exceeded() {
        assert_eq!(Err(SequenceError::CapacityExceeded), grow(6, 11, 10));
        assert_eq!(Err(SequenceError::CapacityExceeded), check_capacity(11 * 32, 10 * 32));
    }

    #[test]
    fn grow_saturates() {
        assert_eq!(Ok(usize::MAX), grow(usize::MAX / 2 + 1, usize::MAX / 2 + 2, usize::MAX));
    }

    proptest! {
        #[test]
        fn grow_within_bounds(old in 0usize..10_000, extra in 1usize..10_000, max in 0usize..40_000) {
            let required = old + extra;

            match grow(old, required, max) {
                Ok(new) => {
                    prop_assert!(new >= required);
                    prop_assert!(new <= max);
                }
                Err(error) => {
                    prop_assert_eq!(SequenceError::CapacityExceeded, error);
                    prop_assert!(required > max);
                }
            }
        }
    }
}
