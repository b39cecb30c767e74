//  Errors.

use core::{
    error, fmt,
    ops::{Bound, Range, RangeBounds},
};

use crate::utils::alloc::AllocError;

/// An error in growing, or accessing, a sequence.
///
/// Only failures of the container plumbing are reported through this type. Failures of the element type itself -- a
/// panicking `Clone`, `Default`, `Drop`, or user-provided closure -- unwind through the operation instead.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SequenceError {
    /// The allocator declined to provide the requested memory.
    AllocationFailure,
    /// The requested size exceeds the maximum size of the sequence, checked prior to any allocation attempt.
    CapacityExceeded,
    /// The index is outside the `[0, len)` range, or `[0, len]` range for insertions.
    BoundsError {
        /// The offending index.
        index: usize,
        /// The length of the sequence at the time of the access.
        len: usize,
    },
}

impl SequenceError {
    /// Returns a `BoundsError` if `index` is not strictly less than `len`.
    #[inline]
    pub(crate) const fn check_access(index: usize, len: usize) -> Result<(), Self> {
        if index < len {
            Ok(())
        } else {
            Err(Self::BoundsError { index, len })
        }
    }

    /// Returns a `BoundsError` if `index` is strictly greater than `len`.
    #[inline]
    pub(crate) const fn check_position(index: usize, len: usize) -> Result<(), Self> {
        if index <= len {
            Ok(())
        } else {
            Err(Self::BoundsError { index, len })
        }
    }

    /// Converts `range` into a `Range`, returning a `BoundsError` unless it is within `[0, len]`.
    pub(crate) fn check_range<R>(range: R, len: usize) -> Result<Range<usize>, Self>
    where
        R: RangeBounds<usize>,
    {
        let start = match range.start_bound() {
            Bound::Included(start) => *start,
            Bound::Excluded(start) => start.checked_add(1).ok_or(Self::BoundsError { index: *start, len })?,
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(end) => end.checked_add(1).ok_or(Self::BoundsError { index: *end, len })?,
            Bound::Excluded(end) => *end,
            Bound::Unbounded => len,
        };

        Self::check_position(end, len)?;

        if start > end {
            return Err(Self::BoundsError { index: start, len });
        }

        Ok(start..end)
    }
}

impl From<AllocError> for SequenceError {
    #[inline]
    fn from(_: AllocError) -> Self {
        Self::AllocationFailure
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::AllocationFailure => f.write_str("memory allocation failed"),
            Self::CapacityExceeded => f.write_str("capacity exceeds maximum size"),
            Self::BoundsError { index, len } => write!(f, "index {index} out of bounds for length {len}"),
        }
    }
}

impl error::Error for SequenceError {}
