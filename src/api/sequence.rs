//! A growable, random-access, sequence.

use crate::utils::SequenceError;

/// A growable, random-access, sequence.
///
/// The trait abstracts over the storage layout, so that a sequence of `T` and a bit-packed sequence of `bool` can be
/// used interchangeably.
pub trait Sequence {
    /// Type of the elements.
    type Item;

    /// Type of a read-only access to an element.
    ///
    /// A reference for most sequences, a value for bit-packed sequences, as a single bit cannot be referenced.
    type Ref<'a>
    where
        Self: 'a;

    /// Returns the number of elements in the sequence.
    fn len(&self) -> usize;

    /// Returns whether the sequence is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements the sequence can hold without reallocating.
    fn capacity(&self) -> usize;

    /// Returns the maximum number of elements the sequence could ever hold.
    fn max_size(&self) -> usize;

    /// Returns the element at `index`, or `BoundsError` if `index` is out of bounds.
    fn get(&self, index: usize) -> Result<Self::Ref<'_>, SequenceError>;

    /// Ensures the capacity is at least `capacity`.
    ///
    /// Does nothing if the capacity is already sufficient, otherwise reallocates to, exactly, `capacity`. On error,
    /// `self` is left unchanged.
    fn reserve(&mut self, capacity: usize) -> Result<(), SequenceError>;

    /// Reduces the capacity to match the length, as closely as the storage allows.
    ///
    /// On error, `self` is left unchanged.
    fn shrink_to_fit(&mut self) -> Result<(), SequenceError>;

    /// Appends an element at the end of the sequence.
    ///
    /// On error, `self` is left unchanged.
    fn push(&mut self, value: Self::Item) -> Result<(), SequenceError>;

    /// Removes the last element of the sequence, if any.
    fn pop(&mut self) -> Option<Self::Item>;

    /// Shortens the sequence to at most `len` elements.
    fn truncate(&mut self, len: usize);

    /// Removes all elements from the sequence, keeping its capacity.
    fn clear(&mut self) {
        self.truncate(0);
    }
}
