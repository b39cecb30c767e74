//! Dynamically sized, allocator-aware, array of bits.

//  Design considerations
//
//  #   Why keep all words initialized?
//
//  A `BitWord` is plain data, so zeroing a fresh allocation costs a `memset`, and in exchange every word in the
//  allocation can be viewed as a slice: all bit manipulations are then safe code.
//
//  #   Why keep the bits past the length cleared?
//
//  Growing the length is then a matter of writing the new bits, and comparing or hashing two arrays is a matter of
//  comparing or hashing their words.

use core::{
    cmp, fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    mem,
    ops::{Range, RangeBounds},
    ptr, slice,
};

use crate::{
    api::Sequence,
    utils::{
        AllocatorHandle, BitWord, IndexInWord, RawSlots, SequenceError,
        alloc::{Allocator, Global},
        copy_bits, growth, load_bits, store_bits,
    },
};

/// Dynamically sized, allocator-aware, array of bits.
///
/// The bits are packed in `BitWord`s, hence the capacity is always a multiple of 64.
///
/// Moving bits around cannot fail, hence the only failures are the allocation of the words and the capacity check,
/// both of which happen prior to any modification: a failing operation always leaves the array unchanged, unless
/// documented otherwise.
pub struct DynamicBitArray<A: Allocator = Global> {
    //  Safety Invariants:
    //  -   Self-Allocated: `words` was allocated by `handle.allocator()`, or an equivalent allocator.
    //  -   Initialized: all words of `words` are initialized.
    //  -   Cleared: all bits at or after `len` are cleared.
    //  -   Bounded: `len <= words.capacity() * 64`.
    words: RawSlots<BitWord>,
    len: usize,
    handle: AllocatorHandle<A>,
}

//
//  Creation
//

impl DynamicBitArray<Global> {
    /// Creates a new, empty, array.
    pub const fn new() -> Self {
        Self::new_in(AllocatorHandle::global())
    }

    /// Creates a new array holding `values`.
    pub fn from_slice(values: &[bool]) -> Result<Self, SequenceError> {
        Self::from_slice_in(values, AllocatorHandle::global())
    }
}

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    /// Creates a new, empty, array.
    ///
    /// Does not allocate.
    pub const fn new_in(handle: AllocatorHandle<A>) -> Self {
        Self {
            words: RawSlots::dangling(),
            len: 0,
            handle,
        }
    }

    /// Creates a new, empty, array with a capacity of at least `capacity`, rounded up to a multiple of 64.
    pub fn with_capacity_in(capacity: usize, handle: AllocatorHandle<A>) -> Result<Self, SequenceError> {
        let mut result = Self::new_in(handle);

        result.reserve(capacity)?;

        Ok(result)
    }

    /// Creates a new array holding `count` times `value`.
    pub fn from_elem_in(count: usize, value: bool, handle: AllocatorHandle<A>) -> Result<Self, SequenceError> {
        let mut result = Self::new_in(handle);

        result.assign_n(count, value)?;

        Ok(result)
    }

    /// Creates a new array holding `values`.
    pub fn from_slice_in(values: &[bool], handle: AllocatorHandle<A>) -> Result<Self, SequenceError> {
        let mut result = Self::new_in(handle);

        result.assign_slice(values)?;

        Ok(result)
    }

    /// Creates a clone of `self`, in a fresh allocation from a clone of its allocator handle.
    ///
    /// The capacity of the clone is just sufficient for its length.
    pub fn try_clone(&self) -> Result<Self, SequenceError>
    where
        A: Clone,
    {
        let handle = self.handle.clone();
        let words = Self::allocate_copy(handle.allocator(), self.as_words(), self.as_words().len())?;

        Ok(Self {
            words,
            len: self.len,
            handle,
        })
    }
}

impl<A> Default for DynamicBitArray<A>
where
    A: Allocator + Default,
{
    fn default() -> Self {
        Self::new_in(AllocatorHandle::default())
    }
}

//
//  Queries
//

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    /// Returns the number of bits.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the array is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bits the array can hold without reallocating.
    ///
    /// Always a multiple of 64.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.words.capacity() * BitWord::BITS
    }

    /// Returns the maximum number of bits the array could ever hold, as per its allocator handle.
    ///
    /// Always a multiple of 64.
    #[inline]
    pub const fn max_size(&self) -> usize {
        self.max_words() * BitWord::BITS
    }

    /// Returns the allocator handle.
    #[inline]
    pub const fn handle(&self) -> &AllocatorHandle<A> {
        &self.handle
    }

    /// Returns the words holding the bits, the bits past the length being cleared.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use grow_array::{collections::DynamicBitArray, utils::BitWord};
    /// let array = DynamicBitArray::from_slice(&[true, false, true]).unwrap();
    ///
    /// assert_eq!(&[BitWord(0b101)], array.as_words());
    /// ```
    #[inline]
    pub fn as_words(&self) -> &[BitWord] {
        &self.words()[..BitWord::words_for(self.len)]
    }

    /// Returns the bit at `index`, or `BoundsError` if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Result<bool, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        Ok(self.bit(index))
    }

    /// Returns a proxy to the bit at `index`, or `BoundsError` if `index` is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<BitRef<'_>, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        let (of_word, in_word) = BitWord::split(index);

        Ok(BitRef {
            word: &mut self.words_mut()[of_word.0],
            index: in_word,
        })
    }

    /// Sets the bit at `index` to `value`, returning its previous value, or `BoundsError` if `index` is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) -> Result<bool, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        Ok(self.assign_bit(index, value))
    }

    /// Returns the number of bits set.
    pub fn count_ones(&self) -> usize {
        self.as_words().iter().map(BitWord::count).sum()
    }

    /// Returns an iterator over the bits.
    #[inline]
    pub fn iter(&self) -> BitIter<'_> {
        BitIter {
            words: self.as_words(),
            front: 0,
            back: self.len,
        }
    }
}

//
//  Capacity
//

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    /// Ensures the capacity is at least `capacity`.
    ///
    /// Does nothing if the capacity is already sufficient. Otherwise, reallocates to exactly `capacity`, rounded up to
    /// a multiple of 64.
    ///
    /// On error, `self` is left unchanged. `CapacityExceeded` is returned, without attempting any allocation, if
    /// `capacity` exceeds `self.max_size()`.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), SequenceError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        growth::check_capacity(capacity, self.max_size())?;

        self.reallocate(BitWord::words_for(capacity))
    }

    /// Ensures the capacity is sufficient for `additional` more bits.
    ///
    /// Unlike `reserve`, the new capacity follows the growth policy, so that repeated calls are amortized.
    ///
    /// On error, `self` is left unchanged.
    pub fn reserve_additional(&mut self, additional: usize) -> Result<(), SequenceError> {
        let required = self.required(additional)?;

        if required <= self.capacity() {
            return Ok(());
        }

        let capacity = growth::grow(self.capacity(), required, self.max_size())?;

        self.reallocate(BitWord::words_for(capacity))
    }

    /// Reallocates to the smallest number of words holding `self.len()` bits.
    ///
    /// On error, `self` is left unchanged. If `self` is empty, its memory is released without allocating.
    pub fn shrink_to_fit(&mut self) -> Result<(), SequenceError> {
        let words = BitWord::words_for(self.len);

        if words == self.words.capacity() {
            return Ok(());
        }

        if words == 0 {
            let previous = mem::replace(&mut self.words, RawSlots::dangling());

            //  Safety:
            //  -   Liveness & Selfness: as per the Self-Allocated invariant, and `previous` is no longer referenced.
            unsafe { previous.deallocate(self.handle.allocator()) };

            return Ok(());
        }

        self.reallocate(words)
    }
}

//
//  Bit-wise modifications
//

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    /// Appends `value` at the end of the array.
    ///
    /// On error, `self` is left unchanged.
    #[inline]
    pub fn push(&mut self, value: bool) -> Result<(), SequenceError> {
        if self.len == self.capacity() {
            self.reserve_additional(1)?;
        }

        self.assign_bit(self.len, value);
        self.len += 1;

        Ok(())
    }

    /// Removes the last bit, if any.
    #[inline]
    pub fn pop(&mut self) -> Option<bool> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;

        Some(self.assign_bit(self.len, false))
    }

    /// Inserts `value` at `index`, shifting all bits after it to the right.
    ///
    /// Returns `BoundsError` if `index` is strictly greater than `self.len()`. On error, `self` is left unchanged.
    #[inline]
    pub fn insert(&mut self, index: usize, value: bool) -> Result<(), SequenceError> {
        self.insert_n(index, 1, value)
    }

    /// Removes the bit at `index`, shifting all bits after it to the left.
    ///
    /// Returns `BoundsError` if `index` is out of bounds. Never reallocates.
    pub fn erase(&mut self, index: usize) -> Result<bool, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        let value = self.bit(index);

        self.erase_window(index..index + 1);

        Ok(value)
    }
}

//
//  Range modifications
//

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    /// Shortens the array to at most `len` bits.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        self.fill(len..self.len, false);
        self.len = len;
    }

    /// Removes all bits, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the array to `len` bits, filling new bits with `value`.
    ///
    /// If `len` is less than the current length, the array is truncated. Otherwise, if `len` exceeds the capacity, the
    /// array is reallocated to exactly `len` bits, rounded up to a multiple of 64.
    ///
    /// On error, `self` is left unchanged.
    pub fn resize(&mut self, len: usize, value: bool) -> Result<(), SequenceError> {
        if len <= self.len {
            self.truncate(len);
            return Ok(());
        }

        self.reserve(len)?;

        self.fill(self.len..len, value);
        self.len = len;

        Ok(())
    }

    /// Inserts `count` times `value` at `index`.
    ///
    /// Returns `BoundsError` if `index` is strictly greater than `self.len()`. On error, `self` is left unchanged.
    pub fn insert_n(&mut self, index: usize, count: usize, value: bool) -> Result<(), SequenceError> {
        self.open_window(index, count)?;

        self.fill(index..index + count, value);

        Ok(())
    }

    /// Inserts `values` at `index`.
    ///
    /// Returns `BoundsError` if `index` is strictly greater than `self.len()`. On error, `self` is left unchanged.
    pub fn insert_slice(&mut self, index: usize, values: &[bool]) -> Result<(), SequenceError> {
        self.open_window(index, values.len())?;

        for (offset, value) in values.iter().enumerate() {
            self.assign_bit(index + offset, *value);
        }

        Ok(())
    }

    /// Inserts the bits of `values` at `index`.
    ///
    /// As the number of bits cannot be known ahead of time, they are first appended, then rotated into place.
    ///
    /// Returns `BoundsError` if `index` is strictly greater than `self.len()`. On error, the appended bits are
    /// discarded, leaving the original bits in place, though the capacity may have grown. If the iterator panics, the
    /// bits appended so far remain at the end of the array.
    pub fn insert_iter<I>(&mut self, index: usize, values: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = bool>,
    {
        SequenceError::check_position(index, self.len)?;

        let original_len = self.len;

        for value in values {
            if let Err(error) = self.push(value) {
                crate::log_trace!("insert_iter interrupted after {} bits", self.len - original_len);

                self.truncate(original_len);
                return Err(error);
            }
        }

        //  Rotate `[index, len)` left by `original_len - index`, by triple reversal.
        self.reverse(index..original_len);
        self.reverse(original_len..self.len);
        self.reverse(index..self.len);

        Ok(())
    }

    /// Appends `values` at the end of the array.
    ///
    /// On error, `self` is left unchanged.
    pub fn extend_from_slice(&mut self, values: &[bool]) -> Result<(), SequenceError> {
        self.insert_slice(self.len, values)
    }

    /// Appends the bits of `values` at the end of the array.
    ///
    /// See `insert_iter`.
    pub fn try_extend<I>(&mut self, values: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = bool>,
    {
        self.insert_iter(self.len, values)
    }

    /// Removes the bits in `range`, shifting all bits after it to the left.
    ///
    /// Returns `BoundsError` if `range` is out of bounds. Never reallocates.
    pub fn erase_range<R>(&mut self, range: R) -> Result<(), SequenceError>
    where
        R: RangeBounds<usize>,
    {
        let range = SequenceError::check_range(range, self.len)?;

        self.erase_window(range);

        Ok(())
    }
}

//
//  Assignment
//

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    /// Replaces the contents with `count` times `value`.
    ///
    /// The existing storage is reused when `count` is within the capacity. Otherwise, the array is reallocated to
    /// exactly `count` bits, rounded up to a multiple of 64; on error, `self` is left unchanged.
    pub fn assign_n(&mut self, count: usize, value: bool) -> Result<(), SequenceError> {
        self.reserve(count)?;

        self.fill(0..count, value);
        self.truncate(count);
        self.len = count;

        Ok(())
    }

    /// Replaces the contents with `values`.
    ///
    /// See `assign_n` for the guarantees.
    pub fn assign_slice(&mut self, values: &[bool]) -> Result<(), SequenceError> {
        self.reserve(values.len())?;

        for (index, value) in values.iter().enumerate() {
            self.assign_bit(index, *value);
        }

        self.truncate(values.len());
        self.len = values.len();

        Ok(())
    }

    /// Replaces the contents with the bits of `values`.
    ///
    /// On error, the array is left valid, but its contents are unspecified.
    pub fn assign_iter<I>(&mut self, values: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = bool>,
    {
        self.clear();

        for value in values {
            self.push(value)?;
        }

        Ok(())
    }

    /// Replaces the contents with the contents of `other`, as per copy-assignment.
    ///
    /// If `other`'s handle propagates on copy:
    ///
    /// -   And is not equivalent to `self`'s, the new contents are built with a clone of `other`'s handle before
    ///     `self`'s are released.
    /// -   And is equivalent to `self`'s, `self` reuses its storage as per `assign_slice`, then adopts it.
    ///
    /// Otherwise, as per `assign_slice`. In all cases, on error, `self` is left unchanged.
    pub fn assign_from(&mut self, other: &Self) -> Result<(), SequenceError>
    where
        A: Clone,
    {
        let propagate = other.handle.propagates_on_copy();

        if propagate && !self.handle.is_equivalent(&other.handle) {
            *self = other.try_clone()?;
            return Ok(());
        }

        self.reserve(other.len)?;

        let words = other.as_words();

        self.words_mut()[..words.len()].copy_from_slice(words);
        self.truncate(other.len);
        self.len = other.len;

        if propagate {
            self.handle = other.handle.clone();
        }

        Ok(())
    }

    /// Moves the contents of `other` into `self`, as per move-assignment, leaving `other` empty.
    ///
    /// If the handles are equivalent, the storage is transferred without reallocation. Otherwise, the words are
    /// copied into a fresh allocation from `self`'s handle; on error, both `self` and `other` are left unchanged.
    pub fn move_from(&mut self, other: &mut Self) -> Result<(), SequenceError> {
        if self.handle.is_equivalent(&other.handle) {
            let words = mem::replace(&mut other.words, RawSlots::dangling());
            let len = mem::replace(&mut other.len, 0);

            self.install(words, len);

            return Ok(());
        }

        let words = Self::allocate_copy(self.handle.allocator(), other.as_words(), other.as_words().len())?;

        self.install(words, other.len);

        other.clear();

        Ok(())
    }
}

//
//  Sequence (trait)
//

impl<A> Sequence for DynamicBitArray<A>
where
    A: Allocator,
{
    type Item = bool;

    type Ref<'a>
        = bool
    where
        Self: 'a;

    fn len(&self) -> usize {
        self.len()
    }

    fn capacity(&self) -> usize {
        self.capacity()
    }

    fn max_size(&self) -> usize {
        self.max_size()
    }

    fn get(&self, index: usize) -> Result<bool, SequenceError> {
        self.get(index)
    }

    fn reserve(&mut self, capacity: usize) -> Result<(), SequenceError> {
        self.reserve(capacity)
    }

    fn shrink_to_fit(&mut self) -> Result<(), SequenceError> {
        self.shrink_to_fit()
    }

    fn push(&mut self, value: bool) -> Result<(), SequenceError> {
        self.push(value)
    }

    fn pop(&mut self) -> Option<bool> {
        self.pop()
    }

    fn truncate(&mut self, len: usize) {
        self.truncate(len);
    }
}

//
//  Proxy
//

/// A proxy to a single bit of a `DynamicBitArray`.
///
/// A bit cannot be referenced directly, hence the proxy references its word, and the index of the bit within.
pub struct BitRef<'a> {
    word: &'a mut BitWord,
    index: IndexInWord,
}

impl BitRef<'_> {
    /// Returns the value of the bit.
    #[inline]
    pub fn get(&self) -> bool {
        self.word.is_set(self.index)
    }

    /// Sets the value of the bit.
    #[inline]
    pub fn set(&mut self, value: bool) {
        self.word.assign(self.index, value);
    }

    /// Sets the value of the bit, returning its previous value.
    #[inline]
    pub fn replace(&mut self, value: bool) -> bool {
        self.word.assign(self.index, value)
    }

    /// Flips the bit, returning its new value.
    #[inline]
    pub fn flip(&mut self) -> bool {
        self.word.flip(self.index)
    }
}

impl fmt::Debug for BitRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("BitRef").field(&self.get()).finish()
    }
}

//
//  Iteration
//

/// An iterator over the bits of a `DynamicBitArray`.
#[derive(Clone)]
pub struct BitIter<'a> {
    words: &'a [BitWord],
    front: usize,
    back: usize,
}

impl BitIter<'_> {
    fn bit(&self, index: usize) -> bool {
        let (of_word, in_word) = BitWord::split(index);

        self.words[of_word.0].is_set(in_word)
    }
}

impl Iterator for BitIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.front == self.back {
            return None;
        }

        let value = self.bit(self.front);

        self.front += 1;

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;

        (len, Some(len))
    }
}

impl DoubleEndedIterator for BitIter<'_> {
    fn next_back(&mut self) -> Option<bool> {
        if self.front == self.back {
            return None;
        }

        self.back -= 1;

        Some(self.bit(self.back))
    }
}

impl ExactSizeIterator for BitIter<'_> {}

impl FusedIterator for BitIter<'_> {}

impl fmt::Debug for BitIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, A> IntoIterator for &'a DynamicBitArray<A>
where
    A: Allocator,
{
    type Item = bool;
    type IntoIter = BitIter<'a>;

    fn into_iter(self) -> BitIter<'a> {
        self.iter()
    }
}

//
//  Common traits
//

impl<A> Clone for DynamicBitArray<A>
where
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        self.try_clone().expect("successful clone")
    }
}

impl<A> Drop for DynamicBitArray<A>
where
    A: Allocator,
{
    fn drop(&mut self) {
        //  Safety:
        //  -   Liveness & Selfness: as per the Self-Allocated invariant.
        unsafe { self.words.deallocate(self.handle.allocator()) };
    }
}

impl<A> fmt::Debug for DynamicBitArray<A>
where
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<A> Eq for DynamicBitArray<A> where A: Allocator {}

impl<A> Hash for DynamicBitArray<A>
where
    A: Allocator,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.len.hash(state);
        self.as_words().hash(state);
    }
}

impl<A> Ord for DynamicBitArray<A>
where
    A: Allocator,
{
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<A, B> PartialEq<DynamicBitArray<B>> for DynamicBitArray<A>
where
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &DynamicBitArray<B>) -> bool {
        //  Bits past the length are cleared, hence comparing words is sufficient.
        self.len == other.len && self.as_words() == other.as_words()
    }
}

impl<A> PartialOrd for DynamicBitArray<A>
where
    A: Allocator,
{
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

//  Safety:
//  -   The words are exclusively owned, just like in a `Vec<u64, A>`.
unsafe impl<A> Send for DynamicBitArray<A> where A: Allocator + Send {}

unsafe impl<A> Sync for DynamicBitArray<A> where A: Allocator + Sync {}

//
//  Utilities implementation.
//

impl<A> DynamicBitArray<A>
where
    A: Allocator,
{
    //  Returns the maximum number of words, such that the number of bits they hold fits in `usize`.
    const fn max_words(&self) -> usize {
        let words = self.handle.max_size::<BitWord>();

        if words > usize::MAX / BitWord::BITS {
            usize::MAX / BitWord::BITS
        } else {
            words
        }
    }

    //  Returns `self.len + additional`, or `CapacityExceeded` on overflow.
    fn required(&self, additional: usize) -> Result<usize, SequenceError> {
        self.len.checked_add(additional).ok_or(SequenceError::CapacityExceeded)
    }

    //  Returns all the words, including those past the length.
    fn words(&self) -> &[BitWord] {
        //  Safety:
        //  -   All words are initialized, as per the Initialized invariant.
        //  -   The pointer is non-null, and suitably aligned, even if dangling.
        unsafe { slice::from_raw_parts(self.words.as_ptr(), self.words.capacity()) }
    }

    fn words_mut(&mut self) -> &mut [BitWord] {
        //  Safety:
        //  -   All words are initialized, as per the Initialized invariant.
        //  -   The pointer is non-null, and suitably aligned, even if dangling.
        //  -   No other borrow is accessible, as `self` is mutably borrowed.
        unsafe { slice::from_raw_parts_mut(self.words.as_ptr(), self.words.capacity()) }
    }

    //  Returns the bit at `index`, which must be within the capacity.
    fn bit(&self, index: usize) -> bool {
        let (of_word, in_word) = BitWord::split(index);

        self.words()[of_word.0].is_set(in_word)
    }

    //  Sets the bit at `index`, which must be within the capacity, returning its previous value.
    fn assign_bit(&mut self, index: usize, value: bool) -> bool {
        let (of_word, in_word) = BitWord::split(index);

        self.words_mut()[of_word.0].assign(in_word, value)
    }

    //  Sets all bits in `range`, which must be within the capacity, to `value`.
    fn fill(&mut self, range: Range<usize>, value: bool) {
        let bits = if value { BitWord::ALL_ONES.0 } else { BitWord::ALL_ZEROS.0 };

        let words = self.words_mut();
        let mut index = range.start;

        //  One block per word, at most.
        while index < range.end {
            let (_, in_word) = BitWord::split(index);
            let block = cmp::min(BitWord::BITS - in_word.0 as usize, range.end - index);

            store_bits(words, index, block, bits);

            index += block;
        }
    }

    //  Reverses the order of the bits in `range`, which must be within the capacity.
    fn reverse(&mut self, range: Range<usize>) {
        let Range { mut start, mut end } = range;

        let words = self.words_mut();

        //  Swaps the lowest and highest blocks, each reversed, until they meet.
        while end - start > 1 {
            let block = cmp::min(BitWord::BITS, (end - start) / 2);

            let low = load_bits(words, start, block);
            let high = load_bits(words, end - block, block);

            store_bits(words, start, block, high.reverse_bits() >> (BitWord::BITS - block));
            store_bits(words, end - block, block, low.reverse_bits() >> (BitWord::BITS - block));

            start += block;
            end -= block;
        }
    }

    //  Opens a window of `count` bits at `index`, growing as per the growth policy if necessary.
    //
    //  The bits of the window are left with unspecified values. On error, `self` is left unchanged.
    fn open_window(&mut self, index: usize, count: usize) -> Result<(), SequenceError> {
        SequenceError::check_position(index, self.len)?;

        if count == 0 {
            return Ok(());
        }

        self.reserve_additional(count)?;

        let len = self.len;

        copy_bits(self.words_mut(), index, index + count, len - index);

        self.len += count;

        Ok(())
    }

    //  Removes the bits in `range`, which must be within the length.
    fn erase_window(&mut self, range: Range<usize>) {
        let Range { start, end } = range;

        if start == end {
            return;
        }

        let tail = self.len - end;

        copy_bits(self.words_mut(), end, start, tail);

        let len = self.len - (end - start);

        self.fill(len..self.len, false);
        self.len = len;
    }

    //  Allocates `words` zeroed words, in which `source` is copied.
    fn allocate_copy(allocator: &A, source: &[BitWord], words: usize) -> Result<RawSlots<BitWord>, SequenceError> {
        debug_assert!(source.len() <= words);

        let slots = RawSlots::<BitWord>::allocate(allocator, words)?;

        //  Safety:
        //  -   `slots` is valid for writes of `words` words, and `source.len() <= words`.
        //  -   `slots` does not overlap `source`, as it is a fresh allocation.
        unsafe {
            ptr::write_bytes(slots.as_ptr(), 0, words);
            slots.as_ptr().copy_from_nonoverlapping(source.as_ptr(), source.len());
        }

        Ok(slots)
    }

    //  Moves the bits to a fresh allocation of exactly `words` words.
    fn reallocate(&mut self, words: usize) -> Result<(), SequenceError> {
        debug_assert!(words >= BitWord::words_for(self.len));

        crate::log_debug!("reallocating from {} to {words} words", self.words.capacity());

        let slots = Self::allocate_copy(self.handle.allocator(), self.as_words(), words)?;

        let len = self.len;

        self.install(slots, len);

        Ok(())
    }

    //  Replaces the storage with `words`, holding `len` bits, releasing the previous storage.
    //
    //  `words` must satisfy all the Safety Invariants.
    fn install(&mut self, words: RawSlots<BitWord>, len: usize) {
        let previous = mem::replace(&mut self.words, words);

        self.len = len;

        //  Safety:
        //  -   Liveness & Selfness: as per the Self-Allocated invariant.
        unsafe { previous.deallocate(self.handle.allocator()) };
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use core::{cmp, fmt};

    use serde::{
        Deserialize, Deserializer, Serialize, Serializer,
        de::{self, SeqAccess, Visitor},
    };

    use super::*;

    impl<A> Serialize for DynamicBitArray<A>
    where
        A: Allocator,
    {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_seq(self.iter())
        }
    }

    impl<'de, A> Deserialize<'de> for DynamicBitArray<A>
    where
        A: Allocator + Default,
    {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            Self::deserialize_in(deserializer, AllocatorHandle::default())
        }
    }

    impl<A> DynamicBitArray<A>
    where
        A: Allocator,
    {
        /// Deserializes an array, whose words are provided by `handle`.
        ///
        /// Failures to allocate, or to honor the maximum size of `handle`, are reported as custom errors.
        pub fn deserialize_in<'de, D>(deserializer: D, handle: AllocatorHandle<A>) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_seq(BitArrayVisitor(handle))
        }
    }

    struct BitArrayVisitor<A>(AllocatorHandle<A>);

    impl<'de, A> Visitor<'de> for BitArrayVisitor<A>
    where
        A: Allocator,
    {
        type Value = DynamicBitArray<A>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
            f.write_str("a sequence of booleans")
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut result = DynamicBitArray::new_in(self.0);

            //  Do not trust the hint blindly.
            let hint = seq.size_hint().unwrap_or(0);
            let hint = cmp::min(hint, cmp::min(MAX_PREALLOCATION, result.max_size()));

            result.reserve(hint).map_err(de::Error::custom)?;

            while let Some(value) = seq.next_element()? {
                result.push(value).map_err(de::Error::custom)?;
            }

            Ok(result)
        }
    }

    const MAX_PREALLOCATION: usize = 1 << 16;

// mod tests
} // mod serde_impl

#[cfg(test)]
mod tests {
    use std::{collections::hash_map::DefaultHasher, vec::Vec};

    use proptest::prelude::*;

    use crate::utils::{equal_equivalent, testing::TestAllocator};

    use super::*;

    type TestBitArray<'a> = DynamicBitArray<&'a TestAllocator>;

    fn array_in<'a>(allocator: &'a TestAllocator, bits: &[bool]) -> TestBitArray<'a> {
        DynamicBitArray::from_slice_in(bits, AllocatorHandle::new(allocator)).expect("allocation")
    }

    fn pattern(len: usize) -> Vec<bool> {
        (0..len).map(|i| i % 3 == 0).collect()
    }

    fn spliced(bits: &[bool], index: usize, values: &[bool]) -> Vec<bool> {
        let mut result = bits[..index].to_vec();
        result.extend_from_slice(values);
        result.extend_from_slice(&bits[index..]);
        result
    }

    #[track_caller]
    fn assert_bits<A>(expected: &[bool], array: &DynamicBitArray<A>)
    where
        A: Allocator,
    {
        let actual: Vec<_> = array.iter().collect();

        assert_eq!(expected, &actual[..]);
        assert_eq!(expected.len(), array.len());
        assert_eq!(0, array.capacity() % BitWord::BITS, "{}", array.capacity());

        //  Bits past the length are cleared.
        let ones = expected.iter().filter(|b| **b).count();

        assert_eq!(ones, array.count_ones());
        assert_eq!(ones, array.words().iter().map(BitWord::count).sum::<usize>());
    }

    #[test]
    fn empty() {
        let array = DynamicBitArray::new();

        assert!(array.is_empty());
        assert_eq!(0, array.capacity());
        assert_eq!(Err(SequenceError::BoundsError { index: 0, len: 0 }), array.get(0));
        assert_bits(&[], &array);
    }

    #[test]
    fn reserve_rounds_to_words() {
        let allocator = TestAllocator::unlimited();
        let mut array = DynamicBitArray::new_in(AllocatorHandle::new(&allocator));

        array.reserve(0).expect("no-op");
        assert_eq!(0, allocator.allocations());

        array.reserve(1).expect("allocation");
        assert_eq!(64, array.capacity());
        assert_eq!(8, allocator.live_bytes());

        array.reserve(64).expect("no-op");
        assert_eq!(1, allocator.allocations());

        array.reserve(65).expect("allocation");
        assert_eq!(128, array.capacity());
        assert_eq!(16, allocator.live_bytes());
    }

    #[test]
    fn reserve_preserves_bits() {
        let bits = pattern(70);
        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        assert_eq!(128, array.capacity());

        array.reserve(1000).expect("allocation");

        assert_eq!(1024, array.capacity());
        assert_bits(&bits, &array);
    }

    #[test]
    fn reserve_failure() {
        let allocator = TestAllocator::unlimited();
        let mut array = array_in(&allocator, &[true, false, true]);

        allocator.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.reserve(65));
        assert_eq!(64, array.capacity());
        assert_bits(&[true, false, true], &array);
    }

    #[test]
    fn capacity_exceeded() {
        let allocator = TestAllocator::unlimited();
        let handle = AllocatorHandle::new(&allocator).with_max_bytes(16);
        let mut array = DynamicBitArray::new_in(handle);

        assert_eq!(128, array.max_size());

        assert_eq!(Err(SequenceError::CapacityExceeded), array.reserve(129));
        assert_eq!(Err(SequenceError::CapacityExceeded), array.resize(129, true));
        assert_eq!(Err(SequenceError::CapacityExceeded), array.assign_n(129, true));
        assert_eq!(Err(SequenceError::CapacityExceeded), array.insert_n(0, 129, true));
        assert_eq!(0, allocator.allocations());

        array.resize(128, true).expect("allocation");

        assert_eq!(Err(SequenceError::CapacityExceeded), array.push(false));
        assert_eq!(128, array.count_ones());
    }

    #[test]
    fn max_size_fits() {
        let array = DynamicBitArray::new();

        assert_eq!(0, array.max_size() % BitWord::BITS);
        assert!(array.max_size().checked_add(BitWord::BITS - 1).is_some());
    }

    #[test]
    fn push_pop() {
        let mut array = DynamicBitArray::new();
        let bits = pattern(130);

        for bit in &bits {
            array.push(*bit).expect("allocation");
        }

        assert_eq!(256, array.capacity());
        assert_bits(&bits, &array);

        for bit in bits.iter().rev() {
            assert_eq!(Some(*bit), array.pop());
        }

        assert_eq!(None, array.pop());
        assert_bits(&[], &array);
    }

    #[test]
    fn push_failure() {
        let allocator = TestAllocator::unlimited();
        let mut array = array_in(&allocator, &[true; 64]);

        allocator.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.push(true));
        assert_eq!(64, array.capacity());
        assert_bits(&[true; 64], &array);
    }

    #[test]
    fn get_set() {
        let mut array = DynamicBitArray::from_slice(&[true, false, true]).expect("allocation");

        assert_eq!(Ok(true), array.get(0));
        assert_eq!(Ok(false), array.get(1));
        assert_eq!(Err(SequenceError::BoundsError { index: 3, len: 3 }), array.get(3));

        assert_eq!(Ok(false), array.set(1, true));
        assert_eq!(Err(SequenceError::BoundsError { index: 4, len: 3 }), array.set(4, true));
        assert_bits(&[true, true, true], &array);
    }

    #[test]
    fn bit_ref() {
        let mut array = DynamicBitArray::from_slice(&pattern(100)).expect("allocation");

        {
            let mut bit = array.get_mut(70).expect("in bounds");

            assert!(!bit.get());

            bit.set(true);
            assert!(bit.get());

            assert!(bit.replace(false));
            assert!(bit.flip());
        }

        assert_eq!(Ok(true), array.get(70));
        assert!(array.get_mut(100).is_err());
    }

    #[test]
    fn insert_into_full() {
        let allocator = TestAllocator::unlimited();
        let mut bits = pattern(64);
        let mut array = array_in(&allocator, &bits);

        assert_eq!(64, array.capacity());

        array.insert_n(2, 1, true).expect("allocation");
        bits.insert(2, true);

        assert_eq!(128, array.capacity());
        assert_bits(&bits, &array);
    }

    #[test]
    fn insert_into_full_failure() {
        let allocator = TestAllocator::unlimited();
        let bits = pattern(64);
        let mut array = array_in(&allocator, &bits);

        allocator.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.insert_n(2, 1, true));
        assert_eq!(Err(SequenceError::AllocationFailure), array.insert(0, true));
        assert_eq!(64, array.capacity());
        assert_bits(&bits, &array);
    }

    #[test]
    fn insert() {
        let mut array = DynamicBitArray::from_slice(&[false, false]).expect("allocation");

        array.insert(1, true).expect("allocation");
        array.insert(3, true).expect("allocation");

        assert_bits(&[false, true, false, true], &array);
        assert_eq!(
            Err(SequenceError::BoundsError { index: 5, len: 4 }),
            array.insert(5, true)
        );
    }

    #[test]
    fn insert_n_across_words() {
        let bits = pattern(100);
        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        array.insert_n(30, 150, true).expect("allocation");

        assert_bits(&spliced(&bits, 30, &[true; 150]), &array);
    }

    #[test]
    fn insert_slice() {
        let mut array = DynamicBitArray::from_slice(&[true, true]).expect("allocation");

        array.insert_slice(1, &[false, true, false]).expect("allocation");
        assert_bits(&[true, false, true, false, true], &array);

        array.extend_from_slice(&[false, false]).expect("allocation");
        assert_bits(&[true, false, true, false, true, false, false], &array);
    }

    #[test]
    fn insert_iter() {
        let bits = pattern(70);
        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        array.insert_iter(5, [true, true, false]).expect("allocation");

        let mut bits = spliced(&bits, 5, &[true, true, false]);

        assert_bits(&bits, &array);

        array.try_extend([false, true]).expect("allocation");
        bits.extend([false, true]);

        assert_bits(&bits, &array);
    }

    #[test]
    fn insert_iter_failure() {
        let allocator = TestAllocator::unlimited();
        let bits = pattern(60);
        let mut array = array_in(&allocator, &bits);

        allocator.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.insert_iter(10, [true; 10]));
        assert_bits(&bits, &array);
    }

    #[test]
    fn insert_iter_failure_after_growth() {
        let allocator = TestAllocator::unlimited();
        let bits = pattern(60);
        let mut array = array_in(&allocator, &bits);

        allocator.set_remaining(1);

        assert_eq!(Err(SequenceError::AllocationFailure), array.insert_iter(10, [true; 300]));

        //  The original bits are in place, in the grown storage.
        assert_eq!(128, array.capacity());
        assert_bits(&bits, &array);
    }

    #[test]
    fn insert_iter_rotates_across_words() {
        let bits = pattern(100);
        let values: Vec<_> = (0..150).map(|i| i % 5 == 1).collect();

        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        array.insert_iter(37, values.iter().copied()).expect("allocation");

        assert_bits(&spliced(&bits, 37, &values), &array);
    }

    #[test]
    fn shift_across_words() {
        let bits = pattern(200);
        let values: Vec<_> = (0..130).map(|i| i % 7 < 3).collect();

        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        //  Unaligned shift, spanning several words.
        array.insert_slice(3, &values).expect("allocation");

        let expected = spliced(&bits, 3, &values);

        assert_bits(&expected, &array);

        array.erase_range(3..133).expect("in bounds");

        assert_bits(&bits, &array);

        //  Word-aligned shift.
        array.insert_n(64, 128, true).expect("allocation");

        let expected = spliced(&bits, 64, &[true; 128]);

        assert_bits(&expected, &array);

        array.erase_range(64..192).expect("in bounds");

        assert_bits(&bits, &array);
    }

    #[test]
    fn erase() {
        let mut bits = pattern(100);
        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        assert_eq!(Ok(bits.remove(63)), array.erase(63));
        assert_eq!(Ok(bits.remove(0)), array.erase(0));
        assert_eq!(Err(SequenceError::BoundsError { index: 98, len: 98 }), array.erase(98));

        assert_eq!(128, array.capacity());
        assert_bits(&bits, &array);
    }

    #[test]
    fn erase_range() {
        let mut bits = pattern(200);
        let mut array = DynamicBitArray::from_slice(&bits).expect("allocation");

        array.erase_range(10..140).expect("in bounds");
        bits.drain(10..140);

        assert_bits(&bits, &array);

        assert_eq!(
            Err(SequenceError::BoundsError { index: 71, len: 70 }),
            array.erase_range(60..71)
        );

        array.erase_range(..).expect("in bounds");

        assert_bits(&[], &array);
        assert_eq!(256, array.capacity());
    }

    #[test]
    fn truncate_clears() {
        let mut array = DynamicBitArray::from_slice(&[true; 100]).expect("allocation");

        array.truncate(3);

        assert_eq!(&[BitWord(0b111)], array.as_words());
        assert_bits(&[true; 3], &array);

        array.clear();

        assert_bits(&[], &array);
        assert_eq!(128, array.capacity());
    }

    #[test]
    fn resize() {
        let mut array = DynamicBitArray::from_slice(&[false, true]).expect("allocation");

        array.resize(70, true).expect("allocation");

        assert_eq!(128, array.capacity());
        assert_eq!(69, array.count_ones());

        array.resize(1, true).expect("no allocation");

        assert_bits(&[false], &array);
    }

    #[test]
    fn resize_failure() {
        let allocator = TestAllocator::unlimited();
        let mut array = array_in(&allocator, &[false, true]);

        allocator.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.resize(65, true));
        assert_bits(&[false, true], &array);

        array.resize(64, true).expect("no allocation");

        assert_eq!(63, array.count_ones());
    }

    #[test]
    fn shrink_to_fit() {
        let allocator = TestAllocator::unlimited();
        let mut array = array_in(&allocator, &pattern(10));

        array.reserve(1000).expect("allocation");
        array.shrink_to_fit().expect("allocation");

        assert_eq!(64, array.capacity());
        assert_bits(&pattern(10), &array);

        array.clear();
        allocator.set_remaining(0);
        array.shrink_to_fit().expect("no allocation");

        assert_eq!(0, array.capacity());
        assert_eq!(0, allocator.live_bytes());
    }

    #[test]
    fn assign() {
        let mut array = DynamicBitArray::from_slice(&pattern(100)).expect("allocation");

        array.assign_n(10, true).expect("no allocation");
        assert_bits(&[true; 10], &array);

        array.assign_slice(&[false, true]).expect("no allocation");
        assert_bits(&[false, true], &array);

        array.assign_iter((0..300).map(|i| i % 2 == 0)).expect("allocation");
        assert_eq!(300, array.len());
        assert_eq!(150, array.count_ones());

        array.assign_n(0, true).expect("no allocation");
        assert_bits(&[], &array);
    }

    #[test]
    fn assign_failure() {
        let allocator = TestAllocator::unlimited();
        let mut array = array_in(&allocator, &[true, false]);

        allocator.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.assign_n(65, true));
        assert_eq!(Err(SequenceError::AllocationFailure), array.assign_slice(&[true; 65]));
        assert_bits(&[true, false], &array);
    }

    #[test]
    fn iter() {
        let array = DynamicBitArray::from_slice(&[true, false, false, true, true]).expect("allocation");

        let mut iter = array.iter();

        assert_eq!(5, iter.len());
        assert_eq!(Some(true), iter.next());
        assert_eq!(Some(true), iter.next_back());
        assert_eq!(Some(true), iter.next_back());
        assert_eq!(2, iter.len());

        let rest: Vec<_> = iter.collect();

        assert_eq!(vec![false, false], rest);

        let all: Vec<_> = (&array).into_iter().rev().collect();

        assert_eq!(vec![true, true, false, false, true], all);
    }

    #[test]
    fn clone() {
        let mut array = DynamicBitArray::from_slice(&pattern(10)).expect("allocation");

        array.reserve(500).expect("allocation");

        let clone = array.clone();

        assert_eq!(array, clone);
        assert_eq!(64, clone.capacity());
    }

    #[test]
    fn try_clone_failure() {
        let allocator = TestAllocator::unlimited();
        let array = array_in(&allocator, &[true]);

        allocator.set_remaining(0);

        assert_eq!(Some(SequenceError::AllocationFailure), array.try_clone().err());
    }

    #[test]
    fn assign_from() {
        let left = TestAllocator::with_id(1, usize::MAX);
        let right = TestAllocator::with_id(2, usize::MAX);

        let mut array =
            DynamicBitArray::from_slice_in(&pattern(200), AllocatorHandle::new(&left).with_equivalence(equal_equivalent))
                .expect("allocation");

        let other = DynamicBitArray::from_slice_in(&[true, true], AllocatorHandle::new(&right)).expect("allocation");

        array.assign_from(&other).expect("no allocation");

        assert_bits(&[true, true], &array);
        assert_eq!(256, array.capacity());
        assert!(ptr::eq(&left, *array.handle().allocator()));

        let other = DynamicBitArray::from_slice_in(
            &[false, true, false],
            AllocatorHandle::new(&right)
                .with_equivalence(equal_equivalent)
                .with_propagate_on_copy(true),
        )
        .expect("allocation");

        array.assign_from(&other).expect("allocation");

        assert_bits(&[false, true, false], &array);
        assert!(ptr::eq(&right, *array.handle().allocator()));
        assert_eq!(0, left.live_bytes());
    }

    #[test]
    fn move_from() {
        let allocator = TestAllocator::unlimited();
        let mut array = array_in(&allocator, &[true]);
        let mut other = array_in(&allocator, &pattern(70));

        let allocations = allocator.allocations();

        array.move_from(&mut other).expect("no allocation");

        assert_bits(&pattern(70), &array);
        assert_bits(&[], &other);
        assert_eq!(0, other.capacity());
        assert_eq!(allocations, allocator.allocations());
    }

    #[test]
    fn move_from_unequal() {
        let left = TestAllocator::with_id(1, usize::MAX);
        let right = TestAllocator::with_id(2, usize::MAX);

        let mut array = DynamicBitArray::from_slice_in(&[true], AllocatorHandle::new(&left).with_equivalence(equal_equivalent))
            .expect("allocation");
        let mut other =
            DynamicBitArray::from_slice_in(&pattern(70), AllocatorHandle::new(&right).with_equivalence(equal_equivalent))
                .expect("allocation");

        left.set_remaining(0);

        assert_eq!(Err(SequenceError::AllocationFailure), array.move_from(&mut other));
        assert_bits(&[true], &array);
        assert_bits(&pattern(70), &other);

        left.set_remaining(usize::MAX);

        array.move_from(&mut other).expect("allocation");

        assert_bits(&pattern(70), &array);
        assert_bits(&[], &other);
        assert_eq!(16, left.live_bytes());
    }

    #[test]
    fn drop_releases() {
        let allocator = TestAllocator::unlimited();

        {
            let mut array = array_in(&allocator, &pattern(100));

            array.reserve(1000).expect("allocation");
        }

        assert_eq!(0, allocator.live_bytes());
        assert_eq!(allocator.allocations(), allocator.deallocations());
    }

    #[test]
    fn comparisons() {
        let short = DynamicBitArray::from_slice(&[true, false]).expect("allocation");
        let long = DynamicBitArray::from_slice(&[true, false, false]).expect("allocation");
        let high = DynamicBitArray::from_slice(&[true, true]).expect("allocation");

        assert!(short < long);
        assert!(long < high);
        assert_ne!(short, long);

        let mut grown = long.clone();
        grown.reserve(1000).expect("allocation");

        assert_eq!(long, grown);
        assert_eq!(hash_of(&long), hash_of(&grown));
        assert_eq!("[true, false]", format!("{short:?}"));
    }

    #[test]
    fn sequence_trait() {
        fn fill<S>(sequence: &mut S, values: impl IntoIterator<Item = S::Item>)
        where
            S: Sequence,
        {
            for value in values {
                sequence.push(value).expect("allocation");
            }
        }

        let mut array = DynamicBitArray::new();

        fill(&mut array, [true, false, true]);

        assert_eq!(Ok(false), Sequence::get(&array, 1));
        assert_eq!(64, Sequence::capacity(&array));

        Sequence::clear(&mut array);

        assert!(Sequence::is_empty(&array));
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Push(bool),
        Pop,
        Insert(prop::sample::Index, usize, bool),
        Erase(prop::sample::Index, usize),
        Resize(usize, bool),
    }

    fn operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            any::<bool>().prop_map(Operation::Push),
            Just(Operation::Pop),
            (any::<prop::sample::Index>(), 0usize..80, any::<bool>()).prop_map(|(i, n, v)| Operation::Insert(i, n, v)),
            (any::<prop::sample::Index>(), 0usize..80).prop_map(|(i, n)| Operation::Erase(i, n)),
            (0usize..300, any::<bool>()).prop_map(|(n, v)| Operation::Resize(n, v)),
        ]
    }

    proptest! {
        #[test]
        fn reserve_rounds_up(requested in 0usize..10_000) {
            let mut array = DynamicBitArray::new();

            array.reserve(requested).expect("allocation");

            prop_assert!(array.capacity() >= requested);
            prop_assert_eq!(0, array.capacity() % BitWord::BITS);
            prop_assert!(array.capacity() < requested + BitWord::BITS);
        }

        #[test]
        fn matches_vec(operations in proptest::collection::vec(operation(), 0..40)) {
            let mut array = DynamicBitArray::new();
            let mut model = Vec::new();

            for operation in operations {
                match operation {
                    Operation::Push(value) => {
                        array.push(value).expect("allocation");
                        model.push(value);
                    }
                    Operation::Pop => {
                        prop_assert_eq!(model.pop(), array.pop());
                    }
                    Operation::Insert(index, count, value) => {
                        let index = index.index(model.len() + 1);

                        array.insert_n(index, count, value).expect("allocation");
                        model = spliced(&model, index, &vec![value; count]);
                    }
                    Operation::Erase(index, count) => {
                        let start = index.index(model.len() + 1);
                        let end = cmp::min(start + count, model.len());

                        array.erase_range(start..end).expect("in bounds");
                        model.drain(start..end);
                    }
                    Operation::Resize(len, value) => {
                        array.resize(len, value).expect("allocation");
                        model.resize(len, value);
                    }
                }

                prop_assert_eq!(0, array.capacity() % BitWord::BITS);
                prop_assert!(array.len() <= array.capacity());
            }

            assert_bits(&model, &array);
        }
    }
}
