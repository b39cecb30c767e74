//! Dynamically sized, allocator-aware, array.

use core::{
    cmp, fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::{Deref, DerefMut, Range, RangeBounds},
    ptr, slice,
};

use crate::{
    api::Sequence,
    utils::{
        AllocatorHandle, RawSlots, Release, SequenceError, StagingBuffer,
        alloc::{Allocator, Global},
        growth,
    },
};

/// Dynamically sized, allocator-aware, array.
///
/// Every operation which may need to allocate reports failure through `SequenceError`, rather than panicking. Unless
/// documented otherwise, a failing operation leaves the array unchanged.
pub struct DynamicArray<T, A: Allocator = Global> {
    //  Safety Invariants:
    //  -   Self-Allocated: `slots` was allocated by `handle.allocator()`, or an equivalent allocator.
    //  -   Initialized: the slots in `[0, len)` are initialized, the slots in `[len, capacity)` are not.
    slots: RawSlots<T>,
    len: usize,
    handle: AllocatorHandle<A>,
}

//
//  Creation
//

impl<T> DynamicArray<T, Global> {
    /// Creates a new, empty, array.
    pub const fn new() -> Self {
        Self::new_in(AllocatorHandle::global())
    }

    /// Creates a new array holding clones of `values`.
    pub fn from_slice(values: &[T]) -> Result<Self, SequenceError>
    where
        T: Clone,
    {
        Self::from_slice_in(values, AllocatorHandle::global())
    }
}

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    /// Creates a new, empty, array.
    ///
    /// Does not allocate.
    pub const fn new_in(handle: AllocatorHandle<A>) -> Self {
        Self {
            slots: RawSlots::dangling(),
            len: 0,
            handle,
        }
    }

    /// Creates a new, empty, array with a capacity of exactly `capacity`.
    pub fn with_capacity_in(capacity: usize, handle: AllocatorHandle<A>) -> Result<Self, SequenceError> {
        let mut result = Self::new_in(handle);

        result.reserve(capacity)?;

        Ok(result)
    }

    /// Creates a new array holding `count` clones of `value`.
    pub fn from_elem_in(count: usize, value: &T, handle: AllocatorHandle<A>) -> Result<Self, SequenceError>
    where
        T: Clone,
    {
        growth::check_capacity(count, handle.max_size::<T>())?;

        let (slots, len) = {
            let mut staging = StagingBuffer::new(handle.allocator(), count)?;

            staging.extend_fill(count, value);

            staging.adopt()
        };

        Ok(Self { slots, len, handle })
    }

    /// Creates a new array holding clones of `values`.
    pub fn from_slice_in(values: &[T], handle: AllocatorHandle<A>) -> Result<Self, SequenceError>
    where
        T: Clone,
    {
        let mut result = Self::new_in(handle);

        result.assign_slice(values)?;

        Ok(result)
    }

    /// Creates a clone of `self`, in a fresh allocation from a clone of its allocator handle.
    pub fn try_clone(&self) -> Result<Self, SequenceError>
    where
        T: Clone,
        A: Clone,
    {
        let (slots, len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), self.len)?;

            staging.extend_cloned(self.as_slice());

            staging.adopt()
        };

        let handle = self.handle.clone();

        Ok(Self { slots, len, handle })
    }
}

impl<T, A> Default for DynamicArray<T, A>
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

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    /// Returns the number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the array is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the array can hold without reallocating.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the maximum number of elements the array could ever hold, as per its allocator handle.
    #[inline]
    pub const fn max_size(&self) -> usize {
        self.handle.max_size::<T>()
    }

    /// Returns the allocator handle.
    #[inline]
    pub const fn handle(&self) -> &AllocatorHandle<A> {
        &self.handle
    }

    /// Returns a raw pointer to the storage.
    ///
    /// The pointer is dangling if no memory has been allocated.
    #[inline]
    pub const fn as_ptr(&self) -> *const T {
        self.slots.as_ptr()
    }

    /// Returns the elements, as a slice.
    #[inline]
    pub const fn as_slice(&self) -> &[T] {
        //  Safety:
        //  -   `[0, len)` is initialized, as per the Initialized invariant.
        //  -   The pointer is non-null, and suitably aligned, even if dangling.
        unsafe { slice::from_raw_parts(self.slots.as_ptr(), self.len) }
    }

    /// Returns the elements, as a mutable slice.
    #[inline]
    pub const fn as_mut_slice(&mut self) -> &mut [T] {
        //  Safety:
        //  -   `[0, len)` is initialized, as per the Initialized invariant.
        //  -   The pointer is non-null, and suitably aligned, even if dangling.
        //  -   No other borrow is accessible, as `self` is mutably borrowed.
        unsafe { slice::from_raw_parts_mut(self.slots.as_ptr(), self.len) }
    }

    /// Returns the element at `index`, or `BoundsError` if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&T, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        //  Safety:
        //  -   `index` is in bounds, as just checked.
        Ok(unsafe { self.get_unchecked(index) })
    }

    /// Returns the element at `index`, or `BoundsError` if `index` is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        //  Safety:
        //  -   `index` is in bounds, as just checked.
        Ok(unsafe { self.get_unchecked_mut(index) })
    }

    /// Returns the element at `index`.
    ///
    /// #   Safety
    ///
    /// -   In-Bounds: `index` must be strictly less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len, "{index} >= {}", self.len);

        //  Safety:
        //  -   `index` is in bounds, as per the In-Bounds pre-condition.
        unsafe { self.as_slice().get_unchecked(index) }
    }

    /// Returns the element at `index`.
    ///
    /// #   Safety
    ///
    /// -   In-Bounds: `index` must be strictly less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len, "{index} >= {}", self.len);

        //  Safety:
        //  -   `index` is in bounds, as per the In-Bounds pre-condition.
        unsafe { self.as_mut_slice().get_unchecked_mut(index) }
    }
}

//
//  Capacity
//

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    /// Ensures the capacity is at least `capacity`.
    ///
    /// Does nothing if the capacity is already sufficient: no element moves. Otherwise, reallocates to exactly
    /// `capacity`.
    ///
    /// On error, `self` is left unchanged. `CapacityExceeded` is returned, without attempting any allocation, if
    /// `capacity` exceeds `self.max_size()`.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), SequenceError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        growth::check_capacity(capacity, self.max_size())?;

        self.reallocate(capacity)
    }

    /// Ensures the capacity is sufficient for `additional` more elements.
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

        self.reallocate(capacity)
    }

    /// Reallocates to a capacity of exactly `self.len()`.
    ///
    /// On error, `self` is left unchanged. If `self` is empty, its memory is released without allocating.
    pub fn shrink_to_fit(&mut self) -> Result<(), SequenceError> {
        if self.capacity() == self.len {
            return Ok(());
        }

        if self.len == 0 {
            let slots = mem::replace(&mut self.slots, RawSlots::dangling());

            //  Safety:
            //  -   Liveness: `slots` is allocated, as per the Self-Allocated invariant, and no longer referenced.
            //  -   Selfness: as per the Self-Allocated invariant.
            unsafe { slots.deallocate(self.handle.allocator()) };

            return Ok(());
        }

        self.reallocate(self.len)
    }
}

//
//  Element-wise modifications
//

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    /// Appends `value` at the end of the array.
    ///
    /// On error, `self` is left unchanged, and `value` is dropped.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), SequenceError> {
        self.push_with(|| value)
    }

    /// Appends the value returned by `f` at the end of the array.
    ///
    /// If capacity is available, the value is written directly in the next slot, otherwise the array grows as per the
    /// growth policy. `f` is only called once any allocation succeeded.
    ///
    /// On error, or if `f` panics, `self` is left unchanged.
    #[inline]
    pub fn push_with<F>(&mut self, f: F) -> Result<(), SequenceError>
    where
        F: FnOnce() -> T,
    {
        if self.len == self.capacity() {
            return self.push_with_slow(f);
        }

        let value = f();

        //  Safety:
        //  -   `self.len` is in bounds, and not initialized, as per the Initialized invariant.
        unsafe { self.slots.slot(self.len).write(value) };

        self.len += 1;

        Ok(())
    }

    /// Removes the last element, if any.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;

        //  Safety:
        //  -   The slot at `self.len` was initialized, and is now considered uninitialized.
        Some(unsafe { self.slots.slot(self.len).read() })
    }

    /// Inserts `value` at `index`, shifting all elements after it to the right.
    ///
    /// Returns `BoundsError` if `index` is strictly greater than `self.len()`. On error, `self` is left unchanged.
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), SequenceError> {
        self.insert_with(index, || value)
    }

    /// Inserts the value returned by `f` at `index`, shifting all elements after it to the right.
    ///
    /// Returns `BoundsError` if `index` is strictly greater than `self.len()`. On error, or if `f` panics, `self` is
    /// left unchanged.
    pub fn insert_with<F>(&mut self, index: usize, f: F) -> Result<(), SequenceError>
    where
        F: FnOnce() -> T,
    {
        SequenceError::check_position(index, self.len)?;

        if self.len == self.capacity() {
            return self.insert_with_slow(index, f);
        }

        let value = f();

        let base = self.slots.as_ptr();

        //  Safety:
        //  -   `[index, len)` is initialized, and `[index + 1, len + 1)` is in bounds as `len < capacity`.
        //  -   The slot at `index` is considered uninitialized after the copy, and immediately overwritten.
        unsafe {
            ptr::copy(base.add(index), base.add(index + 1), self.len - index);
            base.add(index).write(value);
        }

        self.len += 1;

        Ok(())
    }

    /// Removes the element at `index`, shifting all elements after it to the left.
    ///
    /// Returns `BoundsError` if `index` is out of bounds. Never reallocates.
    pub fn erase(&mut self, index: usize) -> Result<T, SequenceError> {
        SequenceError::check_access(index, self.len)?;

        let base = self.slots.as_ptr();

        //  Safety:
        //  -   The slot at `index` is initialized, and considered moved-out after the read.
        //  -   `[index + 1, len)` is initialized, and moved over the hole.
        let value = unsafe {
            let value = base.add(index).read();
            ptr::copy(base.add(index + 1), base.add(index), self.len - index - 1);
            value
        };

        self.len -= 1;

        Ok(value)
    }
}

//
//  Range modifications
//

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    /// Shortens the array to at most `len` elements, dropping the others.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        //  Safety:
        //  -   `[len, self.len)` is initialized.
        let tail = unsafe { ptr::slice_from_raw_parts_mut(self.slots.slot(len), self.len - len) };

        //  Shrink first, so that a panicking drop cannot lead to a double drop.
        self.len = len;

        //  Safety:
        //  -   `tail` is initialized, and no longer part of the array.
        unsafe { tail.drop_in_place() };
    }

    /// Removes all elements, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the array to `len` elements, filling new slots with the values returned by `f`.
    ///
    /// If `len` is less than the current length, the array is truncated. If `len` fits within the current capacity,
    /// new elements are constructed in place. Otherwise, the array is reallocated to exactly `len`.
    ///
    /// On error, or if `f` panics, `self` is left unchanged.
    pub fn resize_with<F>(&mut self, len: usize, mut f: F) -> Result<(), SequenceError>
    where
        F: FnMut() -> T,
    {
        if len <= self.len {
            self.truncate(len);
            return Ok(());
        }

        growth::check_capacity(len, self.max_size())?;

        if len <= self.capacity() {
            let mut tail = PartialTail::new(self.slots, self.len);

            while tail.end < len {
                tail.push(f());
            }

            tail.commit();

            self.len = len;

            return Ok(());
        }

        let (slots, new_len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), len)?;

            staging.seek(self.len);

            for _ in self.len..len {
                staging.append_with(&mut f);
            }

            //  Safety:
            //  -   `[0, len)` is initialized, and will be considered moved-out by `install`.
            unsafe { staging.relocate_front(self.slots.as_ptr(), self.len) };

            staging.adopt()
        };

        //  Safety:
        //  -   All elements were relocated to `slots`.
        unsafe { self.install(slots, new_len) };

        Ok(())
    }

    /// Resizes the array to `len` elements, filling new slots with clones of `value`.
    ///
    /// See `resize_with`.
    pub fn resize(&mut self, len: usize, value: T) -> Result<(), SequenceError>
    where
        T: Clone,
    {
        self.resize_with(len, || value.clone())
    }

    /// Resizes the array to `len` elements, filling new slots with default values.
    ///
    /// See `resize_with`.
    pub fn resize_default(&mut self, len: usize) -> Result<(), SequenceError>
    where
        T: Default,
    {
        self.resize_with(len, T::default)
    }

    /// Inserts `count` clones of `value` at `index`.
    ///
    /// If the array must grow, the new contents are built in a fresh allocation, and on error, or if a clone panics,
    /// `self` is left unchanged.
    ///
    /// Otherwise, elements are shifted in place; if a clone panics, the array is left valid, with at least its
    /// original elements, but its exact contents are unspecified.
    pub fn insert_n(&mut self, index: usize, count: usize, value: &T) -> Result<(), SequenceError>
    where
        T: Clone,
    {
        self.insert_window(index, count, |_, _| value.clone())
    }

    /// Inserts clones of `values` at `index`.
    ///
    /// See `insert_n` for the guarantees.
    pub fn insert_slice(&mut self, index: usize, values: &[T]) -> Result<(), SequenceError>
    where
        T: Clone,
    {
        self.insert_window(index, values.len(), |i, _| values[i].clone())
    }

    /// Inserts clones of the elements in `range` of `self` at `index`.
    ///
    /// Returns `BoundsError` if either `index` or `range` is out of bounds.
    ///
    /// See `insert_n` for the guarantees.
    pub fn insert_from_within<R>(&mut self, index: usize, range: R) -> Result<(), SequenceError>
    where
        R: RangeBounds<usize>,
        T: Clone,
    {
        let range = SequenceError::check_range(range, self.len)?;

        //  Safety:
        //  -   `range` is within the original elements, as just checked.
        self.insert_window(index, range.len(), |i, original| unsafe { original.get(range.start + i).clone() })
    }

    /// Inserts the elements of `values` at `index`.
    ///
    /// As the number of elements cannot be known ahead of time, they are first appended, then rotated into place.
    ///
    /// On error, the appended elements are dropped, leaving the original elements in place. If the iterator panics,
    /// the elements appended so far remain at the end of the array.
    pub fn insert_iter<I>(&mut self, index: usize, values: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = T>,
    {
        SequenceError::check_position(index, self.len)?;

        let original_len = self.len;

        for value in values {
            if let Err(error) = self.push(value) {
                crate::log_trace!("insert_iter interrupted after {} elements", self.len - original_len);

                self.truncate(original_len);
                return Err(error);
            }
        }

        self.as_mut_slice()[index..].rotate_left(original_len - index);

        Ok(())
    }

    /// Appends clones of `values` at the end of the array.
    ///
    /// On error, or if a clone panics, `self` is left unchanged.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<(), SequenceError>
    where
        T: Clone,
    {
        self.insert_slice(self.len, values)
    }

    /// Appends the elements of `values` at the end of the array.
    ///
    /// See `insert_iter`.
    pub fn try_extend<I>(&mut self, values: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_iter(self.len, values)
    }

    /// Removes the elements in `range`, shifting all elements after it to the left.
    ///
    /// Returns `BoundsError` if `range` is out of bounds. Never reallocates.
    ///
    /// If dropping an element panics, the remaining elements of the range are still dropped, and the gap closed.
    pub fn erase_range<R>(&mut self, range: R) -> Result<(), SequenceError>
    where
        R: RangeBounds<usize>,
    {
        let Range { start, end } = SequenceError::check_range(range, self.len)?;

        if start == end {
            return Ok(());
        }

        let gap = CloseGap {
            base: self.slots.as_ptr(),
            start,
            end,
            tail: self.len - end,
            len: &mut self.len,
        };

        *gap.len = start;

        //  Safety:
        //  -   `[start, end)` is initialized, and no longer part of the array.
        unsafe { ptr::slice_from_raw_parts_mut(gap.base.add(start), end - start).drop_in_place() };

        drop(gap);

        Ok(())
    }
}

//
//  Assignment
//

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    /// Replaces the contents with `count` clones of `value`.
    ///
    /// The existing storage is reused when `count` is within the capacity, assigning over existing elements and
    /// constructing the others in place; if a clone panics then, the array is left valid, but its contents are
    /// unspecified.
    ///
    /// Otherwise, the new contents are built in a fresh allocation of exactly `count`; on error, or if a clone panics,
    /// `self` is left unchanged.
    pub fn assign_n(&mut self, count: usize, value: &T) -> Result<(), SequenceError>
    where
        T: Clone,
    {
        self.assign_cloned(count, |_| value)
    }

    /// Replaces the contents with clones of `values`.
    ///
    /// See `assign_n` for the guarantees.
    pub fn assign_slice(&mut self, values: &[T]) -> Result<(), SequenceError>
    where
        T: Clone,
    {
        self.assign_cloned(values.len(), |i| &values[i])
    }

    /// Replaces the contents with the elements of `values`.
    ///
    /// Existing elements are assigned over, and further elements appended. On error, the array is left valid, but
    /// its contents are unspecified.
    pub fn assign_iter<I>(&mut self, values: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut values = values.into_iter();

        for index in 0..self.len {
            let Some(value) = values.next() else {
                self.truncate(index);
                return Ok(());
            };

            //  Safety:
            //  -   `index` is in bounds, as `index < self.len`.
            unsafe { *self.get_unchecked_mut(index) = value };
        }

        for value in values {
            self.push(value)?;
        }

        Ok(())
    }

    /// Replaces the contents with clones of the contents of `other`, as per copy-assignment.
    ///
    /// If `other`'s handle propagates on copy:
    ///
    /// -   And is not equivalent to `self`'s, the new contents are built with a clone of `other`'s handle before
    ///     `self`'s are released; on error, or if a clone panics, `self` is left unchanged.
    /// -   And is equivalent to `self`'s, `self` reuses its storage as per `assign_slice`, then adopts it.
    ///
    /// Otherwise, as per `assign_slice`.
    pub fn assign_from(&mut self, other: &Self) -> Result<(), SequenceError>
    where
        T: Clone,
        A: Clone,
    {
        let propagate = other.handle.propagates_on_copy();

        if propagate && !self.handle.is_equivalent(&other.handle) {
            *self = other.try_clone()?;
            return Ok(());
        }

        self.assign_slice(other.as_slice())?;

        if propagate {
            self.handle = other.handle.clone();
        }

        Ok(())
    }

    /// Moves the contents of `other` into `self`, as per move-assignment, leaving `other` empty.
    ///
    /// If the handles are equivalent, the storage is transferred without reallocation. Otherwise, the elements are
    /// moved one by one into a fresh allocation from `self`'s handle; on error, both `self` and `other` are left
    /// unchanged.
    pub fn move_from(&mut self, other: &mut Self) -> Result<(), SequenceError> {
        if self.handle.is_equivalent(&other.handle) {
            let slots = mem::replace(&mut other.slots, RawSlots::dangling());
            let len = mem::replace(&mut other.len, 0);

            self.replace(slots, len);

            return Ok(());
        }

        let (slots, len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), other.len)?;

            //  Safety:
            //  -   `[0, other.len)` is initialized, and considered moved-out right after.
            unsafe { staging.relocate_back(other.slots.as_ptr(), other.len) };

            other.len = 0;

            staging.adopt()
        };

        self.replace(slots, len);

        Ok(())
    }
}

//
//  Sequence (trait)
//

impl<T, A> Sequence for DynamicArray<T, A>
where
    A: Allocator,
{
    type Item = T;

    type Ref<'a>
        = &'a T
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

    fn get(&self, index: usize) -> Result<&T, SequenceError> {
        self.get(index)
    }

    fn reserve(&mut self, capacity: usize) -> Result<(), SequenceError> {
        self.reserve(capacity)
    }

    fn shrink_to_fit(&mut self) -> Result<(), SequenceError> {
        self.shrink_to_fit()
    }

    fn push(&mut self, value: T) -> Result<(), SequenceError> {
        self.push(value)
    }

    fn pop(&mut self) -> Option<T> {
        self.pop()
    }

    fn truncate(&mut self, len: usize) {
        self.truncate(len);
    }
}

//
//  Iteration
//

/// An owning iterator over the elements of a `DynamicArray`.
pub struct IntoIter<T, A: Allocator = Global> {
    //  Safety Invariants:
    //  -   Initialized: the slots in `[front, back)` are initialized, all others are not.
    slots: RawSlots<T>,
    front: usize,
    back: usize,
    handle: AllocatorHandle<A>,
}

impl<T, A> IntoIter<T, A>
where
    A: Allocator,
{
    /// Returns the remaining elements, as a slice.
    pub fn as_slice(&self) -> &[T] {
        //  Safety:
        //  -   `[front, back)` is initialized, as per the Initialized invariant.
        unsafe { slice::from_raw_parts(self.slots.slot(self.front), self.back - self.front) }
    }
}

impl<T, A> Iterator for IntoIter<T, A>
where
    A: Allocator,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        //  Safety:
        //  -   The slot at `front` is initialized, and considered uninitialized right after.
        let value = unsafe { self.slots.slot(self.front).read() };

        self.front += 1;

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;

        (len, Some(len))
    }
}

impl<T, A> DoubleEndedIterator for IntoIter<T, A>
where
    A: Allocator,
{
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        self.back -= 1;

        //  Safety:
        //  -   The slot at `back` was initialized, and is now considered uninitialized.
        Some(unsafe { self.slots.slot(self.back).read() })
    }
}

impl<T, A> ExactSizeIterator for IntoIter<T, A> where A: Allocator {}

impl<T, A> FusedIterator for IntoIter<T, A> where A: Allocator {}

impl<T, A> Drop for IntoIter<T, A>
where
    A: Allocator,
{
    fn drop(&mut self) {
        //  Safety:
        //  -   Liveness & Selfness: as per the Self-Allocated invariant of the array it was created from.
        let _release = unsafe { Release::new(self.slots, self.handle.allocator()) };

        //  Safety:
        //  -   `[front, back)` is initialized, as per the Initialized invariant.
        unsafe {
            ptr::slice_from_raw_parts_mut(self.slots.slot(self.front), self.back - self.front).drop_in_place();
        }
    }
}

impl<T, A> fmt::Debug for IntoIter<T, A>
where
    T: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, A> IntoIterator for DynamicArray<T, A>
where
    A: Allocator,
{
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let this = ManuallyDrop::new(self);

        //  Safety:
        //  -   `this.handle` is never used, nor dropped, again.
        let handle = unsafe { ptr::read(&this.handle) };

        IntoIter {
            slots: this.slots,
            front: 0,
            back: this.len,
            handle,
        }
    }
}

impl<'a, T, A> IntoIterator for &'a DynamicArray<T, A>
where
    A: Allocator,
{
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.as_slice().iter()
    }
}

impl<'a, T, A> IntoIterator for &'a mut DynamicArray<T, A>
where
    A: Allocator,
{
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.as_mut_slice().iter_mut()
    }
}

//
//  Common traits
//

impl<T, A> Clone for DynamicArray<T, A>
where
    T: Clone,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        self.try_clone().expect("successful clone")
    }
}

impl<T, A> Deref for DynamicArray<T, A>
where
    A: Allocator,
{
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A> DerefMut for DynamicArray<T, A>
where
    A: Allocator,
{
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A> Drop for DynamicArray<T, A>
where
    A: Allocator,
{
    fn drop(&mut self) {
        //  Safety:
        //  -   Liveness & Selfness: as per the Self-Allocated invariant.
        let _release = unsafe { Release::new(self.slots, self.handle.allocator()) };

        //  Safety:
        //  -   `[0, len)` is initialized, as per the Initialized invariant.
        unsafe { ptr::slice_from_raw_parts_mut(self.slots.as_ptr(), self.len).drop_in_place() };
    }
}

impl<T, A> fmt::Debug for DynamicArray<T, A>
where
    T: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T, A> Eq for DynamicArray<T, A>
where
    T: Eq,
    A: Allocator,
{
}

impl<T, A> Hash for DynamicArray<T, A>
where
    T: Hash,
    A: Allocator,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.as_slice().hash(state);
    }
}

impl<T, A> Ord for DynamicArray<T, A>
where
    T: Ord,
    A: Allocator,
{
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T, A, B> PartialEq<DynamicArray<T, B>> for DynamicArray<T, A>
where
    T: PartialEq,
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &DynamicArray<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, A> PartialOrd for DynamicArray<T, A>
where
    T: PartialOrd,
    A: Allocator,
{
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

//  Safety:
//  -   Just like a `Vec<T, A>`.
unsafe impl<T, A> Send for DynamicArray<T, A>
where
    T: Send,
    A: Allocator + Send,
{
}

unsafe impl<T, A> Sync for DynamicArray<T, A>
where
    T: Sync,
    A: Allocator + Sync,
{
}

unsafe impl<T, A> Send for IntoIter<T, A>
where
    T: Send,
    A: Allocator + Send,
{
}

unsafe impl<T, A> Sync for IntoIter<T, A>
where
    T: Sync,
    A: Allocator + Sync,
{
}

//
//  Utilities implementation.
//

impl<T, A> DynamicArray<T, A>
where
    A: Allocator,
{
    //  Returns `self.len + additional`, or `CapacityExceeded` on overflow.
    fn required(&self, additional: usize) -> Result<usize, SequenceError> {
        self.len.checked_add(additional).ok_or(SequenceError::CapacityExceeded)
    }

    //  Moves all elements to a fresh allocation of exactly `capacity` slots.
    fn reallocate(&mut self, capacity: usize) -> Result<(), SequenceError> {
        debug_assert!(capacity >= self.len);

        crate::log_debug!("reallocating from {} to {capacity} slots", self.capacity());

        let (slots, len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), capacity)?;

            //  Safety:
            //  -   `[0, len)` is initialized, and will be considered moved-out by `install`.
            unsafe { staging.relocate_back(self.slots.as_ptr(), self.len) };

            staging.adopt()
        };

        //  Safety:
        //  -   All elements were relocated to `slots`.
        unsafe { self.install(slots, len) };

        Ok(())
    }

    //  Replaces the storage with `slots`, holding `len` elements, releasing the previous storage.
    //
    //  #   Safety
    //
    //  -   Relocated: all elements of the previous storage must have been relocated, and must not be dropped.
    //  -   Allocated: `slots` must satisfy the Self-Allocated invariant, and hold `len` initialized elements.
    unsafe fn install(&mut self, slots: RawSlots<T>, len: usize) {
        let previous = mem::replace(&mut self.slots, slots);

        self.len = len;

        //  Safety:
        //  -   Liveness & Selfness: as per the Self-Allocated invariant.
        unsafe { previous.deallocate(self.handle.allocator()) };
    }

    //  Replaces the storage with `slots`, holding `len` elements, dropping the previous elements and releasing the
    //  previous storage.
    //
    //  `slots` must satisfy the Self-Allocated invariant, and hold `len` initialized elements.
    fn replace(&mut self, slots: RawSlots<T>, len: usize) {
        let previous = mem::replace(&mut self.slots, slots);
        let previous_len = mem::replace(&mut self.len, len);

        //  Safety:
        //  -   Liveness & Selfness: as per the Self-Allocated invariant.
        let _release = unsafe { Release::new(previous, self.handle.allocator()) };

        //  Safety:
        //  -   `[0, previous_len)` of `previous` is initialized, and no longer part of the array.
        unsafe { ptr::slice_from_raw_parts_mut(previous.as_ptr(), previous_len).drop_in_place() };
    }

    #[inline(never)]
    fn push_with_slow<F>(&mut self, f: F) -> Result<(), SequenceError>
    where
        F: FnOnce() -> T,
    {
        let required = self.required(1)?;
        let capacity = growth::grow(self.capacity(), required, self.max_size())?;

        crate::log_debug!("growing from {} to {capacity} slots to push", self.capacity());

        let (slots, len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), capacity)?;

            staging.seek(self.len);
            staging.append_with(f);

            //  Safety:
            //  -   `[0, len)` is initialized, and will be considered moved-out by `install`.
            unsafe { staging.relocate_front(self.slots.as_ptr(), self.len) };

            staging.adopt()
        };

        //  Safety:
        //  -   All elements were relocated to `slots`.
        unsafe { self.install(slots, len) };

        Ok(())
    }

    #[inline(never)]
    fn insert_with_slow<F>(&mut self, index: usize, f: F) -> Result<(), SequenceError>
    where
        F: FnOnce() -> T,
    {
        self.insert_grown(index, 1, |staging, _| staging.append_with(f))
    }

    //  Inserts `count` elements at `index`, the `i`-th of which is produced by `fill(i, original)`.
    //
    //  `original` provides access to the original elements, wherever they currently are.
    fn insert_window<F>(&mut self, index: usize, count: usize, mut fill: F) -> Result<(), SequenceError>
    where
        F: FnMut(usize, Original<T>) -> T,
    {
        SequenceError::check_position(index, self.len)?;

        if count == 0 {
            return Ok(());
        }

        let required = self.required(count)?;

        growth::check_capacity(required, self.max_size())?;

        if required > self.capacity() {
            return self.insert_grown(index, count, |staging, original| {
                for i in 0..count {
                    staging.append_with(|| fill(i, original));
                }
            });
        }

        let base = self.slots.as_ptr();
        let tail = self.len - index;

        let mut gap = OpenGap {
            base,
            index,
            count,
            filled: 0,
            tail,
            len: &mut self.len,
        };

        //  Safety:
        //  -   `[index, len)` is initialized, and `[index + count, len + count)` is in bounds.
        //  -   The window `[index, index + count)` is considered uninitialized after the copy, as tracked by `gap`.
        unsafe { ptr::copy(base.add(index), base.add(index + count), tail) };

        *gap.len = index;

        let original = Original {
            base,
            index,
            shift: count,
            _marker: PhantomData,
        };

        while gap.filled < count {
            let value = fill(gap.filled, original);

            //  Safety:
            //  -   The slot is within the window, and not yet filled.
            unsafe { base.add(index + gap.filled).write(value) };

            gap.filled += 1;
        }

        Ok(())
    }

    //  Inserts `count` elements at `index` in a fresh allocation, sized as per the growth policy.
    //
    //  `construct` must construct exactly `count` elements in the staging buffer.
    fn insert_grown<F>(&mut self, index: usize, count: usize, construct: F) -> Result<(), SequenceError>
    where
        F: FnOnce(&mut StagingBuffer<'_, T, A>, Original<T>),
    {
        let required = self.required(count)?;
        let capacity = growth::grow(self.capacity(), required, self.max_size())?;

        crate::log_debug!("growing from {} to {capacity} slots to insert {count}", self.capacity());

        let base = self.slots.as_ptr();

        let original = Original {
            base,
            index,
            shift: 0,
            _marker: PhantomData,
        };

        let (slots, len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), capacity)?;

            staging.seek(index);

            construct(&mut staging, original);

            //  Safety:
            //  -   `[0, len)` is initialized, and will be considered moved-out by `install`.
            unsafe {
                staging.relocate_front(base, index);
                staging.relocate_back(base.add(index), self.len - index);
            }

            staging.adopt()
        };

        debug_assert_eq!(required, len);

        //  Safety:
        //  -   All elements were relocated to `slots`.
        unsafe { self.install(slots, len) };

        Ok(())
    }

    //  Replaces the contents with `count` elements, the `i`-th being a clone of `source(i)`.
    fn assign_cloned<'v, F>(&mut self, count: usize, mut source: F) -> Result<(), SequenceError>
    where
        F: FnMut(usize) -> &'v T,
        T: Clone + 'v,
    {
        if count <= self.len {
            for (index, slot) in self.as_mut_slice()[..count].iter_mut().enumerate() {
                slot.clone_from(source(index));
            }

            self.truncate(count);

            return Ok(());
        }

        growth::check_capacity(count, self.max_size())?;

        if count <= self.capacity() {
            for (index, slot) in self.as_mut_slice().iter_mut().enumerate() {
                slot.clone_from(source(index));
            }

            //  Elements constructed in place are kept even if a later clone panics.
            while self.len < count {
                let value = source(self.len).clone();

                //  Safety:
                //  -   `self.len` is in bounds, and not initialized, as per the Initialized invariant.
                unsafe { self.slots.slot(self.len).write(value) };

                self.len += 1;
            }

            return Ok(());
        }

        let (slots, len) = {
            let mut staging = StagingBuffer::new(self.handle.allocator(), count)?;

            for index in 0..count {
                staging.append_construct(source(index).clone());
            }

            staging.adopt()
        };

        self.replace(slots, len);

        Ok(())
    }
}

//  Access to the original elements of an array, while a window is being opened.
//
//  Elements before `index` are in place, elements at or after `index` have been shifted by `shift`.
struct Original<T> {
    base: *const T,
    index: usize,
    shift: usize,
    _marker: PhantomData<*const T>,
}

impl<T> Original<T> {
    //  Returns the original element at `index`.
    //
    //  #   Safety
    //
    //  -   `index` must be the index of an original element.
    //  -   The returned reference must not outlive the insertion.
    unsafe fn get<'a>(self, index: usize) -> &'a T {
        let offset = if index < self.index { index } else { index + self.shift };

        //  Safety:
        //  -   `offset` is the current position of an initialized element, as per pre-condition.
        unsafe { &*self.base.add(offset) }
    }
}

impl<T> Clone for Original<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Original<T> {}

//  Slots being constructed in place, beyond the current length.
//
//  If dropped without being committed, drops the constructed slots.
struct PartialTail<T> {
    slots: RawSlots<T>,
    start: usize,
    end: usize,
}

impl<T> PartialTail<T> {
    fn new(slots: RawSlots<T>, start: usize) -> Self {
        Self {
            slots,
            start,
            end: start,
        }
    }

    fn push(&mut self, value: T) {
        debug_assert!(self.end < self.slots.capacity());

        //  Safety:
        //  -   `self.end` is in bounds, and not initialized.
        unsafe { self.slots.slot(self.end).write(value) };

        self.end += 1;
    }

    fn commit(self) {
        mem::forget(self);
    }
}

impl<T> Drop for PartialTail<T> {
    fn drop(&mut self) {
        //  Safety:
        //  -   `[start, end)` was constructed by `push`, and never committed.
        unsafe {
            ptr::slice_from_raw_parts_mut(self.slots.slot(self.start), self.end - self.start).drop_in_place();
        }
    }
}

//  A window `[index, index + count)` opened in the array, followed by `tail` shifted elements.
//
//  On drop, closes the unfilled part of the window, and restores the length.
struct OpenGap<'a, T> {
    base: *mut T,
    index: usize,
    count: usize,
    filled: usize,
    tail: usize,
    len: &'a mut usize,
}

impl<T> Drop for OpenGap<'_, T> {
    fn drop(&mut self) {
        let end = self.index + self.filled;

        if self.filled != self.count {
            //  Safety:
            //  -   The tail is initialized at `index + count`, and `[end, end + tail)` is in bounds.
            unsafe { ptr::copy(self.base.add(self.index + self.count), self.base.add(end), self.tail) };
        }

        *self.len = end + self.tail;
    }
}

//  A range `[start, end)` of dropped elements, followed by `tail` elements.
//
//  On drop, shifts the tail over the range, and restores the length.
struct CloseGap<'a, T> {
    base: *mut T,
    start: usize,
    end: usize,
    tail: usize,
    len: &'a mut usize,
}

impl<T> Drop for CloseGap<'_, T> {
    fn drop(&mut self) {
        //  Safety:
        //  -   The tail is initialized at `end`, and `[start, start + tail)` is in bounds.
        unsafe { ptr::copy(self.base.add(self.end), self.base.add(self.start), self.tail) };

        *self.len = self.start + self.tail;
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use core::{cmp, fmt, marker::PhantomData};

    use serde::{
        Deserialize, Deserializer, Serialize, Serializer,
        de::{self, SeqAccess, Visitor},
    };

    use super::*;

    impl<T, A> Serialize for DynamicArray<T, A>
    where
        T: Serialize,
        A: Allocator,
    {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_seq(self.as_slice())
        }
    }

    impl<'de, T, A> Deserialize<'de> for DynamicArray<T, A>
    where
        T: Deserialize<'de>,
        A: Allocator + Default,
    {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            Self::deserialize_in(deserializer, AllocatorHandle::default())
        }
    }

    impl<T, A> DynamicArray<T, A>
    where
        A: Allocator,
    {
        /// Deserializes an array, whose storage is provided by `handle`.
        ///
        /// Failures to allocate, or to honor the maximum size of `handle`, are reported as custom errors.
        pub fn deserialize_in<'de, D>(deserializer: D, handle: AllocatorHandle<A>) -> Result<Self, D::Error>
        where
            T: Deserialize<'de>,
            D: Deserializer<'de>,
        {
            deserializer.deserialize_seq(ArrayVisitor {
                handle,
                _marker: PhantomData,
            })
        }
    }

    struct ArrayVisitor<T, A> {
        handle: AllocatorHandle<A>,
        _marker: PhantomData<fn() -> T>,
    }

    impl<'de, T, A> Visitor<'de> for ArrayVisitor<T, A>
    where
        T: Deserialize<'de>,
        A: Allocator,
    {
        type Value = DynamicArray<T, A>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
            f.write_str("a sequence")
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut array = DynamicArray::new_in(self.handle);

            //  Do not trust the hint blindly.
            if let Some(hint) = seq.size_hint() {
                let hint = cmp::min(hint, cmp::min(MAX_PREALLOCATION, array.max_size()));

                array.reserve(hint).map_err(de::Error::custom)?;
            }

            while let Some(value) = seq.next_element()? {
                array.push(value).map_err(de::Error::custom)?;
            }

            Ok(array)
        }
    }

    const MAX_PREALLOCATION: usize = 4096;

// mod tests
} // mod serde_impl
