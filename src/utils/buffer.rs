//  Raw storage, and the staging buffer used to build replacement storage.
//
//  #   Why a separate staging buffer?
//
//  Any growing operation must be able to fail -- allocation failure, or a panic from the element type -- without
//  disturbing the existing sequence. Building the new contents in a buffer which owns its partial construction, and
//  which is only adopted once complete, gives the strong guarantee without any bookkeeping in the sequence itself.
//
//  #   Ordering of operations
//
//  Every user of `StagingBuffer` performs all its fallible constructions _before_ any relocation. Relocations are
//  bitwise moves out of the caller's storage: once performed, the caller must not drop the relocated elements, and
//  the buffer must not be dropped either, lest they be dropped twice.

use core::{alloc::Layout, marker::PhantomData, mem, ptr::NonNull};

use crate::utils::{SequenceError, alloc::Allocator};

/// A raw region of `capacity` slots of `T`.
///
/// `RawSlots` does not track which slots are initialized, nor does it own its memory: it is up to its user to drop the
/// elements, and to deallocate the region with the allocator which allocated it.
pub(crate) struct RawSlots<T> {
    //  Safety Invariants:
    //  -   Empty Dangling: if no memory was allocated, `ptr` is dangling.
    //  -   Self-Allocated: otherwise, `ptr` was allocated by `Self::allocate` with `capacity`.
    ptr: NonNull<T>,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T> RawSlots<T> {
    /// Returns an empty region, which owns no memory.
    #[inline]
    pub(crate) const fn dangling() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates a region of exactly `capacity` slots.
    ///
    /// A region occupying zero bytes never calls into the allocator.
    pub(crate) fn allocate<A>(allocator: &A, capacity: usize) -> Result<Self, SequenceError>
    where
        A: Allocator,
    {
        let layout = Self::layout(capacity)?;

        if layout.size() == 0 {
            return Ok(Self {
                capacity,
                ..Self::dangling()
            });
        }

        let ptr = allocator.allocate(layout)?;

        Ok(Self {
            ptr: ptr.cast(),
            capacity,
            _marker: PhantomData,
        })
    }

    /// Deallocates the region.
    ///
    /// #   Safety
    ///
    /// -   Liveness: `self` must still be allocated.
    /// -   Selfness: `self` must have been allocated by `allocator`.
    pub(crate) unsafe fn deallocate<A>(self, allocator: &A)
    where
        A: Allocator,
    {
        let layout = Self::layout(self.capacity);

        #[cfg(debug_assertions)]
        let layout = layout.expect("valid layout");

        //  Safety:
        //  -   Valid since `self` was allocated by `Self::allocate`, which cannot succeed without `Self::layout`, a
        //      pure function, succeeding.
        #[cfg(not(debug_assertions))]
        let layout = unsafe { layout.unwrap_unchecked() };

        if layout.size() == 0 {
            return;
        }

        //  Safety:
        //  -   `self.ptr` is currently allocated, as per Liveness pre-condition.
        //  -   `self.ptr` was allocated by `allocator`, as per Selfness pre-condition.
        //  -   `layout` is the same as used for allocation, as per the Self-Allocated invariant.
        unsafe { allocator.deallocate(self.ptr.cast(), layout) }
    }

    /// Returns the number of slots.
    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a pointer to the first slot.
    #[inline]
    pub(crate) const fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns a pointer to the slot at `index`.
    ///
    /// #   Safety
    ///
    /// -   In-Bounds: `index` must be less than, or equal to, `self.capacity()`.
    #[inline]
    pub(crate) const unsafe fn slot(&self, index: usize) -> *mut T {
        debug_assert!(index <= self.capacity);

        //  Safety:
        //  -   In-bounds of the allocation, or one past the end, as per In-Bounds pre-condition.
        unsafe { self.ptr.as_ptr().add(index) }
    }

    fn layout(capacity: usize) -> Result<Layout, SequenceError> {
        Layout::array::<T>(capacity).map_err(|_| SequenceError::CapacityExceeded)
    }
}

impl<T> Clone for RawSlots<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawSlots<T> {}

/// Deallocates a region when dropped, even if dropping its elements panics.
pub(crate) struct Release<'a, T, A>
where
    A: Allocator,
{
    slots: RawSlots<T>,
    allocator: &'a A,
}

impl<'a, T, A> Release<'a, T, A>
where
    A: Allocator,
{
    /// Creates a guard deallocating `slots` with `allocator`.
    ///
    /// #   Safety
    ///
    /// -   Liveness: `slots` must still be allocated, and not be deallocated by any other means.
    /// -   Selfness: `slots` must have been allocated by `allocator`.
    pub(crate) unsafe fn new(slots: RawSlots<T>, allocator: &'a A) -> Self {
        Self { slots, allocator }
    }
}

impl<T, A> Drop for Release<'_, T, A>
where
    A: Allocator,
{
    fn drop(&mut self) {
        //  Safety:
        //  -   Liveness & Selfness: as per pre-conditions of `Release::new`.
        unsafe { self.slots.deallocate(self.allocator) }
    }
}

/// A freshly allocated region, tracking the contiguous range of slots it has constructed.
///
/// On drop, the constructed range is dropped and the region deallocated.
pub(crate) struct StagingBuffer<'a, T, A>
where
    A: Allocator,
{
    //  Safety Invariants:
    //  -   Constructed: the slots in `[start, end)` are initialized, and no other.
    //  -   Ordered: `start <= end <= slots.capacity()`.
    slots: RawSlots<T>,
    start: usize,
    end: usize,
    allocator: &'a A,
}

impl<'a, T, A> StagingBuffer<'a, T, A>
where
    A: Allocator,
{
    /// Allocates a buffer of exactly `capacity` slots, with an empty constructed range at slot 0.
    pub(crate) fn new(allocator: &'a A, capacity: usize) -> Result<Self, SequenceError> {
        let slots = RawSlots::allocate(allocator, capacity)?;

        Ok(Self {
            slots,
            start: 0,
            end: 0,
            allocator,
        })
    }

    /// Returns the number of slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Moves the, empty, constructed range to `at`.
    #[inline]
    pub(crate) fn seek(&mut self, at: usize) {
        assert_eq!(self.start, self.end, "seek on non-empty range");
        assert!(at <= self.capacity());

        self.start = at;
        self.end = at;
    }

    /// Constructs the value returned by `f` at the end of the constructed range.
    ///
    /// #   Panics
    ///
    /// If there is no slot left at the end of the range, or if `f` panics; in the latter case the buffer is unmodified.
    #[inline]
    pub(crate) fn append_with<F>(&mut self, f: F)
    where
        F: FnOnce() -> T,
    {
        assert!(self.end < self.capacity(), "staging buffer overflow");

        let value = f();

        //  Safety:
        //  -   `self.end` is in bounds, as checked above.
        //  -   The slot is not initialized, as per the Constructed invariant.
        unsafe { self.slots.slot(self.end).write(value) };

        self.end += 1;
    }

    /// Constructs `value` at the end of the constructed range.
    #[inline]
    pub(crate) fn append_construct(&mut self, value: T) {
        self.append_with(|| value);
    }

    /// Constructs a clone of each of `values`, in order, at the end of the constructed range.
    pub(crate) fn extend_cloned(&mut self, values: &[T])
    where
        T: Clone,
    {
        for value in values {
            self.append_with(|| value.clone());
        }
    }

    /// Constructs `count` clones of `value` at the end of the constructed range.
    pub(crate) fn extend_fill(&mut self, count: usize, value: &T)
    where
        T: Clone,
    {
        for _ in 0..count {
            self.append_with(|| value.clone());
        }
    }

    /// Relocates `n` elements from `src` to the `n` slots immediately preceeding the constructed range.
    ///
    /// #   Safety
    ///
    /// -   Readable: `src` must be valid for reads of `n` initialized elements, outside of this buffer.
    /// -   Moved: the caller must consider the elements moved-out of `src`, and never drop them.
    pub(crate) unsafe fn relocate_front(&mut self, src: *const T, n: usize) {
        assert!(n <= self.start, "staging buffer underflow");

        let start = self.start - n;

        //  Safety:
        //  -   `src` is valid for `n` reads, as per Readable pre-condition.
        //  -   The destination is valid for `n` writes, as `[start, self.start)` is in bounds, and uninitialized.
        //  -   `src` and the destination do not overlap, as the buffer is a fresh allocation.
        unsafe { self.slots.slot(start).copy_from_nonoverlapping(src, n) };

        self.start = start;
    }

    /// Relocates `n` elements from `src` to the `n` slots immediately following the constructed range.
    ///
    /// #   Safety
    ///
    /// -   Readable: `src` must be valid for reads of `n` initialized elements, outside of this buffer.
    /// -   Moved: the caller must consider the elements moved-out of `src`, and never drop them.
    pub(crate) unsafe fn relocate_back(&mut self, src: *const T, n: usize) {
        assert!(n <= self.capacity() - self.end, "staging buffer overflow");

        //  Safety:
        //  -   `src` is valid for `n` reads, as per Readable pre-condition.
        //  -   The destination is valid for `n` writes, as `[self.end, self.end + n)` is in bounds, and uninitialized.
        //  -   `src` and the destination do not overlap, as the buffer is a fresh allocation.
        unsafe { self.slots.slot(self.end).copy_from_nonoverlapping(src, n) };

        self.end += n;
    }

    /// Transfers ownership of the region, and of its `len` initialized leading slots, to the caller.
    ///
    /// #   Panics
    ///
    /// If the constructed range does not start at slot 0.
    pub(crate) fn adopt(self) -> (RawSlots<T>, usize) {
        assert_eq!(0, self.start, "adopting a buffer with a hole");

        let result = (self.slots, self.end);

        mem::forget(self);

        result
    }
}

impl<T, A> Drop for StagingBuffer<'_, T, A>
where
    A: Allocator,
{
    fn drop(&mut self) {
        //  Safety:
        //  -   Liveness: the region is still allocated, as the buffer was not adopted.
        //  -   Selfness: the region was allocated by this allocator, as per `StagingBuffer::new`.
        let _release = unsafe { Release::new(self.slots, self.allocator) };

        //  Safety:
        //  -   `[start, end)` is initialized, as per the Constructed invariant.
        unsafe {
            let first = self.slots.slot(self.start);
            core::ptr::slice_from_raw_parts_mut(first, self.end - self.start).drop_in_place();
        }
    }
}
