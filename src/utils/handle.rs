//  See `AllocatorHandle`.
//
//  #   Why a capability object?
//
//  Whether two allocators may free each other's memory, and whether copy-assignment should carry the allocator over, are
//  properties of the allocator _instances_ in use, not of their types. Bundling them with the allocator keeps the
//  decision explicit at the call site, rather than hidden behind trait dispatch.

use core::{cmp, fmt, mem};

use crate::utils::alloc::Global;

/// An allocator, along with the policies governing its use by a sequence.
#[derive(Clone, Copy)]
pub struct AllocatorHandle<A = Global> {
    allocator: A,
    max_bytes: usize,
    propagate_on_copy: bool,
    equivalent: fn(&A, &A) -> bool,
}

//
//  Creation
//

impl AllocatorHandle<Global> {
    /// Returns a handle over the global allocator.
    pub const fn global() -> Self {
        Self::new(Global)
    }
}

impl<A> AllocatorHandle<A> {
    /// Returns a handle over `allocator`.
    ///
    /// By default:
    ///
    /// -   The maximum size of an allocation is `isize::MAX` bytes.
    /// -   The allocator is not propagated on copy-assignment.
    /// -   Any two handles are considered equivalent.
    pub const fn new(allocator: A) -> Self {
        Self {
            allocator,
            max_bytes: isize::MAX as usize,
            propagate_on_copy: false,
            equivalent: always_equivalent::<A>,
        }
    }

    /// Caps the maximum size of any single allocation, in bytes.
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = if max_bytes > isize::MAX as usize {
            isize::MAX as usize
        } else {
            max_bytes
        };
        self
    }

    /// Sets whether copy-assignment propagates the allocator of the source to the destination.
    pub const fn with_propagate_on_copy(mut self, propagate: bool) -> Self {
        self.propagate_on_copy = propagate;
        self
    }

    /// Sets the predicate deciding whether memory allocated by one allocator may be deallocated by the other.
    pub const fn with_equivalence(mut self, equivalent: fn(&A, &A) -> bool) -> Self {
        self.equivalent = equivalent;
        self
    }
}

impl<A> Default for AllocatorHandle<A>
where
    A: Default,
{
    fn default() -> Self {
        Self::new(A::default())
    }
}

//
//  Queries
//

impl<A> AllocatorHandle<A> {
    /// Returns a reference to the underlying allocator.
    #[inline]
    pub const fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Returns the maximum size of any single allocation, in bytes.
    #[inline]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Returns the maximum number of elements of type `T` which a single allocation may hold.
    ///
    /// Zero-sized types never require allocation, and are thus only limited by `usize::MAX`.
    #[inline]
    pub const fn max_size<T>(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            size => self.max_bytes / size,
        }
    }

    /// Returns whether copy-assignment propagates this allocator.
    #[inline]
    pub const fn propagates_on_copy(&self) -> bool {
        self.propagate_on_copy
    }

    /// Returns whether memory allocated through `self` may be deallocated through `other`, and vice-versa.
    #[inline]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        (self.equivalent)(&self.allocator, &other.allocator)
    }
}

impl<A> fmt::Debug for AllocatorHandle<A>
where
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("AllocatorHandle")
            .field("allocator", &self.allocator)
            .field("max_bytes", &self.max_bytes)
            .field("propagate_on_copy", &self.propagate_on_copy)
            .finish_non_exhaustive()
    }
}

/// Equivalence predicate considering any two allocators equivalent.
///
/// Suitable for stateless allocators, such as `Global`.
pub fn always_equivalent<A>(_: &A, _: &A) -> bool {
    true
}

/// Equivalence predicate considering two allocators equivalent only if they compare equal.
pub fn equal_equivalent<A>(left: &A, right: &A) -> bool
where
    A: cmp::PartialEq,
{
    left == right
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let handle = AllocatorHandle::global();

        assert_eq!(isize::MAX as usize, handle.max_bytes());
        assert!(!handle.propagates_on_copy());
        assert!(handle.is_equivalent(&AllocatorHandle::global()));
    }

    #[test]
    fn max_size() {
        let handle = AllocatorHandle::global().with_max_bytes(40);

        assert_eq!(40, handle.max_size::<u8>());
        assert_eq!(10, handle.max_size::<u32>());
        assert_eq!(5, handle.max_size::<u64>());
        assert_eq!(usize::MAX, handle.max_size::<()>());
    }

    #[test]
    fn max_bytes_clamped() {
        let handle = AllocatorHandle::global().with_max_bytes(usize::MAX);

        assert_eq!(isize::MAX as usize, handle.max_bytes());
    }

    #[test]
    fn equivalence() {
        let one = AllocatorHandle::new(1u8).with_equivalence(equal_equivalent);
        let other = AllocatorHandle::new(2u8).with_equivalence(equal_equivalent);

        assert!(one.is_equivalent(&one));
        assert!(!one.is_equivalent(&other));
    }
}
