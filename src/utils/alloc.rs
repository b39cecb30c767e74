//! Shim for unstable allocator API.
//!
//! -   If `allocator_api` is not enabled, then duplicates the subset of the allocator API used by this crate.
//! -   If `allocator_api` is enabled, then forwards the allocator API.

#[cfg(feature = "allocator_api")]
pub use alloc::alloc::{AllocError, Allocator, Global};

#[cfg(not(feature = "allocator_api"))]
pub use shim::{AllocError, Allocator, Global};

#[cfg(not(feature = "allocator_api"))]
pub(super) mod shim {
    use core::{alloc::Layout, error, fmt, ptr::NonNull};

    use alloc::alloc;

    /// The AllocError error indicates an allocation failure that may be due to resource exhaustion or to something
    /// wrong when combining the given input arguments with this allocator.
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct AllocError;

    impl fmt::Display for AllocError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
            f.write_str("memory allocation failed")
        }
    }

    impl error::Error for AllocError {}

    /// An implementation of Allocator can allocate and deallocate arbitrary blocks of data described via Layout.
    ///
    /// #   Safety
    ///
    /// -   Liveness: memory blocks that are currently allocated by an allocator must point to valid memory until either
    ///     they are deallocated or the `Allocator` and all its clones are dropped.
    /// -   Independence: moving an allocator must not invalidate memory blocks returned from it.
    /// -   Shallowness: a copied or cloned allocator must behave like the original allocator.
    pub unsafe trait Allocator {
        /// Attempts to allocate a block of memory.
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

        /// Deallocates the memory referenced by ptr.
        ///
        /// #   Safety
        ///
        /// -   Liveness: `ptr` must still be allocated.
        /// -   Selfness: `ptr` must have been allocated by `self`.
        /// -   Layout: `layout` must match the layout passed to `self.allocate(...)` when allocating `ptr`.
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

        /// Creates a “by reference” adapter for this instance of Allocator.
        fn by_ref(&self) -> &Self
        where
            Self: Sized,
        {
            self
        }
    }

    //  Safety:
    //  -   Liveness, Independence, Shallowness: forwarded to `A`.
    unsafe impl<A> Allocator for &A
    where
        A: Allocator + ?Sized,
    {
        #[inline]
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            (**self).allocate(layout)
        }

        #[inline]
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            //  Safety:
            //  -   Forwarded pre-conditions.
            unsafe { (**self).deallocate(ptr, layout) }
        }
    }

    /// The global memory allocator.
    #[derive(Copy, Clone, Default, Debug)]
    pub struct Global;

    //  Safety:
    //  -   Liveness, Independence, Shallowness: guaranteed by implementation.
    unsafe impl Allocator for Global {
        #[inline]
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            if layout.size() == 0 {
                return Ok(NonNull::slice_from_raw_parts(NonNull::dangling(), 0));
            }

            //  Safety:
            //  -   `layout` has a non-zero size.
            let raw_ptr = unsafe { alloc::alloc(layout) };

            let ptr = NonNull::new(raw_ptr).ok_or(AllocError)?;

            Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
        }

        #[inline]
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            if layout.size() == 0 {
                return;
            }

            //  Safety:
            //  -   `ptr.as_ptr()` is currently allocated, as per Liveness pre-condition.
            //  -   `ptr.as_ptr()` was allocated by `self`, as per Selfness pre-condition.
            //  -   `layout` matches the layout of `ptr.as_ptr()` as per Layout pre-condition.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
        }
    }
} // mod shim
