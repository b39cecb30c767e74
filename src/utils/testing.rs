//  Test utilities: an allocator which fails on demand, an element type which panics on demand, and an iterator
//  which overstates its length.

use core::{alloc::Layout, cell::Cell, fmt, ptr::NonNull};
use std::rc::Rc;

use crate::utils::alloc::{AllocError, Allocator, Global};

/// An allocator which fails once its budget of allocations is exhausted.
#[derive(Debug)]
pub(crate) struct TestAllocator {
    id: u32,
    remaining: Cell<usize>,
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    live_bytes: Cell<usize>,
}

impl TestAllocator {
    pub(crate) fn unlimited() -> Self {
        Self::failing_after(usize::MAX)
    }

    pub(crate) fn failing_after(remaining: usize) -> Self {
        Self::with_id(0, remaining)
    }

    pub(crate) fn with_id(id: u32, remaining: usize) -> Self {
        Self {
            id,
            remaining: Cell::new(remaining),
            allocations: Cell::new(0),
            deallocations: Cell::new(0),
            live_bytes: Cell::new(0),
        }
    }

    /// Sets the number of allocations which will succeed, from now on.
    pub(crate) fn set_remaining(&self, remaining: usize) {
        self.remaining.set(remaining);
    }

    /// Returns the number of successful allocations.
    pub(crate) fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub(crate) fn deallocations(&self) -> usize {
        self.deallocations.get()
    }

    /// Returns the number of bytes currently allocated.
    pub(crate) fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }
}

impl PartialEq for TestAllocator {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

//  Safety:
//  -   Liveness, Independence, Shallowness: forwarded to `Global`.
unsafe impl Allocator for TestAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let remaining = self.remaining.get();

        if remaining == 0 {
            return Err(AllocError);
        }

        let ptr = Global.allocate(layout)?;

        if remaining != usize::MAX {
            self.remaining.set(remaining - 1);
        }

        self.allocations.set(self.allocations.get() + 1);
        self.live_bytes.set(self.live_bytes.get() + layout.size());

        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.deallocations.set(self.deallocations.get() + 1);
        self.live_bytes.set(self.live_bytes.get() - layout.size());

        //  Safety:
        //  -   Forwarded pre-conditions, as all allocations are forwarded to `Global`.
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// Shared state of a family of `Faulty` values.
#[derive(Clone, Default)]
pub(crate) struct Tracker(Rc<TrackerState>);

#[derive(Default)]
struct TrackerState {
    live: Cell<usize>,
    //  Number of clones remaining before clones start failing, if any.
    budget: Cell<Option<usize>>,
}

impl Tracker {
    /// Returns the number of live `Faulty` values.
    pub(crate) fn live(&self) -> usize {
        self.0.live.get()
    }

    /// Lets `n` more clones succeed, after which any clone panics.
    pub(crate) fn fail_after(&self, n: usize) {
        self.0.budget.set(Some(n));
    }

    /// Lets all clones succeed, unless the cloned value is itself failing.
    pub(crate) fn heal(&self) {
        self.0.budget.set(None);
    }

    fn spend(&self) -> bool {
        match self.0.budget.get() {
            None => true,
            Some(0) => false,
            Some(n) => {
                self.0.budget.set(Some(n - 1));
                true
            }
        }
    }

    fn born(&self) {
        self.0.live.set(self.0.live.get() + 1);
    }

    fn died(&self) {
        self.0.live.set(self.0.live.get() - 1);
    }
}

/// An element type whose clone may panic, and which tracks the number of live instances.
pub(crate) struct Faulty {
    value: u32,
    failing: bool,
    tracker: Tracker,
}

impl Faulty {
    pub(crate) fn tracker() -> Tracker {
        Tracker::default()
    }

    pub(crate) fn new(value: u32, tracker: &Tracker) -> Self {
        tracker.born();

        Self {
            value,
            failing: false,
            tracker: tracker.clone(),
        }
    }

    /// Creates a value whose clone always panics.
    pub(crate) fn failing(value: u32, tracker: &Tracker) -> Self {
        let mut result = Self::new(value, tracker);
        result.failing = true;
        result
    }

    pub(crate) fn value(&self) -> u32 {
        self.value
    }
}

impl Clone for Faulty {
    fn clone(&self) -> Self {
        if self.failing || !self.tracker.spend() {
            panic!("Faulty::clone({})", self.value);
        }

        Self::new(self.value, &self.tracker)
    }
}

impl Drop for Faulty {
    fn drop(&mut self) {
        self.tracker.died();
    }
}

impl fmt::Debug for Faulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Faulty({})", self.value)
    }
}

impl PartialEq for Faulty {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Returns the values of `faulties`.
pub(crate) fn values(faulties: &[Faulty]) -> Vec<u32> {
    faulties.iter().map(Faulty::value).collect()
}

/// An iterator claiming to yield far more items than it does.
#[cfg(feature = "serde")]
pub(crate) struct Boasting<I>(pub(crate) I);

#[cfg(feature = "serde")]
impl<I> Iterator for Boasting<I>
where
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, Some(usize::MAX))
    }
}
