//! Allocator-aware growable arrays.
//!
//! #   Organization
//!
//! This crate is composed of multiple top modules:
//!
//! -   The `api` top module contains the interface shared by all sequences.
//! -   The `collections` module contains the sequences themselves: `DynamicArray`, a growable array, and
//!     `DynamicBitArray`, its bit-packed counterpart.
//! -   The `utils` module contains a selection of low-level types upon which the sequences are built: the allocator
//!     handle, the growth policy, and the storage words.
//!
//!
//! #   Failures
//!
//! Failures of the container itself are reported as `SequenceError`, and never panic:
//!
//! -   `AllocationFailure`: the allocator declined to provide memory.
//! -   `CapacityExceeded`: the requested size exceeds the maximum size, as per the `AllocatorHandle`. This is checked
//!     prior to any allocation attempt.
//! -   `BoundsError`: an index is out of bounds.
//!
//! Failures of the element type -- a panicking `Clone`, for example -- are not the container's business, and unwind
//! through the container. The container still restores its invariants on the way out, so that it remains valid.
//!
//!
//! #   Guarantees
//!
//! Unless documented otherwise, a failing operation leaves the sequence exactly as it was prior to the call: the
//! _strong_ guarantee. The exceptions are the operations which shift elements within the existing storage -- insertion
//! without growth, and erasure -- for which a panic of the element type only leaves the sequence valid: the _basic_
//! guarantee.

#![cfg_attr(not(test), no_std)]
//  Features (language)
//  Features (library)
#![cfg_attr(feature = "allocator_api", feature(allocator_api))]
//  Lints
#![deny(missing_docs)]
//  This author prefers to keep its test modules close to what they are testing.
#![allow(clippy::items_after_test_module)]

extern crate alloc;

//  Logging shims, compiled away unless the "log" feature is enabled.
macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::log::debug!($($arg)*);
        }
    };
}

macro_rules! log_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::log::trace!($($arg)*);
        }
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;

pub mod api;
pub mod collections;
pub mod utils;
