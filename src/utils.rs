//! Utilities upon which the collections are built.

mod buffer;
mod error;
mod handle;
mod word;

#[cfg(test)]
pub(crate) mod testing;

pub mod alloc;
pub mod growth;

pub(crate) use buffer::{RawSlots, Release, StagingBuffer};
pub(crate) use word::{copy_bits, load_bits, store_bits};

pub use error::SequenceError;
pub use handle::{AllocatorHandle, always_equivalent, equal_equivalent};
pub use word::{BitWord, IndexInWord, IndexOfWord};
