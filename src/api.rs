//! The interface shared by all sequences.

pub mod sequence;

pub use sequence::Sequence;

pub use crate::utils::{AllocatorHandle, SequenceError};
