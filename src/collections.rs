//! Implementations of growable sequences.

//  Design considerations
//
//  #   Why two types?
//
//  A bit cannot be referenced, so a sequence of bits cannot hand out `&bool`, nor can it relocate its elements one by
//  one. Rather than bending a single generic engine to cover both layouts, each layout gets its own type, and the
//  `Sequence` trait captures what they have in common.
//
//  #   Why inherent?
//
//  The methods are doubly implemented (as inherent methods, and `Sequence` methods) so they can be called without
//  importing the trait.

pub mod dynamic_array;
pub mod dynamic_bit_array;

pub use dynamic_array::{DynamicArray, IntoIter};
pub use dynamic_bit_array::{BitIter, BitRef, DynamicBitArray};
