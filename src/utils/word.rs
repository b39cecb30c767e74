//  See `BitWord` type.
//
//  #   Why `u64`?
//
//  There is a balance to be found. A smaller type means that fewer bits are packed together, and thus bulk operations
//  are not as effective. A larger type may not be well supported -- looking at you, `u128` -- defeating the purpose of
//  efficient bulk operations, and may possibly impose greater alignment than necessary.
//
//  Since 32-bits & 64-bits CPUs tend to support `u64` natively, `u64` is the largest well supported type.

use core::cmp;

/// A storage word, packing 64 booleans.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(transparent)]
pub struct BitWord(pub u64);

/// The index of a word, in a sequence of words.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct IndexOfWord(pub usize);

/// The index of a bit in a word.
///
/// The index of a bit in a word is expected to always be strictly less than 64. No index created by `BitWord::split`
/// will ever violate this invariant.
///
/// #   Panics
///
/// In Debug, most operations taking an `IndexInWord` will panic if its value is strictly greater than 63.
///
/// In Release, any high bit will be ignored (masked away).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct IndexInWord(pub u32);

//
//  Constants.
//

impl BitWord {
    /// Number of bits in a word.
    pub const BITS: usize = 64;

    /// An all-zeros word.
    pub const ALL_ZEROS: Self = Self(0);

    /// An all-ones word.
    pub const ALL_ONES: Self = Self(!0);
}

//
//  Static operations.
//

impl BitWord {
    /// Splits the index of a bit into an index-of-word/index-in-word pair.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use grow_array::utils::BitWord;
    /// let (of_word, in_word) = BitWord::split(133);
    ///
    /// assert_eq!(2, of_word.0);
    /// assert_eq!(5, in_word.0);
    /// ```
    #[inline]
    pub const fn split(index: usize) -> (IndexOfWord, IndexInWord) {
        //  Compute both / and % close together, so the optimizer fuses both in a single instruction.
        let of_word = index / Self::BITS;
        let in_word = index % Self::BITS;

        (IndexOfWord(of_word), IndexInWord(in_word as u32))
    }

    /// Returns the number of words necessary to hold `bits` bits.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use grow_array::utils::BitWord;
    /// assert_eq!(0, BitWord::words_for(0));
    /// assert_eq!(1, BitWord::words_for(1));
    /// assert_eq!(1, BitWord::words_for(64));
    /// assert_eq!(2, BitWord::words_for(65));
    /// ```
    #[inline]
    pub const fn words_for(bits: usize) -> usize {
        bits.div_ceil(Self::BITS)
    }
}

// mod static_tests

//
//  Bit operations.
//

impl BitWord {
    /// Returns the number of bits set.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use grow_array::utils::BitWord;
    /// assert_eq!(0, BitWord::ALL_ZEROS.count());
    /// assert_eq!(64, BitWord::ALL_ONES.count());
    /// ```
    #[inline]
    pub const fn count(&self) -> usize {
        self.0.count_ones() as _
    }

    /// Returns whether the given bit is set.
    ///
    /// #   Panics
    ///
    /// See `IndexInWord`.
    #[inline]
    pub const fn is_set(&self, index: IndexInWord) -> bool {
        self.0 & Self::mask(index) != 0
    }

    /// Sets the given bit to `value`, returning its previous value.
    ///
    /// #   Panics
    ///
    /// See `IndexInWord`.
    #[inline]
    pub const fn assign(&mut self, index: IndexInWord, value: bool) -> bool {
        let previous = self.is_set(index);

        if value {
            self.0 |= Self::mask(index);
        } else {
            self.0 &= !Self::mask(index);
        }

        previous
    }

    /// Flips the given bit, returning its new value.
    ///
    /// #   Panics
    ///
    /// See `IndexInWord`.
    #[inline]
    pub const fn flip(&mut self, index: IndexInWord) -> bool {
        self.0 ^= Self::mask(index);

        self.is_set(index)
    }

    /// Returns a word with only the bits strictly below `index` kept.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use grow_array::utils::{BitWord, IndexInWord};
    /// assert_eq!(BitWord(0b0111), BitWord(0b1111).below(IndexInWord(3)));
    /// assert_eq!(BitWord::ALL_ZEROS, BitWord::ALL_ONES.below(IndexInWord(0)));
    /// ```
    #[inline]
    pub const fn below(self, index: IndexInWord) -> Self {
        Self(self.0 & (Self::mask(index) - 1))
    }

    #[inline]
    const fn mask(index: IndexInWord) -> u64 {
        debug_assert!(index.0 < Self::BITS as u32);

        1u64 << (index.0 % Self::BITS as u32)
    }
}

#[cfg(test)]
mod bit_tests {
    use super::*;

    #[test]
    fn is_set() {
        let word = BitWord(0b1001);

        assert!(word.is_set(IndexInWord(0)));
        assert!(word.is_set(IndexInWord(3)));

        for i in (1..=2).chain(4..=63) {
            assert!(!word.is_set(IndexInWord(i)), "{i}");
        }
    }

    #[test]
    fn assign() {
        let mut word = BitWord::ALL_ZEROS;

        assert!(!word.assign(IndexInWord(5), true));
        assert!(word.assign(IndexInWord(5), true));
        assert_eq!(BitWord(1 << 5), word);

        assert!(word.assign(IndexInWord(5), false));
        assert_eq!(BitWord::ALL_ZEROS, word);
    }

    #[test]
    fn flip() {
        let mut word = BitWord::ALL_ZEROS;

        assert!(word.flip(IndexInWord(63)));
        assert_eq!(BitWord(1 << 63), word);

        assert!(!word.flip(IndexInWord(63)));
        assert_eq!(BitWord::ALL_ZEROS, word);
    }

    #[test]
    fn below() {
        assert_eq!(BitWord(!0 >> 1), BitWord::ALL_ONES.below(IndexInWord(63)));
        assert_eq!(BitWord(0b0101), BitWord(0b1101).below(IndexInWord(3)));
    }
}

//
//  Block operations.
//

//  Returns a mask of the `count` lowest bits, with `count` in `1..=64`.
#[inline]
fn low_mask(count: usize) -> u64 {
    debug_assert!(count > 0 && count <= BitWord::BITS);

    if count >= BitWord::BITS {
        return !0;
    }

    BitWord::ALL_ONES.below(IndexInWord(count as u32)).0
}

/// Returns the `count` bits starting at bit `index` of `words`, in the low bits of the result.
///
/// `count` must be in `1..=64`, and `[index, index + count)` must be within `words`.
#[inline]
pub(crate) fn load_bits(words: &[BitWord], index: usize, count: usize) -> u64 {
    let (of_word, in_word) = BitWord::split(index);
    let shift = in_word.0;

    let mut bits = words[of_word.0].0 >> shift;

    if shift != 0 && shift as usize + count > BitWord::BITS {
        bits |= words[of_word.0 + 1].0 << (BitWord::BITS as u32 - shift);
    }

    bits & low_mask(count)
}

/// Overwrites the `count` bits starting at bit `index` of `words` with the low bits of `bits`.
///
/// `count` must be in `1..=64`, and `[index, index + count)` must be within `words`.
#[inline]
pub(crate) fn store_bits(words: &mut [BitWord], index: usize, count: usize, bits: u64) {
    let (of_word, in_word) = BitWord::split(index);
    let shift = in_word.0;

    let mask = low_mask(count);
    let bits = bits & mask;

    let first = &mut words[of_word.0].0;
    *first = (*first & !(mask << shift)) | (bits << shift);

    if shift != 0 && shift as usize + count > BitWord::BITS {
        let spill = BitWord::BITS as u32 - shift;

        let second = &mut words[of_word.0 + 1].0;
        *second = (*second & !(mask >> spill)) | (bits >> spill);
    }
}

/// Copies the `count` bits starting at bit `source` to bit `destination`, within `words`.
///
/// Both ranges must be within `words`, and may overlap.
pub(crate) fn copy_bits(words: &mut [BitWord], source: usize, destination: usize, count: usize) {
    if source == destination {
        return;
    }

    if destination < source {
        //  Lowest first, so that no block is overwritten before being read.
        let mut offset = 0;

        while offset < count {
            let block = cmp::min(BitWord::BITS, count - offset);

            let bits = load_bits(words, source + offset, block);
            store_bits(words, destination + offset, block, bits);

            offset += block;
        }
    } else {
        //  Highest first, so that no block is overwritten before being read.
        let mut remaining = count;

        while remaining > 0 {
            let block = cmp::min(BitWord::BITS, remaining);
            remaining -= block;

            let bits = load_bits(words, source + remaining, block);
            store_bits(words, destination + remaining, block, bits);
        }
    }
}

// mod block_tests
