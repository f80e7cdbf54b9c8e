//! Bit field access for ASTC blocks.
//!
//! ASTC blocks are 128-bit little endian values. Most fields are read from the least
//! significant end, while weights are stored bit reversed from the most significant end.

use core::ops::{BitAnd, BitOr, Not, Shl, Shr};

/// Integer types that can read and write arbitrary bit fields.
pub trait BitField:
    Copy
    + PartialEq
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    /// Width of the type in bits.
    const WIDTH: u32;

    /// A mask with the lowest `len` bits set.
    fn mask(len: u32) -> Self;

    /// Extracts `len` bits starting at bit `start`.
    #[inline(always)]
    fn bits(self, start: u32, len: u32) -> Self {
        (self >> start) & Self::mask(len)
    }

    /// Returns whether bit `start` is set.
    fn bit(self, start: u32) -> bool;

    /// Returns `self` with `len` bits at `start` replaced by the low bits of `value`.
    #[inline(always)]
    fn with_bits(self, start: u32, len: u32, value: Self) -> Self {
        let mask = Self::mask(len) << start;
        (self & !mask) | ((value << start) & mask)
    }
}

macro_rules! impl_bit_field {
    ($($T:ty)*) => {
        $( impl BitField for $T {
            const WIDTH: u32 = <$T>::BITS;

            #[inline(always)]
            fn mask(len: u32) -> Self {
                if len >= Self::WIDTH {
                    <$T>::MAX
                } else {
                    (1 << len) - 1
                }
            }

            #[inline(always)]
            fn bit(self, start: u32) -> bool {
                self & (1 << start) != 0
            }
        } )*
    };
}

impl_bit_field!(u8 u16 u32 u64 u128);

/// Writes `len` bits of `value` into `block` so that they read back through
/// [`read_reversed_bits`] at stream offset `start`.
///
/// Stream bit `n` lives at block bit `127 - n`.
#[inline]
pub fn write_reversed_bits(block: u128, start: u32, len: u32, value: u32) -> u128 {
    let mut block = block;
    for bit in 0..len {
        let position = 127 - (start + bit);
        block = block.with_bits(position, 1, ((value >> bit) & 1) as u128);
    }
    block
}

/// Reads `len` bits from the bit reversed stream at the top of `block`.
#[inline]
pub fn read_reversed_bits(block: u128, start: u32, len: u32) -> u32 {
    let mut value = 0;
    for bit in 0..len {
        let position = 127 - (start + bit);
        value |= (block.bit(position) as u32) << bit;
    }
    value
}

/// Replicates the `from` low bits of `value` until `to` bits are filled.
///
/// This is how ASTC expands bit-only quantised values back to their full range.
#[inline]
pub fn replicate_bits(value: u32, from: u32, to: u32) -> u32 {
    if from == 0 {
        return 0;
    }

    let mut result = 0;
    let mut filled = 0;
    while filled < to {
        let shift = to as i32 - filled as i32 - from as i32;
        if shift >= 0 {
            result |= value << shift;
        } else {
            result |= value >> (-shift);
        }
        filled += from;
    }
    result & u32::mask(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn bits_extract_fields() {
        let value: u16 = 0b1011_0110_0101;
        assert_eq!(value.bits(0, 4), 0b0101);
        assert_eq!(value.bits(4, 4), 0b0110);
        assert_eq!(value.bits(8, 4), 0b1011);
        assert!(value.bit(0));
        assert!(!value.bit(1));
    }

    #[test]
    fn with_bits_replaces_only_the_field() {
        let value: u128 = u128::MAX;
        let value = value.with_bits(17, 8, 0);
        assert_eq!(value.bits(17, 8), 0);
        assert_eq!(value.bits(0, 17), u128::mask(17));
        assert_eq!(value.bits(25, 103), u128::mask(103));
    }

    #[test]
    fn full_width_mask_does_not_overflow() {
        assert_eq!(u128::mask(128), u128::MAX);
        assert_eq!(u8::mask(8), u8::MAX);
    }

    #[test]
    fn reversed_bits_start_at_the_top_of_the_block() {
        let block = write_reversed_bits(0, 0, 2, 0b01);
        assert!(block.bit(127));
        assert!(!block.bit(126));
        assert_eq!(read_reversed_bits(block, 0, 2), 0b01);
    }

    #[test]
    fn reversed_bits_round_trip_a_sequence() {
        let mut block = 0;
        for (index, value) in [3u32, 0, 2, 1, 3, 3].iter().enumerate() {
            block = write_reversed_bits(block, index as u32 * 2, 2, *value);
        }
        let read: Vec<u32> = (0..6).map(|i| read_reversed_bits(block, i * 2, 2)).collect();
        assert_eq!(read, [3, 0, 2, 1, 3, 3]);
    }

    #[rstest]
    #[case(0b1, 1, 6, 0b111111)]
    #[case(0b10, 2, 6, 0b101010)]
    #[case(0b101, 3, 6, 0b101101)]
    #[case(0b1011, 4, 6, 0b101110)]
    #[case(0b10110, 5, 6, 0b101101)]
    #[case(0b1101, 4, 8, 0b11011101)]
    #[case(0b1, 1, 8, 0xFF)]
    fn replicate_bits_matches_astc_expansion(
        #[case] value: u32,
        #[case] from: u32,
        #[case] to: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(replicate_bits(value, from, to), expected);
    }
}
