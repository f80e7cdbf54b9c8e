//! Quantisation levels and integer sequence encoding sizes.
//!
//! ASTC stores weights and colour endpoint values with an integer sequence encoding
//! (ISE): each value is split into low bits plus, for some ranges, a shared trit or
//! quint. Only bits-only ranges are read and written by this codec, but selecting the
//! colour range requires the sizes of every range.

use crate::util::replicate_bits;

/// How a quantisation range is represented in the integer sequence encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IseEncoding {
    /// `n` plain bits per value.
    Bits(u32),
    /// One trit plus `n` bits per value.
    Trits(u32),
    /// One quint plus `n` bits per value.
    Quints(u32),
}

impl IseEncoding {
    /// The encoding used for a range with `levels` distinct values.
    pub const fn for_levels(levels: u32) -> Option<Self> {
        Some(match levels {
            2 => IseEncoding::Bits(1),
            3 => IseEncoding::Trits(0),
            4 => IseEncoding::Bits(2),
            5 => IseEncoding::Quints(0),
            6 => IseEncoding::Trits(1),
            8 => IseEncoding::Bits(3),
            10 => IseEncoding::Quints(1),
            12 => IseEncoding::Trits(2),
            16 => IseEncoding::Bits(4),
            20 => IseEncoding::Quints(2),
            24 => IseEncoding::Trits(3),
            32 => IseEncoding::Bits(5),
            40 => IseEncoding::Quints(3),
            48 => IseEncoding::Trits(4),
            64 => IseEncoding::Bits(6),
            80 => IseEncoding::Quints(4),
            96 => IseEncoding::Trits(5),
            128 => IseEncoding::Bits(7),
            160 => IseEncoding::Quints(5),
            192 => IseEncoding::Trits(6),
            256 => IseEncoding::Bits(8),
            _ => return None,
        })
    }

    /// Number of plain bits per value if the range is bits-only.
    pub const fn plain_bits(self) -> Option<u32> {
        match self {
            IseEncoding::Bits(bits) => Some(bits),
            _ => None,
        }
    }

    /// Number of bits needed to store `count` values.
    pub const fn sequence_bits(self, count: u32) -> u32 {
        match self {
            IseEncoding::Bits(bits) => count * bits,
            IseEncoding::Trits(bits) => count * bits + (8 * count).div_ceil(5),
            IseEncoding::Quints(bits) => count * bits + (7 * count).div_ceil(3),
        }
    }
}

/// Weight ranges selectable by the block mode, indexed by `[high precision][range field]`.
///
/// Range field values 0 and 1 are reserved.
pub const WEIGHT_LEVELS: [[u32; 8]; 2] = [[0, 0, 2, 3, 4, 5, 6, 8], [0, 0, 10, 12, 16, 20, 24, 32]];

/// Colour endpoint ranges in increasing order.
pub const COLOUR_LEVELS: [u32; 17] = [
    6, 8, 10, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256,
];

/// The largest colour range that stores `value_count` values in `available_bits`.
pub fn colour_levels_for(value_count: u32, available_bits: u32) -> Option<u32> {
    COLOUR_LEVELS.iter().rev().copied().find(|&levels| {
        IseEncoding::for_levels(levels)
            .is_some_and(|encoding| encoding.sequence_bits(value_count) <= available_bits)
    })
}

/// Expands a bits-only quantised weight to the `0..=64` interpolation range.
#[inline]
pub fn unquantise_weight(value: u32, bits: u32) -> u32 {
    let expanded = replicate_bits(value, bits, 6);
    if expanded > 32 {
        expanded + 1
    } else {
        expanded
    }
}

/// Expands a bits-only quantised colour value to the `0..=255` endpoint range.
#[inline]
pub fn unquantise_colour(value: u32, bits: u32) -> u32 {
    replicate_bits(value, bits, 8)
}
