//! The 11-bit block mode field: weight grid size, weight range and plane count.

use super::quantisation::{IseEncoding, WEIGHT_LEVELS};
use super::{BlockError, MAX_WEIGHTS_PER_BLOCK};
use crate::util::BitField;

/// Smallest number of bits a valid weight sequence may occupy.
pub const MIN_WEIGHT_BITS: u32 = 24;

/// Largest number of bits a valid weight sequence may occupy.
pub const MAX_WEIGHT_BITS: u32 = 96;

/// Block mode bit pattern that marks a void extent block.
pub const VOID_EXTENT_MODE: u32 = 0x1FC;

/// A decoded 2D block mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockMode {
    /// Weight grid width
    pub grid_width: u32,
    /// Weight grid height
    pub grid_height: u32,
    /// Index into the weight range table (`2..=7`)
    pub range: u32,
    /// Selects the high precision weight ranges
    pub high_precision: bool,
    /// Whether the block stores two weight planes
    pub dual_plane: bool,
}

impl BlockMode {
    /// A single plane mode with the given grid and number of weight levels.
    ///
    /// Returns [`None`] if `levels` is not a selectable weight range.
    pub fn new(grid_width: u32, grid_height: u32, levels: u32) -> Option<Self> {
        let (precision, range) = (0..2).find_map(|precision| {
            WEIGHT_LEVELS[precision][2..]
                .iter()
                .position(|&l| l == levels)
                .map(|index| (precision, index as u32 + 2))
        })?;

        Some(Self {
            grid_width,
            grid_height,
            range,
            high_precision: precision == 1,
            dual_plane: false,
        })
    }

    /// Number of weight levels.
    pub fn weight_levels(&self) -> u32 {
        WEIGHT_LEVELS[self.high_precision as usize][self.range as usize]
    }

    /// The integer sequence encoding of the weights.
    pub fn weight_encoding(&self) -> IseEncoding {
        // Ranges 2..=7 are always present in the table.
        IseEncoding::for_levels(self.weight_levels()).unwrap_or(IseEncoding::Bits(1))
    }

    /// Number of stored weights.
    pub fn weight_count(&self) -> u32 {
        self.grid_width * self.grid_height * (self.dual_plane as u32 + 1)
    }

    /// Number of bits used by the weight sequence.
    pub fn weight_bits(&self) -> u32 {
        self.weight_encoding().sequence_bits(self.weight_count())
    }

    /// Decodes the block mode field in the low 11 bits of `mode`.
    pub fn decode(mode: u32) -> Result<Self, BlockError> {
        let mode = mode.bits(0, 11);
        let a = mode.bits(5, 2);
        let mut high_precision = mode.bit(9);
        let mut dual_plane = mode.bit(10);
        let mut range = mode.bits(4, 1);

        let (grid_width, grid_height) = if mode.bits(0, 2) != 0 {
            range |= mode.bits(0, 2) << 1;
            let b = mode.bits(7, 2);
            match mode.bits(2, 2) {
                0 => (b + 4, a + 2),
                1 => (b + 8, a + 2),
                2 => (a + 2, b + 8),
                _ if mode.bit(8) => (mode.bits(7, 1) + 2, a + 2),
                _ => (a + 2, mode.bits(7, 1) + 6),
            }
        } else {
            range |= mode.bits(2, 2) << 1;
            if mode.bits(2, 2) == 0 {
                return Err(BlockError::ReservedBlockMode(mode));
            }

            let b = mode.bits(9, 2);
            match mode.bits(7, 2) {
                0 => (12, a + 2),
                1 => (a + 2, 12),
                2 => {
                    high_precision = false;
                    dual_plane = false;
                    (a + 6, b + 6)
                }
                _ => match a {
                    0 => (6, 10),
                    1 => (10, 6),
                    _ => return Err(BlockError::ReservedBlockMode(mode)),
                },
            }
        };

        let block_mode = Self {
            grid_width,
            grid_height,
            range,
            high_precision,
            dual_plane,
        };

        let bits = block_mode.weight_bits();
        if block_mode.weight_count() as usize > MAX_WEIGHTS_PER_BLOCK
            || !(MIN_WEIGHT_BITS..=MAX_WEIGHT_BITS).contains(&bits)
        {
            return Err(BlockError::ReservedBlockMode(mode));
        }

        Ok(block_mode)
    }

    /// Encodes this mode into the 11-bit block mode field.
    ///
    /// Returns [`None`] if no layout can represent the grid.
    pub fn encode(&self) -> Option<u32> {
        let (gw, gh) = (self.grid_width, self.grid_height);
        let r = self.range;
        let mut mode = 0u32;

        let fits = |value: u32, low: u32, count: u32| value >= low && value - low < count;

        if fits(gw, 4, 4) && fits(gh, 2, 4) {
            mode = mode.with_bits(7, 2, gw - 4).with_bits(5, 2, gh - 2);
        } else if fits(gw, 8, 4) && fits(gh, 2, 4) {
            mode = mode
                .with_bits(2, 2, 1)
                .with_bits(7, 2, gw - 8)
                .with_bits(5, 2, gh - 2);
        } else if fits(gw, 2, 4) && fits(gh, 8, 4) {
            mode = mode
                .with_bits(2, 2, 2)
                .with_bits(5, 2, gw - 2)
                .with_bits(7, 2, gh - 8);
        } else if fits(gw, 2, 2) && fits(gh, 2, 4) {
            mode = mode
                .with_bits(2, 2, 3)
                .with_bits(8, 1, 1)
                .with_bits(7, 1, gw - 2)
                .with_bits(5, 2, gh - 2);
        } else if fits(gw, 2, 4) && fits(gh, 6, 2) {
            mode = mode
                .with_bits(2, 2, 3)
                .with_bits(5, 2, gw - 2)
                .with_bits(7, 1, gh - 6);
        } else {
            return self.encode_wide();
        }

        mode = mode
            .with_bits(0, 2, r >> 1)
            .with_bits(4, 1, r & 1)
            .with_bits(9, 1, self.high_precision as u32)
            .with_bits(10, 1, self.dual_plane as u32);
        Some(mode)
    }

    /// Layouts with the low two bits clear, used for 12-wide and 6x10 style grids.
    fn encode_wide(&self) -> Option<u32> {
        let (gw, gh) = (self.grid_width, self.grid_height);
        let fits = |value: u32, low: u32, count: u32| value >= low && value - low < count;

        let mut mode = 0u32;
        let mut allows_flags = true;
        if gw == 12 && fits(gh, 2, 4) {
            mode = mode.with_bits(5, 2, gh - 2);
        } else if gh == 12 && fits(gw, 2, 4) {
            mode = mode.with_bits(7, 2, 1).with_bits(5, 2, gw - 2);
        } else if (gw, gh) == (6, 10) {
            mode = mode.with_bits(7, 2, 3);
        } else if (gw, gh) == (10, 6) {
            mode = mode.with_bits(7, 2, 3).with_bits(5, 2, 1);
        } else if fits(gw, 6, 4) && fits(gh, 6, 4) {
            mode = mode
                .with_bits(7, 2, 2)
                .with_bits(5, 2, gw - 6)
                .with_bits(9, 2, gh - 6);
            allows_flags = false;
        } else {
            return None;
        }

        if !allows_flags && (self.high_precision || self.dual_plane) {
            return None;
        }

        mode = mode
            .with_bits(2, 2, self.range >> 1)
            .with_bits(4, 1, self.range & 1);
        if allows_flags {
            mode = mode
                .with_bits(9, 1, self.high_precision as u32)
                .with_bits(10, 1, self.dual_plane as u32);
        }
        Some(mode)
    }
}
