//! Supported 2D ASTC block footprints.

use crate::error::CodecError;
use derive_enum_all_values::AllValues;

/// Size of a single compressed ASTC block in bytes, regardless of footprint.
pub const ASTC_BLOCK_SIZE: usize = 16;

/// A 2D block footprint: the texel region encoded into one 128-bit block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
pub enum BlockFootprint {
    /// 4x4 texels, 8.00 bits per texel
    Block4x4,
    /// 5x4 texels, 6.40 bits per texel
    Block5x4,
    /// 5x5 texels, 5.12 bits per texel
    Block5x5,
    /// 6x5 texels, 4.27 bits per texel
    Block6x5,
    /// 6x6 texels, 3.56 bits per texel
    Block6x6,
    /// 8x5 texels, 3.20 bits per texel
    Block8x5,
    /// 8x6 texels, 2.67 bits per texel
    Block8x6,
    /// 8x8 texels, 2.00 bits per texel
    Block8x8,
    /// 10x5 texels, 2.56 bits per texel
    Block10x5,
    /// 10x6 texels, 2.13 bits per texel
    Block10x6,
    /// 10x8 texels, 1.60 bits per texel
    Block10x8,
    /// 10x10 texels, 1.28 bits per texel
    Block10x10,
    /// 12x10 texels, 1.07 bits per texel
    Block12x10,
    /// 12x12 texels, 0.89 bits per texel
    Block12x12,
}

impl BlockFootprint {
    /// Block width in texels.
    pub const fn width(self) -> usize {
        self.dimensions().0
    }

    /// Block height in texels.
    pub const fn height(self) -> usize {
        self.dimensions().1
    }

    /// Number of texels covered by one block.
    pub const fn texel_count(self) -> usize {
        let (width, height) = self.dimensions();
        width * height
    }

    const fn dimensions(self) -> (usize, usize) {
        match self {
            BlockFootprint::Block4x4 => (4, 4),
            BlockFootprint::Block5x4 => (5, 4),
            BlockFootprint::Block5x5 => (5, 5),
            BlockFootprint::Block6x5 => (6, 5),
            BlockFootprint::Block6x6 => (6, 6),
            BlockFootprint::Block8x5 => (8, 5),
            BlockFootprint::Block8x6 => (8, 6),
            BlockFootprint::Block8x8 => (8, 8),
            BlockFootprint::Block10x5 => (10, 5),
            BlockFootprint::Block10x6 => (10, 6),
            BlockFootprint::Block10x8 => (10, 8),
            BlockFootprint::Block10x10 => (10, 10),
            BlockFootprint::Block12x10 => (12, 10),
            BlockFootprint::Block12x12 => (12, 12),
        }
    }

    /// Looks up the footprint for a block width and height.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedFootprint`] if the pair is not a supported 2D footprint.
    pub fn from_dimensions(width: usize, height: usize) -> Result<Self, CodecError> {
        Self::all_values()
            .iter()
            .copied()
            .find(|footprint| footprint.dimensions() == (width, height))
            .ok_or(CodecError::UnsupportedFootprint { width, height })
    }

    /// Number of blocks needed to cover `image_width` texels horizontally.
    pub const fn blocks_x(self, image_width: usize) -> usize {
        image_width.div_ceil(self.width())
    }

    /// Number of blocks needed to cover `image_height` texels vertically.
    pub const fn blocks_y(self, image_height: usize) -> usize {
        image_height.div_ceil(self.height())
    }

    /// Size in bytes of the compressed data for an image of the given size.
    ///
    /// Returns [`None`] if the size overflows [`usize`].
    pub fn compressed_size(self, image_width: usize, image_height: usize) -> Option<usize> {
        self.blocks_x(image_width)
            .checked_mul(self.blocks_y(image_height))?
            .checked_mul(ASTC_BLOCK_SIZE)
    }
}
