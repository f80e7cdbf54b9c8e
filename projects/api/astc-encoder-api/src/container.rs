//! Reading and writing `.astc` files.
//!
//! An `.astc` file is a 16 byte little endian header followed by the block data:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `0x5CA1AB13` |
//! | 4 | 1 | block width |
//! | 5 | 1 | block height |
//! | 6 | 1 | block depth (1 for 2D images) |
//! | 7 | 3 | image width |
//! | 10 | 3 | image height |
//! | 13 | 3 | image depth (1 for 2D images) |
//!
//! The header does not describe the pixel layout of the source image, so readers
//! supply it as a [`PixelFormat`].

use crate::compressed_image::{AstcImage, PixelFormat};
use crate::error::AstcError;
use log::debug;
use thiserror::Error;

/// Magic number at the start of every `.astc` file.
pub const ASTC_MAGIC: u32 = 0x5CA1_AB13;

/// Size of the `.astc` header in bytes.
pub const ASTC_HEADER_SIZE: usize = 16;

/// Largest image dimension a 3 byte header field can hold.
const MAX_DIMENSION: usize = (1 << 24) - 1;

/// Errors that can occur while reading or writing `.astc` files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstcFileError {
    /// The file is shorter than its header.
    #[error("File too short: {0} bytes, the header alone needs 16")]
    TooShort(usize),

    /// The file does not start with the ASTC magic number.
    #[error("Invalid magic number {0:#010X}")]
    InvalidMagic(u32),

    /// The file holds a 3D image, which is not supported.
    #[error("Unsupported depth: block depth {block_depth}, image depth {depth}")]
    UnsupportedDepth {
        /// Block depth from the header.
        block_depth: u8,
        /// Image depth from the header.
        depth: u32,
    },

    /// The image or block footprint does not fit into the header fields.
    #[error("Image dimensions {width}x{height} with {block_width}x{block_height} blocks do not fit in an .astc header")]
    DimensionsTooLarge {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
        /// Block width in texels.
        block_width: usize,
        /// Block height in texels.
        block_height: usize,
    },

    /// The block data does not match the header.
    #[error(transparent)]
    Codec(#[from] AstcError),
}

/// Header fields of a 2D `.astc` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstcHeader {
    /// Block width in texels.
    pub block_width: u8,
    /// Block height in texels.
    pub block_height: u8,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl AstcHeader {
    /// Parses the header at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// [`AstcFileError::TooShort`], [`AstcFileError::InvalidMagic`] or
    /// [`AstcFileError::UnsupportedDepth`].
    pub fn parse(bytes: &[u8]) -> Result<Self, AstcFileError> {
        let Some(header) = bytes.first_chunk::<ASTC_HEADER_SIZE>() else {
            return Err(AstcFileError::TooShort(bytes.len()));
        };

        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if magic != ASTC_MAGIC {
            return Err(AstcFileError::InvalidMagic(magic));
        }

        let block_depth = header[6];
        let depth = read_u24(&header[13..16]);
        if block_depth != 1 || depth != 1 {
            return Err(AstcFileError::UnsupportedDepth { block_depth, depth });
        }

        Ok(Self {
            block_width: header[4],
            block_height: header[5],
            width: read_u24(&header[7..10]),
            height: read_u24(&header[10..13]),
        })
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; ASTC_HEADER_SIZE] {
        let mut header = [0u8; ASTC_HEADER_SIZE];
        header[0..4].copy_from_slice(&ASTC_MAGIC.to_le_bytes());
        header[4] = self.block_width;
        header[5] = self.block_height;
        header[6] = 1;
        write_u24(&mut header[7..10], self.width);
        write_u24(&mut header[10..13], self.height);
        write_u24(&mut header[13..16], 1);
        header
    }
}

/// Serializes `image` as an `.astc` file.
///
/// # Errors
///
/// [`AstcFileError::DimensionsTooLarge`] if a dimension does not fit in its header field.
pub fn write_astc_file(image: &AstcImage) -> Result<Vec<u8>, AstcFileError> {
    let too_large = || AstcFileError::DimensionsTooLarge {
        width: image.width(),
        height: image.height(),
        block_width: image.block_width(),
        block_height: image.block_height(),
    };
    if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        return Err(too_large());
    }

    let header = AstcHeader {
        block_width: u8::try_from(image.block_width()).map_err(|_| too_large())?,
        block_height: u8::try_from(image.block_height()).map_err(|_| too_large())?,
        width: image.width() as u32,
        height: image.height() as u32,
    };

    let data = image.data();
    let mut file = Vec::with_capacity(ASTC_HEADER_SIZE + data.len());
    file.extend_from_slice(&header.to_bytes());
    file.extend_from_slice(data);
    Ok(file)
}

/// Parses an `.astc` file into a compressed image that decompresses into `format`.
///
/// # Errors
///
/// Header errors from [`AstcHeader::parse`], or [`AstcFileError::Codec`] if the block
/// data does not match the header.
pub fn read_astc_file(bytes: &[u8], format: PixelFormat) -> Result<AstcImage, AstcFileError> {
    let header = AstcHeader::parse(bytes)?;
    debug!(
        "Read .astc header: {}x{} image, {}x{} blocks, {} bytes of block data",
        header.width,
        header.height,
        header.block_width,
        header.block_height,
        bytes.len() - ASTC_HEADER_SIZE
    );

    let image = AstcImage::from_block_data(
        &bytes[ASTC_HEADER_SIZE..],
        header.width as usize,
        header.height as usize,
        header.block_width as usize,
        header.block_height as usize,
        format,
    )?;
    Ok(image)
}

fn read_u24(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16
}

fn write_u24(bytes: &mut [u8], value: u32) {
    bytes.copy_from_slice(&value.to_le_bytes()[..3]);
}
