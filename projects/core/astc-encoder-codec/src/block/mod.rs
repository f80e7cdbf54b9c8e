//! Single block encoding and decoding.
//!
//! The codec handles the LDR subset of ASTC that it emits itself:
//!
//! - Void extent blocks carrying one constant colour.
//! - Single partition, single plane blocks with a direct LDR colour endpoint mode
//!   (luminance, luminance + alpha, RGB, RGBA) and a bits-only weight grid.
//!
//! Anything else decodes to the ASTC error colour, magenta.

pub mod block_mode;
pub mod endpoints;
pub mod quantisation;
pub mod void_extent;
pub mod weights;

mod decode;
mod encode;

pub use decode::*;
pub use encode::*;

use thiserror::Error;

/// Decoded texel: RGBA as UNORM16.
pub type Texel = [u16; 4];

/// Colour a conforming decoder writes for blocks it cannot decode.
pub const ERROR_COLOUR: Texel = [0xFFFF, 0, 0xFFFF, 0xFFFF];

/// Largest number of texels in a supported footprint.
pub const MAX_TEXELS_PER_BLOCK: usize = 12 * 12;

/// Largest number of weights a single block may store.
pub const MAX_WEIGHTS_PER_BLOCK: usize = 64;

/// Bit position where colour endpoint data starts in a single partition block.
pub const COLOUR_DATA_START: u32 = 17;

/// Reasons a block cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    /// The block mode field is reserved or the weight grid is out of bounds.
    #[error("Reserved block mode {0:#05x}")]
    ReservedBlockMode(u32),

    /// The weight grid is larger than the block footprint.
    #[error("Weight grid {grid_width}x{grid_height} exceeds the block footprint")]
    GridExceedsBlock {
        /// Weight grid width
        grid_width: u32,
        /// Weight grid height
        grid_height: u32,
    },

    /// Dual plane blocks are not handled.
    #[error("Dual plane blocks are not supported")]
    DualPlane,

    /// More than one partition.
    #[error("Unsupported partition count {0}")]
    PartitionCount(u32),

    /// Colour endpoint mode outside the direct LDR set.
    #[error("Unsupported colour endpoint mode {0}")]
    ColourEndpointMode(u32),

    /// Weights use trit or quint encoding.
    #[error("Unsupported weight range with {0} levels")]
    WeightRange(u32),

    /// Colour endpoints use trit or quint encoding.
    #[error("Unsupported colour range with {0} levels")]
    ColourRange(u32),

    /// Too few bits remain to store the colour endpoints.
    #[error("Not enough bits for colour endpoints")]
    InsufficientColourBits,

    /// The void extent coordinates are malformed.
    #[error("Invalid void extent coordinates")]
    InvalidVoidExtent,

    /// HDR void extent blocks are not valid in the LDR profile.
    #[error("HDR void extent in LDR profile")]
    HdrVoidExtent,
}
