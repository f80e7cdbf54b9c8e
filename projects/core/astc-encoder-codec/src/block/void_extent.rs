//! Void extent blocks: a single constant colour for the whole footprint.

use super::block_mode::VOID_EXTENT_MODE;
use super::{BlockError, Texel};
use bitfield::bitfield;

/// Low 64 bits of an LDR void extent block with no extent coordinates.
const LDR_VOID_EXTENT_HEADER: u64 = 0xFFFF_FFFF_FFFF_FDFC;

/// Extent coordinate value meaning "no extent".
const NO_EXTENT: u32 = 0x1FFF;

bitfield! {
    /// Void extent block layout.
    ///
    /// - Bits 0-8: block mode (`0x1FC`)
    /// - Bit 9: HDR flag
    /// - Bits 10-11: reserved, both set
    /// - Bits 12-63: S and T extent coordinates (13 bits each)
    /// - Bits 64-127: RGBA colour (UNORM16 each)
    #[derive(Clone, Copy, PartialEq, Eq)]
    struct VoidExtentBlock(u128);
    impl Debug;
    u32;

    mode, _: 8, 0;
    hdr, _: 9;
    min_s, set_min_s: 24, 12;
    max_s, set_max_s: 37, 25;
    min_t, set_min_t: 50, 38;
    max_t, set_max_t: 63, 51;
    u16, channel, set_channel: 79, 64, 4;
}

/// Whether `block` is a void extent block.
#[inline]
pub fn is_void_extent(block: u128) -> bool {
    VoidExtentBlock(block).mode() == VOID_EXTENT_MODE
}

/// Builds an LDR void extent block for a UNORM16 colour.
pub fn encode_void_extent(colour: Texel) -> u128 {
    let mut block = VoidExtentBlock(LDR_VOID_EXTENT_HEADER as u128);
    for (index, &value) in colour.iter().enumerate() {
        block.set_channel(index, value);
    }
    block.0
}

/// Reads the constant colour of a void extent block.
pub fn decode_void_extent(block: u128) -> Result<Texel, BlockError> {
    let block = VoidExtentBlock(block);
    if block.hdr() {
        return Err(BlockError::HdrVoidExtent);
    }

    let extent = [block.min_s(), block.max_s(), block.min_t(), block.max_t()];
    let no_extent = extent.iter().all(|&coordinate| coordinate == NO_EXTENT);
    if !no_extent && (block.min_s() >= block.max_s() || block.min_t() >= block.max_t()) {
        return Err(BlockError::InvalidVoidExtent);
    }

    Ok(core::array::from_fn(|index| block.channel(index)))
}
