use super::block_mode::BlockMode;
use super::endpoints::{ColourEndpointMode, Endpoint};
use super::quantisation::{colour_levels_for, unquantise_colour, IseEncoding};
use super::void_extent::{decode_void_extent, is_void_extent};
use super::weights::{read_weights, TexelContributions};
use super::{BlockError, Texel, COLOUR_DATA_START, ERROR_COLOUR, MAX_WEIGHTS_PER_BLOCK};
use crate::footprint::BlockFootprint;
use crate::util::BitField;
use likely_stable::unlikely;

/// How endpoint colours are expanded to 16 bits before interpolation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ColourSpace {
    /// Linear LDR: `e` expands to `e * 257`.
    Linear,
    /// sRGB LDR: colour channels expand to `e * 256 + 128`; alpha stays linear.
    #[default]
    Srgb,
}

impl ColourSpace {
    /// The colour space matching an image's `linear` flag.
    pub fn from_linear(linear: bool) -> Self {
        if linear {
            ColourSpace::Linear
        } else {
            ColourSpace::Srgb
        }
    }

    #[inline(always)]
    fn expand(self, value: u8, channel: usize) -> u32 {
        let value = value as u32;
        match self {
            ColourSpace::Srgb if channel < 3 => (value << 8) | 0x80,
            _ => (value << 8) | value,
        }
    }
}

/// Decodes one 16 byte block into `texels`, in row-major order.
///
/// `texels` must hold at least [`BlockFootprint::texel_count`] entries. When the block
/// cannot be decoded, every texel is set to [`ERROR_COLOUR`] and the reason is returned.
pub fn decode_block(
    block: &[u8; 16],
    footprint: BlockFootprint,
    colour_space: ColourSpace,
    texels: &mut [Texel],
) -> Result<(), BlockError> {
    let block = u128::from_le_bytes(*block);
    let texels = &mut texels[..footprint.texel_count()];
    let result = decode_block_bits(block, footprint, colour_space, texels);
    if unlikely(result.is_err()) {
        texels.fill(ERROR_COLOUR);
    }
    result
}

pub(crate) fn decode_block_bits(
    block: u128,
    footprint: BlockFootprint,
    colour_space: ColourSpace,
    texels: &mut [Texel],
) -> Result<(), BlockError> {
    if is_void_extent(block) {
        texels.fill(decode_void_extent(block)?);
        return Ok(());
    }

    let mode = BlockMode::decode(block.bits(0, 11) as u32)?;
    let (block_width, block_height) = (footprint.width() as u32, footprint.height() as u32);
    if mode.grid_width > block_width || mode.grid_height > block_height {
        return Err(BlockError::GridExceedsBlock {
            grid_width: mode.grid_width,
            grid_height: mode.grid_height,
        });
    }
    if mode.dual_plane {
        return Err(BlockError::DualPlane);
    }

    let partitions = block.bits(11, 2) as u32 + 1;
    if partitions != 1 {
        return Err(BlockError::PartitionCount(partitions));
    }

    let endpoint_mode = ColourEndpointMode::from_raw(block.bits(13, 4) as u32)?;
    let (e0, e1) = read_endpoints(block, &mode, endpoint_mode)?;

    let mut grid = [0u8; MAX_WEIGHTS_PER_BLOCK];
    read_weights(block, &mode, &mut grid)?;

    for (index, texel) in texels.iter_mut().enumerate() {
        let s = index as u32 % block_width;
        let t = index as u32 / block_width;
        let weight = TexelContributions::new(
            block_width,
            block_height,
            mode.grid_width,
            mode.grid_height,
            s,
            t,
        )
        .apply(&grid);
        *texel = interpolate(&e0, &e1, weight, colour_space);
    }
    Ok(())
}

fn read_endpoints(
    block: u128,
    mode: &BlockMode,
    endpoint_mode: ColourEndpointMode,
) -> Result<(Endpoint, Endpoint), BlockError> {
    let value_count = endpoint_mode.value_count() as u32;
    let available = 128u32
        .checked_sub(COLOUR_DATA_START + mode.weight_bits())
        .ok_or(BlockError::InsufficientColourBits)?;
    let levels =
        colour_levels_for(value_count, available).ok_or(BlockError::InsufficientColourBits)?;
    let bits = IseEncoding::for_levels(levels)
        .and_then(IseEncoding::plain_bits)
        .ok_or(BlockError::ColourRange(levels))?;

    let mut values = [0u8; 8];
    for (index, value) in values.iter_mut().take(value_count as usize).enumerate() {
        let raw = block.bits(COLOUR_DATA_START + index as u32 * bits, bits) as u32;
        *value = unquantise_colour(raw, bits) as u8;
    }
    Ok(endpoint_mode.unpack(&values))
}

#[inline]
fn interpolate(e0: &Endpoint, e1: &Endpoint, weight: u32, colour_space: ColourSpace) -> Texel {
    let mut texel = [0; 4];
    for (channel, value) in texel.iter_mut().enumerate() {
        let c0 = colour_space.expand(e0[channel], channel);
        let c1 = colour_space.expand(e1[channel], channel);
        *value = ((c0 * (64 - weight) + c1 * weight + 32) >> 6) as u16;
    }
    texel
}
