//! Weight grid storage and bilinear infill onto the texel footprint.

use super::block_mode::BlockMode;
use super::quantisation::unquantise_weight;
use super::{BlockError, MAX_TEXELS_PER_BLOCK, MAX_WEIGHTS_PER_BLOCK};
use crate::util::{read_reversed_bits, write_reversed_bits};

/// The contribution of up to four grid weights to one texel.
///
/// Factors are in sixteenths and sum to 16.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TexelContributions {
    /// Grid weight indices
    pub indices: [u8; 4],
    /// Factors applied to each grid weight
    pub factors: [u8; 4],
}

impl TexelContributions {
    /// Computes the contributions for texel `(s, t)` of a `block_width` x `block_height`
    /// footprint sampled from a `grid_width` x `grid_height` weight grid.
    pub fn new(
        block_width: u32,
        block_height: u32,
        grid_width: u32,
        grid_height: u32,
        s: u32,
        t: u32,
    ) -> Self {
        let scale_s = (1024 + block_width / 2) / (block_width - 1);
        let scale_t = (1024 + block_height / 2) / (block_height - 1);
        let gs = (scale_s * s * (grid_width - 1) + 32) >> 6;
        let gt = (scale_t * t * (grid_height - 1) + 32) >> 6;
        let (js, fs) = (gs >> 4, gs & 0xF);
        let (jt, ft) = (gt >> 4, gt & 0xF);

        let w11 = (fs * ft + 8) >> 4;
        let w10 = ft - w11;
        let w01 = fs - w11;
        let w00 = 16 + w11 - fs - ft;

        let base = js + jt * grid_width;
        let candidates = [
            (base, w00),
            (base + 1, w01),
            (base + grid_width, w10),
            (base + grid_width + 1, w11),
        ];

        let mut contributions = Self::default();
        let grid_size = grid_width * grid_height;
        for (slot, (index, factor)) in candidates.into_iter().enumerate() {
            // Samples on the far edge have a zero factor for the neighbour past the grid.
            if index < grid_size && factor != 0 {
                contributions.indices[slot] = index as u8;
                contributions.factors[slot] = factor as u8;
            }
        }
        contributions
    }

    /// Interpolates the unquantised grid weights for this texel.
    #[inline]
    pub fn apply(&self, grid: &[u8]) -> u32 {
        let mut sum = 8;
        for (&index, &factor) in self.indices.iter().zip(&self.factors) {
            sum += grid.get(index as usize).copied().unwrap_or(0) as u32 * factor as u32;
        }
        sum >> 4
    }
}

/// Precomputed infill for one footprint and grid size.
#[derive(Debug, Clone)]
pub struct DecimationTable {
    grid_width: u32,
    grid_height: u32,
    texels: Vec<TexelContributions>,
}

impl DecimationTable {
    /// Builds the table for a footprint and grid.
    pub fn new(block_width: u32, block_height: u32, grid_width: u32, grid_height: u32) -> Self {
        let texels = (0..block_height)
            .flat_map(|t| (0..block_width).map(move |s| (s, t)))
            .map(|(s, t)| {
                TexelContributions::new(block_width, block_height, grid_width, grid_height, s, t)
            })
            .collect();

        Self {
            grid_width,
            grid_height,
            texels,
        }
    }

    /// Number of grid weights.
    pub fn grid_size(&self) -> usize {
        (self.grid_width * self.grid_height) as usize
    }

    /// Per texel contributions in row-major order.
    pub fn texels(&self) -> &[TexelContributions] {
        &self.texels
    }
}

/// Reads the quantised weight grid of a block and unquantises it to `0..=64`.
///
/// Returns the number of grid weights written to `grid`.
pub fn read_weights(
    block: u128,
    mode: &BlockMode,
    grid: &mut [u8; MAX_WEIGHTS_PER_BLOCK],
) -> Result<usize, BlockError> {
    let levels = mode.weight_levels();
    let bits = mode
        .weight_encoding()
        .plain_bits()
        .ok_or(BlockError::WeightRange(levels))?;

    let count = mode.weight_count() as usize;
    for (index, weight) in grid.iter_mut().take(count).enumerate() {
        let raw = read_reversed_bits(block, index as u32 * bits, bits);
        *weight = unquantise_weight(raw, bits) as u8;
    }
    Ok(count)
}

/// Writes quantised weight indices of `bits` bits each into the top of `block`.
pub fn write_weights(block: u128, bits: u32, weights: &[u8]) -> u128 {
    let mut block = block;
    for (index, &weight) in weights.iter().enumerate() {
        block = write_reversed_bits(block, index as u32 * bits, bits, weight as u32);
    }
    block
}

/// Infills per texel weights from an unquantised grid.
pub fn infill_weights(
    table: &DecimationTable,
    grid: &[u8],
    texel_weights: &mut [u8; MAX_TEXELS_PER_BLOCK],
) {
    for (weight, contributions) in texel_weights.iter_mut().zip(table.texels()) {
        *weight = contributions.apply(grid) as u8;
    }
}
