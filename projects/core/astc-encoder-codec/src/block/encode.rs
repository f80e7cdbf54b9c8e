use super::block_mode::BlockMode;
use super::decode::{decode_block_bits, ColourSpace};
use super::endpoints::{ColourEndpointMode, Endpoint};
use super::quantisation::{colour_levels_for, unquantise_weight};
use super::void_extent::encode_void_extent;
use super::weights::{infill_weights, write_weights, DecimationTable};
use super::{Texel, COLOUR_DATA_START, MAX_TEXELS_PER_BLOCK, MAX_WEIGHTS_PER_BLOCK};
use crate::footprint::BlockFootprint;
use crate::util::BitField;

/// Weight grids tried by the encoder as `(width, height, levels)`, best first.
///
/// Every entry stays under 48 weight bits so 8 colour values still fit at full precision.
const GRID_CANDIDATES: [(u32, u32, u32); 8] = [
    (4, 4, 4),
    (5, 4, 4),
    (4, 5, 4),
    (3, 3, 8),
    (4, 3, 8),
    (3, 4, 8),
    (6, 4, 2),
    (5, 5, 2),
];

/// Number of power iterations used to find the principal axis of a block.
const POWER_ITERATIONS: usize = 8;

/// How much work the encoder spends on each block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EncoderEffort {
    /// Fraction of the usable weight grids to try, in `[0, 1]`.
    pub grid_search: f32,
    /// Endpoint least squares refinement passes.
    pub refine_passes: u32,
    /// Passes of single step weight adjustments.
    pub weight_passes: u32,
}

impl EncoderEffort {
    /// Maps a normalised quality in `[0, 1]` to an effort level.
    ///
    /// Effort grows monotonically with quality.
    pub fn from_quality(quality: f32) -> Self {
        let quality = if quality.is_nan() { 0.0 } else { quality.clamp(0.0, 1.0) };
        let weight_passes = if quality < 0.5 {
            0
        } else if quality > 0.9 {
            2
        } else {
            1
        };

        Self {
            grid_search: quality,
            refine_passes: (quality * 4.0).round() as u32,
            weight_passes,
        }
    }

    fn grid_count(&self, available: usize) -> usize {
        if available == 0 {
            return 0;
        }
        1 + (self.grid_search * (available - 1) as f32).floor() as usize
    }
}

struct GridCandidate {
    mode_bits: u32,
    weight_bits: u32,
    levels: u32,
    table: DecimationTable,
}

/// Encodes blocks of one footprint with one colour endpoint mode.
///
/// Build once per image and reuse; construction precomputes the weight infill tables.
pub struct BlockEncoder {
    footprint: BlockFootprint,
    endpoint_mode: ColourEndpointMode,
    colour_space: ColourSpace,
    effort: EncoderEffort,
    candidates: Vec<GridCandidate>,
}

impl BlockEncoder {
    /// Creates an encoder for the given footprint, endpoint mode, decode colour space and effort.
    pub fn new(
        footprint: BlockFootprint,
        endpoint_mode: ColourEndpointMode,
        colour_space: ColourSpace,
        effort: EncoderEffort,
    ) -> Self {
        let (block_width, block_height) = (footprint.width() as u32, footprint.height() as u32);
        let value_count = endpoint_mode.value_count() as u32;

        let usable: Vec<GridCandidate> = GRID_CANDIDATES
            .iter()
            .filter(|&&(width, height, _)| width <= block_width && height <= block_height)
            .filter_map(|&(width, height, levels)| {
                let mode = BlockMode::new(width, height, levels)?;
                let mode_bits = mode.encode()?;
                let weight_bits = mode.weight_encoding().plain_bits()?;
                let available = 128 - COLOUR_DATA_START - mode.weight_bits();
                (colour_levels_for(value_count, available) == Some(256)).then(|| GridCandidate {
                    mode_bits,
                    weight_bits,
                    levels,
                    table: DecimationTable::new(block_width, block_height, width, height),
                })
            })
            .collect();

        let count = effort.grid_count(usable.len());
        let candidates = usable.into_iter().take(count).collect();

        Self {
            footprint,
            endpoint_mode,
            colour_space,
            effort,
            candidates,
        }
    }

    /// The footprint this encoder produces blocks for.
    pub fn footprint(&self) -> BlockFootprint {
        self.footprint
    }

    /// Encodes one block of texels with RGBA channels in `[0, 1]`, in row-major order.
    ///
    /// `texels` must hold [`BlockFootprint::texel_count`] entries.
    pub fn encode(&self, texels: &[[f32; 4]]) -> [u8; 16] {
        let count = self.footprint.texel_count();
        let mut points = [[0f32; 4]; MAX_TEXELS_PER_BLOCK];
        let mut targets = [[0u16; 4]; MAX_TEXELS_PER_BLOCK];
        for ((texel, point), target) in texels.iter().zip(&mut points).zip(&mut targets).take(count) {
            for channel in 0..4 {
                let value = texel[channel].clamp(0.0, 1.0);
                point[channel] = value * 255.0;
                target[channel] = (value * 65535.0).round() as u16;
            }
        }

        let targets = &targets[..count];
        if targets.iter().all(|target| *target == targets[0]) {
            return encode_void_extent(targets[0]).to_le_bytes();
        }

        let points = &points[..count];
        let mut best: Option<(u128, u64)> = None;
        for candidate in &self.candidates {
            let (block, error) = self.encode_with_grid(candidate, points, targets);
            if best.is_none_or(|(_, best_error)| error < best_error) {
                best = Some((block, error));
            }
            if error == 0 {
                break;
            }
        }

        // Candidates only run out for footprints smaller than every grid, which never happens.
        let (block, _) = best.unwrap_or_else(|| (encode_void_extent(targets[0]), 0));
        block.to_le_bytes()
    }

    fn encode_with_grid(
        &self,
        candidate: &GridCandidate,
        points: &[[f32; 4]],
        targets: &[Texel],
    ) -> (u128, u64) {
        let (e0, e1) = principal_endpoints(points);
        let mut endpoints = (quantise_endpoint(&e0), quantise_endpoint(&e1));
        let mut weights = fit_weights(candidate, points, &endpoints);
        let mut block = self.pack(candidate, &endpoints, &weights);
        let mut error = self.block_error(block, targets);

        for _ in 0..self.effort.refine_passes {
            let texel_weights = decoded_texel_weights(candidate, &weights);
            let Some(refit) = refit_endpoints(points, &texel_weights, &endpoints) else {
                break;
            };
            let refit_weights = fit_weights(candidate, points, &refit);
            let refit_block = self.pack(candidate, &refit, &refit_weights);
            let refit_error = self.block_error(refit_block, targets);
            if refit_error >= error {
                break;
            }

            endpoints = refit;
            weights = refit_weights;
            block = refit_block;
            error = refit_error;
        }

        let grid_size = candidate.table.grid_size();
        for _ in 0..self.effort.weight_passes {
            let mut improved = false;
            for index in 0..grid_size {
                for step in [-1i32, 1] {
                    let original = weights[index];
                    let adjusted = original as i32 + step;
                    if adjusted < 0 || adjusted >= candidate.levels as i32 {
                        continue;
                    }

                    weights[index] = adjusted as u8;
                    let adjusted_block = self.pack(candidate, &endpoints, &weights);
                    let adjusted_error = self.block_error(adjusted_block, targets);
                    if adjusted_error < error {
                        block = adjusted_block;
                        error = adjusted_error;
                        improved = true;
                    } else {
                        weights[index] = original;
                    }
                }
            }
            if !improved {
                break;
            }
        }

        (block, error)
    }

    fn pack(
        &self,
        candidate: &GridCandidate,
        endpoints: &(Endpoint, Endpoint),
        weights: &[u8; MAX_WEIGHTS_PER_BLOCK],
    ) -> u128 {
        let mut values = [0u8; 8];
        let swapped = self
            .endpoint_mode
            .pack(&endpoints.0, &endpoints.1, &mut values);

        let mut block = (candidate.mode_bits as u128).with_bits(13, 4, self.endpoint_mode.raw() as u128);
        for (index, &value) in values
            .iter()
            .take(self.endpoint_mode.value_count())
            .enumerate()
        {
            block = block.with_bits(COLOUR_DATA_START + index as u32 * 8, 8, value as u128);
        }

        let grid_size = candidate.table.grid_size();
        let mut stored = *weights;
        if swapped {
            let max = (candidate.levels - 1) as u8;
            for weight in &mut stored[..grid_size] {
                *weight = max - *weight;
            }
        }
        write_weights(block, candidate.weight_bits, &stored[..grid_size])
    }

    fn block_error(&self, block: u128, targets: &[Texel]) -> u64 {
        let mut decoded = [[0u16; 4]; MAX_TEXELS_PER_BLOCK];
        let decoded = &mut decoded[..targets.len()];
        if decode_block_bits(block, self.footprint, self.colour_space, decoded).is_err() {
            return u64::MAX;
        }

        decoded
            .iter()
            .zip(targets)
            .flat_map(|(decoded, target)| decoded.iter().zip(target))
            .map(|(&d, &t)| {
                let diff = d as i64 - t as i64;
                (diff * diff) as u64
            })
            .sum()
    }
}

#[inline]
fn dot(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn sub(a: &[f32; 4], b: &[f32; 4]) -> [f32; 4] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
}

/// Endpoints at the extremes of the block's principal axis, in `0..=255` units.
fn principal_endpoints(points: &[[f32; 4]]) -> ([f32; 4], [f32; 4]) {
    let count = points.len().max(1) as f32;
    let mut mean = [0f32; 4];
    for point in points {
        for channel in 0..4 {
            mean[channel] += point[channel];
        }
    }
    mean = mean.map(|sum| sum / count);

    let mut covariance = [[0f32; 4]; 4];
    for point in points {
        let offset = sub(point, &mean);
        for row in 0..4 {
            for column in 0..4 {
                covariance[row][column] += offset[row] * offset[column];
            }
        }
    }

    // Start from the covariance column of the channel with the largest variance.
    let widest = (0..4)
        .max_by(|&a, &b| covariance[a][a].total_cmp(&covariance[b][b]))
        .unwrap_or(0);
    let mut axis = covariance[widest];
    for _ in 0..POWER_ITERATIONS {
        let mut next = [0f32; 4];
        for (row, value) in next.iter_mut().enumerate() {
            *value = dot(&covariance[row], &axis);
        }
        let length = dot(&next, &next).sqrt();
        if length <= f32::EPSILON {
            return (mean, mean);
        }
        axis = next.map(|value| value / length);
    }

    let (mut low, mut high) = (f32::MAX, f32::MIN);
    for point in points {
        let projection = dot(&sub(point, &mean), &axis);
        low = low.min(projection);
        high = high.max(projection);
    }

    let along = |distance: f32| {
        let mut endpoint = [0f32; 4];
        for channel in 0..4 {
            endpoint[channel] = mean[channel] + axis[channel] * distance;
        }
        endpoint
    };
    (along(low), along(high))
}

#[inline]
fn quantise_endpoint(endpoint: &[f32; 4]) -> Endpoint {
    endpoint.map(|value| value.round().clamp(0.0, 255.0) as u8)
}

/// Projects each texel onto the endpoint line and averages the projections onto the grid.
fn fit_weights(
    candidate: &GridCandidate,
    points: &[[f32; 4]],
    endpoints: &(Endpoint, Endpoint),
) -> [u8; MAX_WEIGHTS_PER_BLOCK] {
    let e0 = endpoints.0.map(f32::from);
    let e1 = endpoints.1.map(f32::from);
    let direction = sub(&e1, &e0);
    let length_squared = dot(&direction, &direction);

    let mut sums = [0f32; MAX_WEIGHTS_PER_BLOCK];
    let mut totals = [0f32; MAX_WEIGHTS_PER_BLOCK];
    for (point, contributions) in points.iter().zip(candidate.table.texels()) {
        let ideal = if length_squared > 0.0 {
            (dot(&sub(point, &e0), &direction) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };

        for (&index, &factor) in contributions.indices.iter().zip(&contributions.factors) {
            let factor = factor as f32;
            sums[index as usize] += ideal * factor;
            totals[index as usize] += factor;
        }
    }

    let max = (candidate.levels - 1) as f32;
    let mut weights = [0u8; MAX_WEIGHTS_PER_BLOCK];
    for ((weight, &sum), &total) in weights
        .iter_mut()
        .zip(&sums)
        .zip(&totals)
        .take(candidate.table.grid_size())
    {
        let average = if total > 0.0 { sum / total } else { 0.0 };
        *weight = (average * max).round().clamp(0.0, max) as u8;
    }
    weights
}

/// The per texel interpolation weights, as fractions, that the decoder will see.
fn decoded_texel_weights(
    candidate: &GridCandidate,
    weights: &[u8; MAX_WEIGHTS_PER_BLOCK],
) -> [f32; MAX_TEXELS_PER_BLOCK] {
    let mut grid = [0u8; MAX_WEIGHTS_PER_BLOCK];
    for (unquantised, &weight) in grid.iter_mut().zip(weights).take(candidate.table.grid_size()) {
        *unquantised = unquantise_weight(weight as u32, candidate.weight_bits) as u8;
    }

    let mut texel_weights = [0u8; MAX_TEXELS_PER_BLOCK];
    infill_weights(&candidate.table, &grid, &mut texel_weights);
    texel_weights.map(|weight| weight as f32 / 64.0)
}

/// Least squares endpoints for fixed texel weights, or [`None`] if the weights are degenerate.
fn refit_endpoints(
    points: &[[f32; 4]],
    texel_weights: &[f32; MAX_TEXELS_PER_BLOCK],
    current: &(Endpoint, Endpoint),
) -> Option<(Endpoint, Endpoint)> {
    let (mut aa, mut ab, mut bb) = (0f32, 0f32, 0f32);
    let mut rhs_a = [0f32; 4];
    let mut rhs_b = [0f32; 4];
    for (point, &weight) in points.iter().zip(texel_weights) {
        let inverse = 1.0 - weight;
        aa += inverse * inverse;
        ab += inverse * weight;
        bb += weight * weight;
        for channel in 0..4 {
            rhs_a[channel] += inverse * point[channel];
            rhs_b[channel] += weight * point[channel];
        }
    }

    let determinant = aa * bb - ab * ab;
    if determinant.abs() < 1e-4 {
        return None;
    }

    let mut e0 = [0f32; 4];
    let mut e1 = [0f32; 4];
    for channel in 0..4 {
        e0[channel] = (bb * rhs_a[channel] - ab * rhs_b[channel]) / determinant;
        e1[channel] = (aa * rhs_b[channel] - ab * rhs_a[channel]) / determinant;
    }

    let refit = (quantise_endpoint(&e0), quantise_endpoint(&e1));
    (refit != *current).then_some(refit)
}
