//! Common test helpers shared by the codec's unit tests.

use crate::error_info::AstcErrorInfo;
use crate::footprint::BlockFootprint;
use crate::raw_image::{astc_raw_image_create, AstcRawImage};
use core::ffi::c_void;

/// Creates a linear raw image, returning the error descriptor on failure.
pub(crate) fn create_raw(
    pixels: &[u8],
    width: usize,
    height: usize,
    num_components: usize,
    component_size: usize,
) -> Result<*mut AstcRawImage, AstcErrorInfo> {
    let mut error = AstcErrorInfo::new();
    let image = unsafe {
        astc_raw_image_create(
            pixels.as_ptr(),
            pixels.len(),
            width,
            height,
            num_components,
            component_size,
            true,
            false,
            &mut error,
        )
    };

    if image.is_null() {
        Err(error)
    } else {
        Ok(image)
    }
}

/// Records progress values and optionally asks the codec to stop.
#[derive(Default)]
pub(crate) struct ProgressRecorder {
    pub(crate) values: Vec<f32>,
    /// Request cancellation once this many values were recorded.
    pub(crate) cancel_after: Option<usize>,
}

impl ProgressRecorder {
    pub(crate) unsafe extern "C" fn callback(user_info: *mut c_void, progress: f32) -> bool {
        let recorder = unsafe { &mut *(user_info as *mut ProgressRecorder) };
        recorder.values.push(progress);
        recorder
            .cancel_after
            .is_some_and(|limit| recorder.values.len() >= limit)
    }
}

/// Small deterministic generator so tests do not depend on a random source.
pub(crate) struct XorShift(u64);

impl XorShift {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    pub(crate) fn next_u8(&mut self) -> u8 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 56) as u8
    }
}

/// Pixels with no structure at all.
pub(crate) fn noisy_pixels(width: usize, height: usize, num_components: usize) -> Vec<u8> {
    let mut random = XorShift::new((width * height) as u64);
    (0..width * height * num_components)
        .map(|_| random.next_u8())
        .collect()
}

/// RGBA8 pixels along a diagonal colour ramp.
pub(crate) fn smooth_pixels(width: usize, height: usize, num_components: usize) -> Vec<u8> {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    let mut pixels = Vec::with_capacity(width * height * num_components);
    for y in 0..height {
        for x in 0..width {
            let t = (x + y) as f32 / span;
            let colour = [t, 0.5 * t + 0.25, 1.0 - t, 1.0];
            pixels.extend(
                colour
                    .iter()
                    .take(num_components)
                    .map(|c| (c * 255.0).round() as u8),
            );
        }
    }
    pixels
}

/// One block of RGBA texels along a colour ramp.
pub(crate) fn gradient_block(footprint: BlockFootprint) -> Vec<[f32; 4]> {
    let span = (footprint.width() + footprint.height() - 2) as f32;
    (0..footprint.height())
        .flat_map(|t| (0..footprint.width()).map(move |s| (s, t)))
        .map(|(s, t)| {
            let v = (s + t) as f32 / span;
            [0.3 + 0.4 * v, 0.5 + 0.2 * v, 0.7 - 0.4 * v, 1.0]
        })
        .collect()
}

/// One block of random RGBA texels.
pub(crate) fn noisy_block(footprint: BlockFootprint, seed: u64) -> Vec<[f32; 4]> {
    let mut random = XorShift::new(seed);
    (0..footprint.texel_count())
        .map(|_| [(); 4].map(|_| random.next_u8() as f32 / 255.0))
        .collect()
}

/// Mean absolute difference between two byte buffers of equal length.
pub(crate) fn mean_absolute_error(a: &[u8], b: &[u8]) -> f32 {
    assert_eq!(a.len(), b.len());
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs() as u64)
        .sum();
    total as f32 / a.len().max(1) as f32
}
