//! Compressed images and the decompression entry point.

use crate::block::{decode_block, ColourSpace, MAX_TEXELS_PER_BLOCK};
use crate::error::CodecError;
use crate::error_info::AstcErrorInfo;
use crate::footprint::{BlockFootprint, ASTC_BLOCK_SIZE};
use crate::raw_image::{
    allocate, copy_buffer, into_raw_or_error, slice_from_raw, validate_shape, AstcRawImage,
    RawImageInner,
};
use crate::texels::PixelLayout;
use crate::util::ref_count::RefCounted;
use crate::AstcProgressCallback;
use core::ffi::c_void;
use core::ptr;
use log::debug;

/// Opaque, reference counted ASTC compressed 2D image.
///
/// - Returned by [`astc_raw_image_compress`](crate::astc_raw_image_compress) or rebuilt
///   from stored bytes with [`astc_image_create`]
/// - Shared with [`astc_image_retain`]
/// - Freed with [`astc_image_release`] once per reference
#[repr(C)]
pub struct AstcImage {
    _private: [u8; 0],
}

/// Internal representation of [`AstcImage`].
#[derive(Debug, Clone)]
pub(crate) struct CompressedImageInner {
    pub(crate) data: Vec<u8>,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) footprint: BlockFootprint,
    pub(crate) layout: PixelLayout,
    pub(crate) linear: bool,
    pub(crate) hdr: bool,
}

impl CompressedImageInner {
    /// Decompresses the image, reporting progress once per row of blocks.
    pub(crate) fn decompress(
        &self,
        progress: &mut dyn FnMut(f32),
    ) -> Result<RawImageInner, CodecError> {
        let size = self
            .layout
            .image_size(self.width, self.height)
            .ok_or(CodecError::DimensionsTooLarge)?;
        let mut output = allocate(size)?;

        let footprint = self.footprint;
        let colour_space = ColourSpace::from_linear(self.linear);
        let blocks_x = footprint.blocks_x(self.width);
        let blocks_y = footprint.blocks_y(self.height);
        let pixel_bytes = self.layout.bytes_per_pixel();
        let row_bytes = self.width * pixel_bytes;

        let mut invalid_blocks = 0usize;
        let mut texels = [[0u16; 4]; MAX_TEXELS_PER_BLOCK];
        for (block_y, row) in self.data.chunks_exact(blocks_x * ASTC_BLOCK_SIZE).enumerate() {
            for (block_x, block) in row.chunks_exact(ASTC_BLOCK_SIZE).enumerate() {
                let mut bytes = [0u8; ASTC_BLOCK_SIZE];
                bytes.copy_from_slice(block);
                if decode_block(&bytes, footprint, colour_space, &mut texels).is_err() {
                    invalid_blocks += 1;
                }

                // Texels past the image edge are dropped.
                for t in 0..footprint.height() {
                    let y = block_y * footprint.height() + t;
                    if y >= self.height {
                        break;
                    }
                    for s in 0..footprint.width() {
                        let x = block_x * footprint.width() + s;
                        if x >= self.width {
                            break;
                        }
                        let texel = &texels[t * footprint.width() + s];
                        self.layout
                            .write(&mut output, y * row_bytes + x * pixel_bytes, texel);
                    }
                }
            }
            progress((block_y + 1) as f32 / blocks_y as f32);
        }

        if invalid_blocks > 0 {
            debug!("Decoded {invalid_blocks} unsupported blocks as the error colour");
        }

        Ok(RawImageInner {
            data: output,
            width: self.width,
            height: self.height,
            layout: self.layout,
            linear: self.linear,
            hdr: self.hdr,
        })
    }
}

#[inline]
unsafe fn image_inner<'a>(image: *const AstcImage) -> Option<&'a CompressedImageInner> {
    unsafe { RefCounted::get(image as *const RefCounted<CompressedImageInner>) }
}

/// Rebuilds a compressed image from stored block data.
///
/// Copies `data_size` bytes from `data`, which must hold exactly
/// `ceil(width / block_width) * ceil(height / block_height) * 16` bytes.
/// `num_components`, `component_size`, `linear` and `hdr` describe the image
/// produced by [`astc_image_decompress`].
///
/// # Returns
///
/// The compressed image holding one reference, or null with `error` filled in.
///
/// # Safety
///
/// - `data` must be null or valid for reads of `data_size` bytes
/// - `error` must be null or valid for writes
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_create(
    data: *const u8,
    data_size: usize,
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
    num_components: usize,
    component_size: usize,
    linear: bool,
    hdr: bool,
    error: *mut AstcErrorInfo,
) -> *mut AstcImage {
    let data = unsafe { slice_from_raw(data, data_size) };
    let result = (|| {
        let data = data.ok_or(CodecError::MissingData)?;
        let layout = validate_shape(width, height, num_components, component_size)?;
        let footprint = BlockFootprint::from_dimensions(block_width, block_height)?;
        let expected = footprint
            .compressed_size(width, height)
            .ok_or(CodecError::DimensionsTooLarge)?;
        if data.len() != expected {
            return Err(CodecError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(CompressedImageInner {
            data: copy_buffer(data)?,
            width,
            height,
            footprint,
            layout,
            linear,
            hdr,
        })
    })();

    into_raw_or_error(result, unsafe { AstcErrorInfo::from_ptr(error) })
}

/// Adds a reference to `image` and returns it.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_retain(image: *mut AstcImage) -> *mut AstcImage {
    unsafe {
        RefCounted::<CompressedImageInner>::retain(
            image as *const RefCounted<CompressedImageInner>,
        )
    };
    image
}

/// Drops a reference to `image`, freeing it when no references remain.
///
/// # Safety
///
/// `image` must be null or a live image from this library; the released reference
/// must not be used afterwards.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_release(image: *mut AstcImage) {
    unsafe {
        RefCounted::<CompressedImageInner>::release(image as *mut RefCounted<CompressedImageInner>)
    };
}

/// Pointer to the block data of `image`, or null if `image` is null.
///
/// Valid while the caller holds a reference to `image`.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_data(image: *const AstcImage) -> *const u8 {
    unsafe { image_inner(image) }.map_or(ptr::null(), |inner| inner.data.as_ptr())
}

/// Size of the block data of `image` in bytes.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_data_size(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.data.len())
}

/// Width of `image` in pixels.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_width(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.width)
}

/// Height of `image` in pixels.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_height(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.height)
}

/// Block width of `image` in texels.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_block_width(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.footprint.width())
}

/// Block height of `image` in texels.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_block_height(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.footprint.height())
}

/// Number of components per pixel of the decompressed image.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_num_components(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.layout.num_components)
}

/// Size of each component of the decompressed image in bytes.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_component_size(image: *const AstcImage) -> usize {
    unsafe { image_inner(image) }.map_or(0, |inner| inner.layout.component.size())
}

/// Whether `image` decodes to linear rather than sRGB encoded data.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_linear(image: *const AstcImage) -> bool {
    unsafe { image_inner(image) }.is_some_and(|inner| inner.linear)
}

/// Whether `image` was flagged as extended range.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_hdr(image: *const AstcImage) -> bool {
    unsafe { image_inner(image) }.is_some_and(|inner| inner.hdr)
}

/// Decompresses `image` into a new raw image.
///
/// When `progress_callback` is set it is called once per row of blocks with `user_info`
/// and a progress value in `[0, 1]`; its return value is ignored.
///
/// # Returns
///
/// The raw image holding one reference, or null with `error` filled in.
///
/// # Safety
///
/// - `image` must be null or a live image from this library
/// - `error` must be null or valid for writes
/// - `progress_callback` must be safe to call with `user_info` for the duration of the call
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_image_decompress(
    image: *const AstcImage,
    error: *mut AstcErrorInfo,
    user_info: *mut c_void,
    progress_callback: Option<AstcProgressCallback>,
) -> *mut AstcRawImage {
    let result = match unsafe { image_inner(image) } {
        None => Err(CodecError::MissingData),
        Some(inner) => inner.decompress(&mut |value| {
            if let Some(callback) = progress_callback {
                unsafe { callback(user_info, value) };
            }
        }),
    };

    into_raw_or_error(result, unsafe { AstcErrorInfo::from_ptr(error) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_info::AstcErrorKind;
    use crate::raw_image::*;
    use crate::test_prelude::*;
    use rstest::rstest;

    unsafe fn raw_pixels<'a>(image: *const AstcRawImage) -> &'a [u8] {
        unsafe {
            core::slice::from_raw_parts(astc_raw_image_data(image), astc_raw_image_data_size(image))
        }
    }

    #[rstest]
    #[case(4, 4, 4, 4)]
    #[case(17, 9, 6, 6)]
    #[case(33, 20, 8, 5)]
    #[case(1, 1, 12, 12)]
    fn round_trip_preserves_shape_and_stays_close(
        #[case] width: usize,
        #[case] height: usize,
        #[case] block_width: usize,
        #[case] block_height: usize,
    ) {
        let pixels = smooth_pixels(width, height, 4);
        let raw = create_raw(&pixels, width, height, 4, 1).unwrap();
        let mut error = AstcErrorInfo::new();
        unsafe {
            let compressed = astc_raw_image_compress(
                raw,
                block_width,
                block_height,
                0.6,
                &mut error,
                ptr::null_mut(),
                None,
            );
            assert!(!compressed.is_null(), "{error:?}");
            let decoded = astc_image_decompress(compressed, &mut error, ptr::null_mut(), None);
            assert!(!decoded.is_null(), "{error:?}");

            assert_eq!(astc_raw_image_width(decoded), width);
            assert_eq!(astc_raw_image_height(decoded), height);
            assert_eq!(astc_raw_image_num_components(decoded), 4);
            assert_eq!(astc_raw_image_component_size(decoded), 1);

            let error = mean_absolute_error(raw_pixels(raw), raw_pixels(decoded));
            assert!(error < 16.0, "mean error {error}");

            astc_raw_image_release(decoded);
            astc_image_release(compressed);
            astc_raw_image_release(raw);
        }
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 1)]
    #[case(4, 2)]
    #[case(3, 4)]
    fn decompression_keeps_component_layout(
        #[case] num_components: usize,
        #[case] component_size: usize,
    ) {
        let pixels = vec![0u8; 8 * 8 * num_components * component_size];
        let raw = create_raw(&pixels, 8, 8, num_components, component_size).unwrap();
        let mut error = AstcErrorInfo::new();
        unsafe {
            let compressed =
                astc_raw_image_compress(raw, 4, 4, 0.0, &mut error, ptr::null_mut(), None);
            let decoded = astc_image_decompress(compressed, &mut error, ptr::null_mut(), None);
            assert_eq!(astc_raw_image_num_components(decoded), num_components);
            assert_eq!(astc_raw_image_component_size(decoded), component_size);
            assert_eq!(raw_pixels(decoded), pixels.as_slice());

            astc_raw_image_release(decoded);
            astc_image_release(compressed);
            astc_raw_image_release(raw);
        }
    }

    #[test]
    fn create_rebuilds_from_stored_blocks() {
        let blocks = vec![0u8; 2 * 2 * 16];
        let mut error = AstcErrorInfo::new();
        unsafe {
            let image = astc_image_create(
                blocks.as_ptr(),
                blocks.len(),
                8,
                8,
                4,
                4,
                4,
                1,
                false,
                false,
                &mut error,
            );
            assert!(!image.is_null());
            assert_eq!(astc_image_data_size(image), 64);

            // All zero blocks are reserved and decode to magenta.
            let decoded = astc_image_decompress(image, &mut error, ptr::null_mut(), None);
            assert!(!decoded.is_null());
            assert_eq!(&raw_pixels(decoded)[..4], &[0xFF, 0x00, 0xFF, 0xFF]);

            astc_raw_image_release(decoded);
            astc_image_release(image);
        }
    }

    #[test]
    fn create_rejects_truncated_blocks() {
        let blocks = vec![0u8; 48];
        let mut error = AstcErrorInfo::new();
        let image = unsafe {
            astc_image_create(
                blocks.as_ptr(),
                blocks.len(),
                8,
                8,
                4,
                4,
                4,
                1,
                false,
                false,
                &mut error,
            )
        };
        assert!(image.is_null());
        assert_eq!(error.kind(), AstcErrorKind::InvalidInput);
    }

    #[test]
    fn decompress_reports_progress_and_ignores_cancel() {
        let pixels = vec![0u8; 8 * 12];
        let raw = create_raw(&pixels, 8, 12, 1, 1).unwrap();
        let mut recorder = ProgressRecorder {
            cancel_after: Some(1),
            ..Default::default()
        };
        let mut error = AstcErrorInfo::new();
        unsafe {
            let compressed =
                astc_raw_image_compress(raw, 4, 4, 0.0, &mut error, ptr::null_mut(), None);
            let decoded = astc_image_decompress(
                compressed,
                &mut error,
                &mut recorder as *mut ProgressRecorder as *mut c_void,
                Some(ProgressRecorder::callback),
            );
            assert!(!decoded.is_null());
            astc_raw_image_release(decoded);
            astc_image_release(compressed);
            astc_raw_image_release(raw);
        }
        assert_eq!(recorder.values, [1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn null_image_is_reported() {
        let mut error = AstcErrorInfo::new();
        let decoded =
            unsafe { astc_image_decompress(ptr::null(), &mut error, ptr::null_mut(), None) };
        assert!(decoded.is_null());
        assert_eq!(error.kind(), AstcErrorKind::InvalidInput);
    }
}
