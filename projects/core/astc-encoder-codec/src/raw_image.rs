//! Uncompressed images and the compression entry point.

use crate::block::{BlockEncoder, ColourSpace, EncoderEffort, MAX_TEXELS_PER_BLOCK};
use crate::block::endpoints::ColourEndpointMode;
use crate::error::CodecError;
use crate::error_info::AstcErrorInfo;
use crate::footprint::{BlockFootprint, ASTC_BLOCK_SIZE};
use crate::image::{AstcImage, CompressedImageInner};
use crate::texels::PixelLayout;
use crate::util::ref_count::RefCounted;
use crate::AstcProgressCallback;
use core::ffi::c_void;
use core::ptr;
use log::debug;

/// Opaque, reference counted uncompressed 2D image.
///
/// - Created with [`astc_raw_image_create`] or returned by [`astc_image_decompress`](crate::astc_image_decompress)
/// - Shared with [`astc_raw_image_retain`]
/// - Freed with [`astc_raw_image_release`] once per reference
///
/// The pixel data is immutable after creation, so a raw image may be shared between threads.
#[repr(C)]
pub struct AstcRawImage {
    _private: [u8; 0],
}

/// Internal representation of [`AstcRawImage`].
#[derive(Debug, Clone)]
pub(crate) struct RawImageInner {
    pub(crate) data: Vec<u8>,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) layout: PixelLayout,
    pub(crate) linear: bool,
    pub(crate) hdr: bool,
}

impl RawImageInner {
    /// Validates the shape and copies `data`.
    pub(crate) fn new(
        data: Option<&[u8]>,
        width: usize,
        height: usize,
        num_components: usize,
        component_size: usize,
        linear: bool,
        hdr: bool,
    ) -> Result<Self, CodecError> {
        let data = data.ok_or(CodecError::MissingData)?;
        let layout = validate_shape(width, height, num_components, component_size)?;
        let expected = layout
            .image_size(width, height)
            .ok_or(CodecError::DimensionsTooLarge)?;
        if data.len() != expected {
            return Err(CodecError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data: copy_buffer(data)?,
            width,
            height,
            layout,
            linear,
            hdr,
        })
    }

    /// Compresses the image, reporting progress once per row of blocks.
    ///
    /// `progress` returns `true` to stop; it is not called again after that.
    pub(crate) fn compress(
        &self,
        footprint: BlockFootprint,
        quality: f32,
        progress: &mut dyn FnMut(f32) -> bool,
    ) -> Result<CompressedImageInner, CodecError> {
        if !(0.0..=1.0).contains(&quality) {
            return Err(CodecError::InvalidQuality(quality));
        }

        let blocks_x = footprint.blocks_x(self.width);
        let blocks_y = footprint.blocks_y(self.height);
        let size = footprint
            .compressed_size(self.width, self.height)
            .ok_or(CodecError::DimensionsTooLarge)?;
        let mut output = allocate(size)?;

        debug!(
            "Compressing {}x{} image ({} components) with {}x{} blocks at quality {quality}",
            self.width,
            self.height,
            self.layout.num_components,
            footprint.width(),
            footprint.height()
        );

        let encoder = BlockEncoder::new(
            footprint,
            ColourEndpointMode::for_components(self.layout.num_components),
            ColourSpace::from_linear(self.linear),
            EncoderEffort::from_quality(quality),
        );

        let mut texels = [[0f32; 4]; MAX_TEXELS_PER_BLOCK];
        let row_bytes = self.width * self.layout.bytes_per_pixel();
        for block_y in 0..blocks_y {
            for block_x in 0..blocks_x {
                self.gather_block(footprint, block_x, block_y, row_bytes, &mut texels);
                let block = encoder.encode(&texels[..footprint.texel_count()]);
                let offset = (block_y * blocks_x + block_x) * ASTC_BLOCK_SIZE;
                output[offset..offset + ASTC_BLOCK_SIZE].copy_from_slice(&block);
            }

            if progress((block_y + 1) as f32 / blocks_y as f32) {
                debug!("Compression cancelled after {} of {blocks_y} block rows", block_y + 1);
                return Err(CodecError::Cancelled);
            }
        }

        Ok(CompressedImageInner {
            data: output,
            width: self.width,
            height: self.height,
            footprint,
            layout: self.layout,
            linear: self.linear,
            hdr: self.hdr,
        })
    }

    /// Reads one block of texels, clamping coordinates past the image edge.
    fn gather_block(
        &self,
        footprint: BlockFootprint,
        block_x: usize,
        block_y: usize,
        row_bytes: usize,
        texels: &mut [[f32; 4]; MAX_TEXELS_PER_BLOCK],
    ) {
        let pixel_bytes = self.layout.bytes_per_pixel();
        for t in 0..footprint.height() {
            let y = (block_y * footprint.height() + t).min(self.height - 1);
            for s in 0..footprint.width() {
                let x = (block_x * footprint.width() + s).min(self.width - 1);
                let offset = y * row_bytes + x * pixel_bytes;
                texels[t * footprint.width() + s] = self.layout.read(&self.data, offset);
            }
        }
    }
}

/// Checks the image shape shared by raw and compressed images.
pub(crate) fn validate_shape(
    width: usize,
    height: usize,
    num_components: usize,
    component_size: usize,
) -> Result<PixelLayout, CodecError> {
    if width == 0 {
        return Err(CodecError::InvalidWidth);
    }
    if height == 0 {
        return Err(CodecError::InvalidHeight);
    }
    PixelLayout::new(num_components, component_size)
}

/// Allocates a zeroed buffer, reporting failure instead of aborting.
pub(crate) fn allocate(size: usize) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| CodecError::AllocationFailed(size))?;
    buffer.resize(size, 0);
    Ok(buffer)
}

pub(crate) fn copy_buffer(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(data.len())
        .map_err(|_| CodecError::AllocationFailed(data.len()))?;
    buffer.extend_from_slice(data);
    Ok(buffer)
}

/// Resolves a raw pointer and length into a slice, treating null as missing.
///
/// # Safety
///
/// `data` must be null or valid for reads of `data_size` bytes.
pub(crate) unsafe fn slice_from_raw<'a>(data: *const u8, data_size: usize) -> Option<&'a [u8]> {
    if data.is_null() {
        None
    } else {
        Some(unsafe { core::slice::from_raw_parts(data, data_size) })
    }
}

/// Wraps a fallible operation for the C-shaped surface.
///
/// Clears `error`, then returns the object pointer on success, or null with `error` filled in.
pub(crate) fn into_raw_or_error<T, R>(
    result: Result<T, CodecError>,
    error: Option<&mut AstcErrorInfo>,
) -> *mut R {
    let mut error = error;
    if let Some(error) = error.as_deref_mut() {
        error.clear();
    }

    match result {
        Ok(value) => RefCounted::into_raw(value) as *mut R,
        Err(err) => {
            debug!("Codec call failed: {err}");
            if let Some(error) = error {
                error.set(&err);
            }
            ptr::null_mut()
        }
    }
}

#[inline]
pub(crate) unsafe fn raw_image_inner<'a>(image: *const AstcRawImage) -> Option<&'a RawImageInner> {
    unsafe { RefCounted::get(image as *const RefCounted<RawImageInner>) }
}

/// Creates a raw image by copying `data_size` bytes from `data`.
///
/// The caller keeps ownership of `data`. The returned image holds one reference, which
/// must be released with [`astc_raw_image_release`].
///
/// # Parameters
///
/// - `num_components`: 1 (luminance), 2 (luminance + alpha), 3 (RGB) or 4 (RGBA)
/// - `component_size`: 1 (UNORM8), 2 (half float) or 4 (float), in native byte order
/// - `linear`: data is linear rather than sRGB encoded
/// - `hdr`: data uses an extended range; carried as metadata only
///
/// # Returns
///
/// The new image, or null with `error` filled in. `data_size` must equal
/// `width * height * num_components * component_size`.
///
/// # Safety
///
/// - `data` must be null or valid for reads of `data_size` bytes
/// - `error` must be null or valid for writes
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_create(
    data: *const u8,
    data_size: usize,
    width: usize,
    height: usize,
    num_components: usize,
    component_size: usize,
    linear: bool,
    hdr: bool,
    error: *mut AstcErrorInfo,
) -> *mut AstcRawImage {
    let data = unsafe { slice_from_raw(data, data_size) };
    let result = RawImageInner::new(
        data,
        width,
        height,
        num_components,
        component_size,
        linear,
        hdr,
    );
    into_raw_or_error(result, unsafe { AstcErrorInfo::from_ptr(error) })
}

/// Adds a reference to `image` and returns it.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_retain(image: *mut AstcRawImage) -> *mut AstcRawImage {
    unsafe { RefCounted::<RawImageInner>::retain(image as *const RefCounted<RawImageInner>) };
    image
}

/// Drops a reference to `image`, freeing it when no references remain.
///
/// # Safety
///
/// `image` must be null or a live image from this library; the released reference
/// must not be used afterwards.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_release(image: *mut AstcRawImage) {
    unsafe { RefCounted::<RawImageInner>::release(image as *mut RefCounted<RawImageInner>) };
}

/// Pointer to the pixel data of `image`, or null if `image` is null.
///
/// Valid while the caller holds a reference to `image`.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_data(image: *const AstcRawImage) -> *const u8 {
    unsafe { raw_image_inner(image) }.map_or(ptr::null(), |inner| inner.data.as_ptr())
}

/// Size of the pixel data of `image` in bytes.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_data_size(image: *const AstcRawImage) -> usize {
    unsafe { raw_image_inner(image) }.map_or(0, |inner| inner.data.len())
}

/// Width of `image` in pixels.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_width(image: *const AstcRawImage) -> usize {
    unsafe { raw_image_inner(image) }.map_or(0, |inner| inner.width)
}

/// Height of `image` in pixels.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_height(image: *const AstcRawImage) -> usize {
    unsafe { raw_image_inner(image) }.map_or(0, |inner| inner.height)
}

/// Number of components per pixel of `image`.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_num_components(image: *const AstcRawImage) -> usize {
    unsafe { raw_image_inner(image) }.map_or(0, |inner| inner.layout.num_components)
}

/// Size of each component of `image` in bytes.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_component_size(image: *const AstcRawImage) -> usize {
    unsafe { raw_image_inner(image) }.map_or(0, |inner| inner.layout.component.size())
}

/// Whether `image` holds linear rather than sRGB encoded data.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_linear(image: *const AstcRawImage) -> bool {
    unsafe { raw_image_inner(image) }.is_some_and(|inner| inner.linear)
}

/// Whether `image` was flagged as extended range.
///
/// # Safety
///
/// `image` must be null or a live image from this library.
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_hdr(image: *const AstcRawImage) -> bool {
    unsafe { raw_image_inner(image) }.is_some_and(|inner| inner.hdr)
}

/// Compresses `image` with the given block footprint.
///
/// `quality` runs from 0 (fastest) to 1 (best). When `progress_callback` is set it is
/// called once per row of blocks with `user_info` and a progress value in `[0, 1]`.
/// Returning `true` from the callback cancels compression: the callback is not called
/// again and null is returned with [`AstcErrorKind::Cancelled`](crate::AstcErrorKind::Cancelled).
///
/// # Returns
///
/// The compressed image holding one reference, or null with `error` filled in.
///
/// # Safety
///
/// - `image` must be null or a live image from this library
/// - `error` must be null or valid for writes
/// - `progress_callback` must be safe to call with `user_info` for the duration of the call
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_raw_image_compress(
    image: *const AstcRawImage,
    block_width: usize,
    block_height: usize,
    quality: f32,
    error: *mut AstcErrorInfo,
    user_info: *mut c_void,
    progress_callback: Option<AstcProgressCallback>,
) -> *mut AstcImage {
    let result = match unsafe { raw_image_inner(image) } {
        None => Err(CodecError::MissingData),
        Some(inner) => BlockFootprint::from_dimensions(block_width, block_height).and_then(
            |footprint| {
                let mut progress = |value: f32| match progress_callback {
                    Some(callback) => unsafe { callback(user_info, value) },
                    None => false,
                };
                inner.compress(footprint, quality, &mut progress)
            },
        ),
    };

    into_raw_or_error(result, unsafe { AstcErrorInfo::from_ptr(error) })
}
