//! ASTC bitstreams and their decompression.

use crate::callback::ProgressContext;
use crate::error::{AstcError, to_error};
use crate::raw_image::RawImage;
use astc_encoder_codec::{
    AstcErrorInfo, astc_image_block_height, astc_image_block_width, astc_image_component_size,
    astc_image_create, astc_image_data, astc_image_data_size, astc_image_decompress,
    astc_image_hdr, astc_image_height, astc_image_linear, astc_image_num_components,
    astc_image_release, astc_image_retain, astc_image_width,
};
use core::ptr::NonNull;

/// Pixel layout a compressed image decompresses into.
///
/// ASTC blocks do not record the layout of the source pixels, so it travels
/// alongside the bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Number of interleaved components per pixel (1 to 4).
    pub num_components: usize,
    /// Size of one component in bytes (1, 2 or 4).
    pub component_size: usize,
    /// Whether colour values are linear rather than sRGB encoded.
    pub linear: bool,
    /// Whether the image holds high dynamic range data.
    pub hdr: bool,
}

impl Default for PixelFormat {
    /// 8 bit RGBA, sRGB encoded.
    fn default() -> Self {
        Self {
            num_components: 4,
            component_size: 1,
            linear: false,
            hdr: false,
        }
    }
}

/// An ASTC bitstream plus the shape needed to decode it.
///
/// Produced by compressing a [`RawImage`], or rebuilt from stored blocks with
/// [`AstcImage::from_block_data`]. Cloning only adds a reference.
pub struct AstcImage {
    image: NonNull<astc_encoder_codec::AstcImage>,
}

// SAFETY: compressed images are immutable after creation and reference counted atomically.
unsafe impl Send for AstcImage {}
unsafe impl Sync for AstcImage {}

impl AstcImage {
    /// Rebuilds a compressed image from its block data, copying `data`.
    ///
    /// # Errors
    ///
    /// [`AstcError::InvalidInput`] if the footprint is unsupported, the format is
    /// invalid, or `data.len()` does not match the block count for `width` x `height`.
    pub fn from_block_data(
        data: &[u8],
        width: usize,
        height: usize,
        block_width: usize,
        block_height: usize,
        format: PixelFormat,
    ) -> Result<Self, AstcError> {
        let mut error = AstcErrorInfo::new();
        // SAFETY: `data` is valid for reads of `data.len()` bytes and `error` for writes.
        let image = unsafe {
            astc_image_create(
                data.as_ptr(),
                data.len(),
                width,
                height,
                block_width,
                block_height,
                format.num_components,
                format.component_size,
                format.linear,
                format.hdr,
                &mut error,
            )
        };

        match NonNull::new(image) {
            Some(image) => Ok(unsafe { Self::from_raw(image) }),
            None => Err(to_error(&error)),
        }
    }

    /// Takes ownership of one reference to a codec compressed image.
    ///
    /// # Safety
    ///
    /// `image` must be a live compressed image whose reference is transferred to the wrapper.
    pub(crate) unsafe fn from_raw(image: NonNull<astc_encoder_codec::AstcImage>) -> Self {
        Self { image }
    }

    fn as_ptr(&self) -> *const astc_encoder_codec::AstcImage {
        self.image.as_ptr()
    }

    /// The ASTC blocks, 16 bytes each, in row major block order.
    pub fn data(&self) -> &[u8] {
        // SAFETY: the codec keeps the buffer alive for as long as we hold a reference.
        unsafe {
            let data = astc_image_data(self.as_ptr());
            if data.is_null() {
                return &[];
            }
            core::slice::from_raw_parts(data, astc_image_data_size(self.as_ptr()))
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        unsafe { astc_image_width(self.as_ptr()) }
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        unsafe { astc_image_height(self.as_ptr()) }
    }

    /// Width of the block footprint in texels.
    pub fn block_width(&self) -> usize {
        unsafe { astc_image_block_width(self.as_ptr()) }
    }

    /// Height of the block footprint in texels.
    pub fn block_height(&self) -> usize {
        unsafe { astc_image_block_height(self.as_ptr()) }
    }

    /// The layout [`decompress`](Self::decompress) produces.
    pub fn pixel_format(&self) -> PixelFormat {
        unsafe {
            PixelFormat {
                num_components: astc_image_num_components(self.as_ptr()),
                component_size: astc_image_component_size(self.as_ptr()),
                linear: astc_image_linear(self.as_ptr()),
                hdr: astc_image_hdr(self.as_ptr()),
            }
        }
    }

    /// Decodes the image.
    ///
    /// # Errors
    ///
    /// The failure reported by the codec, such as an allocation failure. Blocks
    /// the decoder does not understand decode to magenta rather than failing.
    pub fn decompress(&self) -> Result<RawImage, AstcError> {
        self.decompress_with_progress(|_| {})
    }

    /// Decodes the image, calling `on_progress` once per row of blocks.
    pub fn decompress_with_progress(
        &self,
        mut on_progress: impl FnMut(f32),
    ) -> Result<RawImage, AstcError> {
        let mut error = AstcErrorInfo::new();
        let mut forward = |progress: f32| {
            on_progress(progress);
            false
        };
        let raw = ProgressContext::with(&mut forward, |user_info, callback| unsafe {
            astc_image_decompress(self.as_ptr(), &mut error, user_info, callback)
        });

        match NonNull::new(raw) {
            Some(raw) => Ok(unsafe { RawImage::from_raw(raw) }),
            None => Err(to_error(&error)),
        }
    }
}

impl Clone for AstcImage {
    fn clone(&self) -> Self {
        // SAFETY: we hold a reference, so the image is live.
        unsafe { astc_image_retain(self.image.as_ptr()) };
        Self { image: self.image }
    }
}

impl Drop for AstcImage {
    fn drop(&mut self) {
        // SAFETY: releases the reference this wrapper owns, exactly once.
        unsafe { astc_image_release(self.image.as_ptr()) };
    }
}

impl core::fmt::Debug for AstcImage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AstcImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("block_width", &self.block_width())
            .field("block_height", &self.block_height())
            .field("pixel_format", &self.pixel_format())
            .finish_non_exhaustive()
    }
}
