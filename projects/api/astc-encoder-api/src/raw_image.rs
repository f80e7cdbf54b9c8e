//! Decoded pixel buffers.

use crate::callback::ProgressContext;
use crate::compressed_image::AstcImage;
use crate::error::{AstcError, to_error};
use crate::settings::CompressionSettings;
use astc_encoder_codec::{
    AstcErrorInfo, AstcErrorKind, AstcRawImage, astc_raw_image_component_size,
    astc_raw_image_compress, astc_raw_image_create, astc_raw_image_data,
    astc_raw_image_data_size, astc_raw_image_hdr, astc_raw_image_height, astc_raw_image_linear,
    astc_raw_image_num_components, astc_raw_image_release, astc_raw_image_retain,
    astc_raw_image_width,
};
use core::ptr::NonNull;

/// A decoded image: pixel bytes plus the layout needed to interpret them.
///
/// The pixel buffer is owned by the codec and shared between clones; cloning
/// only adds a reference.
pub struct RawImage {
    image: NonNull<AstcRawImage>,
}

// SAFETY: raw images are immutable after creation and reference counted atomically.
unsafe impl Send for RawImage {}
unsafe impl Sync for RawImage {}

/// Result of a compression that ran to its end.
#[derive(Debug)]
pub enum CompressionOutcome {
    /// The codec produced a compressed image.
    Completed(AstcImage),
    /// Cancellation was requested and honoured. No compressed image exists.
    Cancelled,
}

impl CompressionOutcome {
    /// The compressed image, if the compression completed.
    pub fn completed(self) -> Option<AstcImage> {
        match self {
            CompressionOutcome::Completed(image) => Some(image),
            CompressionOutcome::Cancelled => None,
        }
    }

    /// Whether the compression was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompressionOutcome::Cancelled)
    }
}

impl RawImage {
    /// Creates a raw image by copying `data`.
    ///
    /// # Parameters
    ///
    /// - `data`: pixel bytes, row major, components interleaved, native byte order
    /// - `width`, `height`: image size in pixels
    /// - `num_components`: 1 (L), 2 (LA), 3 (RGB) or 4 (RGBA)
    /// - `component_size`: 1 (unorm8), 2 (half float) or 4 (float)
    /// - `linear`: whether colour values are linear rather than sRGB encoded
    /// - `hdr`: whether the image holds high dynamic range data
    ///
    /// # Errors
    ///
    /// [`AstcError::InvalidInput`] if the codec rejects the shape, or if `data.len()`
    /// is not `width * height * num_components * component_size`.
    ///
    /// # Examples
    ///
    /// ```
    /// use astc_encoder_api::RawImage;
    ///
    /// let image = RawImage::create(&[0u8; 64], 4, 4, 4, 1, false, false)?;
    /// assert_eq!(image.data().len(), 64);
    /// # Ok::<(), astc_encoder_api::AstcError>(())
    /// ```
    pub fn create(
        data: &[u8],
        width: usize,
        height: usize,
        num_components: usize,
        component_size: usize,
        linear: bool,
        hdr: bool,
    ) -> Result<Self, AstcError> {
        let mut error = AstcErrorInfo::new();
        // SAFETY: `data` is valid for reads of `data.len()` bytes and `error` for writes.
        let image = unsafe {
            astc_raw_image_create(
                data.as_ptr(),
                data.len(),
                width,
                height,
                num_components,
                component_size,
                linear,
                hdr,
                &mut error,
            )
        };

        match NonNull::new(image) {
            // SAFETY: the codec handed us one reference.
            Some(image) => Ok(unsafe { Self::from_raw(image) }),
            None => Err(to_error(&error)),
        }
    }

    /// Takes ownership of one reference to a codec raw image.
    ///
    /// # Safety
    ///
    /// `image` must be a live raw image whose reference is transferred to the wrapper.
    pub(crate) unsafe fn from_raw(image: NonNull<AstcRawImage>) -> Self {
        Self { image }
    }

    pub(crate) fn as_ptr(&self) -> *const AstcRawImage {
        self.image.as_ptr()
    }

    /// The pixel bytes.
    pub fn data(&self) -> &[u8] {
        // SAFETY: the codec keeps the buffer alive for as long as we hold a reference.
        unsafe {
            let data = astc_raw_image_data(self.as_ptr());
            if data.is_null() {
                return &[];
            }
            core::slice::from_raw_parts(data, astc_raw_image_data_size(self.as_ptr()))
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        unsafe { astc_raw_image_width(self.as_ptr()) }
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        unsafe { astc_raw_image_height(self.as_ptr()) }
    }

    /// Number of interleaved components per pixel.
    pub fn num_components(&self) -> usize {
        unsafe { astc_raw_image_num_components(self.as_ptr()) }
    }

    /// Size of one component in bytes.
    pub fn component_size(&self) -> usize {
        unsafe { astc_raw_image_component_size(self.as_ptr()) }
    }

    /// Whether colour values are linear rather than sRGB encoded.
    pub fn linear(&self) -> bool {
        unsafe { astc_raw_image_linear(self.as_ptr()) }
    }

    /// Whether the image holds high dynamic range data.
    pub fn hdr(&self) -> bool {
        unsafe { astc_raw_image_hdr(self.as_ptr()) }
    }

    /// Compresses the image on the current thread.
    ///
    /// `on_progress` is called once per row of blocks with a non-decreasing value in
    /// `[0, 1]`. Returning `true` asks the codec to stop, which yields
    /// [`CompressionOutcome::Cancelled`].
    ///
    /// For a cancellable compression that does not block the caller, see
    /// `CompressionSession` (behind the `async` feature).
    ///
    /// # Errors
    ///
    /// [`AstcError::InvalidInput`] for unsupported footprints or qualities outside `[0, 1]`,
    /// otherwise the failure reported by the codec.
    ///
    /// # Panics
    ///
    /// Resumes any panic raised by `on_progress`, after the codec has stopped.
    pub fn compress_blocking(
        &self,
        settings: &CompressionSettings,
        on_progress: &mut dyn FnMut(f32) -> bool,
    ) -> Result<CompressionOutcome, AstcError> {
        let mut error = AstcErrorInfo::new();
        let compressed = ProgressContext::with(on_progress, |user_info, callback| unsafe {
            astc_raw_image_compress(
                self.as_ptr(),
                settings.block_width,
                settings.block_height,
                settings.quality,
                &mut error,
                user_info,
                callback,
            )
        });

        match NonNull::new(compressed) {
            // SAFETY: the codec handed us one reference.
            Some(image) => Ok(CompressionOutcome::Completed(unsafe {
                AstcImage::from_raw(image)
            })),
            None if error.kind() == AstcErrorKind::Cancelled => Ok(CompressionOutcome::Cancelled),
            None => Err(to_error(&error)),
        }
    }
}

impl Clone for RawImage {
    fn clone(&self) -> Self {
        // SAFETY: we hold a reference, so the image is live.
        unsafe { astc_raw_image_retain(self.image.as_ptr()) };
        Self { image: self.image }
    }
}

impl Drop for RawImage {
    fn drop(&mut self) {
        // SAFETY: releases the reference this wrapper owns, exactly once.
        unsafe { astc_raw_image_release(self.image.as_ptr()) };
    }
}

impl core::fmt::Debug for RawImage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("num_components", &self.num_components())
            .field("component_size", &self.component_size())
            .field("linear", &self.linear())
            .field("hdr", &self.hdr())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CompressionSettingsBuilder;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1, 1, 1)]
    #[case(7, 3, 2, 1)]
    #[case(4, 4, 3, 2)]
    #[case(5, 9, 4, 4)]
    fn create_reports_shape(
        #[case] width: usize,
        #[case] height: usize,
        #[case] num_components: usize,
        #[case] component_size: usize,
    ) {
        let data = vec![0x11u8; width * height * num_components * component_size];
        let image =
            RawImage::create(&data, width, height, num_components, component_size, true, false)
                .unwrap();
        assert_eq!(image.width(), width);
        assert_eq!(image.height(), height);
        assert_eq!(image.num_components(), num_components);
        assert_eq!(image.component_size(), component_size);
        assert!(image.linear());
        assert!(!image.hdr());
        assert_eq!(image.data(), &data[..]);
    }

    #[rstest]
    #[case(0, 4, 4, 1)]
    #[case(4, 0, 4, 1)]
    #[case(4, 4, 0, 1)]
    #[case(4, 4, 5, 1)]
    #[case(4, 4, 4, 3)]
    fn create_rejects_invalid_shapes(
        #[case] width: usize,
        #[case] height: usize,
        #[case] num_components: usize,
        #[case] component_size: usize,
    ) {
        let result = RawImage::create(&[0u8; 64], width, height, num_components, component_size, false, false);
        assert!(matches!(result, Err(AstcError::InvalidInput(_))));
    }

    #[test]
    fn create_rejects_wrong_buffer_size() {
        let error = RawImage::create(&[0u8; 63], 4, 4, 4, 1, false, false).unwrap_err();
        assert_eq!(
            error,
            AstcError::InvalidInput("Image data size mismatch: expected 64 bytes, got 63".into())
        );
    }

    #[test]
    fn clones_share_the_buffer() {
        let image = RawImage::create(&[3u8; 16], 2, 2, 4, 1, false, false).unwrap();
        let clone = image.clone();
        assert_eq!(clone.data().as_ptr(), image.data().as_ptr());
        drop(image);
        assert_eq!(clone.data(), &[3u8; 16]);
    }

    #[test]
    fn compress_blocking_reports_progress() {
        let image = RawImage::create(&[0u8; 8 * 8 * 4], 8, 8, 4, 1, false, false).unwrap();
        let mut values = Vec::new();
        let outcome = image
            .compress_blocking(&CompressionSettings::default(), &mut |value| {
                values.push(value);
                false
            })
            .unwrap();

        let compressed = outcome.completed().unwrap();
        assert_eq!(compressed.data().len(), 4 * 16);
        assert_eq!(values, [0.5, 1.0]);
    }

    #[test]
    fn compress_blocking_honours_cancellation() {
        let image = RawImage::create(&[0u8; 8 * 8 * 4], 8, 8, 4, 1, false, false).unwrap();
        let outcome = image
            .compress_blocking(&CompressionSettings::default(), &mut |_| true)
            .unwrap();
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn compress_blocking_rejects_bad_footprint() {
        let image = RawImage::create(&[0u8; 64], 4, 4, 4, 1, false, false).unwrap();
        let settings = CompressionSettingsBuilder::new().block_footprint(7, 7).build();
        let error = image.compress_blocking(&settings, &mut |_| false).unwrap_err();
        assert_eq!(
            error,
            AstcError::InvalidInput("Unsupported block footprint 7x7".into())
        );
    }
}
