#![doc = include_str!("../README.MD")]
#![warn(missing_docs)]

use astc_encoder_api::{AstcError, RawImage};
use half::f16;
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};

const BUFFER_ERROR: &str = "Could not create image buffer";

/// Projects `raw` into an RGBA bitmap.
///
/// Missing channels are filled in the usual way: luminance is copied into red,
/// green and blue, and absent alpha is opaque.
///
/// Alpha is the last channel and is straight, not premultiplied, as in every
/// [`image`] buffer.
///
/// # Errors
///
/// [`AstcError::Other`] if the image is too large for a bitmap, or its buffer does
/// not match its declared shape.
pub fn to_dynamic_image(raw: &RawImage) -> Result<DynamicImage, AstcError> {
    let buffer_error = || AstcError::Other(BUFFER_ERROR.to_owned());
    let width = u32::try_from(raw.width()).map_err(|_| buffer_error())?;
    let height = u32::try_from(raw.height()).map_err(|_| buffer_error())?;
    let num_components = raw.num_components();
    let component_size = raw.component_size();
    if !(1..=4).contains(&num_components) {
        return Err(buffer_error());
    }

    let pixels = raw.data().chunks_exact(num_components * component_size);
    match component_size {
        1 => {
            let data: Vec<u8> = pixels.flat_map(|pixel| expand(pixel, u8::MAX)).collect();
            RgbaImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(buffer_error)
        }
        2 | 4 => {
            let data: Vec<f32> = pixels
                .flat_map(|pixel| {
                    let components: Vec<f32> = pixel
                        .chunks_exact(component_size)
                        .map(read_float)
                        .collect();
                    expand(&components, 1.0)
                })
                .collect();
            ImageBuffer::<Rgba<f32>, Vec<f32>>::from_raw(width, height, data)
                .map(DynamicImage::ImageRgba32F)
                .ok_or_else(buffer_error)
        }
        _ => Err(buffer_error()),
    }
}

/// Converts any bitmap into an 8 bit RGBA [`RawImage`].
///
/// `linear` records whether the bitmap's colours are linear rather than sRGB encoded.
///
/// # Errors
///
/// [`AstcError::InvalidInput`] if the bitmap is empty.
pub fn raw_image_from_dynamic(image: &DynamicImage, linear: bool) -> Result<RawImage, AstcError> {
    let rgba = image.to_rgba8();
    RawImage::create(
        rgba.as_raw(),
        rgba.width() as usize,
        rgba.height() as usize,
        4,
        1,
        linear,
        false,
    )
}

fn expand<T: Copy>(pixel: &[T], opaque: T) -> [T; 4] {
    match *pixel {
        [l] => [l, l, l, opaque],
        [l, a] => [l, l, l, a],
        [r, g, b] => [r, g, b, opaque],
        [r, g, b, a, ..] => [r, g, b, a],
        [] => [opaque; 4],
    }
}

fn read_float(bytes: &[u8]) -> f32 {
    match *bytes {
        [a, b] => f16::from_ne_bytes([a, b]).to_f32(),
        [a, b, c, d] => f32::from_ne_bytes([a, b, c, d]),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, vec![10], [10, 10, 10, 255])]
    #[case(2, vec![10, 20], [10, 10, 10, 20])]
    #[case(3, vec![10, 20, 30], [10, 20, 30, 255])]
    #[case(4, vec![10, 20, 30, 40], [10, 20, 30, 40])]
    fn unorm8_pixels_expand_to_rgba(
        #[case] num_components: usize,
        #[case] pixel: Vec<u8>,
        #[case] expected: [u8; 4],
    ) {
        let raw = RawImage::create(&pixel.repeat(6), 3, 2, num_components, 1, false, false).unwrap();
        let DynamicImage::ImageRgba8(bitmap) = to_dynamic_image(&raw).unwrap() else {
            panic!("expected an 8 bit RGBA bitmap");
        };
        assert_eq!(bitmap.dimensions(), (3, 2));
        assert!(bitmap.pixels().all(|pixel| pixel.0 == expected));
    }

    #[test]
    fn half_pixels_become_float_rgba() {
        let pixel: Vec<u8> = [0.5f32, 0.25]
            .iter()
            .flat_map(|&value| f16::from_f32(value).to_ne_bytes())
            .collect();
        let raw = RawImage::create(&pixel.repeat(4), 2, 2, 2, 2, true, false).unwrap();
        let DynamicImage::ImageRgba32F(bitmap) = to_dynamic_image(&raw).unwrap() else {
            panic!("expected a float RGBA bitmap");
        };
        assert!(bitmap.pixels().all(|pixel| pixel.0 == [0.5, 0.5, 0.5, 0.25]));
    }

    #[test]
    fn float_pixels_become_float_rgba() {
        let pixel: Vec<u8> = [0.1f32, 0.2, 0.3]
            .iter()
            .flat_map(|value| value.to_ne_bytes())
            .collect();
        let raw = RawImage::create(&pixel, 1, 1, 3, 4, true, false).unwrap();
        let DynamicImage::ImageRgba32F(bitmap) = to_dynamic_image(&raw).unwrap() else {
            panic!("expected a float RGBA bitmap");
        };
        assert_eq!(bitmap.get_pixel(0, 0).0, [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn dynamic_images_convert_to_rgba8() {
        let bitmap = image::GrayImage::from_raw(2, 1, vec![7, 9]).unwrap();
        let raw = raw_image_from_dynamic(&DynamicImage::ImageLuma8(bitmap), true).unwrap();
        assert_eq!((raw.width(), raw.height()), (2, 1));
        assert_eq!((raw.num_components(), raw.component_size()), (4, 1));
        assert!(raw.linear());
        assert_eq!(raw.data(), &[7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn empty_bitmaps_are_rejected() {
        let result = raw_image_from_dynamic(&DynamicImage::new_rgba8(0, 0), false);
        assert!(matches!(result, Err(AstcError::InvalidInput(_))));
    }

    #[test]
    fn round_trip_through_a_bitmap() {
        let pixels: Vec<u8> = (0..4 * 3 * 4).map(|i| i as u8).collect();
        let raw = RawImage::create(&pixels, 4, 3, 4, 1, false, false).unwrap();
        let bitmap = to_dynamic_image(&raw).unwrap();
        let back = raw_image_from_dynamic(&bitmap, false).unwrap();
        assert_eq!(back.data(), raw.data());
    }
}
