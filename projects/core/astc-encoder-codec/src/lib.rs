#![doc = include_str!("../README.MD")]
#![warn(missing_docs)]

pub mod block;
pub mod error;
pub mod error_info;
pub mod footprint;
pub mod image;
pub mod raw_image;
pub mod util;

mod texels;

#[cfg(test)]
pub(crate) mod test_prelude;

pub use error::CodecError;
pub use error_info::{AstcErrorInfo, AstcErrorKind, ASTC_ENCODER_ERROR_SIZE};
pub use footprint::BlockFootprint;
pub use image::*;
pub use raw_image::*;

use core::ffi::c_void;

/// Progress callback accepted by [`astc_raw_image_compress`] and [`astc_image_decompress`].
///
/// Called with the opaque `user_info` handle passed alongside it and a progress value in
/// `[0, 1]`. Returning `true` asks the codec to stop as soon as possible. Decompression
/// ignores the returned value.
pub type AstcProgressCallback = unsafe extern "C" fn(user_info: *mut c_void, progress: f32) -> bool;
