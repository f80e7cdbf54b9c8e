#![doc = include_str!("../README.MD")]
#![warn(missing_docs)]

//! Safe, high-level API for ASTC texture compression.
//!
//! This crate wraps the C-shaped surface of `astc-encoder-codec` with owned,
//! reference counted image values, typed errors, and a cancellable compression
//! session that runs the codec on tokio's blocking pool.
//!
//! # Examples
//!
//! ## Compress and Decompress
//!
//! ```ignore
//! use astc_encoder_api::{CompressionSession, CompressionSettingsBuilder, QualityPreset, RawImage};
//!
//! let image = RawImage::create(&pixels, width, height, 4, 1, false, false)?;
//! let settings = CompressionSettingsBuilder::new()
//!     .block_footprint(6, 6)
//!     .preset(QualityPreset::Thorough)
//!     .build();
//!
//! let session = CompressionSession::new(image, settings);
//! let token = session.cancellation_token(); // hand to whoever may cancel
//! if let Some(compressed) = session.run(|_| {}).await?.completed() {
//!     let restored = compressed.decompress()?;
//! }
//! ```
//!
//! ## Store as an `.astc` File
//!
//! ```ignore
//! use astc_encoder_api::{read_astc_file, write_astc_file, PixelFormat};
//!
//! let bytes = write_astc_file(&compressed)?;
//! let compressed = read_astc_file(&bytes, PixelFormat::default())?;
//! ```

// Module declarations
mod callback;
pub mod cancellation;
pub mod compressed_image;
pub mod container;
pub mod error;
pub mod raw_image;
#[cfg(feature = "async")]
pub mod session;
pub mod settings;

// Re-export main functionality at crate root
pub use cancellation::CancellationToken;
pub use compressed_image::{AstcImage, PixelFormat};
pub use container::{AstcFileError, AstcHeader, read_astc_file, write_astc_file};
pub use error::{AstcError, to_error};
pub use raw_image::{CompressionOutcome, RawImage};
#[cfg(feature = "async")]
pub use session::CompressionSession;
pub use settings::{CompressionSettings, CompressionSettingsBuilder, QualityPreset};
