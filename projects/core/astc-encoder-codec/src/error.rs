//! Error type for codec operations.

use crate::error_info::AstcErrorKind;
use thiserror::Error;

/// Errors that can occur inside the codec.
///
/// The C-shaped surface never returns these directly; they are written into an
/// [`AstcErrorInfo`](crate::AstcErrorInfo) out-slot as a kind plus a message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// No pixel data pointer was provided.
    #[error("Image data not specified")]
    MissingData,

    /// Width was zero.
    #[error("Invalid width")]
    InvalidWidth,

    /// Height was zero.
    #[error("Invalid height")]
    InvalidHeight,

    /// Number of components outside `1..=4`.
    #[error("Unsupported number of components")]
    UnsupportedComponentCount,

    /// Component size other than 1, 2 or 4 bytes.
    #[error("Unsupported component size")]
    UnsupportedComponentSize,

    /// The buffer does not match the declared image shape.
    #[error("Image data size mismatch: expected {expected} bytes, got {actual}")]
    DataSizeMismatch {
        /// The size implied by the image shape
        expected: usize,
        /// The size of the provided buffer
        actual: usize,
    },

    /// The image shape overflows the addressable size.
    #[error("Image dimensions are too large")]
    DimensionsTooLarge,

    /// The block footprint is not a supported 2D ASTC footprint.
    #[error("Unsupported block footprint {width}x{height}")]
    UnsupportedFootprint {
        /// Requested block width
        width: usize,
        /// Requested block height
        height: usize,
    },

    /// Quality outside `[0, 1]` or not a number.
    #[error("Invalid quality {0}, expected a value between 0 and 1")]
    InvalidQuality(f32),

    /// Memory for the output could not be reserved.
    #[error("Could not allocate {0} bytes")]
    AllocationFailed(usize),

    /// The progress callback asked the codec to stop.
    #[error("Task was cancelled")]
    Cancelled,
}

impl CodecError {
    /// The [`AstcErrorKind`] reported for this error across the C-shaped surface.
    pub fn kind(&self) -> AstcErrorKind {
        match self {
            CodecError::MissingData
            | CodecError::InvalidWidth
            | CodecError::InvalidHeight
            | CodecError::UnsupportedComponentCount
            | CodecError::UnsupportedComponentSize
            | CodecError::DataSizeMismatch { .. }
            | CodecError::DimensionsTooLarge
            | CodecError::UnsupportedFootprint { .. }
            | CodecError::InvalidQuality(_) => AstcErrorKind::InvalidInput,
            CodecError::AllocationFailed(_) => AstcErrorKind::CodecFailure,
            CodecError::Cancelled => AstcErrorKind::Cancelled,
        }
    }
}
