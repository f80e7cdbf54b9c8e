//! Error types for ASTC compression and decompression.

use astc_encoder_codec::{AstcErrorInfo, AstcErrorKind};
use thiserror::Error;

/// Errors that can occur when creating, compressing or decompressing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstcError {
    /// The codec rejected the arguments (dimensions, component layout, buffer size, footprint).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The codec failed and explained why.
    #[error("{0}")]
    Other(String),

    /// The codec returned no result and no message.
    #[error("Unknown error")]
    Unknown,

    /// The background worker stopped before the compression finished.
    #[error("Compression worker failed: {0}")]
    WorkerFailed(String),
}

/// Converts a codec error descriptor into an [`AstcError`].
///
/// A descriptor carrying a message becomes [`AstcError::Other`], or
/// [`AstcError::InvalidInput`] when the codec classified the failure as bad input.
/// A descriptor without a message becomes [`AstcError::Unknown`].
pub fn to_error(info: &AstcErrorInfo) -> AstcError {
    match (info.kind(), info.message()) {
        (_, None) => AstcError::Unknown,
        (AstcErrorKind::InvalidInput, Some(message)) => AstcError::InvalidInput(message.to_owned()),
        (_, Some(message)) => AstcError::Other(message.to_owned()),
    }
}

impl From<&AstcErrorInfo> for AstcError {
    fn from(info: &AstcErrorInfo) -> Self {
        to_error(info)
    }
}
