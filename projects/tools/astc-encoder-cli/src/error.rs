use astc_encoder_api::{AstcError, AstcFileError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Container(#[from] AstcFileError),
    #[error(transparent)]
    Codec(#[from] AstcError),
    #[error("Compression was cancelled")]
    Cancelled,
}
