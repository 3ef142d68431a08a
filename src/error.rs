//! Error types for the engraving pipeline.
//!
//! Generation-stage failures (QR encoding, raster loading) are surfaced to
//! the caller. Script parsing never fails: `MalformedScript` is only used
//! internally to describe lines the parser skipped.

use std::io;
use thiserror::Error;

/// Errors that can occur while generating burn points or scripts.
#[derive(Error, Debug)]
pub enum EngraveError {
    /// Input rejected before entering the pipeline (blank QR text, bad sizes).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The module-matrix encoder could not produce a matrix.
    #[error("QR encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// A script line could not be interpreted.
    #[error("Malformed script: {0}")]
    MalformedScript(String),

    /// Raster decoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngraveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngraveError::InvalidInput("text cannot be empty".into());
        assert_eq!(err.to_string(), "Invalid input: text cannot be empty");

        let err = EngraveError::EncoderUnavailable("data too long".into());
        assert_eq!(err.to_string(), "QR encoder unavailable: data too long");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.png");
        let err: EngraveError = io_err.into();
        assert!(matches!(err, EngraveError::Io(_)));
    }
}
