//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, image, TIFF, JPEG and PDF errors, and provides semantic
//! variants for parameter validation and fatal configuration problems.
use thiserror::Error;

use crate::types::Axis;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JPEG encoding error: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The parameter table cannot work for this document. Aborts the whole run.
    #[error("Configuration error ({axis} axis): {message}")]
    Configuration { axis: Axis, message: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    /// True for errors that must stop the whole document rather than one page.
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}
