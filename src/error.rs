//! Error types for the slicer

use thiserror::Error;

/// Result type alias for slicer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort document production
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid generator configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The rasterizer could not produce pixels for a slice
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Decoding an input image or encoding a slice failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A raster image was not a usable base64 data URI
    #[error("Invalid data URI: {0}")]
    DataUri(String),

    /// The PDF document rejected an image or page
    #[error("PDF error: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
