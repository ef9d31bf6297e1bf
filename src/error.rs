//! Error types for raster-codec

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed artifact: {0}")]
    Format(String),

    #[error("truncated data: expected {expected}, got {actual}")]
    TruncatedData { expected: usize, actual: usize },

    #[error("data overrun: {0}")]
    Overrun(String),

    #[error("unsupported image size {width}x{height}, only 512x512 is accepted")]
    UnsupportedImageSize { width: usize, height: usize },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
