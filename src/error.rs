// src/error.rs
// Standardized error types for banter

use thiserror::Error;

/// Main error type for the banter library
#[derive(Error, Debug)]
pub enum BanterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} capability not loaded")]
    CapabilityUnavailable(&'static str),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF extraction error: {0}")]
    Pdf(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown error: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using BanterError
pub type Result<T> = std::result::Result<T, BanterError>;

impl From<String> for BanterError {
    fn from(s: String) -> Self {
        BanterError::Other(s)
    }
}
