//! Error types for storepulse-core

use thiserror::Error;

/// Main error type for the storepulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend API error (transport failure or non-success status)
    #[error("API error: {0}")]
    Api(String),

    /// Malformed layout grid (jagged rows, dimension mismatch)
    #[error("layout error: {0}")]
    Layout(String),

    /// A request of the same kind is already in flight
    #[error("request already in flight")]
    Busy,
}

/// Result type alias for storepulse-core
pub type Result<T> = std::result::Result<T, Error>;
