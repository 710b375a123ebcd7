//! Blobstore Error Types

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for blobstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Blobstore error types
#[derive(Error, Debug)]
pub enum Error {
    // Client input errors
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No such key: {0}")]
    NoSuchKey(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Catalog serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wire error code reported in JSON and XML error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRecord(_) => "InvalidRecord",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::NoSuchKey(_) => "NoSuchKey",
            _ => "InternalError",
        }
    }

    /// Human readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Error::InvalidRecord(m)
            | Error::InvalidRequest(m)
            | Error::InvalidArgument(m) => m.clone(),
            Error::NoSuchKey(_) => "The specified key does not exist.".to_string(),
            _ => "We encountered an internal error. Please try again.".to_string(),
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRecord(_)
            | Error::InvalidRequest(_)
            | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NoSuchKey(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error was caused by client input
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
