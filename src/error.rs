//! Custom error types for the LibrarySphere front-end
//!
//! This module defines the application-level error type. Failures talking to
//! the remote library API have their own type, [`crate::api::ApiError`], because
//! screens turn those into user notices instead of propagating them.

use thiserror::Error;

/// Main error type for the LibrarySphere application
#[derive(Debug, Error)]
pub enum SphereError {
    /// Error occurred while parsing address
    #[error("Failed to parse network address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    /// Error occurred while reading the configuration file or binding the listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error occurred while parsing configuration
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] json5::Error),

    /// The configured API base address is not an absolute URL
    #[error("Invalid API base URL: {0}")]
    InvalidApiUrl(#[from] url::ParseError),

    /// The configuration file watcher could not be started
    #[error("Failed to watch configuration file: {0}")]
    Watch(#[from] notify::Error),

    /// Generic error with a message
    #[error("Error: {0}")]
    Generic(String),
}

impl From<&str> for SphereError {
    fn from(message: &str) -> Self {
        SphereError::Generic(message.to_string())
    }
}

impl From<String> for SphereError {
    fn from(message: String) -> Self {
        SphereError::Generic(message)
    }
}

/// Result type alias using our custom error type
pub type Result<T> = std::result::Result<T, SphereError>;
