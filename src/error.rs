// src/error.rs

//! Unified error handling for the feed engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network or connection failure talking to the upstream API
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a status outside [200, 300)
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The `X-NextPage` cursor was missing or malformed
    #[error("Pagination error: {0}")]
    Pagination(String),

    /// No published feed under that name
    #[error("Feed not found: {0}")]
    NotFound(String),

    /// TOML parsing failed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a non-2xx status error.
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a pagination cursor error.
    pub fn pagination(message: impl fmt::Display) -> Self {
        Self::Pagination(message.to_string())
    }

    /// Create a feed-not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error is a missing feed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
