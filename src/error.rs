// src/error.rs

//! Unified error handling for the feed engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure reported by a document fetcher.
///
/// Every variant is recoverable: the polling loop logs it and tries again on
/// the next cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The document does not exist at the configured location
    #[error("document not found")]
    NotFound,

    /// Transport failure or unexpected response
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The host refused the request because of rate limiting
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },
}

impl FetchError {
    /// Create an unreachable error from any displayable cause.
    pub fn unreachable(cause: impl fmt::Display) -> Self {
        Self::Unreachable(cause.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::unreachable(e)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regex compilation failed
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Fetching a source document failed
    #[error("Fetch error for {source_id}: {error}")]
    Fetch { source_id: String, error: FetchError },

    /// The requested source is not configured
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A notifier failed to deliver a message
    #[error("Delivery error for {target}: {message}")]
    Delivery { target: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error for a source.
    pub fn fetch(source_id: impl Into<String>, error: FetchError) -> Self {
        Self::Fetch {
            source_id: source_id.into(),
            error,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a delivery error for a target.
    pub fn delivery(target: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Delivery {
            target: target.to_string(),
            message: message.to_string(),
        }
    }

    /// The underlying fetch failure, if this error came from a fetcher.
    pub fn as_fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch { error, .. } => Some(error),
            _ => None,
        }
    }
}
