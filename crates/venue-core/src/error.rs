//! Error types for the venue enricher.

use thiserror::Error;

/// Result type alias using the venue enricher's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for enrichment operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Fingerprint cache read or write failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// Inference/generation failed (server-side or unclassified upstream failure)
    #[error("Inference error: {0}")]
    Inference(String),

    /// Upstream rejected the call because of rate limiting
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Upstream call exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry of the same call may succeed.
    ///
    /// Timeouts, rate limits, server-side failures, transport failures and
    /// malformed model responses are transient. Credential, configuration and
    /// request-shape failures are permanent and must not be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Inference(_)
                | Error::RateLimited(_)
                | Error::Timeout(_)
                | Error::Request(_)
                | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
