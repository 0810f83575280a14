//! Error types for the sync crate.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for queue, facade and worker operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Retry policy class for transport failures. The drain loops retry every
/// class up to the applicable ceiling; the class is logged and recorded as
/// the failure reason, it does not short-circuit retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
}

/// Failures on the wire.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the server
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Per-request timeout elapsed
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify the failure for logging and the recorded failure reason.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                408 | 409 | 423 | 425 | 429 => RetryClass::Retryable,
                500..=599 => RetryClass::Retryable,
                _ => RetryClass::Permanent,
            },
            Self::Http(_) => RetryClass::Retryable,
            Self::Timeout(_) => RetryClass::Retryable,
        }
    }
}

/// Top-level error for the queue, facade and worker.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] sokoni_core::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
