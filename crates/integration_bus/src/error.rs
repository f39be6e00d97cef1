//! Bus API error types

use thiserror::Error;

/// Errors that can occur while talking to the upstream bus endpoints
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusApiError {
    /// Upstream answered with a status other than 200
    #[error("Upstream returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code
        status: u16,
    },

    /// Request did not complete within the configured timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// Connection, DNS or other transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Body was not JSON or lacked the expected `busesList` array
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be built
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BusApiError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::HttpStatus { status } => *status >= 500 || *status == 429,
            Self::MalformedResponse(_) | Self::Configuration(_) => false,
        }
    }

    /// Map a reqwest error into a timeout or transport failure
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err.to_string())
        }
    }
}
