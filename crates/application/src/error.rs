//! Application-level errors

use domain::{DomainError, LineId};
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Upstream answered with a non-200 status
    #[error("Upstream returned HTTP {status}")]
    UpstreamHttp {
        /// The HTTP status code
        status: u16,
    },

    /// Upstream request timed out
    #[error("Upstream request timed out")]
    UpstreamTimeout,

    /// Connection or other transport failure
    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    /// Upstream body could not be understood
    #[error("Malformed upstream response: {0}")]
    UpstreamMalformed(String),

    /// The stop reported no buses at all
    #[error("No buses reported at this stop")]
    NoSuchStop,

    /// Requested lines are not served at the stop
    #[error("Lines not served at this stop: {}", join_lines(.invalid))]
    NoSuchLine {
        /// Lines missing from the response, in requested order
        invalid: Vec<LineId>,
    },

    /// An entry with the same unique id already exists
    #[error("Stop already configured: {0}")]
    AlreadyConfigured(String),

    /// Invalid configuration or input
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The first refresh did not succeed
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_lines(lines: &[LineId]) -> String {
    lines
        .iter()
        .map(LineId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamTimeout | Self::UpstreamTransport(_) | Self::NotReady(_) => true,
            Self::UpstreamHttp { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
