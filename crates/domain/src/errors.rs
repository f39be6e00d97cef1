//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid bus stop identifier
    #[error("Invalid bus stop id: {0}")]
    InvalidStopId(String),

    /// Invalid bus line identifier
    #[error("Invalid bus line: {0}")]
    InvalidLineId(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_stop_id_error_message() {
        let err = DomainError::InvalidStopId("  ".to_string());
        assert_eq!(err.to_string(), "Invalid bus stop id:   ");
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("no lines".to_string());
        assert_eq!(err.to_string(), "Validation failed: no lines");
    }
}
