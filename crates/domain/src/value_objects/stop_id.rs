//! Bus stop identifier value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Upstream-assigned bus stop identifier (e.g. `BS219257`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopId(String);

impl StopId {
    /// Create a stop id, trimming surrounding whitespace
    ///
    /// Rejects empty ids and ids containing whitespace or URL query
    /// delimiters, since the id is embedded verbatim in request URLs.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let value = id.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::InvalidStopId(
                "Stop id must not be empty".to_string(),
            ));
        }

        if value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '&' | '?' | '#' | '='))
        {
            return Err(DomainError::InvalidStopId(value));
        }

        Ok(Self(value))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StopId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StopId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StopId> for String {
    fn from(id: StopId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_id_is_trimmed() {
        let id = StopId::new("  BS219257 ").unwrap();
        assert_eq!(id.as_str(), "BS219257");
    }

    #[test]
    fn empty_stop_id_rejected() {
        assert!(StopId::new("").is_err());
        assert!(StopId::new("   ").is_err());
    }

    #[test]
    fn stop_id_with_query_delimiter_rejected() {
        assert!(StopId::new("BS1&x=2").is_err());
        assert!(StopId::new("BS 1").is_err());
    }

    #[test]
    fn stop_id_deserialization_validates() {
        let ok: Result<StopId, _> = serde_json::from_str("\"11120\"");
        assert_eq!(ok.unwrap().as_str(), "11120");

        let bad: Result<StopId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
