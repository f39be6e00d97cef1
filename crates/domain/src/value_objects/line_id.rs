//! Bus line identifier value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Bus route number as reported by the upstream `name` field (e.g. `"720-3"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineId(String);

impl LineId {
    /// Create a line id, trimming surrounding whitespace
    pub fn new(line: impl Into<String>) -> Result<Self, DomainError> {
        let value = line.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::InvalidLineId(
                "Line must not be empty".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// Get the line as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LineId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LineId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LineId> for String {
    fn from(id: LineId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_id_keeps_inner_characters() {
        let line = LineId::new(" 720-3 ").unwrap();
        assert_eq!(line.as_str(), "720-3");
        assert_eq!(line.to_string(), "720-3");
    }

    #[test]
    fn empty_line_rejected() {
        assert!(LineId::new("").is_err());
        assert!(LineId::new("\t").is_err());
    }

    #[test]
    fn line_ids_order_lexically() {
        let a = LineId::new("100").unwrap();
        let b = LineId::new("2").unwrap();
        assert!(a < b);
    }
}
