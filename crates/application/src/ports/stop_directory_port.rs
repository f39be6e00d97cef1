//! Stop directory port
//!
//! Name search and line listing used while setting up a stop.

use std::fmt;

use async_trait::async_trait;
use domain::StopId;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// A stop matching a name search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSearchResult {
    /// Upstream stop id
    pub stop_id: StopId,
    /// Human-readable label, e.g. `광화문(01123) - 종로 방면`
    pub title: String,
    /// Area description
    pub location: String,
    /// Bus categories serving the stop
    pub bus_types: Vec<String>,
}

impl fmt::Display for StopSearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// A line serving a stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedLine {
    /// Route number
    pub number: String,
    /// Bus category
    pub kind: String,
}

impl fmt::Display for ServedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.number)
    }
}

/// Port for the stop directory
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StopDirectoryPort: Send + Sync {
    /// Search stops by name
    async fn search_stops(&self, name: &str) -> Result<Vec<StopSearchResult>, ApplicationError>;

    /// List the lines serving a stop
    async fn list_lines(&self, stop_id: &StopId) -> Result<Vec<ServedLine>, ApplicationError>;
}
