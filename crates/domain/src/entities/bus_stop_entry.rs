//! Persisted configuration record for one monitored stop

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entities::BusStopQuery;
use crate::errors::DomainError;
use crate::value_objects::{LineId, StopId};

/// A configured stop as stored in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStopEntry {
    /// Upstream stop id
    pub stop_id: StopId,
    /// Lines selected during setup
    pub lines: Vec<LineId>,
    /// Optional display name used as sensor name prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Poll interval override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval_secs: Option<u64>,
}

impl BusStopEntry {
    /// Identifier used to detect duplicate setups: `{stop_id}_{lines joined}`
    #[must_use]
    pub fn unique_id(&self) -> String {
        let lines: String = self.lines.iter().map(LineId::as_str).collect();
        format!("{}_{lines}", self.stop_id)
    }

    /// Build the immutable polling query for this entry
    pub fn to_query(&self) -> Result<BusStopQuery, DomainError> {
        BusStopQuery::new(
            self.stop_id.clone(),
            self.lines.iter().cloned(),
            self.name.clone(),
        )
    }

    /// Effective poll interval, falling back to `default_secs`
    ///
    /// A zero override is ignored.
    #[must_use]
    pub fn scan_interval(&self, default_secs: u64) -> Duration {
        let secs = self
            .scan_interval_secs
            .filter(|s| *s > 0)
            .unwrap_or(default_secs);
        Duration::from_secs(secs)
    }
}
