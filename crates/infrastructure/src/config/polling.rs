//! Polling configuration.

use serde::{Deserialize, Serialize};

/// Poll interval defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval used by stops without an override, in seconds
    #[serde(default = "default_scan_interval_secs")]
    pub default_scan_interval_secs: u64,
}

const fn default_scan_interval_secs() -> u64 {
    60
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            default_scan_interval_secs: default_scan_interval_secs(),
        }
    }
}

impl PollingConfig {
    /// Validate the polling configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_scan_interval_secs == 0 {
            return Err("polling.default_scan_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
