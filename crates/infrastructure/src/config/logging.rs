//! Log output configuration.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log output settings; `RUST_LOG` overrides `filter` when set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives, e.g. "info" or "korea_bus=debug,integration_bus=trace"
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit structured JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Validate the filter directives
    pub fn validate(&self) -> Result<(), String> {
        EnvFilter::try_new(&self.filter)
            .map(|_| ())
            .map_err(|e| format!("logging.filter is invalid: {e}"))
    }
}
