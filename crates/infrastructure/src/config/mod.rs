//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (`korea_bus.toml` unless overridden), then `KOREA_BUS_*` environment
//! variables using `__` between nested keys, e.g.
//! `KOREA_BUS_POLLING__DEFAULT_SCAN_INTERVAL_SECS=30`.

mod logging;
mod polling;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use domain::BusStopEntry;
use integration_bus::BusApiConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use logging::LoggingConfig;
pub use polling::PollingConfig;

/// Configuration file used when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "korea_bus.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "KOREA_BUS";

/// Errors raised while loading, validating or saving the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values are present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The configuration could not be rendered as TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream endpoints and HTTP settings
    #[serde(default)]
    pub api: BusApiConfig,

    /// Polling defaults
    #[serde(default)]
    pub polling: PollingConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Configured stops
    #[serde(default)]
    pub stops: Vec<BusStopEntry>,
}

impl AppConfig {
    /// Load configuration from environment and `korea_bus.toml` if present
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from environment and an optional file at `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("api.arrivals_url", defaults.api.arrivals_url)?
            .set_default("api.search_url", defaults.api.search_url)?
            .set_default("api.station_url", defaults.api.station_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default(
                "polling.default_scan_interval_secs",
                defaults.polling.default_scan_interval_secs,
            )?
            .set_default("logging.filter", defaults.logging.filter)?
            .set_default("logging.json", defaults.logging.json)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (e.g., KOREA_BUS_API__TIMEOUT_SECS)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(path = %path.display(), stops = config.stops.len(), "Configuration loaded");
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error for unusable endpoints, zero timeouts or intervals,
    /// stops without lines and duplicated stops.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate().map_err(ConfigError::Invalid)?;
        self.polling.validate().map_err(ConfigError::Invalid)?;
        self.logging.validate().map_err(ConfigError::Invalid)?;

        let mut seen = HashSet::new();
        for entry in &self.stops {
            if entry.lines.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "stop {} has no lines",
                    entry.stop_id
                )));
            }
            if entry.scan_interval_secs == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "stop {} has a zero scan interval",
                    entry.stop_id
                )));
            }
            if !seen.insert(entry.unique_id()) {
                return Err(ConfigError::Invalid(format!(
                    "stop {} is configured twice with the same lines",
                    entry.stop_id
                )));
            }
        }

        Ok(())
    }

    /// Poll interval for a configured stop
    pub fn scan_interval(&self, entry: &BusStopEntry) -> Duration {
        entry.scan_interval(self.polling.default_scan_interval_secs)
    }

    /// Write the configuration to `path` as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(path, rendered).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), stops = self.stops.len(), "Configuration saved");
        Ok(())
    }
}
