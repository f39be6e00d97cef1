//! Console logging setup

use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured filter. Fails if a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    }

    debug!(json = config.json, "Logging initialized");
    Ok(())
}
