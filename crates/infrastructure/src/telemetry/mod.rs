//! Logging initialization
//!
//! Installs the global `tracing` subscriber used by the binary.

mod logging;

pub use logging::{TelemetryError, init_logging};
