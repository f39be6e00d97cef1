//! Application layer - Use cases and orchestration
//!
//! Contains the polling coordinator, the arrival sensor views and the stop
//! setup wizard, plus the port definitions they are written against.
//! Adapters in the infrastructure layer implement the ports.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
