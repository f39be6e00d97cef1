//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod bus_arrival_port;
mod stop_directory_port;

pub use bus_arrival_port::BusArrivalPort;
#[cfg(test)]
pub use bus_arrival_port::MockBusArrivalPort;
#[cfg(test)]
pub use stop_directory_port::MockStopDirectoryPort;
pub use stop_directory_port::{ServedLine, StopDirectoryPort, StopSearchResult};
