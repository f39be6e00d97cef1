//! Domain entities

mod arrival;
mod bus_stop_entry;
mod bus_stop_query;
mod snapshot;

pub use arrival::{ArrivalTime, BusArrivalRecord, NO_INFORMATION, UNKNOWN, UNKNOWN_SEATS, VehicleSlot};
pub use bus_stop_entry::BusStopEntry;
pub use bus_stop_query::BusStopQuery;
pub use snapshot::FetchSnapshot;
