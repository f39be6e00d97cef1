//! Korean bus arrival integration
//!
//! Fetches real-time arrivals for a bus stop from the Kakao Map mobile
//! endpoint (`busesInBusStopJson`) and scrapes the Kakao Map stop search and
//! station pages used while setting up a stop.
//!
//! # Architecture
//!
//! [`BusArrivalClient`] defines the arrivals interface, implemented by
//! [`KakaoBusClient`]. It returns raw entries ([`RawBusEntry`]) untouched;
//! [`RawBusEntry::to_records`] normalizes an entry into one record per vehicle
//! slot. [`StopDirectoryClient`] (implemented by [`KakaoStopDirectory`])
//! resolves stop names to stop ids and lists the lines serving a stop.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::StopId;
//! use integration_bus::{BusApiConfig, BusArrivalClient, KakaoBusClient};
//!
//! let client = KakaoBusClient::new(&BusApiConfig::default())?;
//! let entries = client.fetch(&StopId::new("BS219257")?).await?;
//! for entry in &entries {
//!     println!("{:?}", entry.line_name());
//! }
//! ```

mod client;
mod config;
mod directory;
mod error;
mod models;

pub use client::{BusArrivalClient, KakaoBusClient};
pub use config::BusApiConfig;
pub use directory::{KakaoStopDirectory, StopDirectoryClient};
pub use error::BusApiError;
pub use models::{
    CURRENT_VEHICLE_FIELDS, LineOption, LineValidation, NEXT_VEHICLE_FIELDS, RawBusEntry,
    SlotFields, StopCandidate, validate_lines,
};
