//! Domain layer for the Korea bus arrival monitor
//!
//! Contains the stop/line value objects, arrival records, snapshots and the
//! persisted stop entry. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
