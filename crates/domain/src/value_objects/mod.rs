//! Value Objects - Immutable, identity-less domain primitives

mod line_id;
mod stop_id;

pub use line_id::LineId;
pub use stop_id::StopId;
