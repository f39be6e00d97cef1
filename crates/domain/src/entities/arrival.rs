//! Arrival records normalized from one upstream bus entry

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::LineId;

/// Sentinel shown for display fields the upstream did not report
pub const UNKNOWN: &str = "unknown";

/// Default for the remaining-seat count when not reported
pub const UNKNOWN_SEATS: &str = "-1";

/// Vehicle state shown for a next-vehicle record without an ETA
pub const NO_INFORMATION: &str = "no information";

/// Which vehicle of a line an arrival record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleSlot {
    /// The first vehicle approaching the stop
    Current,
    /// The vehicle after that (upstream `...2` fields)
    Next,
}

impl VehicleSlot {
    /// All slots in display order
    pub const ALL: [Self; 2] = [Self::Current, Self::Next];

    /// Snapshot key for a line in this slot (`720` or `720:next`)
    #[must_use]
    pub fn key_for(self, line: &LineId) -> String {
        match self {
            Self::Current => line.as_str().to_string(),
            Self::Next => format!("{line}:next"),
        }
    }

    /// Suffix appended to sensor unique ids
    #[must_use]
    pub const fn id_suffix(self) -> &'static str {
        match self {
            Self::Current => "",
            Self::Next => "_next",
        }
    }
}

impl fmt::Display for VehicleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Next => write!(f, "next"),
        }
    }
}

/// Seconds-to-arrival as reported upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ArrivalTime {
    /// An integer number of seconds; `<= 0` means no ETA is available
    Seconds(i64),
    /// The field was absent or null
    Unreported,
    /// The field was present but not an integer (raw text kept for logging)
    Malformed(String),
}

impl ArrivalTime {
    /// Seconds until arrival when a positive ETA is available
    #[must_use]
    pub const fn eta_seconds(&self) -> Option<i64> {
        match self {
            Self::Seconds(secs) if *secs > 0 => Some(*secs),
            _ => None,
        }
    }

    /// Whether the upstream value is usable (integer or absent)
    #[must_use]
    pub const fn is_parseable(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }

    /// Raw seconds value, with absent treated as zero
    #[must_use]
    pub const fn raw_seconds(&self) -> Option<i64> {
        match self {
            Self::Seconds(secs) => Some(*secs),
            Self::Unreported => Some(0),
            Self::Malformed(_) => None,
        }
    }

    /// Absolute arrival timestamp relative to `now`
    #[must_use]
    pub fn arrival_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.eta_seconds()
            .and_then(Duration::try_seconds)
            .and_then(|eta| now.checked_add_signed(eta))
    }
}

/// One vehicle of one line approaching the stop
///
/// Display-only fields stay `None` when the upstream omitted them; callers
/// substitute [`UNKNOWN`] (or [`UNKNOWN_SEATS`]) at presentation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusArrivalRecord {
    /// Route number, join key against the tracked lines
    pub line_id: LineId,
    /// Which vehicle of the line this is
    pub slot: VehicleSlot,
    /// Time until the vehicle reaches the stop
    pub arrival: ArrivalTime,
    /// Vehicle licence plate / number
    pub vehicle_id: Option<String>,
    /// Stop the vehicle is currently at
    pub current_stop_name: Option<String>,
    /// Stop after the tracked stop
    pub next_stop_name: Option<String>,
    /// Free-text vehicle state (e.g. "3 stops away")
    pub vehicle_state_message: Option<String>,
    /// Heading of the line at this stop
    pub direction: Option<String>,
    /// Bus category (trunk, branch, village, ...)
    pub vehicle_type: Option<String>,
    /// Remaining seats, when the operator reports them
    pub remaining_seats: Option<String>,
    /// Upstream collection timestamp, `YYYYMMDDHHMMSS`
    pub collected_at: Option<String>,
    /// First departure of the day
    pub first_departure: Option<String>,
    /// Last departure of the day
    pub last_departure: Option<String>,
    /// Headway description
    pub headway_intervals: Option<String>,
    /// Whether this is the last vehicle of the day
    pub is_last_vehicle: Option<String>,
    /// Number of stops until the tracked stop
    pub stops_away: Option<String>,
}

impl BusArrivalRecord {
    /// Create a record with only the line, slot and arrival time set
    #[must_use]
    pub const fn new(line_id: LineId, slot: VehicleSlot, arrival: ArrivalTime) -> Self {
        Self {
            line_id,
            slot,
            arrival,
            vehicle_id: None,
            current_stop_name: None,
            next_stop_name: None,
            vehicle_state_message: None,
            direction: None,
            vehicle_type: None,
            remaining_seats: None,
            collected_at: None,
            first_departure: None,
            last_departure: None,
            headway_intervals: None,
            is_last_vehicle: None,
            stops_away: None,
        }
    }

    /// Snapshot key of this record
    #[must_use]
    pub fn key(&self) -> String {
        self.slot.key_for(&self.line_id)
    }
}
