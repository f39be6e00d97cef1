//! Arrival sensor views
//!
//! One view per tracked line and vehicle slot. Views hold no data of their
//! own: every read looks up the coordinator's latest snapshot, and the ETA
//! is projected from the read time.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use domain::{
    ArrivalTime, BusArrivalRecord, BusStopEntry, LineId, NO_INFORMATION, UNKNOWN, UNKNOWN_SEATS,
    VehicleSlot,
};
use serde::Serialize;
use tracing::warn;

use super::polling_coordinator::PollingCoordinator;

/// Device class reported by every arrival view
pub const DEVICE_CLASS: &str = "timestamp";

const COLLECT_FORMAT: &str = "%Y%m%d%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display attributes of one arrival view
///
/// Fields the upstream omitted carry [`UNKNOWN`]; the line-level fields are
/// only present on the current-vehicle view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrivalAttributes {
    /// Raw seconds until arrival (`None` when unparsable)
    pub arrival_time: Option<i64>,
    /// `"{m}min {s}s"`
    pub time_left: String,
    /// Projected arrival, RFC 3339
    pub arrival_datetime: String,
    pub vehicle_number: String,
    pub current_stop: String,
    pub vehicle_state_message: String,
    pub remain_seat: String,
    /// Upstream collection time, `YYYY-MM-DD HH:MM:SS`
    pub updated_at: String,
    pub last_vehicle: String,
    pub bus_stop_count: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervals: Option<String>,
}

impl ArrivalAttributes {
    fn from_record(record: &BusArrivalRecord, now: DateTime<Utc>) -> Self {
        let eta = record.arrival.eta_seconds();
        let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let line_level = |value: &Option<String>| match record.slot {
            VehicleSlot::Current => Some(or_unknown(value)),
            VehicleSlot::Next => None,
        };

        let vehicle_state_message = match (&record.vehicle_state_message, record.slot, eta) {
            (Some(message), _, _) => message.clone(),
            (None, VehicleSlot::Next, None) => NO_INFORMATION.to_string(),
            (None, _, _) => UNKNOWN.to_string(),
        };

        Self {
            arrival_time: record.arrival.raw_seconds(),
            time_left: eta.map_or_else(|| UNKNOWN.to_string(), format_time_left),
            arrival_datetime: record
                .arrival
                .arrival_at(now)
                .map_or_else(|| UNKNOWN.to_string(), |at| at.to_rfc3339()),
            vehicle_number: or_unknown(&record.vehicle_id),
            current_stop: or_unknown(&record.current_stop_name),
            vehicle_state_message,
            remain_seat: record
                .remaining_seats
                .clone()
                .unwrap_or_else(|| UNKNOWN_SEATS.to_string()),
            updated_at: record
                .collected_at
                .as_deref()
                .map_or_else(|| UNKNOWN.to_string(), format_collect_datetime),
            last_vehicle: or_unknown(&record.is_last_vehicle),
            bus_stop_count: or_unknown(&record.stops_away),
            next_stop: line_level(&record.next_stop_name),
            direction: line_level(&record.direction),
            bus_type: line_level(&record.vehicle_type),
            first_time: line_level(&record.first_departure),
            last_time: line_level(&record.last_departure),
            intervals: line_level(&record.headway_intervals),
        }
    }
}

/// Serializable point-in-time view of a sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub device_class: &'static str,
    pub available: bool,
    /// Projected arrival, RFC 3339
    pub value: Option<String>,
    /// Empty when the line/slot is absent from the snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ArrivalAttributes>,
}

/// Arrival view for one line and slot of a stop
#[derive(Debug, Clone)]
pub struct ArrivalSensor {
    coordinator: Arc<PollingCoordinator>,
    line: LineId,
    slot: VehicleSlot,
    unique_id: String,
    name: String,
}

impl ArrivalSensor {
    /// Create a view; `display_name` prefixes the generated name
    pub fn new(
        coordinator: Arc<PollingCoordinator>,
        line: LineId,
        slot: VehicleSlot,
        display_name: Option<&str>,
    ) -> Self {
        let stop_id = coordinator.query().stop_id().clone();
        let unique_id = format!("{stop_id}_{line}{}", slot.id_suffix());
        let base = match slot {
            VehicleSlot::Current => format!("{line} bus arrival ({stop_id})"),
            VehicleSlot::Next => format!("Next {line} bus arrival ({stop_id})"),
        };
        let name = match display_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(prefix) => format!("{prefix} {base}"),
            None => base,
        };

        Self {
            coordinator,
            line,
            slot,
            unique_id,
            name,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn line(&self) -> &LineId {
        &self.line
    }

    pub const fn slot(&self) -> VehicleSlot {
        self.slot
    }

    pub const fn device_class(&self) -> &'static str {
        DEVICE_CLASS
    }

    fn with_record<T>(&self, f: impl FnOnce(&BusArrivalRecord) -> T) -> Option<T> {
        let snapshot = self.coordinator.snapshot()?;
        snapshot.get(&self.line, self.slot).map(f)
    }

    /// Last cycle succeeded, the record exists and its arrival time parses
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
            && self
                .with_record(|r| r.arrival.is_parseable())
                .unwrap_or(false)
    }

    /// Projected arrival relative to `now`; `None` without a positive ETA
    pub fn native_value_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.with_record(|record| {
            if let ArrivalTime::Malformed(raw) = &record.arrival {
                warn!(line = %self.line, slot = %self.slot, %raw, "Unparsable arrival time");
            }
            record.arrival.arrival_at(now)
        })
        .flatten()
    }

    /// Projected arrival as of now
    pub fn native_value(&self) -> Option<DateTime<Utc>> {
        self.native_value_at(Utc::now())
    }

    /// Display attributes relative to `now`; `None` when the record is absent
    pub fn attributes_at(&self, now: DateTime<Utc>) -> Option<ArrivalAttributes> {
        self.with_record(|record| ArrivalAttributes::from_record(record, now))
    }

    pub fn attributes(&self) -> Option<ArrivalAttributes> {
        self.attributes_at(Utc::now())
    }

    /// Everything a host needs to render the view at `now`
    pub fn state_at(&self, now: DateTime<Utc>) -> SensorState {
        SensorState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            device_class: DEVICE_CLASS,
            available: self.available(),
            value: self.native_value_at(now).map(|at| at.to_rfc3339()),
            attributes: self.attributes_at(now),
        }
    }

    pub fn state(&self) -> SensorState {
        self.state_at(Utc::now())
    }
}

/// Two views (current and next vehicle) per configured line, in line order
pub fn create_sensors(
    coordinator: &Arc<PollingCoordinator>,
    entry: &BusStopEntry,
) -> Vec<ArrivalSensor> {
    entry
        .lines
        .iter()
        .flat_map(|line| {
            VehicleSlot::ALL.into_iter().map(move |slot| {
                ArrivalSensor::new(
                    Arc::clone(coordinator),
                    line.clone(),
                    slot,
                    entry.name.as_deref(),
                )
            })
        })
        .collect()
}

/// `"{m}min {s}s"` for a positive number of seconds
pub fn format_time_left(seconds: i64) -> String {
    format!("{}min {}s", seconds / 60, seconds % 60)
}

/// Reformat an upstream `YYYYMMDDHHMMSS` timestamp for display
///
/// Anything unparsable becomes [`UNKNOWN`].
pub fn format_collect_datetime(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw.trim(), COLLECT_FORMAT).map_or_else(
        |_| {
            warn!(%raw, "Unparsable collection timestamp");
            UNKNOWN.to_string()
        },
        |dt| dt.format(DISPLAY_FORMAT).to_string(),
    )
}
