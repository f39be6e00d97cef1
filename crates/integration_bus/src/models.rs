//! Bus data models
//!
//! Raw upstream entries plus their normalization into domain arrival
//! records, and the directory results used while setting up a stop.

use std::fmt;

use domain::{ArrivalTime, BusArrivalRecord, LineId, VehicleSlot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Upstream keys read for one vehicle slot of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotFields {
    /// Slot the keys describe
    pub slot: VehicleSlot,
    /// Seconds until arrival
    pub arrival_time: &'static str,
    /// Vehicle number
    pub vehicle_number: &'static str,
    /// Stop the vehicle is currently at
    pub current_stop: &'static str,
    /// Free-text vehicle state
    pub vehicle_state_message: &'static str,
    /// Remaining seats
    pub remain_seat: &'static str,
    /// Collection timestamp
    pub collected_at: &'static str,
    /// Last-vehicle flag
    pub last_vehicle: &'static str,
    /// Stops remaining until the tracked stop
    pub bus_stop_count: &'static str,
    /// Stop after the tracked stop (reported for the first vehicle only)
    pub next_stop: Option<&'static str>,
}

impl SlotFields {
    /// Keys whose presence indicates the upstream reported this slot
    const fn presence_keys(&self) -> [&'static str; 4] {
        [
            self.arrival_time,
            self.vehicle_number,
            self.vehicle_state_message,
            self.current_stop,
        ]
    }
}

/// Keys for the first approaching vehicle
pub const CURRENT_VEHICLE_FIELDS: SlotFields = SlotFields {
    slot: VehicleSlot::Current,
    arrival_time: "arrivalTime",
    vehicle_number: "vehicleNumber",
    current_stop: "currentBusStopName",
    vehicle_state_message: "vehicleStateMessage",
    remain_seat: "remainSeat",
    collected_at: "collectDateTime",
    last_vehicle: "lastVehicle",
    bus_stop_count: "busStopCount",
    next_stop: Some("nextBusStopName"),
};

/// Keys for the vehicle after that
pub const NEXT_VEHICLE_FIELDS: SlotFields = SlotFields {
    slot: VehicleSlot::Next,
    arrival_time: "arrivalTime2",
    vehicle_number: "vehicleNumber2",
    current_stop: "currentBusStopName2",
    vehicle_state_message: "vehicleStateMessage2",
    remain_seat: "remainSeat2",
    collected_at: "collectDateTime2",
    last_vehicle: "lastVehicle2",
    bus_stop_count: "busStopCount2",
    next_stop: None,
};

/// One element of the upstream `busesList` array, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBusEntry(Value);

impl RawBusEntry {
    /// Wrap a raw JSON value
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Raw field lookup; `None` for absent fields and non-object entries
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// A field rendered as display text
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_text)
    }

    /// The line number (`name` field), if usable
    #[must_use]
    pub fn line_name(&self) -> Option<String> {
        self.text("name")
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    }

    /// Seconds-to-arrival for the given slot
    #[must_use]
    pub fn arrival_time(&self, fields: &SlotFields) -> ArrivalTime {
        self.get(fields.arrival_time)
            .map_or(ArrivalTime::Unreported, parse_arrival)
    }

    /// Whether the upstream reported anything for the slot
    #[must_use]
    pub fn has_slot(&self, fields: &SlotFields) -> bool {
        fields
            .presence_keys()
            .iter()
            .any(|key| self.get(key).is_some())
    }

    /// Normalize this entry into one record for the given slot
    ///
    /// Returns `None` when the entry has no usable line name.
    #[must_use]
    pub fn to_record(&self, fields: &SlotFields) -> Option<BusArrivalRecord> {
        let line = self.line_name().and_then(|n| LineId::new(n).ok())?;

        let mut record = BusArrivalRecord::new(line, fields.slot, self.arrival_time(fields));
        record.vehicle_id = self.text(fields.vehicle_number);
        record.current_stop_name = self.text(fields.current_stop);
        record.next_stop_name = fields.next_stop.and_then(|key| self.text(key));
        record.vehicle_state_message = self.text(fields.vehicle_state_message);
        record.remaining_seats = self.text(fields.remain_seat);
        record.collected_at = self.text(fields.collected_at);
        record.is_last_vehicle = self.text(fields.last_vehicle);
        record.stops_away = self.text(fields.bus_stop_count);
        // Line-level fields are shared by both vehicles.
        record.direction = self.text("direction");
        record.vehicle_type = self.text("typeName");
        record.first_departure = self.text("first");
        record.last_departure = self.text("last");
        record.headway_intervals = self.text("intervals");

        Some(record)
    }

    /// Normalize this entry into its current-vehicle record and, when the
    /// upstream reports one, the next-vehicle companion record
    #[must_use]
    pub fn to_records(&self) -> Vec<BusArrivalRecord> {
        let Some(current) = self.to_record(&CURRENT_VEHICLE_FIELDS) else {
            debug!(entry = %self.0, "Skipping bus entry without a line name");
            return Vec::new();
        };

        let mut records = vec![current];
        if self.has_slot(&NEXT_VEHICLE_FIELDS) {
            records.extend(self.to_record(&NEXT_VEHICLE_FIELDS));
        }
        records
    }
}

impl From<Value> for RawBusEntry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Render a JSON scalar as display text; containers yield `None`
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse an upstream arrival value (number or numeric string)
#[allow(clippy::cast_possible_truncation)] // bounded above, fractional seconds dropped
fn parse_arrival(value: &Value) -> ArrivalTime {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < 9.0e15)
                    .map(|f| f.trunc() as i64)
            })
            .map_or_else(|| ArrivalTime::Malformed(n.to_string()), ArrivalTime::Seconds),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_or_else(|_| ArrivalTime::Malformed(s.clone()), ArrivalTime::Seconds),
        Value::Null => ArrivalTime::Unreported,
        other => ArrivalTime::Malformed(other.to_string()),
    }
}

/// Outcome of checking requested lines against a stop's live entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineValidation {
    /// Every requested line is currently served
    Valid,
    /// The stop returned no buses at all
    NoSuchStop,
    /// Some requested lines are not served (in requested order)
    NoSuchLine {
        /// Lines absent from the response
        invalid: Vec<LineId>,
    },
}

impl LineValidation {
    /// Whether the selection can be accepted
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Lines reported as invalid (empty unless `NoSuchLine`)
    #[must_use]
    pub fn invalid_lines(&self) -> &[LineId] {
        match self {
            Self::NoSuchLine { invalid } => invalid,
            Self::Valid | Self::NoSuchStop => &[],
        }
    }
}

/// Set-difference the wanted lines against the lines present in `entries`
#[must_use]
pub fn validate_lines(entries: &[RawBusEntry], wanted: &[LineId]) -> LineValidation {
    if entries.is_empty() {
        return LineValidation::NoSuchStop;
    }

    let available: Vec<String> = entries.iter().filter_map(RawBusEntry::line_name).collect();
    let invalid: Vec<LineId> = wanted
        .iter()
        .filter(|line| !available.iter().any(|a| a == line.as_str()))
        .cloned()
        .collect();

    if invalid.is_empty() {
        LineValidation::Valid
    } else {
        LineValidation::NoSuchLine { invalid }
    }
}

/// A stop found by name search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCandidate {
    /// Upstream stop id (`data-id`)
    pub id: String,
    /// Stop name (`data-title`)
    pub name: String,
    /// Public stop number shown on the sign
    pub stop_number: String,
    /// Direction the stop serves
    pub direction: String,
    /// Area description
    pub location: String,
    /// Bus categories serving the stop
    pub bus_types: Vec<String>,
}

impl StopCandidate {
    /// Selection label, `"{name}({stop_number}) - {direction}"`
    #[must_use]
    pub fn title(&self) -> String {
        format!("{}({}) - {}", self.name, self.stop_number, self.direction)
    }
}

impl fmt::Display for StopCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A line serving a stop, as listed on the station page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOption {
    /// Route number
    pub number: String,
    /// Bus category (e.g. "간선"), `"Unknown"` when missing
    pub kind: String,
}

impl LineOption {
    /// Selection label, `"{kind} {number}"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.number)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_entry() -> RawBusEntry {
        RawBusEntry::new(json!({
            "name": "720",
            "arrivalTime": "125",
            "arrivalTime2": 900,
            "vehicleNumber": "서울74사1234",
            "vehicleNumber2": "서울74사5678",
            "currentBusStopName": "광화문",
            "currentBusStopName2": "서대문",
            "nextBusStopName": "종로1가",
            "vehicleStateMessage": "2분 5초",
            "vehicleStateMessage2": "15분",
            "remainSeat": 12,
            "direction": "종로",
            "typeName": "간선",
            "first": "04:00",
            "last": "23:30",
            "intervals": "8",
            "collectDateTime": "20241114112703",
            "collectDateTime2": "20241114112703",
            "lastVehicle": false,
            "busStopCount": 2,
            "busStopCount2": 7
        }))
    }

    #[test]
    fn test_current_record_fields() {
        let record = full_entry().to_record(&CURRENT_VEHICLE_FIELDS).unwrap();
        assert_eq!(record.line_id.as_str(), "720");
        assert_eq!(record.slot, VehicleSlot::Current);
        assert_eq!(record.arrival, ArrivalTime::Seconds(125));
        assert_eq!(record.vehicle_id.as_deref(), Some("서울74사1234"));
        assert_eq!(record.next_stop_name.as_deref(), Some("종로1가"));
        assert_eq!(record.remaining_seats.as_deref(), Some("12"));
        assert_eq!(record.is_last_vehicle.as_deref(), Some("false"));
        assert_eq!(record.stops_away.as_deref(), Some("2"));
        assert_eq!(record.vehicle_type.as_deref(), Some("간선"));
    }

    #[test]
    fn test_next_record_reads_suffixed_keys() {
        let record = full_entry().to_record(&NEXT_VEHICLE_FIELDS).unwrap();
        assert_eq!(record.slot, VehicleSlot::Next);
        assert_eq!(record.arrival, ArrivalTime::Seconds(900));
        assert_eq!(record.vehicle_id.as_deref(), Some("서울74사5678"));
        assert_eq!(record.current_stop_name.as_deref(), Some("서대문"));
        assert!(record.next_stop_name.is_none());
        assert!(record.remaining_seats.is_none());
        assert_eq!(record.direction.as_deref(), Some("종로"));
    }

    #[test]
    fn test_entry_yields_companion_record() {
        let records = full_entry().to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key(), "720");
        assert_eq!(records[1].key(), "720:next");
    }

    #[test]
    fn test_entry_without_second_slot() {
        let entry = RawBusEntry::new(json!({ "name": "9", "arrivalTime": 30 }));
        let records = entry.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].slot, VehicleSlot::Current);
    }

    #[test]
    fn test_minimal_entry_never_fails() {
        let entry = RawBusEntry::new(json!({ "name": "9" }));
        let record = entry.to_record(&CURRENT_VEHICLE_FIELDS).unwrap();
        assert_eq!(record.arrival, ArrivalTime::Unreported);
        assert!(record.vehicle_id.is_none());
        assert!(record.collected_at.is_none());
    }

    #[test]
    fn test_entry_without_name_is_skipped() {
        assert!(RawBusEntry::new(json!({ "arrivalTime": 30 })).to_records().is_empty());
        assert!(RawBusEntry::new(json!({ "name": "  " })).to_records().is_empty());
        assert!(RawBusEntry::new(json!("not an object")).to_records().is_empty());
    }

    #[test]
    fn test_arrival_parsing() {
        let parse = |v: Value| RawBusEntry::new(json!({ "name": "1", "arrivalTime": v }))
            .arrival_time(&CURRENT_VEHICLE_FIELDS);

        assert_eq!(parse(json!(125)), ArrivalTime::Seconds(125));
        assert_eq!(parse(json!(" 60 ")), ArrivalTime::Seconds(60));
        assert_eq!(parse(json!(-5)), ArrivalTime::Seconds(-5));
        assert_eq!(parse(json!(12.7)), ArrivalTime::Seconds(12));
        assert_eq!(parse(json!(null)), ArrivalTime::Unreported);
        assert_eq!(parse(json!("bad")), ArrivalTime::Malformed("bad".to_string()));
        assert!(matches!(parse(json!([1])), ArrivalTime::Malformed(_)));
    }

    #[test]
    fn test_numeric_line_name() {
        let entry = RawBusEntry::new(json!({ "name": 1002 }));
        assert_eq!(entry.line_name().as_deref(), Some("1002"));
    }

    #[test]
    fn test_validate_lines() {
        let entries = vec![
            RawBusEntry::new(json!({ "name": "720" })),
            RawBusEntry::new(json!({ "name": "9" })),
        ];
        let line = |s: &str| LineId::new(s).unwrap();

        assert_eq!(
            validate_lines(&entries, &[line("720"), line("9")]),
            LineValidation::Valid
        );

        let result = validate_lines(&entries, &[line("100"), line("9"), line("1")]);
        assert!(!result.is_valid());
        assert_eq!(result.invalid_lines(), &[line("100"), line("1")]);

        assert_eq!(validate_lines(&[], &[line("9")]), LineValidation::NoSuchStop);
    }

    #[test]
    fn test_stop_candidate_title() {
        let stop = StopCandidate {
            id: "BS219257".to_string(),
            name: "광화문".to_string(),
            stop_number: "01123".to_string(),
            direction: "종로 방면".to_string(),
            location: "서울 종로구".to_string(),
            bus_types: vec!["간선".to_string()],
        };
        assert_eq!(stop.title(), "광화문(01123) - 종로 방면");
    }

    #[test]
    fn test_line_option_label() {
        let option = LineOption {
            number: "720".to_string(),
            kind: "간선".to_string(),
        };
        assert_eq!(option.label(), "간선 720");
    }

    #[test]
    fn test_repeated_line_does_not_mix_entries() {
        let entries = [
            RawBusEntry::new(json!({ "name": "720", "arrivalTime": 60, "arrivalTime2": 600 })),
            RawBusEntry::new(json!({ "name": "720", "arrivalTime": 90 })),
        ];
        let snapshot = domain::FetchSnapshot::from_records(
            entries.iter().flat_map(RawBusEntry::to_records),
            chrono::Utc::now(),
        );

        let line = LineId::new("720").unwrap();
        assert_eq!(
            snapshot.get(&line, VehicleSlot::Current).unwrap().arrival,
            ArrivalTime::Seconds(90)
        );
        assert!(snapshot.get(&line, VehicleSlot::Next).is_none());
    }
}
