//! Snapshot of every arrival record produced by one successful poll

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::entities::{BusArrivalRecord, VehicleSlot};
use crate::value_objects::LineId;

/// Per-line arrival records from a single upstream response
///
/// Built wholesale from one response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSnapshot {
    records: HashMap<(LineId, VehicleSlot), BusArrivalRecord>,
    fetched_at: DateTime<Utc>,
}

impl FetchSnapshot {
    /// Build a snapshot from normalized records
    ///
    /// Records arrive grouped per upstream entry, current slot first. If the
    /// upstream lists the same line twice, the later entry replaces both
    /// slots, so a line never mixes vehicles from different entries.
    pub fn from_records(
        records: impl IntoIterator<Item = BusArrivalRecord>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut by_slot = HashMap::new();
        for record in records {
            if record.slot == VehicleSlot::Current {
                by_slot.remove(&(record.line_id.clone(), VehicleSlot::Next));
            }
            by_slot.insert((record.line_id.clone(), record.slot), record);
        }
        Self {
            records: by_slot,
            fetched_at,
        }
    }

    /// An empty snapshot (stop currently has no active buses)
    #[must_use]
    pub fn empty(fetched_at: DateTime<Utc>) -> Self {
        Self {
            records: HashMap::new(),
            fetched_at,
        }
    }

    /// Look up the record for a line and slot
    pub fn get(&self, line: &LineId, slot: VehicleSlot) -> Option<&BusArrivalRecord> {
        self.records.get(&(line.clone(), slot))
    }

    /// When the upstream response was received
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Number of records (both slots)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the response contained no buses
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct lines present in the snapshot, sorted
    pub fn lines(&self) -> Vec<&LineId> {
        let mut lines: Vec<&LineId> = self
            .records
            .values()
            .filter(|r| r.slot == VehicleSlot::Current)
            .map(|r| &r.line_id)
            .collect();
        lines.sort();
        lines
    }

    /// Iterate over all records in unspecified order
    pub fn records(&self) -> impl Iterator<Item = &BusArrivalRecord> {
        self.records.values()
    }
}
