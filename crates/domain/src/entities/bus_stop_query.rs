//! The stop/line selection a coordinator polls for

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{LineId, StopId};

/// Immutable description of what to poll: one stop and the lines tracked there
///
/// Lines keep their configured order (used for display) and are de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStopQuery {
    stop_id: StopId,
    lines: Vec<LineId>,
    name: Option<String>,
}

impl BusStopQuery {
    /// Create a query; at least one line is required
    pub fn new(
        stop_id: StopId,
        lines: impl IntoIterator<Item = LineId>,
        name: Option<String>,
    ) -> Result<Self, DomainError> {
        let mut unique: Vec<LineId> = Vec::new();
        for line in lines {
            if !unique.contains(&line) {
                unique.push(line);
            }
        }

        if unique.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "At least one bus line must be tracked at stop {stop_id}"
            )));
        }

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            stop_id,
            lines: unique,
            name,
        })
    }

    /// The stop being polled
    pub fn stop_id(&self) -> &StopId {
        &self.stop_id
    }

    /// Tracked lines in display order
    pub fn lines(&self) -> &[LineId] {
        &self.lines
    }

    /// Optional display name for the stop
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the given line is tracked by this query
    pub fn tracks(&self, line: &LineId) -> bool {
        self.lines.contains(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> LineId {
        LineId::new(s).unwrap()
    }

    #[test]
    fn query_deduplicates_preserving_order() {
        let query = BusStopQuery::new(
            StopId::new("BS1").unwrap(),
            vec![line("720"), line("100"), line("720")],
            None,
        )
        .unwrap();

        assert_eq!(query.lines(), &[line("720"), line("100")]);
        assert!(query.tracks(&line("100")));
        assert!(!query.tracks(&line("9")));
    }

    #[test]
    fn query_requires_a_line() {
        let result = BusStopQuery::new(StopId::new("BS1").unwrap(), Vec::new(), None);
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn blank_name_is_dropped() {
        let query =
            BusStopQuery::new(StopId::new("BS1").unwrap(), vec![line("1")], Some("  ".into()))
                .unwrap();
        assert!(query.name().is_none());
    }
}
