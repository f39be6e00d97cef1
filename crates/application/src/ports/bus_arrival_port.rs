//! Bus arrival port
//!
//! Defines the interface for fetching live arrivals at a stop.

use async_trait::async_trait;
use domain::{BusArrivalRecord, LineId, StopId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for real-time bus arrival data
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BusArrivalPort: Send + Sync {
    /// Fetch and normalize every arrival currently reported at a stop
    ///
    /// Returns one record per line and vehicle slot, in upstream order. An
    /// empty list is a valid answer (no buses running).
    async fn fetch_arrivals(
        &self,
        stop_id: &StopId,
    ) -> Result<Vec<BusArrivalRecord>, ApplicationError>;

    /// Check that every line is currently served at the stop
    ///
    /// Fails with [`ApplicationError::NoSuchStop`] when the stop reports no
    /// buses and [`ApplicationError::NoSuchLine`] listing the missing lines.
    async fn validate_lines(
        &self,
        stop_id: &StopId,
        lines: &[LineId],
    ) -> Result<(), ApplicationError>;
}
