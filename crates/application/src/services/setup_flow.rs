//! Stop setup wizard
//!
//! Drives the configuration steps for a new stop: search by name, pick a
//! stop, pick lines, validate them against the live arrivals and produce a
//! [`BusStopEntry`]. Failures are reported as form error keys the host can
//! show next to the form.

use std::sync::Arc;

use domain::{BusStopEntry, DomainError, LineId, StopId};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{BusArrivalPort, ServedLine, StopDirectoryPort, StopSearchResult};

/// Form-level error shown by the setup wizard
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    /// The name search found no stops
    #[error("no_bus_stop")]
    NoBusStop,
    /// The stop id is malformed or reports no buses
    #[error("invalid_bus_stop_id")]
    InvalidBusStopId,
    /// A selected line is malformed or not served at the stop
    #[error("invalid_bus_number")]
    InvalidBusNumber,
    /// The upstream did not answer in time
    #[error("timeout_error")]
    TimeoutError,
    /// The upstream failed or answered with garbage
    #[error("client_error")]
    ClientError,
    /// The same stop and lines are already configured
    #[error("already_configured")]
    AlreadyConfigured,
    /// The scan interval override is not a positive number of seconds
    #[error("invalid_scan_interval")]
    InvalidScanInterval,
    /// Anything else
    #[error("unknown_error")]
    UnknownError,
}

impl FormError {
    /// Key used by the host to look up the message
    pub const fn key(self) -> &'static str {
        match self {
            Self::NoBusStop => "no_bus_stop",
            Self::InvalidBusStopId => "invalid_bus_stop_id",
            Self::InvalidBusNumber => "invalid_bus_number",
            Self::TimeoutError => "timeout_error",
            Self::ClientError => "client_error",
            Self::AlreadyConfigured => "already_configured",
            Self::InvalidScanInterval => "invalid_scan_interval",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl From<&ApplicationError> for FormError {
    fn from(err: &ApplicationError) -> Self {
        match err {
            ApplicationError::NoSuchStop
            | ApplicationError::Domain(DomainError::InvalidStopId(_)) => Self::InvalidBusStopId,
            ApplicationError::NoSuchLine { .. }
            | ApplicationError::Domain(DomainError::InvalidLineId(_)) => Self::InvalidBusNumber,
            ApplicationError::UpstreamTimeout => Self::TimeoutError,
            ApplicationError::UpstreamHttp { .. }
            | ApplicationError::UpstreamTransport(_)
            | ApplicationError::UpstreamMalformed(_) => Self::ClientError,
            ApplicationError::AlreadyConfigured(_) => Self::AlreadyConfigured,
            _ => Self::UnknownError,
        }
    }
}

impl From<ApplicationError> for FormError {
    fn from(err: ApplicationError) -> Self {
        Self::from(&err)
    }
}

/// Setup wizard over the arrivals and directory ports
pub struct SetupFlow {
    arrivals: Arc<dyn BusArrivalPort>,
    directory: Arc<dyn StopDirectoryPort>,
}

impl std::fmt::Debug for SetupFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupFlow").finish_non_exhaustive()
    }
}

impl SetupFlow {
    /// Create a new setup flow
    pub fn new(arrivals: Arc<dyn BusArrivalPort>, directory: Arc<dyn StopDirectoryPort>) -> Self {
        Self {
            arrivals,
            directory,
        }
    }

    /// Step 1: find stops matching a name
    #[instrument(skip(self))]
    pub async fn search_stops(&self, stop_name: &str) -> Result<Vec<StopSearchResult>, FormError> {
        let stop_name = stop_name.trim();
        if stop_name.is_empty() {
            return Err(FormError::NoBusStop);
        }

        let stops = self
            .directory
            .search_stops(stop_name)
            .await
            .map_err(|e| log_form_error("search", &e))?;

        if stops.is_empty() {
            return Err(FormError::NoBusStop);
        }

        debug!(count = stops.len(), "Stops found");
        Ok(stops)
    }

    /// Step 2: list the lines serving the chosen stop
    #[instrument(skip(self), fields(stop_id = %stop_id))]
    pub async fn list_lines(&self, stop_id: &StopId) -> Result<Vec<ServedLine>, FormError> {
        self.directory
            .list_lines(stop_id)
            .await
            .map_err(|e| log_form_error("list lines", &e))
    }

    /// Check raw stop and line input against the live arrivals
    pub async fn validate(
        &self,
        stop_id: &str,
        lines: &[String],
    ) -> Result<(StopId, Vec<LineId>), FormError> {
        let stop_id = StopId::new(stop_id).map_err(|_| FormError::InvalidBusStopId)?;
        let lines = parse_lines(lines)?;

        self.arrivals
            .validate_lines(&stop_id, &lines)
            .await
            .map_err(|e| log_form_error("validate", &e))?;

        Ok((stop_id, lines))
    }

    /// Step 3: validate the selection and build the entry to persist
    ///
    /// `existing` holds the entries already configured; an entry with the
    /// same unique id is rejected before any network call.
    #[instrument(skip(self, existing))]
    pub async fn create_entry(
        &self,
        stop_id: &str,
        lines: &[String],
        name: Option<String>,
        existing: &[BusStopEntry],
    ) -> Result<BusStopEntry, FormError> {
        let candidate = BusStopEntry {
            stop_id: StopId::new(stop_id).map_err(|_| FormError::InvalidBusStopId)?,
            lines: parse_lines(lines)?,
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            scan_interval_secs: None,
        };

        let unique_id = candidate.unique_id();
        if existing.iter().any(|e| e.unique_id() == unique_id) {
            warn!(%unique_id, "Stop already configured");
            return Err(FormError::AlreadyConfigured);
        }

        self.arrivals
            .validate_lines(&candidate.stop_id, &candidate.lines)
            .await
            .map_err(|e| log_form_error("validate", &e))?;

        info!(%unique_id, "Stop entry created");
        Ok(candidate)
    }
}

/// Options step: set the poll interval override
pub fn set_scan_interval(entry: &mut BusStopEntry, seconds: i64) -> Result<(), FormError> {
    let seconds = u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .ok_or(FormError::InvalidScanInterval)?;
    entry.scan_interval_secs = Some(seconds);
    Ok(())
}

fn parse_lines(lines: &[String]) -> Result<Vec<LineId>, FormError> {
    let mut parsed: Vec<LineId> = Vec::with_capacity(lines.len());
    for line in lines {
        let line = LineId::new(line.as_str()).map_err(|_| FormError::InvalidBusNumber)?;
        if !parsed.contains(&line) {
            parsed.push(line);
        }
    }

    if parsed.is_empty() {
        return Err(FormError::InvalidBusNumber);
    }
    Ok(parsed)
}

fn log_form_error(step: &str, err: &ApplicationError) -> FormError {
    let form_error = FormError::from(err);
    warn!(step, error = %err, key = form_error.key(), "Setup step failed");
    form_error
}
