//! Kakao bus adapter - Implements BusArrivalPort and StopDirectoryPort using integration_bus

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{BusArrivalPort, ServedLine, StopDirectoryPort, StopSearchResult};
use async_trait::async_trait;
use domain::{BusArrivalRecord, LineId, StopId};
use integration_bus::{
    BusApiConfig, BusApiError, BusArrivalClient, KakaoBusClient, KakaoStopDirectory,
    LineValidation, RawBusEntry, StopDirectoryClient,
};
use tracing::{debug, instrument, warn};

/// Adapter for the Kakao Map arrivals endpoint and stop directory
pub struct KakaoBusAdapter {
    arrivals: Arc<dyn BusArrivalClient>,
    directory: Arc<dyn StopDirectoryClient>,
}

impl std::fmt::Debug for KakaoBusAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KakaoBusAdapter")
            .field("arrivals", &"BusArrivalClient")
            .field("directory", &"StopDirectoryClient")
            .finish()
    }
}

impl KakaoBusAdapter {
    /// Create an adapter backed by the Kakao Map clients
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients fail to initialize.
    pub fn new(config: &BusApiConfig) -> Result<Self, ApplicationError> {
        let arrivals = KakaoBusClient::new(config).map_err(map_bus_error)?;
        let directory = KakaoStopDirectory::new(config).map_err(map_bus_error)?;
        Ok(Self::with_clients(Arc::new(arrivals), Arc::new(directory)))
    }

    /// Create an adapter over arbitrary clients
    pub fn with_clients(
        arrivals: Arc<dyn BusArrivalClient>,
        directory: Arc<dyn StopDirectoryClient>,
    ) -> Self {
        Self {
            arrivals,
            directory,
        }
    }

    /// Normalize raw entries, keeping upstream order
    fn normalize(entries: &[RawBusEntry]) -> Vec<BusArrivalRecord> {
        entries.iter().flat_map(RawBusEntry::to_records).collect()
    }
}

/// Map client errors onto the application error taxonomy
pub fn map_bus_error(err: BusApiError) -> ApplicationError {
    match err {
        BusApiError::HttpStatus { status } => ApplicationError::UpstreamHttp { status },
        BusApiError::Timeout { .. } => ApplicationError::UpstreamTimeout,
        BusApiError::Transport(msg) => ApplicationError::UpstreamTransport(msg),
        BusApiError::MalformedResponse(msg) => ApplicationError::UpstreamMalformed(msg),
        BusApiError::Configuration(msg) => ApplicationError::Configuration(msg),
    }
}

#[async_trait]
impl BusArrivalPort for KakaoBusAdapter {
    #[instrument(skip(self, stop_id), fields(stop_id = %stop_id))]
    async fn fetch_arrivals(
        &self,
        stop_id: &StopId,
    ) -> Result<Vec<BusArrivalRecord>, ApplicationError> {
        let entries = self.arrivals.fetch(stop_id).await.map_err(map_bus_error)?;
        let records = Self::normalize(&entries);
        debug!(
            entries = entries.len(),
            records = records.len(),
            "Arrivals normalized"
        );
        Ok(records)
    }

    #[instrument(skip(self, stop_id), fields(stop_id = %stop_id))]
    async fn validate_lines(
        &self,
        stop_id: &StopId,
        lines: &[LineId],
    ) -> Result<(), ApplicationError> {
        match self
            .arrivals
            .validate(stop_id, lines)
            .await
            .map_err(map_bus_error)?
        {
            LineValidation::Valid => Ok(()),
            LineValidation::NoSuchStop => Err(ApplicationError::NoSuchStop),
            LineValidation::NoSuchLine { invalid } => {
                Err(ApplicationError::NoSuchLine { invalid })
            },
        }
    }
}

#[async_trait]
impl StopDirectoryPort for KakaoBusAdapter {
    #[instrument(skip(self))]
    async fn search_stops(&self, name: &str) -> Result<Vec<StopSearchResult>, ApplicationError> {
        let candidates = self
            .directory
            .search_stops(name)
            .await
            .map_err(map_bus_error)?;

        Ok(candidates
            .into_iter()
            .filter_map(|candidate| match StopId::new(candidate.id.as_str()) {
                Ok(stop_id) => Some(StopSearchResult {
                    stop_id,
                    title: candidate.title(),
                    location: candidate.location,
                    bus_types: candidate.bus_types,
                }),
                Err(e) => {
                    warn!(id = %candidate.id, error = %e, "Skipping stop with unusable id");
                    None
                },
            })
            .collect())
    }

    #[instrument(skip(self, stop_id), fields(stop_id = %stop_id))]
    async fn list_lines(&self, stop_id: &StopId) -> Result<Vec<ServedLine>, ApplicationError> {
        let lines = self
            .directory
            .list_lines(stop_id)
            .await
            .map_err(map_bus_error)?;

        Ok(lines
            .into_iter()
            .map(|line| ServedLine {
                number: line.number,
                kind: line.kind,
            })
            .collect())
    }
}
