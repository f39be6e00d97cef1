//! Kakao Map arrivals client
//!
//! Fetches the buses currently serving a stop from the mobile
//! `busesInBusStopJson` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use domain::{LineId, StopId};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::BusApiConfig;
use crate::error::BusApiError;
use crate::models::{LineValidation, RawBusEntry, validate_lines};

/// Trait for bus arrival clients
#[async_trait]
pub trait BusArrivalClient: Send + Sync {
    /// Fetch the raw `busesList` entries for a stop, in upstream order
    async fn fetch(&self, stop_id: &StopId) -> Result<Vec<RawBusEntry>, BusApiError>;

    /// Check that every wanted line is currently served at the stop
    ///
    /// Only meaningful while setting up a stop: during normal operation a line
    /// legitimately disappears from the response when it is off schedule.
    async fn validate(
        &self,
        stop_id: &StopId,
        wanted: &[LineId],
    ) -> Result<LineValidation, BusApiError> {
        let entries = self.fetch(stop_id).await?;
        let result = validate_lines(&entries, wanted);
        if !result.is_valid() {
            warn!(%stop_id, ?result, "Requested lines failed validation");
        }
        Ok(result)
    }
}

/// Arrivals client for the Kakao Map mobile endpoint
///
/// Holds one long-lived `reqwest::Client`, so connections are reused across
/// polls.
#[derive(Debug, Clone)]
pub struct KakaoBusClient {
    client: Client,
    config: BusApiConfig,
}

impl KakaoBusClient {
    /// Create a new arrivals client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &BusApiConfig) -> Result<Self, BusApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BusApiError::Configuration(e.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client that shares an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: &BusApiConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Parse the JSON body into the raw `busesList` entries
    fn parse_buses_response(body: &str) -> Result<Vec<RawBusEntry>, BusApiError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| BusApiError::MalformedResponse(e.to_string()))?;

        match value.get("busesList") {
            Some(Value::Array(entries)) => {
                Ok(entries.iter().cloned().map(RawBusEntry::new).collect())
            },
            Some(other) => Err(BusApiError::MalformedResponse(format!(
                "busesList is not a list: {other}"
            ))),
            None => Err(BusApiError::MalformedResponse(
                "busesList field missing".to_string(),
            )),
        }
    }
}

#[async_trait]
impl BusArrivalClient for KakaoBusClient {
    #[instrument(skip(self, stop_id), fields(stop_id = %stop_id))]
    async fn fetch(&self, stop_id: &StopId) -> Result<Vec<RawBusEntry>, BusApiError> {
        let url = &self.config.arrivals_url;

        debug!(?url, "Fetching buses at stop");

        let response = self
            .client
            .get(url)
            .query(&[("busStopId", stop_id.as_str())])
            .send()
            .await
            .map_err(|e| BusApiError::from_reqwest(&e, self.config.timeout_secs))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Arrivals endpoint returned an error status");
            return Err(BusApiError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| BusApiError::from_reqwest(&e, self.config.timeout_secs))?;

        let entries = Self::parse_buses_response(&body)?;

        if entries.is_empty() {
            debug!("No buses currently reported at stop");
        }

        debug!(count = entries.len(), "Buses fetched");
        Ok(entries)
    }
}
