//! Bus API configuration

use serde::{Deserialize, Serialize};
use url::Url;

/// Endpoints and HTTP settings for the Kakao Map bus pages
///
/// Passed into the client constructors so tests can point them at a mock
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusApiConfig {
    /// JSON endpoint listing the buses serving a stop
    #[serde(default = "default_arrivals_url")]
    pub arrivals_url: String,

    /// HTML stop search page
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// HTML station page listing the lines at a stop
    #[serde(default = "default_station_url")]
    pub station_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language sent with directory (HTML) requests
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

fn default_arrivals_url() -> String {
    "https://m.map.kakao.com/actions/busesInBusStopJson".to_string()
}

fn default_search_url() -> String {
    "https://m.map.kakao.com/actions/searchView".to_string()
}

fn default_station_url() -> String {
    "https://m.map.kakao.com/actions/busStationInfo".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Mobile Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "ko-KR,ko;q=0.9,en;q=0.8".to_string()
}

impl Default for BusApiConfig {
    fn default() -> Self {
        Self {
            arrivals_url: default_arrivals_url(),
            search_url: default_search_url(),
            station_url: default_station_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

impl BusApiConfig {
    /// Configuration with every endpoint rooted at `base_url` (mock servers)
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            arrivals_url: format!("{base}/actions/busesInBusStopJson"),
            search_url: format!("{base}/actions/searchView"),
            station_url: format!("{base}/actions/busStationInfo"),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is not an absolute http(s) URL or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("arrivals_url", &self.arrivals_url),
            ("search_url", &self.search_url),
            ("station_url", &self.station_url),
        ] {
            let url = Url::parse(value).map_err(|e| format!("{name} is not a valid URL: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("{name} must use http or https"));
            }
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
