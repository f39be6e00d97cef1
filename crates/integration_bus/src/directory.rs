//! Kakao Map stop directory
//!
//! Resolves a stop name to candidate stop ids and lists the lines serving a
//! stop by scraping the mobile search and station pages. Used only while
//! setting up a stop; markup that does not match is skipped, never fatal.
//!
//! Items are the `<li>` elements carrying a `data-id`. An item's markup runs
//! until the next such element, so nested lists inside an item stay part of
//! it. Field lookups take the first match inside that span.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use domain::StopId;
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::config::BusApiConfig;
use crate::error::BusApiError;
use crate::models::{LineOption, StopCandidate};

/// Fallback for missing location / bus category text
const UNKNOWN_TEXT: &str = "Unknown";

/// Screen-reader label preceding the public stop number
const STOP_NUMBER_LABEL: &str = "버스 정류장 번호";

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::expect_used)] // Infallible with valid static patterns
            Regex::new($pattern).expect("Failed to compile directory pattern")
        });
    };
}

static_regex!(LIST_ITEM_OPEN, r"<li\b([^>]*)>");
static_regex!(ATTRIBUTE, r#"([\w-]+)\s*=\s*"([^"]*)""#);
static_regex!(
    SCREEN_OUT_FOLLOWED_BY_TEXT,
    r#"(?s)<span[^>]*class="[^"]*\bscreen_out\b[^"]*"[^>]*>(.*?)</span>\s*([^<]*)"#
);
static_regex!(
    TXT_BAR_FOLLOWED_BY_TEXT,
    r#"(?s)<span[^>]*class="[^"]*\btxt_bar\b[^"]*"[^>]*>.*?</span>\s*([^<]*)"#
);
static_regex!(
    TXT_GINFO,
    r#"(?s)<span[^>]*class="[^"]*\btxt_ginfo\b[^"]*"[^>]*>(.*?)</span>"#
);
static_regex!(
    BUS_TYPE,
    r#"(?s)<span[^>]*class="(?:[^"]*\s)?bus_type[^"]*"[^>]*>(.*?)</span>"#
);
static_regex!(
    TIT_G,
    r#"(?s)<strong[^>]*class="[^"]*\btit_g\b[^"]*"[^>]*>(.*?)</strong>"#
);
static_regex!(TAG, r"(?s)<[^>]*>");

/// Trait for stop directory clients
#[async_trait]
pub trait StopDirectoryClient: Send + Sync {
    /// Search stops by (partial) name
    async fn search_stops(&self, name: &str) -> Result<Vec<StopCandidate>, BusApiError>;

    /// List the lines serving a stop
    async fn list_lines(&self, stop_id: &StopId) -> Result<Vec<LineOption>, BusApiError>;
}

/// Stop directory backed by the Kakao Map mobile pages
#[derive(Debug, Clone)]
pub struct KakaoStopDirectory {
    client: Client,
    config: BusApiConfig,
}

impl KakaoStopDirectory {
    /// Create a new directory client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &BusApiConfig) -> Result<Self, BusApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| BusApiError::Configuration(e.to_string()))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| BusApiError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// GET an HTML page, failing on any non-200 status
    async fn get_html(&self, url: &str, query: &[(&str, &str)]) -> Result<String, BusApiError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| BusApiError::from_reqwest(&e, self.config.timeout_secs))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), ?url, "Directory page returned an error status");
            return Err(BusApiError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| BusApiError::from_reqwest(&e, self.config.timeout_secs))
    }

    /// Extract stop candidates from the search result page
    fn parse_search_page(html: &str) -> Vec<StopCandidate> {
        list_items(html)
            .into_iter()
            .filter_map(|(attrs, body)| {
                if !has_class(attrs, "search_item") {
                    return None;
                }

                let id = attribute(attrs, "data-id")?;
                let name = attribute(attrs, "data-title").unwrap_or_default();

                let stop_number = SCREEN_OUT_FOLLOWED_BY_TEXT
                    .captures_iter(body)
                    .find(|c| c.get(1).is_some_and(|l| l.as_str().contains(STOP_NUMBER_LABEL)))
                    .and_then(|c| c.get(2))
                    .map(|m| clean_text(m.as_str()))
                    .filter(|s| !s.is_empty());

                let direction = TXT_BAR_FOLLOWED_BY_TEXT
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .map(|m| clean_text(m.as_str()))
                    .filter(|s| !s.is_empty());

                let (Some(stop_number), Some(direction)) = (stop_number, direction) else {
                    debug!(%id, "Skipping search item without stop number or direction");
                    return None;
                };

                let location = TXT_GINFO
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .map(|m| clean_text(m.as_str()))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| UNKNOWN_TEXT.to_string());

                let bus_types = BUS_TYPE
                    .captures_iter(body)
                    .filter_map(|c| c.get(1))
                    .map(|m| clean_text(m.as_str()))
                    .collect();

                Some(StopCandidate {
                    id,
                    name,
                    stop_number,
                    direction,
                    location,
                    bus_types,
                })
            })
            .collect()
    }

    /// Extract the lines listed on a station page
    fn parse_station_page(html: &str) -> Vec<LineOption> {
        list_items(html)
            .into_iter()
            .filter_map(|(_, body)| {
                let number = TIT_G
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .map(|m| clean_text(m.as_str()))
                    .filter(|s| !s.is_empty())?;

                let kind = BUS_TYPE
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .map(|m| clean_text(m.as_str()))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| UNKNOWN_TEXT.to_string());

                Some(LineOption { number, kind })
            })
            .collect()
    }
}

#[async_trait]
impl StopDirectoryClient for KakaoStopDirectory {
    #[instrument(skip(self))]
    async fn search_stops(&self, name: &str) -> Result<Vec<StopCandidate>, BusApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let html = self
            .get_html(&self.config.search_url, &[("q", name), ("lvl", "2")])
            .await?;

        let stops = Self::parse_search_page(&html);
        debug!(count = stops.len(), "Stops found");
        Ok(stops)
    }

    #[instrument(skip(self, stop_id), fields(stop_id = %stop_id))]
    async fn list_lines(&self, stop_id: &StopId) -> Result<Vec<LineOption>, BusApiError> {
        let html = self
            .get_html(&self.config.station_url, &[("busStopId", stop_id.as_str())])
            .await?;

        let lines = Self::parse_station_page(&html);
        debug!(count = lines.len(), "Lines found");
        Ok(lines)
    }
}

/// Split a page into `(attributes, markup)` per `<li data-id=…>` item
fn list_items(html: &str) -> Vec<(&str, &str)> {
    let opens: Vec<_> = LIST_ITEM_OPEN
        .captures_iter(html)
        .filter_map(|c| {
            let tag = c.get(0)?;
            let attrs = c.get(1)?.as_str();
            attribute(attrs, "data-id").map(|_| (tag.start(), tag.end(), attrs))
        })
        .collect();

    opens
        .iter()
        .enumerate()
        .map(|(i, &(_, body_start, attrs))| {
            let span_end = opens.get(i + 1).map_or(html.len(), |&(next, _, _)| next);
            let span = &html[body_start..span_end];
            let body = span.rfind("</li>").map_or(span, |close| &span[..close]);
            (attrs, body)
        })
        .collect()
}

/// Value of an HTML attribute in a tag's attribute text
fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attrs)
        .find(|c| c.get(1).is_some_and(|n| n.as_str().eq_ignore_ascii_case(name)))
        .and_then(|c| c.get(2))
        .map(|v| decode_entities(v.as_str()))
}

/// Whether the `class` attribute contains the given class token
fn has_class(attrs: &str, class: &str) -> bool {
    attribute(attrs, "class").is_some_and(|v| v.split_whitespace().any(|c| c == class))
}

/// Strip tags, decode entities and collapse whitespace
fn clean_text(fragment: &str) -> String {
    let without_tags = TAG.replace_all(fragment, " ");
    decode_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the handful of entities the pages actually use
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
