//! USGS earthquake feed client.
//!
//! Provides blocking HTTP access to the USGS summary feeds.
//! Uses reqwest with rustls for TLS.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::FetchError;
use crate::models::{self, EarthquakeRecord};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("bhumikamp/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Time span covered by a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedWindow {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl FeedWindow {
    /// All windows, in selector order.
    pub const ALL: [Self; 4] = [Self::Hour, Self::Day, Self::Week, Self::Month];

    /// Get the selector value for this window.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Path of the all-magnitudes feed for this window.
    #[must_use]
    pub fn feed_path(self) -> String {
        format!("/earthquakes/feed/v1.0/summary/all_{}.geojson", self.as_str())
    }
}

impl fmt::Display for FeedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeedWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!(
                "unknown feed window: {s} (expected: {})",
                Self::ALL.map(Self::as_str).join(", ")
            )),
        }
    }
}

/// Client for the USGS summary feeds.
///
/// Holds no state between calls: every `fetch` is one request.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    /// Create a client for the public USGS endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(USGS_BASE_URL)
    }

    /// Create a client against another host serving the same paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the feed for `window`.
    #[must_use]
    pub fn feed_url(&self, window: FeedWindow) -> String {
        format!("{}{}", self.base_url, window.feed_path())
    }

    /// Fetch and normalize the feed for a window.
    ///
    /// Records come back in feed order. No retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns `Network` on transport failure, `HttpStatus` on a
    /// non-success response and `MalformedPayload` if the body is not a
    /// usable feature collection.
    #[instrument(skip(self), fields(window = window.as_str()))]
    pub fn fetch(&self, window: FeedWindow) -> Result<Vec<EarthquakeRecord>, FetchError> {
        let url = self.feed_url(window);

        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send()?;

        // Check status before reading the body
        let status = response.status();
        debug!("response status {}", status);
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text()?;
        let records = models::parse_feed(&body)?;

        debug!("fetched {} events", records.len());
        Ok(records)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::SocketAddr;
    use std::sync::mpsc;

    use axum::{http::StatusCode, routing::get, Router};

    use super::*;

    pub(crate) const ONE_EVENT: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":"us7000abcd","properties":{"mag":5.2,"place":"10 km S of Somewhere","time":1700000000000,"url":"https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd"},"geometry":{"type":"Point","coordinates":[142.3,38.1,35.0]}}
    ]}"#;

    /// Serve a fixed response for one window's feed path on a background thread.
    pub(crate) fn serve(window: FeedWindow, status: StatusCode, body: &'static str) -> String {
        let (tx, rx) = mpsc::channel::<SocketAddr>();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                let app = Router::new()
                    .route(&window.feed_path(), get(move || async move { (status, body) }));
                axum::serve(listener, app).await.unwrap();
            });
        });

        format!("http://{}", rx.recv().unwrap())
    }

    #[test]
    fn test_window_round_trip() {
        for window in FeedWindow::ALL {
            let parsed: FeedWindow = window.as_str().parse().unwrap();
            assert_eq!(parsed, window);
        }
        assert!("year".parse::<FeedWindow>().is_err());
    }

    #[test]
    fn test_feed_url() {
        let client = FeedClient::with_base_url("http://localhost:9/").unwrap();
        assert_eq!(
            client.feed_url(FeedWindow::Month),
            "http://localhost:9/earthquakes/feed/v1.0/summary/all_month.geojson"
        );
        assert_eq!(
            FeedClient::new().unwrap().feed_url(FeedWindow::Day),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson"
        );
    }

    #[test]
    fn test_fetch_success() {
        let base = serve(FeedWindow::Week, StatusCode::OK, ONE_EVENT);
        let client = FeedClient::with_base_url(base).unwrap();

        let records = client.fetch(FeedWindow::Week).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "us7000abcd");
        assert_eq!(records[0].magnitude, Some(5.2));
    }

    #[test]
    fn test_fetch_http_status() {
        let base = serve(FeedWindow::Day, StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let client = FeedClient::with_base_url(base).unwrap();

        let err = client.fetch(FeedWindow::Day).unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)), "got {err:?}");
    }

    #[test]
    fn test_fetch_wrong_window_is_not_found() {
        let base = serve(FeedWindow::Day, StatusCode::OK, ONE_EVENT);
        let client = FeedClient::with_base_url(base).unwrap();

        let err = client.fetch(FeedWindow::Hour).unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(404)), "got {err:?}");
    }

    #[test]
    fn test_fetch_malformed() {
        let base = serve(FeedWindow::Day, StatusCode::OK, "{}");
        let client = FeedClient::with_base_url(base).unwrap();

        let err = client.fetch(FeedWindow::Day).unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)), "got {err:?}");
    }

    #[test]
    fn test_fetch_network_error() {
        // Bind then drop to get a port with nothing listening
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = FeedClient::with_base_url(format!("http://{addr}")).unwrap();

        let err = client.fetch(FeedWindow::Day).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }
}
