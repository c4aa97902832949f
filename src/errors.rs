//! Error types for bhumikamp.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur while fetching and normalizing a feed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure (DNS, connect, TLS, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Feed returned a non-success status
    #[error("HTTP error! Status: {0}")]
    HttpStatus(u16),

    /// Body is not a usable GeoJSON feature collection
    #[error("Invalid data format: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    /// Shorthand for a malformed payload error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload(reason.into())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPayload(e.to_string())
    }
}
