//! Error types for the catalog module.

use thiserror::Error;

/// Errors that can occur while talking to the dataset catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured catalog base URL is malformed.
    #[error("invalid catalog URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The catalog endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The catalog endpoint that timed out.
        url: String,
    },

    /// Catalog answered with a non-success status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The catalog endpoint.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response body was not the expected JSON shape.
    #[error("malformed catalog response from {url}: {source}")]
    Decode {
        /// The catalog endpoint.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
