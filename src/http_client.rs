//! Shared HTTP client construction policy.
//!
//! Catalog and download traffic both run in batch/headless contexts, so the
//! clients never consult proxy environment variables or system proxy
//! settings. Timeouts and user-agent are per-caller.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::debug;

/// How a client bounds the time spent on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestTimeout {
    /// One deadline from connect through the last body byte. Suited to
    /// small API responses.
    Total(Duration),
    /// Separate limits on connecting and on each body read; a transfer may
    /// run as long as bytes keep arriving.
    Idle(Duration),
}

/// Builds a reqwest client with an explicit no-proxy policy.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the TLS backend or
/// resolver cannot be initialized.
pub(crate) fn build_http_client(
    user_agent: &str,
    timeout: RequestTimeout,
) -> Result<Client, reqwest::Error> {
    debug!(?timeout, user_agent, "building HTTP client");
    apply_timeout(base_builder(user_agent), timeout).build()
}

fn base_builder(user_agent: &str) -> ClientBuilder {
    Client::builder()
        .no_proxy()
        .gzip(true)
        .user_agent(user_agent)
}

fn apply_timeout(builder: ClientBuilder, timeout: RequestTimeout) -> ClientBuilder {
    match timeout {
        RequestTimeout::Total(limit) => builder.timeout(limit),
        RequestTimeout::Idle(limit) => builder.connect_timeout(limit).read_timeout(limit),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client_with_total_deadline() {
        let client = build_http_client("test-agent", RequestTimeout::Total(Duration::from_secs(5)));
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_idle_timeout() {
        let client = build_http_client("test-agent", RequestTimeout::Idle(Duration::from_secs(5)));
        assert!(client.is_ok());
    }
}
