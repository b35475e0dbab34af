//! HTTP implementation of the [`Catalog`] trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{Catalog, CatalogError, Dataset};
use crate::http_client::{RequestTimeout, build_http_client};
use crate::user_agent;

/// Public catalog this tool targets by default.
pub const DEFAULT_CATALOG_URL: &str = "https://transport.data.gouv.fr";

/// Request timeout for catalog API calls.
pub const CATALOG_TIMEOUT_SECS: u64 = 30;

/// Catalog client speaking the `/api/datasets` JSON API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    /// Creates a catalog client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidUrl`] if `base_url` does not parse, or
    /// [`CatalogError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        Self::with_timeout(base_url, Duration::from_secs(CATALOG_TIMEOUT_SECS))
    }

    /// Creates a catalog client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Same as [`HttpCatalog::new`].
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        Url::parse(base_url).map_err(|_| CatalogError::invalid_url(base_url))?;
        let client = build_http_client(
            &user_agent::catalog_user_agent(),
            RequestTimeout::Total(timeout),
        )
        .map_err(|e| CatalogError::from_reqwest(base_url, e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint listing every dataset.
    #[must_use]
    pub fn datasets_url(&self) -> String {
        format!("{}/api/datasets", self.base_url)
    }

    /// Endpoint for a single dataset.
    #[must_use]
    pub fn dataset_url(&self, id: &str) -> String {
        format!("{}/api/datasets/{}", self.base_url, urlencoding::encode(id))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::from_reqwest(url, e))?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::decode(url, e))
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    #[instrument(skip(self))]
    async fn list_datasets(&self) -> Result<Vec<Dataset>, CatalogError> {
        let url = self.datasets_url();
        let datasets: Vec<Dataset> = self.get_json(&url).await?;
        debug!(count = datasets.len(), "catalog listing fetched");
        Ok(datasets)
    }

    #[instrument(skip(self))]
    async fn get_dataset(&self, id: &str) -> Result<Dataset, CatalogError> {
        let url = self.dataset_url(id);
        self.get_json(&url).await
    }
}
