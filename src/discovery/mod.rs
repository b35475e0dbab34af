//! Job discovery: turns one catalog dataset into download jobs.
//!
//! Discovery is deliberately lossy. A dataset that is not public transit, is
//! unknown, or cannot be fetched simply yields no jobs, and nothing is
//! recorded in the error reports. Resources are kept only when they are
//! available and declare exactly one accepted format.
//!
//! Every job folder follows
//! `<output root>/<dataset title>/<format>/<resource title>_<YYYY-MM-DD>` and
//! is created before the job is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::catalog::{AttributeTable, Catalog, Dataset, Resource, parse_catalog_timestamp};
use crate::download::DownloadJob;
use crate::download::filename::sanitize_path_segment;

/// Dataset type tag that marks transit datasets.
pub const PUBLIC_TRANSIT_TYPE: &str = "public-transit";

/// Resource formats worth downloading. Matching is exact and case-sensitive.
pub const ACCEPTED_FORMATS: [&str; 34] = [
    "NeTEx",
    "ods",
    "turtle",
    "parquet",
    "zip",
    "gpx",
    "xml",
    "gpkg",
    "xls",
    "SSIM",
    "gtfs-rt",
    "json",
    "ogc:wfs",
    "SIRI Lite",
    "png",
    "shp",
    "geojson",
    "web",
    "octet-stream",
    "ogc:wms",
    "html",
    "plain",
    "n3",
    "xlsx",
    "GTFS",
    "shapefile",
    "gbfs",
    "pdf",
    "pbf",
    "csv.zip",
    "markdown",
    "SIRI",
    "kml",
    "csv",
];

/// Whether `format` is in [`ACCEPTED_FORMATS`].
#[must_use]
pub fn is_accepted_format(format: &str) -> bool {
    ACCEPTED_FORMATS.contains(&format)
}

/// Returns the accepted single format of a resource that should be fetched.
#[must_use]
pub fn eligible_format(resource: &Resource) -> Option<&str> {
    if !resource.available() {
        return None;
    }
    resource
        .format
        .as_single()
        .filter(|format| is_accepted_format(format))
}

/// Date suffix for a resource folder.
///
/// `YYYY-MM-DD` when the timestamp parses, otherwise its first ten
/// characters, otherwise empty.
#[must_use]
pub fn resource_date(updated: Option<&str>) -> String {
    let Some(raw) = updated else {
        return String::new();
    };
    parse_catalog_timestamp(raw).map_or_else(
        || raw.chars().take(10).collect(),
        |timestamp| timestamp.format("%Y-%m-%d").to_string(),
    )
}

/// Folder name of one resource: `<title>_<date>`, sanitized.
#[must_use]
pub fn resource_folder_name(resource: &Resource) -> String {
    let title = resource
        .title
        .as_deref()
        .or(resource.id.as_deref())
        .unwrap_or("resource");
    let date = resource_date(resource.updated.as_deref());
    sanitize_path_segment(&format!("{title}_{date}"))
}

/// Produces download jobs for datasets, one dataset at a time.
///
/// Cheap to clone; every pool task holds its own clone.
#[derive(Clone)]
pub struct JobDiscoverer {
    catalog: Arc<dyn Catalog>,
    attributes: Arc<AttributeTable>,
    output_root: PathBuf,
}

impl std::fmt::Debug for JobDiscoverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDiscoverer")
            .field("datasets", &self.attributes.len())
            .field("output_root", &self.output_root)
            .finish_non_exhaustive()
    }
}

impl JobDiscoverer {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        attributes: Arc<AttributeTable>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            attributes,
            output_root: output_root.into(),
        }
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Discovers every eligible job of `dataset_id`.
    ///
    /// Datasets that are unknown or not [`PUBLIC_TRANSIT_TYPE`] return
    /// immediately without touching the network. Catalog failures yield an
    /// empty list.
    #[instrument(skip(self))]
    pub async fn discover(&self, dataset_id: &str) -> Vec<DownloadJob> {
        let Some(attributes) = self.attributes.get(dataset_id) else {
            debug!("dataset not in attribute table");
            return Vec::new();
        };
        if attributes.dataset_type.as_deref() != Some(PUBLIC_TRANSIT_TYPE) {
            return Vec::new();
        }

        let dataset = match self.catalog.get_dataset(dataset_id).await {
            Ok(dataset) => dataset,
            Err(error) => {
                debug!(error = %error, "dataset detail unavailable, skipping");
                return Vec::new();
            }
        };

        let title = attributes
            .title
            .as_deref()
            .or(dataset.title.as_deref())
            .unwrap_or(dataset_id);
        self.jobs_for_dataset(title, &dataset).await
    }

    /// Builds jobs for an already-fetched dataset, creating every folder.
    async fn jobs_for_dataset(&self, title: &str, dataset: &Dataset) -> Vec<DownloadJob> {
        let dataset_folder = self.output_root.join(sanitize_path_segment(title));
        if let Err(error) = tokio::fs::create_dir_all(&dataset_folder).await {
            warn!(folder = %dataset_folder.display(), error = %error, "cannot create dataset folder");
            return Vec::new();
        }

        let mut jobs = Vec::new();
        for resource in &dataset.resources {
            let Some(format) = eligible_format(resource) else {
                continue;
            };

            let folder = dataset_folder
                .join(sanitize_path_segment(format))
                .join(resource_folder_name(resource));
            if let Err(error) = tokio::fs::create_dir_all(&folder).await {
                warn!(folder = %folder.display(), error = %error, "cannot create resource folder");
                continue;
            }

            if let Some(url) = resource.original_url.as_deref().filter(|url| !url.is_empty()) {
                jobs.push(DownloadJob::new(url, folder));
            }
        }

        debug!(jobs = jobs.len(), "dataset discovered");
        jobs
    }
}
