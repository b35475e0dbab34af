//! Transit Downloader Core Library
//!
//! This library provides the core functionality for the transit downloader,
//! which mirrors every public-transit resource published by an open-data
//! catalog onto the local filesystem.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Catalog API client and dataset attribute table
//! - [`discovery`] - Turns one dataset into zero or more download jobs
//! - [`download`] - Streaming HTTP fetch worker and filename resolution
//! - [`extract`] - Archive detection and expansion
//! - [`report`] - Per-worker error buffers and merged error reports
//! - [`pipeline`] - Three-stage bounded worker-pool orchestration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod discovery;
pub mod download;
pub mod extract;
mod http_client;
pub mod pipeline;
pub mod report;
#[cfg(test)]
mod test_support;
mod user_agent;

// Re-export commonly used types
pub use catalog::{
    AttributeTable, Catalog, CatalogError, Dataset, DatasetAttributes, HttpCatalog, Resource,
    ResourceFormat,
};
pub use discovery::{ACCEPTED_FORMATS, JobDiscoverer, PUBLIC_TRANSIT_TYPE};
pub use download::{DownloadJob, FetchError, FetchOutcome, Fetcher};
pub use extract::{ExtractError, ExtractionOutcome, destination_for, expand_archive, is_archive};
pub use pipeline::{
    DEFAULT_OUTPUT_DIR, MAX_WORKERS_CAP, Pipeline, PipelineConfig, PipelineError, PipelineSummary,
    default_worker_count, progress_enabled,
};
pub use report::{ErrorBuffer, ErrorContext, ErrorRecord, MergeSummary, merge_error_buffers};
pub use user_agent::BROWSER_USER_AGENT;
