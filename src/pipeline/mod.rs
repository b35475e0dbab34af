//! Three-stage download pipeline.
//!
//! Dataset ids are shuffled, then pushed through three bounded pools with a
//! strict barrier between them:
//!
//! 1. **Discovery**: each dataset id becomes zero or more [`DownloadJob`]s.
//! 2. **Download**: each job is fetched; archives are collected.
//! 3. **Extraction** (optional): each archive is expanded next to itself.
//!
//! Fetch failures end up in `errors.log`, extraction failures in
//! `extraction_errors.log`, both under the output root.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use transit_downloader::{AttributeTable, Catalog, Fetcher, HttpCatalog, Pipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(HttpCatalog::new("https://transport.data.gouv.fr")?);
//! let table = Arc::new(AttributeTable::from_datasets(&catalog.list_datasets().await?));
//! let pipeline = Pipeline::new(catalog, Fetcher::new()?, PipelineConfig::new("./downloads"))?;
//! let summary = pipeline.run(table).await?;
//! println!("{} jobs, {} downloaded", summary.jobs, summary.downloaded);
//! # Ok(())
//! # }
//! ```

mod pool;
mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::catalog::{AttributeTable, Catalog};
use crate::discovery::JobDiscoverer;
use crate::download::{DownloadJob, FetchOutcome, Fetcher};
use crate::extract::{ExtractionOutcome, expand_archive};
use crate::report::{
    ERRORS_LOG, EXTRACTION_ERRORS_LOG, ErrorBuffer, MergeSummary, ReportError, merge_error_buffers,
    write_report,
};

pub use progress::progress_enabled;

/// Default output root.
pub const DEFAULT_OUTPUT_DIR: &str = "./downloads";

/// Upper bound of the computed default worker count.
pub const MAX_WORKERS_CAP: usize = 32;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 100;

/// Default pool size: `min(32, 5 × available cores)`.
#[must_use]
pub fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    cores.saturating_mul(5).min(MAX_WORKERS_CAP)
}

/// Error type for pipeline runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The output root could not be created.
    #[error("cannot create output directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub output_root: PathBuf,
    pub workers: usize,
    pub extract_archives: bool,
    /// Draw per-stage progress bars.
    pub show_progress: bool,
}

impl PipelineConfig {
    /// Default settings for `output_root`: computed worker count, no
    /// extraction, no progress bars.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            workers: default_worker_count(),
            extract_archives: false,
            show_progress: false,
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_extraction(mut self, extract_archives: bool) -> Self {
        self.extract_archives = extract_archives;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if (MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            Ok(())
        } else {
            Err(PipelineError::InvalidWorkers {
                value: self.workers,
            })
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

/// Final counts of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Dataset ids fed into discovery.
    pub datasets: usize,
    /// Jobs produced by discovery.
    pub jobs: usize,
    pub downloaded: usize,
    pub failed_downloads: usize,
    /// Successfully downloaded files recognized as archives.
    pub archives: usize,
    pub extracted: usize,
    pub extraction_failures: usize,
    /// Pool tasks that panicked, across all stages.
    pub panicked_tasks: usize,
    /// Merged fetch-failure report; always written.
    pub errors_log: MergeSummary,
    /// Extraction-failure report; written only when a failure occurred.
    pub extraction_log: Option<MergeSummary>,
    pub elapsed: Duration,
    /// Absolute path of the output root.
    pub output_root: PathBuf,
}

/// Result of the download stage.
#[derive(Debug, Default)]
struct DownloadStage {
    downloaded: usize,
    failed: usize,
    archives: Vec<PathBuf>,
    buffers: Vec<ErrorBuffer>,
    panicked: usize,
}

/// Result of the extraction stage.
#[derive(Debug, Default)]
struct ExtractionStage {
    extracted: usize,
    failed: usize,
    log: Option<MergeSummary>,
    panicked: usize,
}

/// Orchestrates discovery, download and extraction.
pub struct Pipeline {
    catalog: Arc<dyn Catalog>,
    fetcher: Fetcher,
    config: PipelineConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWorkers`] if `config.workers` is
    /// outside 1..=100.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        fetcher: Fetcher,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            catalog,
            fetcher,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline over every dataset in `attributes`.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_datasets`].
    pub async fn run(&self, attributes: Arc<AttributeTable>) -> Result<PipelineSummary, PipelineError> {
        let ids = attributes.ids().to_vec();
        self.run_datasets(ids, attributes).await
    }

    /// Runs the pipeline over `dataset_ids`.
    ///
    /// Per-dataset, per-job and per-archive failures never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the output root cannot be created or a
    /// report cannot be written.
    #[instrument(skip_all, fields(datasets = dataset_ids.len(), workers = self.config.workers))]
    pub async fn run_datasets(
        &self,
        mut dataset_ids: Vec<String>,
        attributes: Arc<AttributeTable>,
    ) -> Result<PipelineSummary, PipelineError> {
        let started = Instant::now();
        let root = &self.config.output_root;
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|source| PipelineError::Io {
                path: root.clone(),
                source,
            })?;

        dataset_ids.shuffle(&mut rand::thread_rng());
        let datasets = dataset_ids.len();

        let (jobs, discovery_panics) = self.discover(dataset_ids, attributes).await?;
        let job_count = jobs.len();
        info!(jobs = job_count, "discovery finished");

        let mut download = self.download(jobs).await?;
        info!(
            downloaded = download.downloaded,
            failed = download.failed,
            archives = download.archives.len(),
            "downloads finished"
        );

        let archive_count = download.archives.len();
        let extraction = if self.config.extract_archives && !download.archives.is_empty() {
            let archives = std::mem::take(&mut download.archives);
            self.extract(archives).await?
        } else {
            ExtractionStage::default()
        };

        let errors_log = merge_error_buffers(&mut download.buffers, &root.join(ERRORS_LOG)).await?;

        Ok(PipelineSummary {
            datasets,
            jobs: job_count,
            downloaded: download.downloaded,
            failed_downloads: download.failed,
            archives: archive_count,
            extracted: extraction.extracted,
            extraction_failures: extraction.failed,
            panicked_tasks: discovery_panics + download.panicked + extraction.panicked,
            errors_log,
            extraction_log: extraction.log,
            elapsed: started.elapsed(),
            output_root: absolute_path(root),
        })
    }

    async fn discover(
        &self,
        dataset_ids: Vec<String>,
        attributes: Arc<AttributeTable>,
    ) -> Result<(Vec<DownloadJob>, usize), PipelineError> {
        let discoverer = JobDiscoverer::new(
            Arc::clone(&self.catalog),
            attributes,
            self.config.output_root.clone(),
        );
        let bar = progress::stage_bar(
            "Collecting jobs",
            "datasets",
            dataset_ids.len(),
            self.config.show_progress,
        );

        let run = pool::run_bounded("discovery", dataset_ids, self.config.workers, &bar, |_, id| {
            let discoverer = discoverer.clone();
            async move { discoverer.discover(&id).await }
        })
        .await?;
        bar.finish_and_clear();

        let jobs = run.outputs.into_iter().flatten().collect();
        Ok((jobs, run.panicked))
    }

    async fn download(&self, jobs: Vec<DownloadJob>) -> Result<DownloadStage, PipelineError> {
        let bar = progress::stage_bar("Downloading", "files", jobs.len(), self.config.show_progress);

        let run = pool::run_bounded("download", jobs, self.config.workers, &bar, |index, job| {
            let fetcher = self.fetcher.clone();
            async move {
                let mut buffer = ErrorBuffer::new(index);
                let outcome = fetcher.fetch(&job, &mut buffer).await;
                (outcome, buffer)
            }
        })
        .await?;
        bar.finish_and_clear();

        let mut stage = DownloadStage {
            panicked: run.panicked,
            ..DownloadStage::default()
        };
        for (outcome, buffer) in run.outputs {
            match outcome {
                FetchOutcome::Success { path, is_archive } => {
                    stage.downloaded += 1;
                    if is_archive {
                        stage.archives.push(path);
                    }
                }
                FetchOutcome::Failure { .. } => stage.failed += 1,
            }
            if !buffer.is_empty() {
                stage.buffers.push(buffer);
            }
        }
        Ok(stage)
    }

    async fn extract(&self, archives: Vec<PathBuf>) -> Result<ExtractionStage, PipelineError> {
        info!(archives = archives.len(), "extracting archives");
        let bar = progress::stage_bar(
            "Extracting ZIPs",
            "archives",
            archives.len(),
            self.config.show_progress,
        );

        let run = pool::run_bounded(
            "extraction",
            archives,
            self.config.workers,
            &bar,
            |index, archive| async move {
                let mut buffer = ErrorBuffer::new(index);
                let outcome = expand_archive(&archive, &mut buffer).await;
                (outcome, buffer)
            },
        )
        .await?;
        bar.finish_and_clear();

        let mut stage = ExtractionStage {
            panicked: run.panicked,
            ..ExtractionStage::default()
        };
        let mut records = Vec::new();
        for (outcome, buffer) in run.outputs {
            match outcome {
                ExtractionOutcome::Success { .. } => stage.extracted += 1,
                ExtractionOutcome::Failure { .. } => stage.failed += 1,
            }
            records.extend(buffer.records().iter().cloned());
        }

        if !records.is_empty() {
            let path = self.config.output_root.join(EXTRACTION_ERRORS_LOG);
            stage.log = Some(write_report(&path, &records).await?);
        }
        Ok(stage)
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|error| {
        debug!(path = %path.display(), error = %error, "cannot resolve absolute path");
        path.to_path_buf()
    })
}
