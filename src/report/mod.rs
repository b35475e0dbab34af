//! Per-worker error buffers and merged error reports.
//!
//! Each pool task receives its own [`ErrorBuffer`] when it is dispatched and
//! hands it back with its result, so no two workers ever write the same
//! buffer. Once a pool has fully drained, [`merge_error_buffers`] concatenates
//! every buffer into a single plain-text report and counts the failures in it.
//!
//! A report is a sequence of paragraphs separated by blank lines; every
//! failure paragraph starts with [`FAILURE_MARKER`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

/// Marker that opens every failure paragraph in a report.
pub const FAILURE_MARKER: &str = "❌";

/// File name of the merged download-failure report.
pub const ERRORS_LOG: &str = "errors.log";

/// File name of the extraction-failure report.
pub const EXTRACTION_ERRORS_LOG: &str = "extraction_errors.log";

/// Errors raised while writing a report to disk.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file could not be written.
    #[error("IO error writing report {path}: {source}")]
    Io {
        /// Report path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// What produced a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    /// A download of `url` into `folder`.
    Fetch { url: String, folder: PathBuf },
    /// Expansion of a downloaded archive.
    Extraction { archive: PathBuf },
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub message: String,
    pub context: ErrorContext,
}

impl ErrorRecord {
    /// Records a failed download.
    pub fn fetch(
        url: impl Into<String>,
        folder: impl Into<PathBuf>,
        message: impl fmt::Display,
    ) -> Self {
        Self {
            message: single_paragraph(&message.to_string()),
            context: ErrorContext::Fetch {
                url: url.into(),
                folder: folder.into(),
            },
        }
    }

    /// Records a failed extraction.
    pub fn extraction(archive: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self {
            message: single_paragraph(&message.to_string()),
            context: ErrorContext::Extraction {
                archive: archive.into(),
            },
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            ErrorContext::Fetch { url, folder } => write!(
                f,
                "{FAILURE_MARKER} Error with file in folder {}\n Error downloading at url: {url}\n --{}",
                folder.display(),
                self.message
            ),
            ErrorContext::Extraction { archive } => write!(
                f,
                "{FAILURE_MARKER} Failed to extract {}\n --{}",
                archive.display(),
                self.message
            ),
        }
    }
}

// Blank lines inside a message would split its paragraph and skew counts.
fn single_paragraph(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Error records owned by a single pool task.
#[derive(Debug, Default)]
pub struct ErrorBuffer {
    worker: usize,
    records: Vec<ErrorRecord>,
}

impl ErrorBuffer {
    /// Creates an empty buffer for the task with dispatch index `worker`.
    #[must_use]
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            records: Vec::new(),
        }
    }

    /// Dispatch index of the owning task.
    #[must_use]
    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Location and failure count of a written report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub path: PathBuf,
    pub error_count: usize,
}

/// Counts failure paragraphs (blank-line separated) in report content.
#[must_use]
pub fn count_failures(content: &str) -> usize {
    content
        .split("\n\n")
        .filter(|paragraph| paragraph.contains(FAILURE_MARKER))
        .count()
}

fn render<'a>(records: impl IntoIterator<Item = &'a ErrorRecord>) -> String {
    let mut content = String::new();
    for record in records {
        content.push_str(&record.to_string());
        content.push_str("\n\n");
    }
    content
}

/// Writes `records` to `path` in one write and returns the failure count.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be written.
#[instrument(skip(records), fields(path = %path.display()))]
pub async fn write_report(path: &Path, records: &[ErrorRecord]) -> Result<MergeSummary, ReportError> {
    let content = render(records);
    tokio::fs::write(path, &content)
        .await
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let error_count = count_failures(&content);
    debug!(error_count, "report written");
    Ok(MergeSummary {
        path: path.to_path_buf(),
        error_count,
    })
}

/// Merges every worker buffer into one report at `report_path`.
///
/// Buffers are concatenated in whatever order they were collected; the
/// report file is always created, even when there is nothing to merge. The
/// source buffers are removed from `buffers` once the report is on disk.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the report cannot be written; `buffers` is
/// left untouched in that case.
#[instrument(skip(buffers), fields(buffer_count = buffers.len(), path = %report_path.display()))]
pub async fn merge_error_buffers(
    buffers: &mut Vec<ErrorBuffer>,
    report_path: &Path,
) -> Result<MergeSummary, ReportError> {
    let content = render(buffers.iter().flat_map(|buffer| buffer.records.iter()));
    tokio::fs::write(report_path, &content)
        .await
        .map_err(|source| ReportError::Io {
            path: report_path.to_path_buf(),
            source,
        })?;
    buffers.clear();

    let error_count = count_failures(&content);
    info!(error_count, "error buffers merged");
    Ok(MergeSummary {
        path: report_path.to_path_buf(),
        error_count,
    })
}
