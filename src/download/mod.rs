//! HTTP fetch worker for streaming catalog resources to disk.
//!
//! # Features
//!
//! - Streaming downloads through a fixed 8 KiB write buffer
//! - Filename resolution from `Content-Disposition` (including RFC 5987) or URL
//! - Browser User-Agent and an explicit no-proxy policy
//! - Archive classification by content once the body is on disk
//! - Tagged [`FetchOutcome`] instead of errors: failures are recorded, never raised

mod client;
mod constants;
mod error;
pub mod filename;

use std::path::{Path, PathBuf};

pub use client::Fetcher;
pub use constants::{CHUNK_SIZE, FETCH_TIMEOUT_SECS};
pub use error::FetchError;

/// One file to fetch: a source URL and the folder it lands in.
///
/// The folder already exists when the job is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadJob {
    pub url: String,
    pub folder: PathBuf,
}

impl DownloadJob {
    #[must_use]
    pub fn new(url: impl Into<String>, folder: PathBuf) -> Self {
        Self {
            url: url.into(),
            folder,
        }
    }
}

/// Result of fetching one [`DownloadJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was fully written to `path`.
    Success { path: PathBuf, is_archive: bool },
    /// The fetch failed; the same failure is recorded in the task's buffer.
    Failure {
        message: String,
        url: String,
        folder: PathBuf,
    },
}

impl FetchOutcome {
    /// Path of a successfully downloaded archive, if this is one.
    #[must_use]
    pub fn archive_path(&self) -> Option<&Path> {
        match self {
            Self::Success {
                path,
                is_archive: true,
            } => Some(path),
            Self::Success { .. } | Self::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
