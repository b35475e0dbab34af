//! Archive detection and expansion.
//!
//! Archives are recognized by structure (a readable ZIP central directory),
//! never by file extension. Expansion writes into a sibling folder named
//! after the archive and runs on the blocking thread pool, since the `zip`
//! crate is synchronous.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::report::{ErrorBuffer, ErrorRecord};

/// Suffix for the destination folder of archives that have no extension.
const EXTRACTED_SUFFIX: &str = "_extracted";

/// Errors raised while expanding an archive.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Filesystem error while reading the archive or writing an entry.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The archive structure is corrupt or unsupported.
    #[error("invalid archive {archive}: {source}")]
    Archive {
        /// Archive path.
        archive: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An entry path would land outside the destination folder.
    #[error("entry {entry} in {archive} escapes the destination folder")]
    UnsafeEntry {
        /// Archive path.
        archive: PathBuf,
        /// Raw entry name.
        entry: String,
    },

    /// The blocking extraction task did not complete.
    #[error("extraction task for {archive} failed: {message}")]
    TaskFailed {
        /// Archive path.
        archive: PathBuf,
        /// Join error text.
        message: String,
    },
}

impl ExtractError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn archive(archive: &Path, source: zip::result::ZipError) -> Self {
        Self::Archive {
            archive: archive.to_path_buf(),
            source,
        }
    }
}

/// Result of expanding one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Every entry was written.
    Success { archive: PathBuf },
    /// Expansion stopped; the failure is also in the task's error buffer.
    Failure { message: String, archive: PathBuf },
}

impl ExtractionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Returns true when `path` is structurally a ZIP container.
pub async fn is_archive(path: &Path) -> bool {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || is_archive_blocking(&owned))
        .await
        .unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "archive probe task failed");
            false
        })
}

fn is_archive_blocking(path: &Path) -> bool {
    fs::File::open(path)
        .ok()
        .is_some_and(|file| ZipArchive::new(file).is_ok())
}

/// Folder an archive expands into: a sibling named after its stem.
#[must_use]
pub fn destination_for(archive: &Path) -> PathBuf {
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));
    let stem = archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let has_extension = archive.extension().is_some();
    if stem.is_empty() || !has_extension {
        parent.join(format!("{stem}{EXTRACTED_SUFFIX}"))
    } else {
        parent.join(stem)
    }
}

/// Expands `archive` next to itself, recording any failure in `buffer`.
///
/// A failure never propagates: it is returned as
/// [`ExtractionOutcome::Failure`] and appended to the caller's buffer.
#[instrument(skip(buffer), fields(archive = %archive.display(), worker = buffer.worker()))]
pub async fn expand_archive(archive: &Path, buffer: &mut ErrorBuffer) -> ExtractionOutcome {
    let owned = archive.to_path_buf();
    let destination = destination_for(archive);
    let result = tokio::task::spawn_blocking(move || extract_into(&owned, &destination))
        .await
        .unwrap_or_else(|e| {
            Err(ExtractError::TaskFailed {
                archive: archive.to_path_buf(),
                message: e.to_string(),
            })
        });

    match result {
        Ok(entries) => {
            debug!(entries, "archive extracted");
            ExtractionOutcome::Success {
                archive: archive.to_path_buf(),
            }
        }
        Err(error) => {
            warn!(error = %error, "archive extraction failed");
            buffer.push(ErrorRecord::extraction(archive, &error));
            ExtractionOutcome::Failure {
                message: error.to_string(),
                archive: archive.to_path_buf(),
            }
        }
    }
}

/// Synchronously extracts every entry of `archive` into `destination`.
///
/// Returns the number of file entries written.
///
/// # Errors
///
/// Returns [`ExtractError`] on IO failure, a corrupt archive, or an entry
/// whose path escapes `destination`.
pub fn extract_into(archive: &Path, destination: &Path) -> Result<usize, ExtractError> {
    fs::create_dir_all(destination).map_err(|e| ExtractError::io(destination, e))?;

    let file = fs::File::open(archive).map_err(|e| ExtractError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| ExtractError::archive(archive, e))?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ExtractError::archive(archive, e))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ExtractError::UnsafeEntry {
                archive: archive.to_path_buf(),
                entry: entry.name().to_string(),
            });
        };
        let target = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ExtractError::io(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
        }
        let mut outfile = fs::File::create(&target).map_err(|e| ExtractError::io(&target, e))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| ExtractError::io(&target, e))?;
        written += 1;
    }
    Ok(written)
}
