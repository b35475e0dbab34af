//! Fetch worker: streams one URL into one destination folder.
//!
//! The worker never raises: every failure becomes a
//! [`FetchOutcome::Failure`] and is appended to the calling task's
//! [`ErrorBuffer`]. Requests are not retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CHUNK_SIZE, FETCH_TIMEOUT_SECS};
use super::error::FetchError;
use super::filename::resolve_filename;
use super::{DownloadJob, FetchOutcome};
use crate::extract::is_archive;
use crate::http_client::{RequestTimeout, build_http_client};
use crate::report::{ErrorBuffer, ErrorRecord};
use crate::user_agent::BROWSER_USER_AGENT;

/// HTTP fetch worker.
///
/// Created once and cloned into every pool task so all downloads share one
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use std::path::PathBuf;
/// use transit_downloader::download::{DownloadJob, Fetcher};
/// use transit_downloader::report::ErrorBuffer;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = Fetcher::new()?;
/// let job = DownloadJob::new("https://example.com/gtfs.zip", PathBuf::from("./downloads"));
/// let mut errors = ErrorBuffer::new(0);
/// let outcome = fetcher.fetch(&job, &mut errors).await;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the default 60 second connect and read timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
    }

    /// Creates a fetcher with an explicit connect and read timeout.
    ///
    /// `timeout` bounds connecting and every wait for body bytes, not the
    /// whole transfer.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = build_http_client(BROWSER_USER_AGENT, RequestTimeout::Idle(timeout))?;
        Ok(Self { client })
    }

    /// Downloads `job` and classifies the result.
    ///
    /// On failure the error is recorded in `buffer` with the job's URL and
    /// folder, and returned as [`FetchOutcome::Failure`].
    #[instrument(skip(self, buffer), fields(url = %job.url, worker = buffer.worker()))]
    pub async fn fetch(&self, job: &DownloadJob, buffer: &mut ErrorBuffer) -> FetchOutcome {
        match self.download_to_folder(&job.url, &job.folder).await {
            Ok(path) => {
                let is_archive = is_archive(&path).await;
                debug!(path = %path.display(), is_archive, "download complete");
                FetchOutcome::Success { path, is_archive }
            }
            Err(error) => {
                warn!(folder = %job.folder.display(), error = %error, "download failed");
                buffer.push(ErrorRecord::fetch(&job.url, &job.folder, &error));
                FetchOutcome::Failure {
                    message: error.to_string(),
                    url: job.url.clone(),
                    folder: job.folder.clone(),
                }
            }
        }
    }

    /// Streams `url` into `folder` and returns the written file path.
    ///
    /// The filename comes from the response (`Content-Disposition`, then the
    /// final URL after redirects). The status is checked before any file is
    /// created. A stream or write error after that point leaves the partial
    /// file in place.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    pub async fn download_to_folder(&self, url: &str, folder: &Path) -> Result<PathBuf, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let filename = resolve_filename(content_disposition.as_deref(), response.url());
        let file_path = folder.join(&filename);
        debug!(filename = %filename, path = %file_path.display(), "resolved output path");

        let file = File::create(&file_path)
            .await
            .map_err(|e| FetchError::io(&file_path, e))?;
        let bytes = stream_to_file(file, response, url, &file_path).await?;
        debug!(bytes, "body written");

        Ok(file_path)
    }
}

/// Streams the response body through a fixed-size write buffer.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::from_reqwest(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    Ok(bytes_written)
}
