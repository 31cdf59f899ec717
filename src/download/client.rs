//! Streaming HTTP implementation of [`Downloader`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::Downloader;
use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::{
    extension_from_content_type, fallback_filename, filename_from_url, parse_content_disposition,
    resolve_unique_path, sanitize_filename,
};
use crate::user_agent;

/// Downloads links with plain HTTP GET into a local download area.
///
/// Bodies are streamed into `<name>.part` and renamed once complete, so
/// area scans never pick up a half-written file.
///
/// # Example
///
/// ```no_run
/// use vortexflow_core::download::{Downloader, HttpDownloader};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = HttpDownloader::new("./downloads")?;
/// let files = downloader.download("https://example.com/video.mp4").await?;
/// println!("Downloaded: {files:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    download_dir: PathBuf,
}

impl HttpDownloader {
    /// Creates a downloader writing into `download_dir` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Unavailable`] when the HTTP client cannot be
    /// built or the download directory cannot be created.
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self, DownloadError> {
        Self::with_timeouts(download_dir, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a downloader with explicit connect/read timeouts in seconds.
    ///
    /// # Errors
    ///
    /// Same as [`HttpDownloader::new`].
    #[instrument(level = "debug", skip(download_dir))]
    pub fn with_timeouts(
        download_dir: impl Into<PathBuf>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let download_dir = download_dir.into();
        std::fs::create_dir_all(&download_dir).map_err(|e| {
            DownloadError::unavailable(
                format!("cannot create download directory {}: {e}", download_dir.display()),
                "Choose a writable --download-dir",
            )
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_download_user_agent())
            .build()
            .map_err(|e| {
                DownloadError::unavailable(
                    format!("cannot build HTTP client: {e}"),
                    "Check the system TLS configuration and proxy environment variables",
                )
            })?;

        Ok(Self {
            client,
            download_dir,
        })
    }

    /// Local download area this downloader writes into.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    async fn fetch(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let filename = extract_filename(&response, &parsed);
        let final_path = resolve_unique_path(&self.download_dir, &filename);
        let partial_path = partial_path_for(&final_path);
        debug!(path = %final_path.display(), "resolved output path");

        let mut file = File::create(&partial_path)
            .await
            .map_err(|e| DownloadError::io(partial_path.clone(), e))?;
        // Removes the partial file on error and when the caller drops this
        // future mid-stream (e.g. a per-download timeout).
        let guard = PartialFileGuard::new(partial_path.clone());

        let streamed = stream_to_file(&mut file, response, url, &partial_path).await;
        drop(file);
        let bytes = streamed?;

        tokio::fs::rename(&partial_path, &final_path)
            .await
            .map_err(|e| DownloadError::io(final_path.clone(), e))?;
        guard.disarm();

        info!(path = %final_path.display(), bytes, "download complete");
        Ok(final_path)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[instrument(skip(self), fields(dir = %self.download_dir.display()))]
    async fn download(&self, link: &str) -> Result<Vec<PathBuf>, DownloadError> {
        self.fetch(link).await.map(|path| vec![path])
    }

    fn manual_open(&self, link: &str) {
        warn!(link, dir = %self.download_dir.display(), "manual download required");
    }
}

/// Deletes a `.part` file when dropped unless disarmed.
struct PartialFileGuard {
    path: Option<PathBuf>,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "cleaning up partial file");
            if let Err(e) = std::fs::remove_file(&path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %path.display(), error = %e, "failed to remove partial file");
            }
        }
    }
}

fn partial_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    final_path.with_file_name(name)
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

/// Extracts filename from Content-Disposition header or URL path.
fn extract_filename(response: &reqwest::Response, url: &Url) -> String {
    if let Some(header) = response.headers().get(CONTENT_DISPOSITION)
        && let Ok(value) = header.to_str()
        && let Some(filename) = parse_content_disposition(value)
    {
        return sanitize_filename(&filename);
    }

    if let Some(filename) = filename_from_url(url) {
        return filename;
    }

    let extension = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map_or(".bin", extension_from_content_type);
    fallback_filename(extension)
}
