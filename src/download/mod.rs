//! The download resource contract and its HTTP implementation.
//!
//! The orchestrator drives exactly one [`Downloader`] and never has more than
//! one call in flight, because the resource behind it (a browser session, a
//! rate-limited account) is unsafe to share.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vortexflow_core::download::{Downloader, HttpDownloader};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader: Arc<dyn Downloader> = Arc::new(HttpDownloader::new("./downloads")?);
//! # let _ = downloader;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;

use std::path::PathBuf;

use async_trait::async_trait;

pub use client::HttpDownloader;
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_DOWNLOAD_TIMEOUT, PARTIAL_DOWNLOAD_SUFFIXES, READ_TIMEOUT_SECS,
};
pub use error::DownloadError;
pub use filename::is_partial_download;
pub(crate) use filename::{resolve_unique_path, unix_timestamp};

/// An exclusive download resource.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads one link and returns the local paths it produced.
    ///
    /// An empty list counts as a failure for the link.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the link could not be downloaded.
    async fn download(&self, link: &str) -> Result<Vec<PathBuf>, DownloadError>;

    /// Hands a link to the operator for manual handling. Fire-and-forget.
    fn manual_open(&self, link: &str);
}
