//! Constants for the download module (timeouts, partial-file markers).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Upper bound on a single link download before it counts as failed.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Suffixes of files still being written by a browser or by [`HttpDownloader`](super::HttpDownloader).
pub const PARTIAL_DOWNLOAD_SUFFIXES: [&str; 3] = [".crdownload", ".tmp", ".part"];
