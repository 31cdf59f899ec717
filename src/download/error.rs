//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors a [`Downloader`](super::Downloader) reports for one link.
///
/// Every variant except [`DownloadError::Unavailable`] is a per-link failure
/// that the orchestrator records and moves past.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The download did not finish within the allowed time.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The download reported success but produced no files.
    #[error("no files produced for {url}")]
    NoFiles {
        /// The URL that produced nothing.
        url: String,
    },

    /// The download resource itself could not be obtained.
    #[error("download resource unavailable: {reason}\n  Suggestion: {suggestion}")]
    Unavailable {
        /// What went wrong.
        reason: String,
        /// Remediation shown to the operator.
        suggestion: &'static str,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a resource-unavailable error with the given remediation.
    pub fn unavailable(reason: impl Into<String>, suggestion: &'static str) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            suggestion,
        }
    }
}
