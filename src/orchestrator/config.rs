//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::download::DEFAULT_DOWNLOAD_TIMEOUT;

/// Default pause before each retry-phase attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default local download area.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Default output root.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Settings for one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Root of the sorted output tree.
    pub output_root: PathBuf,
    /// Local download area scanned after manual steps.
    pub download_dir: PathBuf,
    /// Leading links of the whole run handled by hand.
    pub manual_count: usize,
    /// Delay before each retry-phase attempt.
    pub retry_delay: Duration,
    /// Upper bound on one download; exceeding it is a failure.
    pub download_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            manual_count: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    /// Config with the given output root and download area, other fields default.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            download_dir: download_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the manual-intervention threshold.
    #[must_use]
    pub fn with_manual_count(mut self, manual_count: usize) -> Self {
        self.manual_count = manual_count;
        self
    }

    /// Sets the retry-phase delay.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets the per-download timeout.
    #[must_use]
    pub fn with_download_timeout(mut self, download_timeout: Duration) -> Self {
        self.download_timeout = download_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.manual_count, 0);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.download_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_builder_overrides() {
        let config = OrchestratorConfig::new("/out", "/dl")
            .with_manual_count(3)
            .with_retry_delay(Duration::ZERO)
            .with_download_timeout(Duration::from_secs(5));
        assert_eq!(config.output_root, PathBuf::from("/out"));
        assert_eq!(config.download_dir, PathBuf::from("/dl"));
        assert_eq!(config.manual_count, 3);
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.download_timeout, Duration::from_secs(5));
    }
}
