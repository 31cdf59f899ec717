//! Persisted run state: interrupted session, failed links, banned links.
//!
//! Each record is a flat document overwritten in full on every save. Loads
//! never fail: a missing or corrupt file is "no prior state". Saves return
//! [`StoreError`] and callers decide whether to escalate; the orchestrator
//! only logs them.

mod json;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{DownloadJob, FailedLinkRecord, total_links};

pub use json::{BANNED_FILE, FAILED_FILE, JsonStateStore, SESSION_FILE};

/// Errors writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem write or rename failed.
    #[error(
        "cannot write state file {path}: {source}\n  Suggestion: Check that the state directory exists and is writable"
    )]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized.
    #[error("cannot encode state for {path}: {source}")]
    Encode {
        /// Target file.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Removing a state file failed.
    #[error("cannot remove state file {path}: {source}")]
    Remove {
        /// Target file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Jobs left over from an interrupted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Jobs not yet fully processed, in run order.
    pub remaining_jobs: Vec<DownloadJob>,
    /// Output root the interrupted run was sorting into.
    pub output_folder: String,
}

impl Session {
    /// Number of links still to process.
    #[must_use]
    pub fn remaining_links(&self) -> usize {
        total_links(&self.remaining_jobs)
    }
}

/// Repository boundary for run state.
///
/// There is exactly one writer at a time (the orchestrator worker or a CLI
/// command), so implementations need not be transactional.
pub trait StateStore: Send + Sync {
    /// Overwrites the saved session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the session cannot be written.
    fn save_session(&self, remaining_jobs: &[DownloadJob], output_folder: &str) -> Result<()>;

    /// Loads the saved session, `None` when absent or unreadable.
    fn load_session(&self) -> Option<Session>;

    /// Deletes the saved session. Clearing an absent session succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Remove`] when an existing file cannot be removed.
    fn clear_session(&self) -> Result<()>;

    /// Overwrites the failed-link list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the list cannot be written.
    fn save_failed_links(&self, records: &[FailedLinkRecord]) -> Result<()>;

    /// Loads the failed-link list, empty when absent or unreadable.
    fn load_failed_links(&self) -> Vec<FailedLinkRecord>;

    /// Loads the banned-link set, empty when absent or unreadable.
    fn load_banned_links(&self) -> BTreeSet<String>;

    /// Overwrites the banned-link set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the set cannot be written.
    fn save_banned_links(&self, links: &BTreeSet<String>) -> Result<()>;
}
