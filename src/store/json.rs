//! JSON-file implementation of [`StateStore`].

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{Result, Session, StateStore, StoreError};
use crate::job::{DownloadJob, FailedLinkRecord};

/// Interrupted-session file name.
pub const SESSION_FILE: &str = "session.json";
/// Failed-link list file name.
pub const FAILED_FILE: &str = "failed_links.json";
/// Banned-link list file name.
pub const BANNED_FILE: &str = "banned_links.json";

/// Stores each record as a pretty-printed JSON file under one directory.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous version intact.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    dir: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRef<'a> {
    remaining_jobs: &'a [DownloadJob],
    output_folder: &'a str,
}

impl JsonStateStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the state files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of one state file.
    #[must_use]
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    fn write<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<()> {
        let path = self.path_of(file_name);
        let encoded = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        let temp = path.with_extension("json.tmp");
        fs::write(&temp, encoded)
            .and_then(|()| fs::rename(&temp, &path))
            .map_err(|source| {
                let _ = fs::remove_file(&temp);
                StoreError::Write {
                    path: path.clone(),
                    source,
                }
            })?;
        debug!(path = %path.display(), "state saved");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, file_name: &str) -> Option<T> {
        let path = self.path_of(file_name);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "cannot read state file, treating as empty");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "corrupt state file, treating as empty");
                None
            }
        }
    }
}

impl StateStore for JsonStateStore {
    fn save_session(&self, remaining_jobs: &[DownloadJob], output_folder: &str) -> Result<()> {
        self.write(
            SESSION_FILE,
            &SessionRef {
                remaining_jobs,
                output_folder,
            },
        )
    }

    fn load_session(&self) -> Option<Session> {
        self.read::<Session>(SESSION_FILE)
            .filter(|session| !session.remaining_jobs.is_empty())
    }

    fn clear_session(&self) -> Result<()> {
        let path = self.path_of(SESSION_FILE);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "session cleared");
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove { path, source }),
        }
    }

    fn save_failed_links(&self, records: &[FailedLinkRecord]) -> Result<()> {
        self.write(FAILED_FILE, records)
    }

    fn load_failed_links(&self) -> Vec<FailedLinkRecord> {
        self.read(FAILED_FILE).unwrap_or_default()
    }

    fn load_banned_links(&self) -> BTreeSet<String> {
        self.read(BANNED_FILE).unwrap_or_default()
    }

    fn save_banned_links(&self, links: &BTreeSet<String>) -> Result<()> {
        self.write(BANNED_FILE, links)
    }
}
