//! Moves downloaded files into the per-job output tree.
//!
//! Layout: `{output_root}/Single_File_Downloads/{folder}` and
//! `{output_root}/Multi_File_Downloads/{folder}`. Every move is best-effort:
//! a failure is logged and the rest of the batch continues.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::download::{is_partial_download, resolve_unique_path};
use crate::job::{DownloadJob, FailedLinkRecord};

/// Errors relocating a single file.
#[derive(Debug, Error)]
pub enum SortError {
    /// Destination directory could not be created.
    #[error("cannot create destination {path}: {source}")]
    CreateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// File could not be moved (rename and copy fallback both failed).
    #[error("cannot move {from} to {to}: {source}")]
    Move {
        /// Source file.
        from: PathBuf,
        /// Intended destination.
        to: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Result of a manual re-sort pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualSortOutcome {
    /// Final paths of files moved into the output tree.
    pub sorted_files: Vec<PathBuf>,
    /// Failed-link records that matched no file.
    pub remaining: Vec<FailedLinkRecord>,
}

/// Sorts files into `{output_root}/{kind dir}/{folder}`.
#[derive(Debug, Clone)]
pub struct FileSorter {
    output_root: PathBuf,
}

impl FileSorter {
    /// Creates a sorter writing under `output_root`.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Root of the output tree.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Destination directory for a job's files.
    #[must_use]
    pub fn destination_for(&self, job: &DownloadJob) -> PathBuf {
        self.output_root
            .join(job.kind().output_dir_name())
            .join(job.folder_name())
    }

    /// Moves `paths` into the job's destination and returns the new paths.
    ///
    /// No-op on an empty list. Failures are logged per file and skipped.
    #[instrument(skip(self, paths, job), fields(folder = job.folder_name(), files = paths.len()))]
    pub fn sort(&self, paths: &[PathBuf], job: &DownloadJob) -> Vec<PathBuf> {
        if paths.is_empty() {
            return Vec::new();
        }

        let destination = self.destination_for(job);
        if let Err(e) = fs::create_dir_all(&destination) {
            let error = SortError::CreateDir {
                path: destination,
                source: e,
            };
            warn!(error = %error, "cannot sort files");
            return Vec::new();
        }

        let mut moved = Vec::with_capacity(paths.len());
        for path in paths {
            match move_into(path, &destination) {
                Ok(target) => {
                    debug!(from = %path.display(), to = %target.display(), "file sorted");
                    moved.push(target);
                }
                Err(error) => warn!(error = %error, "skipping file"),
            }
        }
        info!(moved = moved.len(), destination = %destination.display(), "sorted files");
        moved
    }

    /// Sorts manually downloaded files back to the failed links they belong to.
    ///
    /// A completed file in `download_dir` matches a record when the record's
    /// share id occurs in the file name. Matched files are sorted into that
    /// record's destination; matched records are dropped from the result.
    #[instrument(skip(self, records), fields(dir = %download_dir.display(), records = records.len()))]
    pub fn sort_manual_downloads(
        &self,
        download_dir: &Path,
        records: Vec<FailedLinkRecord>,
    ) -> ManualSortOutcome {
        let ids: Vec<Option<String>> = records.iter().map(FailedLinkRecord::share_id).collect();
        let mut matched = vec![false; records.len()];
        let mut sorted_files = Vec::new();

        for file in completed_files(download_dir) {
            let Some(name) = file.file_name().map(|name| name.to_string_lossy().into_owned()) else {
                continue;
            };
            let hit = ids
                .iter()
                .position(|id| id.as_deref().is_some_and(|id| name.contains(id)));
            let Some(index) = hit else {
                continue;
            };

            let moved = self.sort(std::slice::from_ref(&file), records[index].job());
            if !moved.is_empty() {
                matched[index] = true;
                sorted_files.extend(moved);
            }
        }

        let remaining = records
            .into_iter()
            .zip(matched)
            .filter_map(|(record, hit)| (!hit).then_some(record))
            .collect();
        ManualSortOutcome {
            sorted_files,
            remaining,
        }
    }
}

/// Completed (non-partial) regular files directly inside `dir`, sorted.
///
/// An unreadable or missing directory yields an empty set.
#[must_use]
pub fn completed_files(dir: &Path) -> BTreeSet<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(dir = %dir.display(), error = %error, "download area not readable");
            return BTreeSet::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.path())
        .filter(|path| !is_partial_download(path))
        .collect()
}

/// Completed files present in `dir` now but not in `before`.
#[must_use]
pub fn new_completed_files(dir: &Path, before: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    completed_files(dir)
        .into_iter()
        .filter(|path| !before.contains(path))
        .collect()
}

fn move_into(path: &Path, destination: &Path) -> Result<PathBuf, SortError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = resolve_unique_path(destination, &file_name);

    if fs::rename(path, &target).is_ok() {
        return Ok(target);
    }
    // Cross-device moves need a copy.
    fs::copy(path, &target)
        .and_then(|_| fs::remove_file(path))
        .map_err(|source| SortError::Move {
            from: path.to_path_buf(),
            to: target.clone(),
            source,
        })?;
    Ok(target)
}
