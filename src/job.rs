//! Download job model.
//!
//! A [`DownloadJob`] groups the target-service links found in one chat
//! message. Its [`JobKind`] is fixed at construction from the link count and
//! decides which output tree the files are sorted into. The orchestrator may
//! later shrink the link list of a job (stop remainders, failed-link
//! records) without changing the kind, so the sorted destination of every
//! link stays stable across resumes.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a job violates its construction invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// No links were supplied.
    #[error("job '{folder_name}' has no links")]
    NoLinks {
        /// Folder name of the offending job.
        folder_name: String,
    },

    /// The same link appears twice in one job.
    #[error("job '{folder_name}' lists {link} more than once")]
    DuplicateLink {
        /// Folder name of the offending job.
        folder_name: String,
        /// The repeated link.
        link: String,
    },

    /// Folder name is empty or whitespace.
    #[error("job from {source_file} has an empty folder name")]
    EmptyFolderName {
        /// Source document of the offending job.
        source_file: String,
    },

    /// Declared kind does not match the link count.
    #[error("{kind} job '{folder_name}' cannot hold {count} link(s)")]
    KindMismatch {
        /// Declared kind.
        kind: JobKind,
        /// Folder name of the offending job.
        folder_name: String,
        /// Actual link count.
        count: usize,
    },
}

/// Whether a job came from a single-link or multi-link message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobKind {
    /// Exactly one link in the originating message.
    Single,
    /// Two or more links in the originating message.
    Multi,
}

impl JobKind {
    /// Derives the kind from a link count (`None` for zero links).
    #[must_use]
    pub fn for_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Single),
            _ => Some(Self::Multi),
        }
    }

    /// Returns the stable uppercase label used in persisted records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Multi => "MULTI",
        }
    }

    /// Returns the top-level output directory name for this kind.
    #[must_use]
    pub fn output_dir_name(self) -> &'static str {
        match self {
            Self::Single => "Single_File_Downloads",
            Self::Multi => "Multi_File_Downloads",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of links downloaded and sorted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JobRecord", into = "JobRecord")]
pub struct DownloadJob {
    source_file: String,
    links: Vec<String>,
    kind: JobKind,
    folder_name: String,
}

/// On-disk shape of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobRecord {
    source_file: String,
    links: Vec<String>,
    #[serde(rename = "type")]
    kind: JobKind,
    folder_name: String,
}

impl DownloadJob {
    /// Creates a job, deriving its kind from the number of links.
    ///
    /// # Errors
    ///
    /// Returns [`JobError`] if `links` is empty, contains duplicates, or
    /// `folder_name` is blank.
    pub fn new(
        source_file: impl Into<String>,
        links: Vec<String>,
        folder_name: impl Into<String>,
    ) -> Result<Self, JobError> {
        let source_file = source_file.into();
        let folder_name = folder_name.into();
        let kind = JobKind::for_count(links.len()).ok_or_else(|| JobError::NoLinks {
            folder_name: folder_name.clone(),
        })?;
        validate(&source_file, &links, &folder_name)?;
        Ok(Self {
            source_file,
            links,
            kind,
            folder_name,
        })
    }

    /// Creates a SINGLE job holding one link.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::EmptyFolderName`] if `folder_name` is blank.
    pub fn single(
        source_file: impl Into<String>,
        link: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Result<Self, JobError> {
        Self::new(source_file, vec![link.into()], folder_name)
    }

    /// Rebuilds a job that keeps a previously assigned kind.
    ///
    /// Used for persisted remainders and failed-link records, whose link
    /// list may have been shortened after the kind was fixed. A SINGLE job
    /// still may not hold more than one link.
    fn restore(
        source_file: String,
        links: Vec<String>,
        kind: JobKind,
        folder_name: String,
    ) -> Result<Self, JobError> {
        if links.is_empty() {
            return Err(JobError::NoLinks { folder_name });
        }
        if kind == JobKind::Single && links.len() > 1 {
            return Err(JobError::KindMismatch {
                kind,
                folder_name,
                count: links.len(),
            });
        }
        validate(&source_file, &links, &folder_name)?;
        Ok(Self {
            source_file,
            links,
            kind,
            folder_name,
        })
    }

    /// Name of the document the job was found in.
    #[must_use]
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Links still belonging to this job, in message order.
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Kind fixed when the job was first created.
    #[must_use]
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Destination folder name under the kind's output tree.
    #[must_use]
    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    /// Number of links in the job.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false for a constructed job; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns the part of this job starting at link `index`, keeping its
    /// kind and metadata. `None` when nothing is left.
    #[must_use]
    pub fn remainder_from(&self, index: usize) -> Option<Self> {
        let links = self.links.get(index..)?.to_vec();
        if links.is_empty() {
            return None;
        }
        Some(Self {
            links,
            ..self.clone_metadata()
        })
    }

    /// Builds the failed-link record for one of this job's links.
    #[must_use]
    pub fn failed_record(&self, link: &str) -> FailedLinkRecord {
        FailedLinkRecord {
            job: Self {
                links: vec![link.to_string()],
                ..self.clone_metadata()
            },
        }
    }

    fn clone_metadata(&self) -> Self {
        Self {
            source_file: self.source_file.clone(),
            links: Vec::new(),
            kind: self.kind,
            folder_name: self.folder_name.clone(),
        }
    }
}

fn validate(source_file: &str, links: &[String], folder_name: &str) -> Result<(), JobError> {
    if folder_name.trim().is_empty() {
        return Err(JobError::EmptyFolderName {
            source_file: source_file.to_string(),
        });
    }
    let mut seen = HashSet::with_capacity(links.len());
    for link in links {
        if !seen.insert(link.as_str()) {
            return Err(JobError::DuplicateLink {
                folder_name: folder_name.to_string(),
                link: link.clone(),
            });
        }
    }
    Ok(())
}

impl TryFrom<JobRecord> for DownloadJob {
    type Error = JobError;

    fn try_from(record: JobRecord) -> Result<Self, Self::Error> {
        Self::restore(
            record.source_file,
            record.links,
            record.kind,
            record.folder_name,
        )
    }
}

impl From<DownloadJob> for JobRecord {
    fn from(job: DownloadJob) -> Self {
        Self {
            source_file: job.source_file,
            links: job.links,
            kind: job.kind,
            folder_name: job.folder_name,
        }
    }
}

/// A job-shaped record for exactly one link that failed to download.
///
/// Serialized exactly like a [`DownloadJob`] whose `links` has length 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DownloadJob", into = "DownloadJob")]
pub struct FailedLinkRecord {
    job: DownloadJob,
}

impl FailedLinkRecord {
    /// The failed link.
    #[must_use]
    pub fn link(&self) -> &str {
        // Construction guarantees exactly one link.
        self.job.links.first().map_or("", String::as_str)
    }

    /// The owning job's metadata carrying only the failed link.
    #[must_use]
    pub fn job(&self) -> &DownloadJob {
        &self.job
    }

    /// Share identifier used to match manually downloaded files: the last
    /// non-empty path segment of the link, or the `surl` query value.
    #[must_use]
    pub fn share_id(&self) -> Option<String> {
        share_id(self.link())
    }
}

impl TryFrom<DownloadJob> for FailedLinkRecord {
    type Error = JobError;

    fn try_from(job: DownloadJob) -> Result<Self, Self::Error> {
        if job.links.len() != 1 {
            return Err(JobError::KindMismatch {
                kind: job.kind,
                folder_name: job.folder_name,
                count: job.links.len(),
            });
        }
        Ok(Self { job })
    }
}

impl From<FailedLinkRecord> for DownloadJob {
    fn from(record: FailedLinkRecord) -> Self {
        record.job
    }
}

/// Extracts the share identifier from a link.
#[must_use]
pub fn share_id(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == "surl")
        && !value.is_empty()
    {
        return Some(value.into_owned());
    }
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Total number of links across a job list.
#[must_use]
pub fn total_links(jobs: &[DownloadJob]) -> usize {
    jobs.iter().map(DownloadJob::len).sum()
}
