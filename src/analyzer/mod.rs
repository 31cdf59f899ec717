//! Link analysis over exported chat documents.
//!
//! Turns a list of HTML exports into a deterministic, deduplicated list of
//! [`DownloadJob`]s plus aggregate statistics.
//!
//! # Algorithm
//!
//! Documents are processed in the order given, messages in document order,
//! anchors in message order. For each message the target-service links that
//! are neither banned nor already claimed by an earlier job form the job.
//! First occurrence wins across the whole run, so identical input and an
//! identical banned set always produce the identical job list.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::path::PathBuf;
//! use vortexflow_core::analyzer::LinkAnalyzer;
//!
//! let analyzer = LinkAnalyzer::default();
//! let report = analyzer.analyze(&[PathBuf::from("messages.html")], &BTreeSet::new());
//! println!("{} jobs, {} target links", report.jobs.len(), report.target_count);
//! ```

mod document;
mod folder;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::classifier::LinkClassifier;
use crate::job::{DownloadJob, JobKind};

pub use document::{Anchor, Message, extract_messages};
pub use folder::{multi_folder_name, sanitize_folder_name, single_fallback_name, single_folder_name};

/// Errors for a single source document. Never fatal to an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The document could not be read as UTF-8 text.
    #[error("cannot read document {path}: {source}")]
    Unreadable {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// A document that was skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    /// Document path.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// An in-memory source document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Base name used in fallback folder names (e.g. `messages.html`).
    pub name: String,
    /// Raw HTML.
    pub html: String,
}

impl SourceDocument {
    /// Reads a document from disk, naming it by its file name.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::Unreadable`] when the file cannot be read.
    pub fn read(path: &Path) -> Result<Self, AnalyzeError> {
        let html = fs::read_to_string(path).map_err(|source| AnalyzeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            name: document_base_name(path),
            html,
        })
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Every href seen, before banning.
    pub raw_count: usize,
    /// Hrefs removed by the banned-link filter.
    pub banned_count: usize,
    /// Non-banned hrefs minus distinct non-banned hrefs.
    pub duplicate_count: usize,
    /// Sorted distinct non-banned hrefs of any category.
    pub unique_links: Vec<String>,
    /// Distinct target-service links placed into jobs.
    pub target_count: usize,
    /// Jobs in creation order.
    pub jobs: Vec<DownloadJob>,
    /// Non-target unique links grouped by category label.
    pub other_domains: BTreeMap<String, usize>,
    /// Documents that could not be processed.
    pub skipped_documents: Vec<SkippedDocument>,
}

impl AnalysisReport {
    /// Number of SINGLE jobs.
    #[must_use]
    pub fn single_jobs(&self) -> usize {
        self.count_kind(JobKind::Single)
    }

    /// Number of MULTI jobs.
    #[must_use]
    pub fn multi_jobs(&self) -> usize {
        self.count_kind(JobKind::Multi)
    }

    /// Total links across all jobs.
    #[must_use]
    pub fn total_job_links(&self) -> usize {
        crate::job::total_links(&self.jobs)
    }

    fn count_kind(&self, kind: JobKind) -> usize {
        self.jobs.iter().filter(|job| job.kind() == kind).count()
    }
}

/// Extracts, filters, deduplicates and groups links from chat exports.
#[derive(Debug, Clone, Default)]
pub struct LinkAnalyzer {
    classifier: LinkClassifier,
}

impl LinkAnalyzer {
    /// Creates an analyzer using the given classifier.
    #[must_use]
    pub fn new(classifier: LinkClassifier) -> Self {
        Self { classifier }
    }

    /// Returns the classifier in use.
    #[must_use]
    pub fn classifier(&self) -> &LinkClassifier {
        &self.classifier
    }

    /// Analyzes documents on disk in the order given.
    ///
    /// Unreadable documents are logged and listed in
    /// [`AnalysisReport::skipped_documents`]; the rest still process.
    #[instrument(skip(self, paths, banned), fields(documents = paths.len(), banned = banned.len()))]
    pub fn analyze(&self, paths: &[PathBuf], banned: &BTreeSet<String>) -> AnalysisReport {
        let mut documents = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for path in paths {
            match SourceDocument::read(path) {
                Ok(document) => documents.push(document),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "skipping unreadable document");
                    skipped.push(SkippedDocument {
                        path: path.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        let mut report = self.analyze_documents(&documents, banned);
        report.skipped_documents = skipped;
        report
    }

    /// Analyzes already-loaded documents in the order given.
    #[must_use]
    pub fn analyze_documents(
        &self,
        documents: &[SourceDocument],
        banned: &BTreeSet<String>,
    ) -> AnalysisReport {
        let parsed: Vec<(&SourceDocument, Vec<Message>)> = documents
            .iter()
            .map(|document| (document, extract_messages(&document.html)))
            .collect();

        let mut raw_count = 0usize;
        let mut banned_count = 0usize;
        let mut non_banned: Vec<&str> = Vec::new();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut jobs = Vec::new();

        for (document, messages) in &parsed {
            debug!(document = %document.name, messages = messages.len(), "scanning document");
            for (index, message) in messages.iter().enumerate() {
                for anchor in &message.anchors {
                    raw_count += 1;
                    if banned.contains(&anchor.href) {
                        banned_count += 1;
                    } else {
                        non_banned.push(anchor.href.as_str());
                    }
                }

                if let Some(job) = self.job_for_message(&document.name, index, message, banned, &claimed) {
                    claimed.extend(job.links().iter().cloned());
                    jobs.push(job);
                }
            }
        }

        let unique: BTreeSet<&str> = non_banned.iter().copied().collect();
        let mut other_domains: BTreeMap<String, usize> = BTreeMap::new();
        for link in &unique {
            let category = self.classifier.classify(link);
            if !category.is_target() {
                *other_domains.entry(category.label().to_string()).or_default() += 1;
            }
        }

        let report = AnalysisReport {
            raw_count,
            banned_count,
            duplicate_count: non_banned.len() - unique.len(),
            unique_links: unique.into_iter().map(str::to_string).collect(),
            target_count: claimed.len(),
            jobs,
            other_domains,
            skipped_documents: Vec::new(),
        };

        info!(
            raw = report.raw_count,
            banned = report.banned_count,
            duplicates = report.duplicate_count,
            unique = report.unique_links.len(),
            target = report.target_count,
            jobs = report.jobs.len(),
            "analysis complete"
        );
        report
    }

    fn job_for_message(
        &self,
        document_name: &str,
        index: usize,
        message: &Message,
        banned: &BTreeSet<String>,
        claimed: &HashSet<String>,
    ) -> Option<DownloadJob> {
        let mut links: Vec<String> = Vec::new();
        for anchor in &message.anchors {
            let href = anchor.href.as_str();
            if banned.contains(href)
                || claimed.contains(href)
                || links.iter().any(|existing| existing == href)
                || !self.classifier.is_target(href)
            {
                continue;
            }
            links.push(href.to_string());
        }

        let folder_name = match links.len() {
            0 => return None,
            1 => single_folder_name(
                message.anchor_text(&links[0]),
                document_name,
                index,
            ),
            _ => multi_folder_name(document_name, index),
        };

        match DownloadJob::new(document_name, links, folder_name) {
            Ok(job) => Some(job),
            Err(error) => {
                // Unreachable with the filtering above; logged rather than panicking.
                warn!(document = document_name, message = index + 1, error = %error, "dropping invalid job");
                None
            }
        }
    }
}

/// File name component of a document path, used in fallback folder names.
#[must_use]
pub fn document_base_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy().into_owned(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn doc(name: &str, html: &str) -> SourceDocument {
        SourceDocument {
            name: name.to_string(),
            html: html.to_string(),
        }
    }

    fn message(anchors: &[(&str, &str)]) -> String {
        let body: String = anchors
            .iter()
            .map(|(href, text)| format!(r#"<a href="{href}">{text}</a> "#))
            .collect();
        format!(r#"<div class="message"><div class="text">{body}</div></div>"#)
    }

    #[test]
    fn test_single_link_message_uses_anchor_text() {
        let html = message(&[("https://terabox.com/s/1a", "My Movie (HD)")]);
        let report = LinkAnalyzer::default().analyze_documents(&[doc("chat.html", &html)], &BTreeSet::new());
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].kind(), JobKind::Single);
        assert_eq!(report.jobs[0].folder_name(), "My Movie HD");
        assert_eq!(report.jobs[0].source_file(), "chat.html");
    }

    #[test]
    fn test_multi_link_message_uses_group_name() {
        let html = format!(
            "{}{}",
            message(&[("https://example.com", "x")]),
            message(&[("https://terabox.com/s/1a", "a"), ("https://terabox.com/s/1b", "b")])
        );
        let report = LinkAnalyzer::default().analyze_documents(&[doc("chat.html", &html)], &BTreeSet::new());
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].kind(), JobKind::Multi);
        assert_eq!(report.jobs[0].folder_name(), "Message_Group_chat.html_2");
        assert_eq!(
            report.jobs[0].links(),
            ["https://terabox.com/s/1a", "https://terabox.com/s/1b"]
        );
    }

    #[test]
    fn test_repeated_link_in_later_message_yields_no_job() {
        let html = format!(
            "{}{}",
            message(&[("https://terabox.com/s/1a", "a"), ("https://terabox.com/s/1b", "b")]),
            message(&[("https://terabox.com/s/1a", "again")])
        );
        let report = LinkAnalyzer::default().analyze_documents(&[doc("chat.html", &html)], &BTreeSet::new());
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].len(), 2);
        assert_eq!(report.raw_count, 3);
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.target_count, 2);
    }

    #[test]
    fn test_partially_claimed_message_keeps_only_new_links() {
        let html = format!(
            "{}{}",
            message(&[("https://terabox.com/s/1a", "a")]),
            message(&[("https://terabox.com/s/1a", "a"), ("https://terabox.com/s/1c", "Fresh One")])
        );
        let report = LinkAnalyzer::default().analyze_documents(&[doc("chat.html", &html)], &BTreeSet::new());
        assert_eq!(report.jobs.len(), 2);
        assert_eq!(report.jobs[1].kind(), JobKind::Single);
        assert_eq!(report.jobs[1].links(), ["https://terabox.com/s/1c"]);
        assert_eq!(report.jobs[1].folder_name(), "Fresh One");
    }

    #[test]
    fn test_same_link_twice_in_one_message_is_single() {
        let html = message(&[("https://terabox.com/s/1a", "Clip"), ("https://terabox.com/s/1a", "Clip")]);
        let report = LinkAnalyzer::default().analyze_documents(&[doc("chat.html", &html)], &BTreeSet::new());
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].kind(), JobKind::Single);
        assert_eq!(report.duplicate_count, 1);
    }

    #[test]
    fn test_banned_link_is_excluded_everywhere() {
        let banned: BTreeSet<String> = ["https://terabox.com/s/bad".to_string()].into();
        let html = message(&[("https://terabox.com/s/bad", "bad"), ("https://terabox.com/s/ok", "ok")]);
        let report = LinkAnalyzer::default().analyze_documents(&[doc("chat.html", &html)], &banned);
        assert_eq!(report.banned_count, 1);
        assert_eq!(report.raw_count, 2);
        assert!(!report.unique_links.contains(&"https://terabox.com/s/bad".to_string()));
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].links(), ["https://terabox.com/s/ok"]);
        assert_eq!(report.jobs[0].kind(), JobKind::Single);
    }

    #[test]
    fn test_empty_anchor_text_falls_back() {
        let html = format!(
            "{}{}{}",
            message(&[]),
            message(&[]),
            message(&[("https://terabox.com/s/1a", "★★★")])
        );
        let report = LinkAnalyzer::default().analyze_documents(&[doc("export.html", &html)], &BTreeSet::new());
        assert_eq!(report.jobs[0].folder_name(), "Single_Download_export.html_3");
    }

    #[test]
    fn test_other_domains_breakdown() {
        let html = message(&[
            ("https://t.me/chan/1", "tg"),
            ("https://www.example.org/a", "ex"),
            ("https://example.org/b", "ex"),
            ("https://terabox.com/s/1a", "tb"),
            ("garbage", "junk"),
        ]);
        let report = LinkAnalyzer::default().analyze_documents(&[doc("c.html", &html)], &BTreeSet::new());
        assert_eq!(report.other_domains.get("Telegram"), Some(&1));
        assert_eq!(report.other_domains.get("example.org"), Some(&2));
        assert_eq!(report.other_domains.get("Invalid URL"), Some(&1));
        assert!(!report.other_domains.contains_key("TeraBox"));
    }

    #[test]
    fn test_unique_links_sorted() {
        let html = message(&[("https://z.example/1", "z"), ("https://a.example/1", "a")]);
        let report = LinkAnalyzer::default().analyze_documents(&[doc("c.html", &html)], &BTreeSet::new());
        assert_eq!(report.unique_links, ["https://a.example/1", "https://z.example/1"]);
    }

    #[test]
    fn test_document_base_name() {
        assert_eq!(document_base_name(Path::new("/tmp/export/messages3.html")), "messages3.html");
    }
}
