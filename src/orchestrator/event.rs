//! Events published by the worker to the presentation layer.

use std::collections::BTreeMap;
use std::fmt;

use crate::analyzer::AnalysisReport;
use crate::job::FailedLinkRecord;

/// Lifecycle state of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, not started.
    Idle,
    /// Processing links.
    Running,
    /// Parked before the next link start.
    Paused,
    /// Stop observed, persisting the remainder.
    Stopping,
    /// Ended early; the remainder is saved as a session.
    Stopped,
    /// Main pass and retry phase finished.
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Read-only analysis statistics for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    /// Every href seen, before banning.
    pub raw_count: usize,
    /// Hrefs removed by the banned filter.
    pub banned_count: usize,
    /// Repeated non-banned hrefs.
    pub duplicate_count: usize,
    /// Distinct non-banned hrefs.
    pub unique_count: usize,
    /// Distinct target-service links placed into jobs.
    pub target_count: usize,
    /// Number of jobs.
    pub job_count: usize,
    /// Number of SINGLE jobs.
    pub single_jobs: usize,
    /// Number of MULTI jobs.
    pub multi_jobs: usize,
    /// Non-target unique links by category label.
    pub other_domains: BTreeMap<String, usize>,
    /// Documents that could not be read.
    pub skipped_documents: usize,
}

impl From<&AnalysisReport> for AnalysisSummary {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            raw_count: report.raw_count,
            banned_count: report.banned_count,
            duplicate_count: report.duplicate_count,
            unique_count: report.unique_links.len(),
            target_count: report.target_count,
            job_count: report.jobs.len(),
            single_jobs: report.single_jobs(),
            multi_jobs: report.multi_jobs(),
            other_domains: report.other_domains.clone(),
            skipped_documents: report.skipped_documents.len(),
        }
    }
}

/// Worker-to-presentation notification. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    /// Analysis finished.
    AnalysisComplete(AnalysisSummary),
    /// Run state changed.
    StateChanged(RunState),
    /// A link is about to be processed.
    Progress {
        /// 1-based position within the current pass.
        current: usize,
        /// Links in the current pass.
        total: usize,
        /// Human-readable description.
        message: String,
    },
    /// The operator must handle `link` by hand, then confirm.
    ManualActionRequired {
        /// Link to handle.
        link: String,
        /// 1-based position among the manual links.
        position: usize,
        /// Number of manual links in this run.
        of: usize,
    },
    /// A link failed and was recorded.
    LinkFailed(FailedLinkRecord),
    /// The download resource could not be acquired; the run did not start.
    ResourceUnavailable {
        /// Error and remediation text.
        message: String,
    },
    /// The run ended (completed or stopped).
    RunFinished {
        /// Failed-link records left after the run.
        failed_count: usize,
    },
}
