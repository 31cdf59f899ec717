//! The sequential download worker and its state machine.
//!
//! States: `Idle → Running ⇄ Paused → (Stopping → Stopped) | Completed`.
//!
//! One link is in flight at a time. Pause and stop are cooperative and take
//! effect only at link boundaries; an in-flight download always runs to
//! completion (or to its timeout). After the main pass, every failed link
//! gets exactly one more attempt in the retry phase.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vortexflow_core::download::{Downloader, HttpDownloader};
//! use vortexflow_core::orchestrator::{DownloadOrchestrator, OrchestratorConfig};
//! use vortexflow_core::store::JsonStateStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OrchestratorConfig::new("./output", "./downloads");
//! let store = Arc::new(JsonStateStore::new(".vortexflow"));
//! let orchestrator = DownloadOrchestrator::new(config, store);
//! let summary = orchestrator
//!     .run(Vec::new(), || {
//!         HttpDownloader::new("./downloads").map(|d| Arc::new(d) as Arc<dyn Downloader>)
//!     })
//!     .await?;
//! println!("{:?}", summary.outcome);
//! # Ok(())
//! # }
//! ```

mod config;
mod control;
mod event;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::analyzer::{AnalysisReport, LinkAnalyzer};
use crate::classifier::LinkClassifier;
use crate::download::{DownloadError, Downloader, unix_timestamp};
use crate::job::{DownloadJob, FailedLinkRecord, JobError, total_links};
use crate::sorter::{FileSorter, ManualSortOutcome, completed_files, new_completed_files};
use crate::store::StateStore;

pub use config::{DEFAULT_DOWNLOAD_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_DELAY, OrchestratorConfig};
pub use control::{ControlHandle, Signals};
pub use event::{AnalysisSummary, OrchestratorEvent, RunState};

/// Errors that end an orchestrator operation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The download resource could not be acquired; nothing was consumed.
    #[error("cannot start run: {source}")]
    ResourceUnavailable {
        /// Acquisition failure.
        #[source]
        source: DownloadError,
    },

    /// A direct download failed.
    #[error("direct download of {link} failed: {source}")]
    Download {
        /// The link.
        link: String,
        /// Underlying failure.
        #[source]
        source: DownloadError,
    },

    /// A job could not be built.
    #[error(transparent)]
    Job(#[from] JobError),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Main pass and retry phase finished; the session is cleared.
    Completed,
    /// Stopped early; unprocessed links are saved as a session.
    Stopped,
}

/// Totals for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Links in the job list the run started with.
    pub total_links: usize,
    /// Main-pass links consumed (downloaded, failed or handled by hand).
    pub processed: usize,
    /// Main-pass links downloaded and sorted.
    pub succeeded: usize,
    /// Links handled through the manual step.
    pub manual: usize,
    /// Failed links that succeeded in the retry phase.
    pub recovered: usize,
    /// Failed-link records left after the run.
    pub failed: Vec<FailedLinkRecord>,
    /// Links saved in the session for a later resume.
    pub remaining_links: usize,
}

impl RunSummary {
    fn new(total_links: usize) -> Self {
        Self {
            outcome: RunOutcome::Completed,
            total_links,
            processed: 0,
            succeeded: 0,
            manual: 0,
            recovered: 0,
            failed: Vec::new(),
            remaining_links: 0,
        }
    }

    /// True when the run completed with no failed links left.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcome == RunOutcome::Completed && self.failed.is_empty()
    }
}

/// Result of a direct single-link download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectOutcome {
    /// Downloaded and sorted; final paths.
    Sorted(Vec<PathBuf>),
    /// Not a target-service link; handed to the operator.
    HandedToOperator,
}

/// Owns all run state; the presentation layer talks to it only through
/// [`ControlHandle`] and the event channel.
pub struct DownloadOrchestrator {
    config: OrchestratorConfig,
    store: Arc<dyn StateStore>,
    sorter: FileSorter,
    control: ControlHandle,
    events: Option<mpsc::UnboundedSender<OrchestratorEvent>>,
    state: RunState,
}

impl DownloadOrchestrator {
    /// Creates an idle orchestrator.
    #[must_use]
    pub fn new(config: OrchestratorConfig, store: Arc<dyn StateStore>) -> Self {
        let sorter = FileSorter::new(config.output_root.clone());
        Self {
            config,
            store,
            sorter,
            control: ControlHandle::new(),
            events: None,
            state: RunState::Idle,
        }
    }

    /// Publishes events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<OrchestratorEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uses an existing control handle (e.g. one already wired to a signal handler).
    #[must_use]
    pub fn with_control(mut self, control: ControlHandle) -> Self {
        self.control = control;
        self
    }

    /// Handle for pause/resume/stop/confirm.
    #[must_use]
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Analyzes documents against the freshly loaded banned set and
    /// publishes [`OrchestratorEvent::AnalysisComplete`].
    pub fn analyze(&self, analyzer: &LinkAnalyzer, paths: &[PathBuf]) -> AnalysisReport {
        let banned = self.store.load_banned_links();
        let report = analyzer.analyze(paths, &banned);
        self.emit(OrchestratorEvent::AnalysisComplete(AnalysisSummary::from(
            &report,
        )));
        report
    }

    /// Processes `jobs` in order, then retries failures once.
    ///
    /// `acquire` obtains the download resource. If it fails, a
    /// [`OrchestratorEvent::ResourceUnavailable`] event is published and the
    /// error returned before any job is consumed or any state written.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ResourceUnavailable`] when `acquire` fails.
    /// Per-link failures never end the run.
    #[instrument(skip_all, fields(jobs = jobs.len(), links = total_links(&jobs)))]
    pub async fn run<F>(
        mut self,
        jobs: Vec<DownloadJob>,
        acquire: F,
    ) -> Result<RunSummary, OrchestratorError>
    where
        F: FnOnce() -> Result<Arc<dyn Downloader>, DownloadError>,
    {
        let downloader = match acquire() {
            Ok(downloader) => downloader,
            Err(source) => {
                error!(error = %source, "download resource unavailable");
                self.emit(OrchestratorEvent::ResourceUnavailable {
                    message: remediation_message(&source),
                });
                return Err(OrchestratorError::ResourceUnavailable { source });
            }
        };
        let downloader = downloader.as_ref();

        let total = total_links(&jobs);
        let manual_total = self.config.manual_count.min(total);
        let mut failed = self.store.load_failed_links();
        let mut summary = RunSummary::new(total);
        info!(
            total,
            manual = manual_total,
            carried_failures = failed.len(),
            "run starting"
        );
        self.set_state(RunState::Running);

        let mut queue: VecDeque<DownloadJob> = jobs.into();
        let mut position = 0usize;

        while let Some(job) = queue.pop_front() {
            for (index, link) in job.links().iter().enumerate() {
                if !self.checkpoint().await {
                    return Ok(self.stop_main(job.remainder_from(index), queue, failed, summary));
                }
                position += 1;

                if position <= self.config.manual_count {
                    if !self
                        .manual_step(&job, link, position, manual_total, downloader)
                        .await
                    {
                        return Ok(self.stop_main(job.remainder_from(index), queue, failed, summary));
                    }
                    summary.manual += 1;
                } else {
                    self.emit(OrchestratorEvent::Progress {
                        current: position,
                        total,
                        message: format!("Downloading {link}"),
                    });
                    match self.attempt(downloader, link).await {
                        Ok(paths) => {
                            self.sorter.sort(&paths, &job);
                            summary.succeeded += 1;
                            if remove_record(&mut failed, link) {
                                self.save_failed(&failed);
                            }
                        }
                        Err(error) => self.record_failure(&job, link, &error, &mut failed),
                    }
                }
                summary.processed += 1;
            }
            debug!(folder = job.folder_name(), "job finished");
        }

        if self.control.is_stop_requested() {
            info!("stop requested after the main pass, skipping retries");
            return Ok(self.finish(failed, summary, RunOutcome::Stopped));
        }

        let (failed, stopped) = self.retry_phase(downloader, failed, &mut summary).await;
        let outcome = if stopped {
            RunOutcome::Stopped
        } else {
            RunOutcome::Completed
        };
        Ok(self.finish(failed, summary, outcome))
    }

    /// Downloads one link right away and sorts it as a SINGLE job named
    /// `Direct_Download_{unix seconds}`. Non-target links go to the operator.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Download`] when the download fails.
    #[instrument(skip(self, classifier, downloader))]
    pub async fn direct_download(
        &self,
        classifier: &LinkClassifier,
        link: &str,
        downloader: &dyn Downloader,
    ) -> Result<DirectOutcome, OrchestratorError> {
        if !classifier.is_target(link) {
            info!(link, "not a target-service link, handing to operator");
            downloader.manual_open(link);
            return Ok(DirectOutcome::HandedToOperator);
        }

        let job = DownloadJob::single(
            "direct",
            link,
            format!("Direct_Download_{}", unix_timestamp()),
        )?;
        let paths = self
            .attempt(downloader, link)
            .await
            .map_err(|source| OrchestratorError::Download {
                link: link.to_string(),
                source,
            })?;
        Ok(DirectOutcome::Sorted(self.sorter.sort(&paths, &job)))
    }

    /// Matches files in the download area to persisted failed links, sorts
    /// them, and saves the reduced failed-link list.
    pub fn sort_manual_downloads(&self) -> ManualSortOutcome {
        let records = self.store.load_failed_links();
        let before = records.len();
        let outcome = self
            .sorter
            .sort_manual_downloads(&self.config.download_dir, records);
        if outcome.remaining.len() != before {
            self.save_failed(&outcome.remaining);
        }
        info!(
            sorted = outcome.sorted_files.len(),
            resolved = before - outcome.remaining.len(),
            "manual downloads sorted"
        );
        outcome
    }

    /// Gate before a link start: false when the run must stop.
    async fn checkpoint(&mut self) -> bool {
        let signals = self.control.signals();
        if signals.stop_requested {
            return false;
        }
        if signals.paused {
            self.set_state(RunState::Paused);
            if !self.control.wait_while_paused().await {
                return false;
            }
            self.set_state(RunState::Running);
        }
        true
    }

    async fn manual_step(
        &self,
        job: &DownloadJob,
        link: &str,
        position: usize,
        of: usize,
        downloader: &dyn Downloader,
    ) -> bool {
        let before = completed_files(&self.config.download_dir);
        let seen = self.control.signals().confirmations;

        info!(link, position, of, "manual step");
        self.emit(OrchestratorEvent::ManualActionRequired {
            link: link.to_string(),
            position,
            of,
        });
        downloader.manual_open(link);

        if !self.control.wait_for_confirmation(seen).await {
            return false;
        }

        let new_files = new_completed_files(&self.config.download_dir, &before);
        if new_files.is_empty() {
            warn!(link, "no new files in the download area after manual step");
        } else {
            self.sorter.sort(&new_files, job);
        }
        true
    }

    async fn attempt(
        &self,
        downloader: &dyn Downloader,
        link: &str,
    ) -> Result<Vec<PathBuf>, DownloadError> {
        match tokio::time::timeout(self.config.download_timeout, downloader.download(link)).await
        {
            Err(_) => Err(DownloadError::timeout(link)),
            Ok(Ok(paths)) if paths.is_empty() => Err(DownloadError::NoFiles {
                url: link.to_string(),
            }),
            Ok(result) => result,
        }
    }

    fn record_failure(
        &self,
        job: &DownloadJob,
        link: &str,
        error: &DownloadError,
        failed: &mut Vec<FailedLinkRecord>,
    ) {
        warn!(link, folder = job.folder_name(), error = %error, "download failed");
        let record = job.failed_record(link);
        self.emit(OrchestratorEvent::LinkFailed(record.clone()));
        if !failed.iter().any(|existing| existing.link() == link) {
            failed.push(record);
        }
        self.save_failed(failed);
    }

    async fn retry_phase(
        &mut self,
        downloader: &dyn Downloader,
        pending: Vec<FailedLinkRecord>,
        summary: &mut RunSummary,
    ) -> (Vec<FailedLinkRecord>, bool) {
        if pending.is_empty() {
            return (pending, false);
        }
        let total = pending.len();
        info!(total, "retry phase");

        let mut still_failed = Vec::new();
        let mut pending = pending.into_iter().enumerate();
        while let Some((index, record)) = pending.next() {
            tokio::time::sleep(self.config.retry_delay).await;
            if !self.checkpoint().await {
                still_failed.push(record);
                still_failed.extend(pending.map(|(_, record)| record));
                return (still_failed, true);
            }

            self.emit(OrchestratorEvent::Progress {
                current: index + 1,
                total,
                message: format!("Retrying {}", record.link()),
            });
            match self.attempt(downloader, record.link()).await {
                Ok(paths) => {
                    self.sorter.sort(&paths, record.job());
                    summary.recovered += 1;
                }
                Err(error) => {
                    warn!(link = record.link(), error = %error, "retry failed");
                    self.emit(OrchestratorEvent::LinkFailed(record.clone()));
                    still_failed.push(record);
                }
            }
        }
        (still_failed, false)
    }

    /// Stop observed inside the main pass: save the remainder as a session.
    fn stop_main(
        &mut self,
        current: Option<DownloadJob>,
        queue: VecDeque<DownloadJob>,
        failed: Vec<FailedLinkRecord>,
        mut summary: RunSummary,
    ) -> RunSummary {
        self.set_state(RunState::Stopping);
        let remaining: Vec<DownloadJob> = current.into_iter().chain(queue).collect();
        summary.remaining_links = total_links(&remaining);

        let output_folder = self.config.output_root.display().to_string();
        if let Err(e) = self.store.save_session(&remaining, &output_folder) {
            warn!(error = %e, "failed to save session");
        }
        self.save_failed(&failed);
        info!(remaining = summary.remaining_links, "run stopped, session saved");

        summary.failed = failed;
        summary.outcome = RunOutcome::Stopped;
        self.set_state(RunState::Stopped);
        self.emit(OrchestratorEvent::RunFinished {
            failed_count: summary.failed.len(),
        });
        summary
    }

    /// Main pass exhausted: clear the session and persist the failed list.
    fn finish(
        &mut self,
        failed: Vec<FailedLinkRecord>,
        mut summary: RunSummary,
        outcome: RunOutcome,
    ) -> RunSummary {
        if outcome == RunOutcome::Stopped {
            self.set_state(RunState::Stopping);
        }
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "failed to clear session");
        }
        self.save_failed(&failed);

        summary.failed = failed;
        summary.outcome = outcome;
        self.set_state(match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Stopped => RunState::Stopped,
        });
        info!(
            succeeded = summary.succeeded,
            recovered = summary.recovered,
            failed = summary.failed.len(),
            outcome = ?outcome,
            "run finished"
        );
        self.emit(OrchestratorEvent::RunFinished {
            failed_count: summary.failed.len(),
        });
        summary
    }

    fn save_failed(&self, records: &[FailedLinkRecord]) {
        if let Err(e) = self.store.save_failed_links(records) {
            warn!(error = %e, "failed to save failed links");
        }
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "state change");
            self.state = state;
            self.emit(OrchestratorEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is listening; the run goes on.
            let _ = events.send(event);
        }
    }
}

fn remove_record(failed: &mut Vec<FailedLinkRecord>, link: &str) -> bool {
    let before = failed.len();
    failed.retain(|record| record.link() != link);
    failed.len() != before
}

fn remediation_message(error: &DownloadError) -> String {
    match error {
        DownloadError::Unavailable { .. } => error.to_string(),
        other => format!(
            "{other}\n  Suggestion: Check that the download resource is installed and reachable, then start the run again"
        ),
    }
}
