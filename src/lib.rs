//! VortexFlow Core Library
//!
//! Turns exported chat histories into sorted local downloads: links are
//! pulled out of HTML exports, filtered to one file-hosting service,
//! grouped into jobs per message, and fed one at a time through an
//! exclusive download resource into a per-job output tree.
//!
//! # Architecture
//!
//! - [`classifier`] - Domain-based link categories
//! - [`analyzer`] - HTML export parsing, dedup and job grouping
//! - [`job`] - Job and failed-link record model
//! - [`store`] - Session / failed / banned link persistence
//! - [`sorter`] - Output tree layout and file moves
//! - [`download`] - Downloader contract and HTTP implementation
//! - [`orchestrator`] - Sequential worker state machine with pause/stop/retry

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analyzer;
pub mod classifier;
pub mod download;
pub mod job;
pub mod orchestrator;
pub mod sorter;
pub mod store;
mod user_agent;

// Re-export commonly used types
pub use analyzer::{AnalysisReport, LinkAnalyzer};
pub use classifier::{LinkCategory, LinkClassifier};
pub use download::{DownloadError, Downloader, HttpDownloader};
pub use job::{DownloadJob, FailedLinkRecord, JobKind};
pub use orchestrator::{
    ControlHandle, DownloadOrchestrator, OrchestratorConfig, OrchestratorEvent, RunOutcome,
    RunState, RunSummary,
};
pub use sorter::FileSorter;
pub use store::{JsonStateStore, Session, StateStore};
