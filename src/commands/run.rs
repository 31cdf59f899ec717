//! Run and resume commands: drive the orchestrator with operator controls.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{info, warn};
use vortexflow_core::{
    DownloadJob, DownloadOrchestrator, Downloader, HttpDownloader, LinkAnalyzer,
    OrchestratorConfig, StateStore,
};

use crate::ProcessExit;
use crate::app::{config_runtime, control_input, exit_handler, progress_manager, terminal};
use crate::app_config::FileConfig;
use crate::cli::{RunArgs, RunOptions};
use crate::output;

pub async fn run_run_command(
    args: &RunArgs,
    file_config: &FileConfig,
    store: Arc<dyn StateStore>,
    quiet: bool,
) -> Result<ProcessExit> {
    if let Some(session) = store.load_session() {
        warn!(
            remaining = session.remaining_links(),
            "An interrupted session exists and will be replaced if this run stops early.\n  \
             Suggestion: use `vortexflow resume` to continue it instead"
        );
    }

    let config = config_runtime::resolve_orchestrator_config(&args.options, file_config);
    let classifier =
        config_runtime::resolve_classifier(&args.classifier.target_domains, file_config);
    let analyzer = LinkAnalyzer::new(classifier);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let orchestrator = DownloadOrchestrator::new(config, store).with_events(events_tx);
    let report = orchestrator.analyze(&analyzer, &args.documents);
    if !quiet {
        output::print_analysis_summary(&report);
    }

    if report.skipped_documents.len() == args.documents.len() {
        bail!(
            "None of the {} documents could be read.\n  \
             Suggestion: pass HTML chat exports that exist and are readable",
            args.documents.len()
        );
    }
    if report.jobs.is_empty() {
        info!("No target-service links found, nothing to download");
        return Ok(ProcessExit::Success);
    }

    drive(orchestrator, report.jobs, events_rx, quiet).await
}

pub async fn run_resume_command(
    options: &RunOptions,
    file_config: &FileConfig,
    store: Arc<dyn StateStore>,
    quiet: bool,
) -> Result<ProcessExit> {
    let Some(session) = store.load_session() else {
        bail!(
            "No interrupted session to resume.\n  \
             Suggestion: start a new run with `vortexflow run <FILE>...`"
        );
    };
    println!("{}", output::session_line(&session));

    let config = resume_config(options, file_config, &session.output_folder);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let orchestrator = DownloadOrchestrator::new(config, store).with_events(events_tx);
    drive(orchestrator, session.remaining_jobs, events_rx, quiet).await
}

/// The session's output folder wins over the config file, an explicit
/// `--output-dir` wins over both.
fn resume_config(
    options: &RunOptions,
    file_config: &FileConfig,
    session_output: &str,
) -> OrchestratorConfig {
    let mut config = config_runtime::resolve_orchestrator_config(options, file_config);
    if options.output_dir.is_none() && !session_output.is_empty() {
        config.output_root = PathBuf::from(session_output);
    }
    config
}

async fn drive(
    orchestrator: DownloadOrchestrator,
    jobs: Vec<DownloadJob>,
    events_rx: mpsc::UnboundedReceiver<vortexflow_core::OrchestratorEvent>,
    quiet: bool,
) -> Result<ProcessExit> {
    let control = orchestrator.control();
    control_input::spawn_interrupt_handler(control.clone());
    control_input::spawn_stdin_reader(control);
    if !quiet {
        eprintln!("{}", control_input::CONTROL_HINT);
    }

    let use_progress_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let renderer = progress_manager::spawn_event_renderer(use_progress_bar, events_rx);

    let download_dir = orchestrator.config().download_dir.clone();
    let result = orchestrator
        .run(jobs, move || {
            HttpDownloader::new(download_dir).map(|d| Arc::new(d) as Arc<dyn Downloader>)
        })
        .await;
    let _ = renderer.await;

    let summary = result?;
    output::print_run_summary(&summary);
    Ok(exit_handler::determine_exit_outcome(&summary))
}
