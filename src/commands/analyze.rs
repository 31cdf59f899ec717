//! Analyze command: statistics for chat exports, no downloads.

use anyhow::{Context, Result};
use tracing::info;
use vortexflow_core::{LinkAnalyzer, StateStore};

use crate::ProcessExit;
use crate::app::config_runtime;
use crate::app_config::FileConfig;
use crate::cli::AnalyzeArgs;
use crate::output;

pub fn run_analyze_command(
    args: &AnalyzeArgs,
    file_config: &FileConfig,
    store: &dyn StateStore,
) -> Result<ProcessExit> {
    let classifier =
        config_runtime::resolve_classifier(&args.classifier.target_domains, file_config);
    let analyzer = LinkAnalyzer::new(classifier);
    let banned = store.load_banned_links();
    let report = analyzer.analyze(&args.documents, &banned);

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to encode analysis report as JSON")?;
        println!("{json}");
    } else {
        output::print_analysis_summary(&report);
    }
    info!(
        jobs = report.jobs.len(),
        links = report.total_job_links(),
        "Analysis complete"
    );

    if report.skipped_documents.len() == args.documents.len() {
        return Ok(ProcessExit::Failure);
    }
    Ok(ProcessExit::Success)
}
