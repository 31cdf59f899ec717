//! Direct command: download one link right away.

use std::sync::Arc;

use anyhow::{Context, Result};
use vortexflow_core::classifier::TARGET_SERVICE_LABEL;
use vortexflow_core::orchestrator::DirectOutcome;
use vortexflow_core::{DownloadOrchestrator, HttpDownloader, StateStore};

use crate::ProcessExit;
use crate::app::config_runtime;
use crate::app_config::FileConfig;
use crate::cli::DirectArgs;

pub async fn run_direct_command(
    args: &DirectArgs,
    file_config: &FileConfig,
    store: Arc<dyn StateStore>,
) -> Result<ProcessExit> {
    let config = config_runtime::resolve_orchestrator_config(&args.options, file_config);
    let classifier =
        config_runtime::resolve_classifier(&args.classifier.target_domains, file_config);
    let downloader = HttpDownloader::new(config.download_dir.clone())
        .context("Failed to set up the downloader")?;

    let orchestrator = DownloadOrchestrator::new(config, store);
    let outcome = orchestrator
        .direct_download(&classifier, &args.link, &downloader)
        .await?;

    match outcome {
        DirectOutcome::Sorted(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            Ok(ProcessExit::Success)
        }
        DirectOutcome::HandedToOperator => {
            println!(
                "Not a {TARGET_SERVICE_LABEL} link; download it by hand: {}",
                args.link
            );
            Ok(ProcessExit::Partial)
        }
    }
}
