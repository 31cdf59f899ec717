//! Merges CLI flags, the config file and built-in defaults.
//!
//! Precedence for every setting: CLI flag, then config file, then default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use vortexflow_core::classifier::DEFAULT_TARGET_DOMAINS;
use vortexflow_core::{LinkClassifier, OrchestratorConfig};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::RunOptions;

/// State directory used when neither the CLI nor the config file names one.
pub(crate) const DEFAULT_STATE_DIR: &str = ".vortexflow";

pub(crate) fn resolve_state_dir(cli_state_dir: Option<&Path>, file_config: &FileConfig) -> PathBuf {
    cli_state_dir
        .map(Path::to_path_buf)
        .or_else(|| file_config.state_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

pub(crate) fn resolve_classifier(cli_domains: &[String], file_config: &FileConfig) -> LinkClassifier {
    if !cli_domains.is_empty() {
        return LinkClassifier::new(cli_domains);
    }
    match &file_config.target_domains {
        Some(domains) => LinkClassifier::new(domains),
        None => LinkClassifier::new(DEFAULT_TARGET_DOMAINS),
    }
}

pub(crate) fn resolve_orchestrator_config(
    options: &RunOptions,
    file_config: &FileConfig,
) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();

    if let Some(output_dir) = options.output_dir.clone().or_else(|| file_config.output_dir.clone()) {
        config.output_root = output_dir;
    }
    if let Some(download_dir) = options
        .download_dir
        .clone()
        .or_else(|| file_config.download_dir.clone())
    {
        config.download_dir = download_dir;
    }

    let manual_count = options
        .manual_count
        .map(|count| usize::try_from(count).unwrap_or(usize::MAX))
        .or(file_config.manual_count);
    if let Some(manual_count) = manual_count {
        config.manual_count = manual_count;
    }

    if let Some(ms) = options.retry_delay_ms.or(file_config.retry_delay_ms) {
        config.retry_delay = Duration::from_millis(ms);
    }
    if let Some(secs) = options
        .download_timeout_secs
        .or(file_config.download_timeout_secs)
    {
        config.download_timeout = Duration::from_secs(secs);
    }
    config
}

pub(crate) fn resolve_default_log_level(
    verbose: u8,
    quiet: bool,
    file_verbosity: Option<VerbositySetting>,
) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => file_verbosity.map_or("info", VerbositySetting::log_level),
        1 => "debug",
        _ => "trace",
    }
}

/// Explicit `-v`/`-q` beat `RUST_LOG`.
pub(crate) fn should_force_cli_log_level(verbose: u8, quiet: bool) -> bool {
    verbose > 0 || quiet
}
