//! Commands over persisted state: session, failed links, banned links.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use vortexflow_core::{DownloadOrchestrator, StateStore};

use crate::ProcessExit;
use crate::app::config_runtime;
use crate::app_config::FileConfig;
use crate::cli::{RunOptions, SortManualArgs};

pub fn run_discard_command(store: &dyn StateStore) -> Result<ProcessExit> {
    let Some(session) = store.load_session() else {
        println!("No interrupted session.");
        return Ok(ProcessExit::Success);
    };
    store
        .clear_session()
        .context("Failed to delete the saved session")?;
    println!(
        "Discarded session with {} remaining links.",
        session.remaining_links()
    );
    Ok(ProcessExit::Success)
}

pub fn run_sort_manual_command(
    args: &SortManualArgs,
    file_config: &FileConfig,
    store: Arc<dyn StateStore>,
) -> Result<ProcessExit> {
    let options = RunOptions {
        output_dir: args.output_dir.clone(),
        download_dir: args.download_dir.clone(),
        ..RunOptions::default()
    };
    let config = config_runtime::resolve_orchestrator_config(&options, file_config);
    info!(download_dir = %config.download_dir.display(), "Scanning for manual downloads");

    let outcome = DownloadOrchestrator::new(config, store).sort_manual_downloads();
    for path in &outcome.sorted_files {
        println!("{}", path.display());
    }
    println!(
        "Sorted {} files; {} failed links remain.",
        outcome.sorted_files.len(),
        outcome.remaining.len()
    );
    Ok(ProcessExit::Success)
}

pub fn run_ban_command(links: &[String], store: &dyn StateStore) -> Result<ProcessExit> {
    let mut banned = store.load_banned_links();
    let added = links
        .iter()
        .map(|link| link.trim())
        .filter(|link| !link.is_empty())
        .filter(|link| banned.insert((*link).to_string()))
        .count();
    if added > 0 {
        store
            .save_banned_links(&banned)
            .context("Failed to save the banned-link list")?;
    }
    println!("Banned {added} new links ({} total).", banned.len());
    Ok(ProcessExit::Success)
}

pub fn run_unban_command(links: &[String], store: &dyn StateStore) -> Result<ProcessExit> {
    let mut banned = store.load_banned_links();
    let removed = links
        .iter()
        .filter(|link| banned.remove(link.trim()))
        .count();
    if removed > 0 {
        store
            .save_banned_links(&banned)
            .context("Failed to save the banned-link list")?;
    }
    println!("Unbanned {removed} links ({} total).", banned.len());
    Ok(ProcessExit::Success)
}

pub fn run_banned_command(store: &dyn StateStore) -> Result<ProcessExit> {
    let banned = store.load_banned_links();
    if banned.is_empty() {
        info!("The banned-link list is empty");
    }
    for link in &banned {
        println!("{link}");
    }
    Ok(ProcessExit::Success)
}
