use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use vortexflow_core::{JsonStateStore, StateStore};

use crate::app::{config_runtime, terminal};
use crate::app_config;
use crate::cli::{Cli, Command};
use crate::{ProcessExit, commands};

pub(crate) async fn run_vortexflow() -> Result<ProcessExit> {
    // Parse before tracing so --help works without logs
    let cli = Cli::parse();

    let loaded = app_config::load_default_file_config()?;
    let file_config = loaded.config.unwrap_or_default();

    let default_level =
        config_runtime::resolve_default_log_level(cli.verbose, cli.quiet, file_config.verbosity);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(cli.verbose, cli.quiet);
    terminal::init_tracing(
        default_level,
        force_cli_log_level,
        terminal::is_no_color_requested(),
    );
    debug!(?cli, config_path = ?loaded.path, "CLI arguments parsed");

    let state_dir = config_runtime::resolve_state_dir(cli.state_dir.as_deref(), &file_config);
    debug!(state_dir = %state_dir.display(), "state directory");
    let store: Arc<dyn StateStore> = Arc::new(JsonStateStore::new(state_dir));
    let quiet = cli.quiet;

    match cli.command {
        Command::Analyze(args) => commands::run_analyze_command(&args, &file_config, store.as_ref()),
        Command::Run(args) => commands::run_run_command(&args, &file_config, store, quiet).await,
        Command::Resume(options) => {
            commands::run_resume_command(&options, &file_config, store, quiet).await
        }
        Command::Discard => commands::run_discard_command(store.as_ref()),
        Command::SortManual(args) => commands::run_sort_manual_command(&args, &file_config, store),
        Command::Direct(args) => commands::run_direct_command(&args, &file_config, store).await,
        Command::Ban(list) => commands::run_ban_command(&list.links, store.as_ref()),
        Command::Unban(list) => commands::run_unban_command(&list.links, store.as_ref()),
        Command::Banned => commands::run_banned_command(store.as_ref()),
    }
}
