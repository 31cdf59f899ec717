//! CLI command handlers.

mod analyze;
mod direct;
mod run;
mod state;

pub use analyze::run_analyze_command;
pub use direct::run_direct_command;
pub use run::{run_resume_command, run_run_command};
pub use state::{
    run_ban_command, run_banned_command, run_discard_command, run_sort_manual_command,
    run_unban_command,
};
