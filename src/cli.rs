//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pull file-hosting links out of chat exports and download them in order.
///
/// VortexFlow analyzes exported chat histories (HTML), groups the
/// file-hosting links of each message into a job, downloads them one at a
/// time and sorts the results into a per-job folder tree.
#[derive(Parser, Debug)]
#[command(name = "vortexflow")]
#[command(author, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding session, failed-link and banned-link state
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze chat exports and print link statistics
    Analyze(AnalyzeArgs),

    /// Analyze chat exports, then download and sort every job
    Run(RunArgs),

    /// Continue the interrupted session
    Resume(RunOptions),

    /// Delete the interrupted session
    Discard,

    /// Sort manually downloaded files back to their failed links
    SortManual(SortManualArgs),

    /// Download one link right away
    Direct(DirectArgs),

    /// Add links to the banned list
    Ban(LinkList),

    /// Remove links from the banned list
    Unban(LinkList),

    /// Print the banned list
    Banned,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ClassifierArgs {
    /// Target-service domain (repeatable; replaces the built-in list)
    #[arg(long = "target-domain", value_name = "DOMAIN")]
    pub target_domains: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// HTML chat export files, processed in the order given
    #[arg(required = true, value_name = "FILE")]
    pub documents: Vec<PathBuf>,

    /// Print the full report (jobs included) as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub classifier: ClassifierArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// Root of the sorted output tree
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Local download area
    #[arg(short, long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Number of leading links to handle by hand
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(0..=10_000))]
    pub manual_count: Option<u64>,

    /// Delay before each retry attempt in milliseconds (max 600000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=600_000))]
    pub retry_delay_ms: Option<u64>,

    /// Per-download timeout in seconds (1-86400)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub download_timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// HTML chat export files, processed in the order given
    #[arg(required = true, value_name = "FILE")]
    pub documents: Vec<PathBuf>,

    #[command(flatten)]
    pub options: RunOptions,

    #[command(flatten)]
    pub classifier: ClassifierArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SortManualArgs {
    /// Root of the sorted output tree
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Local download area to scan
    #[arg(short, long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DirectArgs {
    /// Link to download
    #[arg(value_name = "URL")]
    pub link: String,

    #[command(flatten)]
    pub options: RunOptions,

    #[command(flatten)]
    pub classifier: ClassifierArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LinkList {
    /// Links, exactly as they appear in the exports
    #[arg(required = true, value_name = "URL")]
    pub links: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_parses_documents_and_options() {
        let cli = Cli::try_parse_from([
            "vortexflow",
            "run",
            "a.html",
            "b.html",
            "-o",
            "/out",
            "--manual-count",
            "2",
            "--target-domain",
            "files.example",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.documents, [PathBuf::from("a.html"), PathBuf::from("b.html")]);
        assert_eq!(args.options.output_dir, Some(PathBuf::from("/out")));
        assert_eq!(args.options.manual_count, Some(2));
        assert_eq!(args.classifier.target_domains, ["files.example"]);
    }

    #[test]
    fn test_cli_verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["vortexflow", "banned", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["vortexflow", "-q", "discard"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_run_requires_documents() {
        let err = Cli::try_parse_from(["vortexflow", "run"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        let err = Cli::try_parse_from(["vortexflow", "resume", "--download-timeout-secs", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_ban_requires_links() {
        assert!(Cli::try_parse_from(["vortexflow", "ban"]).is_err());
        let cli = Cli::try_parse_from(["vortexflow", "ban", "https://x/1", "https://x/2"]).unwrap();
        let Command::Ban(list) = cli.command else {
            panic!("expected ban command");
        };
        assert_eq!(list.links.len(), 2);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["vortexflow"]).is_err());
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["vortexflow", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
