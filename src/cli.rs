//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "krazy2view",
    version,
    about = "Show krazy2 progress and results",
    long_about = "krazy2view — replay krazy2 status output as progress events and turn krazy2 XML reports into an issue table.\n\nConfiguration precedence: CLI > krazy2view.toml > defaults.",
    after_help = "Examples:\n  krazy2view progress --log krazy2.log --checkers 40\n  krazy2view analyze --report build/krazy2.xml --working-dir src\n  krazy2view analyze --progress-log krazy2.log --checkers 40 --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current krazy2view version."
    )]
    Version,
    /// Replay captured krazy2 status output
    #[command(
        about = "Replay progress output",
        long_about = "Feed a captured krazy2 status stream through the progress tracker chunk by chunk and print the resulting events.",
        after_help = "Examples:\n  krazy2view progress --log krazy2.log --checkers 40\n  krazy2view progress --log krazy2.log --checkers 40 --chunk-size 1 --output json"
    )]
    Progress {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Captured krazy2 status output (required)")]
        log: String,
        #[arg(long, help = "Number of checkers krazy2 runs")]
        checkers: Option<usize>,
        #[arg(long, help = "Bytes fed per chunk (default: 4096)")]
        chunk_size: Option<usize>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Build the issue table from krazy2 reports
    #[command(
        about = "Show analysis results",
        long_about = "Parse krazy2 XML reports into checkers and issues, optionally replaying the status output of the same run first. All reports of one invocation form a single result set.",
        after_help = "Examples:\n  krazy2view analyze --report 'build/*.xml'\n  krazy2view analyze --report krazy2.xml --progress-log krazy2.log --checkers 40"
    )]
    Analyze {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Directory krazy2 analyzed; relative report paths resolve against it")]
        working_dir: Option<String>,
        #[arg(long = "report", help = "Report file or glob pattern (repeatable)")]
        reports: Vec<String>,
        #[arg(long, help = "Captured krazy2 status output of the same run")]
        progress_log: Option<String>,
        #[arg(long, help = "Number of checkers krazy2 runs")]
        checkers: Option<usize>,
        #[arg(long, help = "Bytes fed per chunk (default: 4096)")]
        chunk_size: Option<usize>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
