//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Netsync - Synchronize networks between registries using their provenance.
#[derive(Debug, Parser)]
#[command(name = "netsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Plan file path (default: ~/.netsync/plan.toml)
    #[arg(short, long, global = true, env = "NETSYNC_PLAN")]
    pub config: Option<PathBuf>,

    /// Log debug detail, including chain walks
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show what a run would do, without writing anything
    Plan,

    /// Synchronize once
    Run(RunArgs),

    /// Synchronize periodically until interrupted
    Watch(WatchArgs),

    /// Write a plan file template
    Init(InitArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Refresh stale copies in place (overrides the plan file)
    #[arg(long)]
    pub update: bool,

    /// Also refresh read-only copies (implies --update)
    #[arg(long)]
    pub update_read_only: bool,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Minutes between runs (overrides the plan file)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many runs instead of waiting for Ctrl+C
    #[arg(long)]
    pub cycles: Option<usize>,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Overwrite an existing plan file
    #[arg(long)]
    pub force: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
