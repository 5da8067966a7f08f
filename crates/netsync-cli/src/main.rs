//! Netsync CLI - Synchronize networks between registries using their provenance.

use clap::Parser;
use netsync_cli::commands;
use netsync_cli::config::OutputFormat;
use netsync_cli::{Cli, Command, Formatter, PlanFile};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> netsync_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = PlanFile::resolve_path(cli.config.as_deref())?;

    // Init runs before a plan exists
    if let Command::Init(args) = cli.command {
        let format = cli.format.map(Into::into).unwrap_or(OutputFormat::Table);
        let formatter = Formatter::new(format, !cli.no_color);
        return commands::execute_init(args, &path, &formatter);
    }

    let plan = PlanFile::load(&path)?;
    tracing::debug!("Loaded plan from {}", path.display());

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(plan.output.format);
    let color_enabled = !cli.no_color && plan.output.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Plan => commands::execute_plan(&plan, &formatter),
        Command::Run(args) => commands::execute_run(args, &plan, &formatter),
        Command::Watch(args) => commands::execute_watch(args, &plan, &formatter),
        Command::Init(_) => Ok(()),
    }
}

/// Log to stderr so reports on stdout stay machine readable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
