//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::commands::{connect, run::check_complete};
use crate::config::PlanFile;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use netsync_engine::{SyncEngine, SyncWorker};
use std::time::Duration;

/// Execute the watch command.
///
/// Registry calls block, so runs happen on the blocking pool of a runtime
/// owned by this command.
pub fn execute_watch(args: WatchArgs, plan: &PlanFile, formatter: &Formatter) -> Result<()> {
    let interval = match args.interval {
        Some(0) => {
            return Err(CliError::Config(
                "--interval must be greater than 0".to_string(),
            ))
        }
        Some(minutes) => Duration::from_secs(minutes * 60),
        None => plan.watch.interval(),
    };

    let engine = SyncEngine::new(plan.sync.clone())?;
    let conn = connect(plan)?;
    let mut worker = SyncWorker::new(
        engine,
        conn.finder,
        conn.source,
        conn.target,
        plan.target.username.clone(),
        interval,
    )?;

    println!(
        "{}",
        formatter.info(&format!(
            "Synchronizing every {} minute(s); press Ctrl+C to stop",
            interval.as_secs() / 60
        ))
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match args.cycles {
            Some(cycles) => worker.run_cycles(cycles).await,
            None => worker.run().await,
        }
    })?;

    let report = worker.report();
    println!("{}", formatter.format_report(report)?);
    check_complete(report)
}
