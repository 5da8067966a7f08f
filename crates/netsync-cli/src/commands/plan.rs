//! Plan command implementation.

use crate::commands::connect;
use crate::config::PlanFile;
use crate::error::Result;
use crate::output::Formatter;
use netsync_engine::SyncEngine;

/// Execute the plan command.
///
/// Runs the engine as a dry run, so decisions are reported but nothing is
/// written to the target.
pub fn execute_plan(plan: &PlanFile, formatter: &Formatter) -> Result<()> {
    let mut config = plan.sync.clone();
    config.dry_run = true;

    let engine = SyncEngine::new(config)?;
    let conn = connect(plan)?;
    let report = engine.run(
        &conn.finder,
        conn.source.as_ref(),
        conn.target.as_ref(),
        &plan.target.username,
    )?;

    println!("{}", formatter.format_report(&report)?);
    Ok(())
}
