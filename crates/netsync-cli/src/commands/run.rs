//! Run command implementation.

use crate::cli::RunArgs;
use crate::commands::connect;
use crate::config::PlanFile;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use netsync_engine::{SyncConfig, SyncEngine, SyncReport};

/// Execute the run command.
pub fn execute_run(args: RunArgs, plan: &PlanFile, formatter: &Formatter) -> Result<()> {
    let config = apply_overrides(&args, plan.sync.clone());
    let engine = SyncEngine::new(config)?;
    let conn = connect(plan)?;

    let report = engine.run(
        &conn.finder,
        conn.source.as_ref(),
        conn.target.as_ref(),
        &plan.target.username,
    )?;

    println!("{}", formatter.format_report(&report)?);
    check_complete(&report)
}

/// Command line flags win over the plan file.
fn apply_overrides(args: &RunArgs, mut config: SyncConfig) -> SyncConfig {
    if args.update || args.update_read_only {
        config.update_target_network = true;
    }
    if args.update_read_only {
        config.update_read_only_network = true;
    }
    config
}

/// Turn a report with failures into a nonzero exit.
pub(crate) fn check_complete(report: &SyncReport) -> Result<()> {
    if report.has_failures() {
        return Err(CliError::Incomplete(
            report.failures.len() + report.quarantined.len(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsync_engine::{SyncFailure, SyncMode};

    #[test]
    fn test_no_overrides() {
        let args = RunArgs {
            update: false,
            update_read_only: false,
        };
        let config = apply_overrides(&args, SyncConfig::default());
        assert_eq!(config.mode(), SyncMode::CreateOnly);
    }

    #[test]
    fn test_update_read_only_implies_update() {
        let args = RunArgs {
            update: false,
            update_read_only: true,
        };
        let config = apply_overrides(&args, SyncConfig::default());
        assert_eq!(config.mode(), SyncMode::Update);
        assert!(config.update_read_only_network);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_plan_settings_kept() {
        let args = RunArgs {
            update: true,
            update_read_only: false,
        };
        let mut plan_config = SyncConfig::update_mode();
        plan_config.update_read_only_network = true;
        let config = apply_overrides(&args, plan_config);
        assert!(config.update_read_only_network);
    }

    #[test]
    fn test_check_complete() {
        let mut report = SyncReport::new(false);
        assert!(check_complete(&report).is_ok());

        report.failures.push(SyncFailure {
            record: "s1".to_string(),
            step: "fetch_content".to_string(),
            message: "HTTP 502".to_string(),
        });
        assert!(matches!(check_complete(&report), Err(CliError::Incomplete(1))));
    }
}
