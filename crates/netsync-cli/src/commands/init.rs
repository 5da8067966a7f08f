//! Init command implementation.

use crate::cli::InitArgs;
use crate::config::PlanFile;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the init command.
pub fn execute_init(args: InitArgs, path: &Path, formatter: &Formatter) -> Result<()> {
    if path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        )));
    }

    PlanFile::template().save(path)?;
    println!(
        "{}",
        formatter.success(&format!("Plan template written to {}", path.display()))
    );
    Ok(())
}
