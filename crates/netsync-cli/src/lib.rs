//! Netsync CLI library.
//!
//! Plan file handling, command execution and output formatting for the
//! `netsync` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::PlanFile;
pub use error::{CliError, Result};
pub use output::Formatter;
