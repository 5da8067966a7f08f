//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sync engine error
    #[error("Sync error: {0}")]
    Sync(#[from] netsync_engine::SyncError),

    /// Registry client error
    #[error("Registry error: {0}")]
    Client(#[from] netsync_client::ClientError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The run finished but some records were not synchronized
    #[error("Sync incomplete: {0} record(s) failed or were quarantined")]
    Incomplete(usize),
}
