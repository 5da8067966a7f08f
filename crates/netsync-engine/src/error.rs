//! Error types for synchronization runs

use thiserror::Error;

/// Errors that abort a synchronization run
///
/// Per-record failures never surface here; they are accumulated in the
/// [`SyncReport`](crate::SyncReport) instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Registry call failed during run setup
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source records could not be selected
    #[error("Source selection error: {0}")]
    Selection(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
