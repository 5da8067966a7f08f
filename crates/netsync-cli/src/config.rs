//! Plan file management for the CLI.
//!
//! A plan file names the two servers, which source networks to select and
//! how to synchronize them.

use crate::error::{CliError, Result};
use netsync_client::NdexRegistry;
use netsync_engine::selection::SourceSelection;
use netsync_engine::SyncConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Synchronization plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    /// Server networks are copied from
    pub source: ServerProfile,

    /// Server networks are copied to; its account owns the copies
    pub target: ServerProfile,

    /// Source networks to synchronize
    pub selection: SourceSelection,

    /// Engine settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Periodic run settings
    #[serde(default)]
    pub watch: WatchSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Connection details of one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// API base URL (e.g., "https://www.ndexbio.org/v2")
    pub url: String,

    /// Account name
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,

    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Settings for the watch command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Minutes between runs
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl PlanFile {
    /// Default plan file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".netsync").join("plan.toml"))
    }

    /// Resolve an explicit path or fall back to the default.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Load and validate a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "Plan file {} not found; run 'netsync init' to create one",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let plan: PlanFile = toml::from_str(&contents)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Save the plan file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize plan: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check settings that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        self.sync.validate().map_err(CliError::Config)?;

        for (side, profile) in [("source", &self.source), ("target", &self.target)] {
            if profile.url.trim().is_empty() {
                return Err(CliError::Config(format!("{} url must not be empty", side)));
            }
        }
        if self.target.username.trim().is_empty() {
            return Err(CliError::Config(
                "target username must not be empty; it owns the copies".into(),
            ));
        }
        if let SourceSelection::Ids { ids } = &self.selection {
            if ids.is_empty() {
                return Err(CliError::Config("selection lists no ids".into()));
            }
        }
        if self.watch.interval_minutes == 0 {
            return Err(CliError::Config("watch interval_minutes must be greater than 0".into()));
        }
        Ok(())
    }

    /// Template written by `netsync init`.
    pub fn template() -> Self {
        Self {
            source: ServerProfile {
                url: "https://www.ndexbio.org/v2".to_string(),
                username: "source-account".to_string(),
                password: String::new(),
                timeout_secs: None,
            },
            target: ServerProfile {
                url: "https://test.ndexbio.org/v2".to_string(),
                username: "target-account".to_string(),
                password: String::new(),
                timeout_secs: None,
            },
            selection: SourceSelection::Query {
                query: String::new(),
                owner: Some("source-account".to_string()),
                limit: netsync_engine::selection::DEFAULT_QUERY_LIMIT,
            },
            sync: SyncConfig::default(),
            watch: WatchSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl ServerProfile {
    /// Open a registry client for this server.
    pub fn connect(&self) -> Result<NdexRegistry> {
        let registry = match self.timeout_secs {
            Some(secs) => NdexRegistry::with_timeout(
                &self.url,
                &self.username,
                &self.password,
                Duration::from_secs(secs),
            )?,
            None => NdexRegistry::new(&self.url, &self.username, &self.password)?,
        };
        Ok(registry)
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

impl WatchSettings {
    /// Interval between runs.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_interval_minutes() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
