//! Configuration for synchronization runs
//!
//! Selects the operating mode and the policies that apply to stale or
//! write-protected copies.

use serde::{Deserialize, Serialize};

/// Largest candidate set fetched from the target registry
pub const MAX_CANDIDATES: usize = 100;

/// Operating mode of a run, derived from [`SyncConfig::update_target_network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Create copies that are missing; never touch existing ones
    CreateOnly,
    /// Refresh stale direct copies in place, create missing ones
    Update,
}

/// What Create-only mode does with a direct copy that is out of date
///
/// `Duplicate` reproduces the long-standing behavior: the stale copy is left
/// alone and a second, fresh copy is created next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaleCopyPolicy {
    /// Create another copy and leave the stale one in place
    #[default]
    Duplicate,
    /// Refresh the stale copy as Update mode would
    Refresh,
}

/// Where the retrieved-from locator is read from in a lineage entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AncestryLookup {
    /// Fixed property position (index 2)
    #[default]
    Positional,
    /// Property named `pav:retrievedFrom`
    Keyed,
}

/// Configuration for a synchronization run
///
/// # Examples
///
/// ```
/// use netsync_engine::{SyncConfig, SyncMode};
///
/// let config = SyncConfig::default();
/// assert_eq!(config.mode(), SyncMode::CreateOnly);
///
/// let config = SyncConfig::update_mode();
/// assert_eq!(config.mode(), SyncMode::Update);
/// assert!(!config.update_read_only_network);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Refresh stale copies in place instead of only creating missing ones
    /// Default: false (Create-only mode)
    #[serde(default)]
    pub update_target_network: bool,

    /// Allow unlocking, refreshing and relocking read-only copies, in
    /// Update mode or under the refresh stale-copy policy
    /// Default: false
    #[serde(default)]
    pub update_read_only_network: bool,

    /// Create-only handling of stale direct copies
    /// Default: duplicate
    #[serde(default)]
    pub stale_copy_policy: StaleCopyPolicy,

    /// Ancestry extraction strategy
    /// Default: positional
    #[serde(default)]
    pub ancestry_lookup: AncestryLookup,

    /// Number of target candidates to consider (at most 100)
    /// Default: 100
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Compute and report decisions without writing to the target
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

fn default_candidate_limit() -> usize {
    MAX_CANDIDATES
}

impl Default for SyncConfig {
    /// Create-only mode, positional ancestry, full candidate set
    fn default() -> Self {
        Self {
            update_target_network: false,
            update_read_only_network: false,
            stale_copy_policy: StaleCopyPolicy::Duplicate,
            ancestry_lookup: AncestryLookup::Positional,
            candidate_limit: MAX_CANDIDATES,
            dry_run: false,
        }
    }
}

impl SyncConfig {
    /// Update mode, leaving read-only copies untouched
    pub fn update_mode() -> Self {
        Self {
            update_target_network: true,
            ..Self::default()
        }
    }

    /// Operating mode selected by this configuration
    pub fn mode(&self) -> SyncMode {
        if self.update_target_network {
            SyncMode::Update
        } else {
            SyncMode::CreateOnly
        }
    }

    /// Candidate limit clamped to [`MAX_CANDIDATES`]
    pub fn effective_candidate_limit(&self) -> usize {
        self.candidate_limit.min(MAX_CANDIDATES)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.candidate_limit == 0 {
            return Err("candidate_limit must be greater than 0".to_string());
        }
        // Create-only mode only refreshes copies under the refresh policy
        if self.update_read_only_network
            && !self.update_target_network
            && self.stale_copy_policy == StaleCopyPolicy::Duplicate
        {
            return Err(
                "update_read_only_network requires update_target_network or stale_copy_policy = \"refresh\""
                    .to_string(),
            );
        }
        Ok(())
    }
}
