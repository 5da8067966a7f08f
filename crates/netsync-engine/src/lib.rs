//! Netsync Engine
//!
//! Provenance-based synchronization of networks from a source registry to a
//! target registry.
//!
//! # Overview
//!
//! A run decides, for every selected source record, whether the target
//! registry already holds a faithful copy of it. Copies are recognized only
//! through lineage: a target record is a copy of a source when its most recent
//! lineage event is a `Copy` whose retrieved-from locator names that source.
//!
//! The engine is responsible for:
//! - **Provenance fetching**: bulk-reading lineage and quarantining records
//!   whose lineage cannot be read
//! - **Chain walking**: classifying each target candidate as a direct copy, a
//!   modified copy or unrelated
//! - **Decisions**: choosing Create, Update, UpdateReadOnly or Skip per source
//! - **Execution**: performing the writes with a recorded outcome per step
//!
//! # Modes
//!
//! | Mode | Current copy | Stale copy | Modified copy | No copy |
//! |------|--------------|------------|---------------|---------|
//! | **Create-only** | Skip | Create (or refresh, per `stale_copy_policy`) | Create | Create |
//! | **Update** | Skip | Update / UpdateReadOnly / Skip if protected | Skip | Create |
//!
//! # Usage
//!
//! ```
//! use netsync_client::MemoryRegistry;
//! use netsync_domain::{RecordSummary, Timestamp};
//! use netsync_engine::selection::SourceSelection;
//! use netsync_engine::{SyncConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(MemoryRegistry::new("http://source.org"));
//! let target = MemoryRegistry::new("http://target.org").with_account("curator");
//! source.insert(RecordSummary::new("s1", Timestamp::from_millis(10)), None);
//!
//! let selection = SourceSelection::Ids { ids: vec!["s1".to_string()] };
//! let finder = selection.finder(source.clone());
//!
//! let engine = SyncEngine::new(SyncConfig::default())?;
//! let report = engine.run(&finder, source.as_ref(), &target, "curator")?;
//!
//! assert_eq!(report.created, 1);
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! update_target_network = true
//! update_read_only_network = false
//! stale_copy_policy = "duplicate"
//! ancestry_lookup = "positional"
//! candidate_limit = 100
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod engine;
mod error;
mod report;
mod worker;

pub mod ancestry;
pub mod executor;
pub mod fetcher;
pub mod planner;
pub mod selection;
pub mod walker;

pub use config::{AncestryLookup, StaleCopyPolicy, SyncConfig, SyncMode, MAX_CANDIDATES};
pub use context::RunContext;
pub use engine::SyncEngine;
pub use error::SyncError;
pub use planner::{ActionKind, CreateReason, SkipReason, SyncAction, SyncDecision};
pub use report::{DecisionEntry, QuarantineEntry, SyncFailure, SyncReport};
pub use worker::SyncWorker;
