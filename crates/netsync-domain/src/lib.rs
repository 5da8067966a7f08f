//! Netsync Domain Layer
//!
//! This crate contains the passive data model shared by every other netsync
//! crate. It has ZERO external dependencies and performs no I/O: registries,
//! HTTP transport and the synchronization engine live elsewhere and depend on
//! the types and traits defined here.
//!
//! ## Key Concepts
//!
//! - **Record**: a network held by a registry, described by a [`RecordSummary`]
//! - **Lineage**: the provenance history of a record, a chain of
//!   [`LineageEntity`] nodes linked through the [`LineageEvent`] that produced them
//! - **Copy event**: the privileged [`EventKind::Copy`], written whenever a
//!   record is duplicated from another registry
//! - **Registry**: the trait seam through which records, content and lineage
//!   are read and written
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Immutable snapshots only; nothing here mutates a registry
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lineage;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use lineage::{EventKind, LineageEntity, LineageEvent, Origin, Property};
pub use record::{Permission, RecordContent, RecordId, RecordSummary, Timestamp};
pub use traits::{Registry, SourceFinder};
