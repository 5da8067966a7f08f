//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the synchronization engine and
//! infrastructure. Implementations live in other crates (netsync-client).

use crate::{LineageEntity, Permission, RecordContent, RecordId, RecordSummary};

/// A registry holding records, their content and their lineage
///
/// Every call is a blocking round trip. Implementations take `&self` so that
/// one registry handle can be shared by the fetcher, the decision engine and
/// the executor within a run.
pub trait Registry {
    /// Error type for registry operations
    type Error: std::fmt::Display;

    /// Base locator of the registry (e.g., "https://www.ndexbio.org/v2")
    fn base_uri(&self) -> String;

    /// List records owned by `owner` on which the caller holds `permission`
    fn list_candidates(
        &self,
        owner: &str,
        permission: Permission,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RecordSummary>, Self::Error>;

    /// Free-text search, optionally restricted to one owner
    fn search_records(
        &self,
        query: &str,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RecordSummary>, Self::Error>;

    /// Fetch a single record summary
    fn get_summary(&self, id: &RecordId) -> Result<RecordSummary, Self::Error>;

    /// Fetch the lineage root of a record; `Ok(None)` when none is recorded
    fn get_provenance(&self, id: &RecordId) -> Result<Option<LineageEntity>, Self::Error>;

    /// Replace the lineage of a record
    fn set_provenance(&self, id: &RecordId, lineage: &LineageEntity) -> Result<(), Self::Error>;

    /// Fetch the full content of a record
    fn get_content(&self, id: &RecordId) -> Result<RecordContent, Self::Error>;

    /// Store content as a new record; the registry assigns the identifier
    fn create_content(&self, content: RecordContent) -> Result<RecordSummary, Self::Error>;

    /// Overwrite the record named by `content.target_id`
    fn update_content(&self, content: RecordContent) -> Result<RecordSummary, Self::Error>;

    /// Set or clear the read-only flag of a record
    fn set_read_only(&self, id: &RecordId, read_only: bool) -> Result<(), Self::Error>;
}

/// Strategy that selects the source records of a run
pub trait SourceFinder {
    /// Error type for discovery
    type Error;

    /// Enumerate the source records to synchronize
    fn find_source_networks(&self) -> Result<Vec<RecordSummary>, Self::Error>;
}
