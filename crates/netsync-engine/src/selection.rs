//! Source selection strategies
//!
//! A run starts from the set of source records it should synchronize. That
//! set is either the result of a text query or an explicit id list.

use crate::SyncError;
use netsync_domain::{RecordId, RecordSummary, Registry, SourceFinder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Default number of records a query selects
pub const DEFAULT_QUERY_LIMIT: usize = 100;

fn default_query_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

/// Which source records a run synchronizes
///
/// # Examples
///
/// ```
/// use netsync_engine::selection::SourceSelection;
///
/// let selection: SourceSelection = toml::from_str(r#"
///     kind = "query"
///     query = "signaling"
/// "#).unwrap();
///
/// assert_eq!(
///     selection,
///     SourceSelection::Query { query: "signaling".to_string(), owner: None, limit: 100 }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSelection {
    /// Records matching a text query
    Query {
        /// Search text; empty matches everything
        query: String,

        /// Only records owned by this account
        #[serde(default)]
        owner: Option<String>,

        /// Maximum number of records selected
        #[serde(default = "default_query_limit")]
        limit: usize,
    },

    /// Records named explicitly
    Ids {
        /// Record identifiers
        ids: Vec<String>,
    },
}

impl SourceSelection {
    /// Build the finder for this selection over `registry`
    pub fn finder<R: Registry>(&self, registry: Arc<R>) -> SelectionFinder<R> {
        match self {
            SourceSelection::Query {
                query,
                owner,
                limit,
            } => SelectionFinder::Query(QueryFinder::new(
                registry,
                query.clone(),
                owner.clone(),
                *limit,
            )),
            SourceSelection::Ids { ids } => SelectionFinder::Ids(IdListFinder::new(
                registry,
                ids.iter().map(RecordId::new).collect(),
            )),
        }
    }
}

/// Selects source records by text query
pub struct QueryFinder<R> {
    registry: Arc<R>,
    query: String,
    owner: Option<String>,
    limit: usize,
}

impl<R: Registry> QueryFinder<R> {
    /// Query `registry` for up to `limit` records
    pub fn new(registry: Arc<R>, query: String, owner: Option<String>, limit: usize) -> Self {
        Self {
            registry,
            query,
            owner,
            limit,
        }
    }
}

impl<R: Registry> SourceFinder for QueryFinder<R> {
    type Error = SyncError;

    fn find_source_networks(&self) -> Result<Vec<RecordSummary>, SyncError> {
        tracing::info!(
            "Searching source networks matching '{}' (owner: {:?}, limit: {})",
            self.query,
            self.owner,
            self.limit
        );

        self.registry
            .search_records(&self.query, self.owner.as_deref(), self.limit)
            .map_err(|e| SyncError::Selection(format!("search for '{}' failed: {}", self.query, e)))
    }
}

/// Selects source records by identifier
///
/// Duplicate ids are selected once. Ids whose summary cannot be read are
/// logged and left out.
pub struct IdListFinder<R> {
    registry: Arc<R>,
    ids: Vec<RecordId>,
}

impl<R: Registry> IdListFinder<R> {
    /// Select `ids` from `registry`
    pub fn new(registry: Arc<R>, ids: Vec<RecordId>) -> Self {
        Self { registry, ids }
    }
}

impl<R: Registry> SourceFinder for IdListFinder<R> {
    type Error = SyncError;

    fn find_source_networks(&self) -> Result<Vec<RecordSummary>, SyncError> {
        let mut seen = HashSet::new();
        let mut summaries = Vec::with_capacity(self.ids.len());

        for id in self.ids.iter().filter(|id| seen.insert(*id)) {
            match self.registry.get_summary(id) {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::warn!("Skipping source network {}: {}", id, e),
            }
        }

        Ok(summaries)
    }
}

/// Either selection strategy, chosen at runtime
pub enum SelectionFinder<R> {
    /// Text query
    Query(QueryFinder<R>),
    /// Explicit id list
    Ids(IdListFinder<R>),
}

impl<R: Registry> SourceFinder for SelectionFinder<R> {
    type Error = SyncError;

    fn find_source_networks(&self) -> Result<Vec<RecordSummary>, SyncError> {
        match self {
            SelectionFinder::Query(finder) => finder.find_source_networks(),
            SelectionFinder::Ids(finder) => finder.find_source_networks(),
        }
    }
}
