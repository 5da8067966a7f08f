//! In-memory registry
//!
//! Deterministic stand-in for a registry server, used by tests and for
//! rehearsing a plan without a network. Records keep insertion order, which
//! is the order candidates are listed in.

use crate::ClientError;
use netsync_domain::{
    LineageEntity, Permission, RecordContent, RecordId, RecordSummary, Registry, Timestamp,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry operation, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_candidates`
    ListCandidates,
    /// `search_records`
    Search,
    /// `get_summary`
    GetSummary,
    /// `get_provenance`
    GetProvenance,
    /// `set_provenance`
    SetProvenance,
    /// `get_content`
    GetContent,
    /// `create_content`
    CreateContent,
    /// `update_content`
    UpdateContent,
    /// `set_read_only`
    SetReadOnly,
}

/// A write accepted by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// New record created
    Created(RecordId),
    /// Record content overwritten
    Updated(RecordId),
    /// Lineage replaced
    ProvenanceSet(RecordId),
    /// Read-only flag changed
    ReadOnlySet(RecordId, bool),
}

#[derive(Debug, Clone)]
struct StoredRecord {
    summary: RecordSummary,
    owner: String,
    lineage: Option<LineageEntity>,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<StoredRecord>,
    failures: Vec<(Operation, Option<RecordId>)>,
    writes: Vec<WriteOp>,
}

impl State {
    fn record(&self, id: &RecordId) -> Result<&StoredRecord, ClientError> {
        self.records
            .iter()
            .find(|r| &r.summary.id == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    fn record_mut(&mut self, id: &RecordId) -> Result<&mut StoredRecord, ClientError> {
        self.records
            .iter_mut()
            .find(|r| &r.summary.id == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    fn check(&self, operation: Operation, id: Option<&RecordId>) -> Result<(), ClientError> {
        let injected = self.failures.iter().any(|(op, target)| {
            *op == operation && (target.is_none() || target.as_ref() == id)
        });
        if injected {
            return Err(ClientError::Communication(match id {
                Some(id) => format!("injected {:?} failure for {}", operation, id),
                None => format!("injected {:?} failure", operation),
            }));
        }
        Ok(())
    }
}

/// Registry held entirely in memory
///
/// Clones share the same records.
///
/// # Examples
///
/// ```
/// use netsync_client::MemoryRegistry;
/// use netsync_domain::{RecordSummary, Registry, Timestamp};
///
/// let registry = MemoryRegistry::new("http://registry.example.org");
/// let stored = registry.insert(RecordSummary::new("n1", Timestamp::from_millis(5)), None);
///
/// assert_eq!(stored.uri.as_deref(), Some("http://registry.example.org/network/n1"));
/// assert_eq!(registry.get_summary(&stored.id).unwrap(), stored);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    base_uri: String,
    account: String,
    state: Arc<Mutex<State>>,
}

impl MemoryRegistry {
    /// Create an empty registry answering at `base_uri`
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            account: "netsync".to_string(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Own inserted and created records as `account`
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn locator(&self, id: &RecordId) -> String {
        format!("{}/network/{}", self.base_uri, id)
    }

    /// Store a record owned by this registry's account
    ///
    /// A missing locator is filled in from the base URI. Returns the summary
    /// as stored.
    pub fn insert(&self, summary: RecordSummary, lineage: Option<LineageEntity>) -> RecordSummary {
        let account = self.account.clone();
        self.insert_owned(&account, summary, lineage)
    }

    /// Store a record owned by `owner`
    pub fn insert_owned(
        &self,
        owner: &str,
        mut summary: RecordSummary,
        lineage: Option<LineageEntity>,
    ) -> RecordSummary {
        if summary.uri.is_none() {
            summary.uri = Some(self.locator(&summary.id));
        }
        let payload = format!("network:{}", summary.id).into_bytes();

        let mut state = self.state();
        state.records.retain(|r| r.summary.id != summary.id);
        state.records.push(StoredRecord {
            summary: summary.clone(),
            owner: owner.to_string(),
            lineage,
            payload,
        });
        summary
    }

    /// Change a record's modification time, as an edit on the server would
    pub fn touch(&self, id: &RecordId, modification_time: Timestamp) -> Result<(), ClientError> {
        self.state().record_mut(id)?.summary.modification_time = modification_time;
        Ok(())
    }

    /// Make `operation` fail, for one record or for all of them
    pub fn fail_on(&self, operation: Operation, id: Option<RecordId>) {
        self.state().failures.push((operation, id));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Writes accepted so far, oldest first
    pub fn writes(&self) -> Vec<WriteOp> {
        self.state().writes.clone()
    }

    /// Stored lineage of a record
    pub fn lineage(&self, id: &RecordId) -> Option<LineageEntity> {
        self.state().record(id).ok().and_then(|r| r.lineage.clone())
    }

    /// Stored payload of a record
    pub fn payload(&self, id: &RecordId) -> Option<Vec<u8>> {
        self.state().record(id).ok().map(|r| r.payload.clone())
    }

    /// Summaries of all records, in insertion order
    pub fn summaries(&self) -> Vec<RecordSummary> {
        self.state().records.iter().map(|r| r.summary.clone()).collect()
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    /// Whether the registry holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Registry for MemoryRegistry {
    type Error = ClientError;

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn list_candidates(
        &self,
        owner: &str,
        _permission: Permission,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RecordSummary>, ClientError> {
        let state = self.state();
        state.check(Operation::ListCandidates, None)?;

        Ok(state
            .records
            .iter()
            .filter(|r| r.owner == owner)
            .skip(offset)
            .take(limit)
            .map(|r| r.summary.clone())
            .collect())
    }

    fn search_records(
        &self,
        query: &str,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RecordSummary>, ClientError> {
        let state = self.state();
        state.check(Operation::Search, None)?;

        let needle = query.trim().to_lowercase();
        let matches = |summary: &RecordSummary| {
            needle.is_empty()
                || summary.id.as_str().to_lowercase().contains(&needle)
                || [&summary.name, &summary.description]
                    .into_iter()
                    .flatten()
                    .any(|text| text.to_lowercase().contains(&needle))
        };

        Ok(state
            .records
            .iter()
            .filter(|r| owner.is_none_or(|owner| r.owner == owner))
            .filter(|r| matches(&r.summary))
            .take(limit)
            .map(|r| r.summary.clone())
            .collect())
    }

    fn get_summary(&self, id: &RecordId) -> Result<RecordSummary, ClientError> {
        let state = self.state();
        state.check(Operation::GetSummary, Some(id))?;
        Ok(state.record(id)?.summary.clone())
    }

    fn get_provenance(&self, id: &RecordId) -> Result<Option<LineageEntity>, ClientError> {
        let state = self.state();
        state.check(Operation::GetProvenance, Some(id))?;
        Ok(state.record(id)?.lineage.clone())
    }

    fn set_provenance(&self, id: &RecordId, lineage: &LineageEntity) -> Result<(), ClientError> {
        let mut state = self.state();
        state.check(Operation::SetProvenance, Some(id))?;
        state.record_mut(id)?.lineage = Some(lineage.clone());
        state.writes.push(WriteOp::ProvenanceSet(id.clone()));
        Ok(())
    }

    fn get_content(&self, id: &RecordId) -> Result<RecordContent, ClientError> {
        let state = self.state();
        state.check(Operation::GetContent, Some(id))?;
        Ok(RecordContent::new(state.record(id)?.payload.clone()))
    }

    fn create_content(&self, content: RecordContent) -> Result<RecordSummary, ClientError> {
        let mut state = self.state();
        state.check(Operation::CreateContent, None)?;

        let id = RecordId::new(uuid::Uuid::now_v7().to_string());
        let summary = RecordSummary::new(id.clone(), Timestamp::now()).with_uri(self.locator(&id));
        state.records.push(StoredRecord {
            summary: summary.clone(),
            owner: self.account.clone(),
            lineage: None,
            payload: content.payload,
        });
        state.writes.push(WriteOp::Created(id));
        Ok(summary)
    }

    fn update_content(&self, content: RecordContent) -> Result<RecordSummary, ClientError> {
        let id = content
            .target_id
            .ok_or_else(|| ClientError::Other("update requires a target id".to_string()))?;

        let mut state = self.state();
        state.check(Operation::UpdateContent, Some(&id))?;

        let record = state.record_mut(&id)?;
        if record.summary.read_only {
            return Err(ClientError::Rejected {
                status: 403,
                message: format!("network {} is read-only", id),
            });
        }
        record.payload = content.payload;
        record.summary.modification_time = Timestamp::now();
        let summary = record.summary.clone();

        state.writes.push(WriteOp::Updated(id));
        Ok(summary)
    }

    fn set_read_only(&self, id: &RecordId, read_only: bool) -> Result<(), ClientError> {
        let mut state = self.state();
        state.check(Operation::SetReadOnly, Some(id))?;
        state.record_mut(id)?.summary.read_only = read_only;
        state.writes.push(WriteOp::ReadOnlySet(id.clone(), read_only));
        Ok(())
    }
}
