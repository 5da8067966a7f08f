//! Record module - registry-side metadata for a network

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque record identifier, stable across registries
///
/// Registries hand out UUID strings, but nothing in the engine relies on
/// that shape: identifiers are compared as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a raw identifier string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Point in time, in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Build a timestamp from epoch milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Epoch milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Access level requested when listing records on a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// May read the record
    Read,
    /// May modify the record
    Write,
    /// Full control, including provenance and flags
    Admin,
}

impl Permission {
    /// Wire name of the permission
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "READ",
            Permission::Write => "WRITE",
            Permission::Admin => "ADMIN",
        }
    }
}

/// Metadata snapshot of a record, as reported by its registry
///
/// The engine only ever holds these as read-only snapshots for the
/// duration of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    /// Registry identifier
    pub id: RecordId,

    /// Display name
    pub name: Option<String>,

    /// Free-text description
    pub description: Option<String>,

    /// Last content change
    pub modification_time: Timestamp,

    /// Canonical locator of the record
    pub uri: Option<String>,

    /// Whether the record is currently write-protected
    pub read_only: bool,
}

impl RecordSummary {
    /// Create a writable summary with no name, description or locator
    pub fn new(id: impl Into<RecordId>, modification_time: Timestamp) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            modification_time,
            uri: None,
            read_only: false,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the canonical locator
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Mark the record as write-protected
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Name for log lines, falling back to the identifier
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Full content of a record, opaque to the engine
///
/// Content is moved verbatim from the source registry to the target. The
/// only thing the engine ever changes is the identifier the content should
/// be stored under, for in-place updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContent {
    /// Identifier the registry should store this content under, if any
    pub target_id: Option<RecordId>,

    /// Serialized payload
    pub payload: Vec<u8>,
}

impl RecordContent {
    /// Wrap a payload with no identifier override
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            target_id: None,
            payload,
        }
    }

    /// Redirect this content onto an existing record
    pub fn with_target(mut self, id: RecordId) -> Self {
        self.target_id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display() {
        let id = RecordId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(RecordId::from("abc-123"), id);
    }

    #[test]
    fn test_timestamp_ordering() {
        let early = Timestamp::from_millis(10);
        let late = Timestamp::from_millis(20);
        assert!(early < late);
        assert_eq!(early.max(late), late);
        assert_eq!(early.min(late), early);
    }

    #[test]
    fn test_timestamp_now_is_recent() {
        // 2020-01-01 in milliseconds
        assert!(Timestamp::now().as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_summary_builders() {
        let summary = RecordSummary::new("n1", Timestamp::from_millis(5))
            .with_name("Pathway")
            .with_uri("http://example.org/network/n1")
            .read_only();

        assert_eq!(summary.label(), "Pathway");
        assert!(summary.read_only);
        assert_eq!(summary.uri.as_deref(), Some("http://example.org/network/n1"));
        assert_eq!(RecordSummary::new("n2", Timestamp::default()).label(), "n2");
    }

    #[test]
    fn test_content_with_target() {
        let content = RecordContent::new(b"{}".to_vec()).with_target(RecordId::new("t1"));
        assert_eq!(content.target_id, Some(RecordId::new("t1")));
        assert_eq!(content.payload, b"{}");
    }
}
