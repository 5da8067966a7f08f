//! Provenance fetching
//!
//! Bulk-retrieves lineage roots for a set of records and quarantines the
//! records whose lineage could not be read. A failed read means the record
//! cannot be synchronized this run; it is never treated as a root.

use netsync_domain::{LineageEntity, RecordId, RecordSummary, Registry};
use std::collections::HashMap;
use std::fmt;

/// Lineage root of every record in a run, keyed by record id
pub type LineageMap = HashMap<RecordId, LineageEntity>;

/// Which registry a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The registry copies are made from
    Source,
    /// The registry copies are made to
    Target,
}

impl Side {
    /// Lowercase name for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record excluded from the run because its lineage could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarantined {
    /// Registry the record belongs to
    pub side: Side,
    /// Excluded record
    pub id: RecordId,
    /// Registry error message
    pub message: String,
}

/// Fetch lineage for `records` into `lineage`, removing quarantined records
///
/// Records for which the registry reports no lineage stay in the run with no
/// map entry. Records whose lineage read fails are removed from `records`
/// and returned.
pub fn fetch_lineage<R: Registry>(
    registry: &R,
    side: Side,
    records: &mut Vec<RecordSummary>,
    lineage: &mut LineageMap,
) -> Vec<Quarantined> {
    tracing::info!(
        "Getting provenance history for {} {} networks",
        records.len(),
        side
    );

    let mut quarantined = Vec::new();

    for record in records.iter() {
        match registry.get_provenance(&record.id) {
            Ok(Some(root)) => {
                tracing::debug!("Storing provenance for {} network {}", side, record.id);
                lineage.insert(record.id.clone(), root);
            }
            Ok(None) => {
                tracing::debug!("No provenance recorded for {} network {}", side, record.id);
            }
            Err(e) => {
                tracing::warn!(
                    "Unable to read provenance of {} network {}; excluding it from this run: {}",
                    side,
                    record.id,
                    e
                );
                quarantined.push(Quarantined {
                    side,
                    id: record.id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if !quarantined.is_empty() {
        records.retain(|record| !quarantined.iter().any(|q| q.id == record.id));
    }

    quarantined
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsync_domain::{Permission, RecordContent, Timestamp};
    use std::collections::HashSet;

    // Mock registry serving canned lineage and failing for chosen ids
    struct MockRegistry {
        lineage: HashMap<RecordId, LineageEntity>,
        failing: HashSet<RecordId>,
    }

    impl MockRegistry {
        fn new() -> Self {
            Self {
                lineage: HashMap::new(),
                failing: HashSet::new(),
            }
        }
    }

    impl Registry for MockRegistry {
        type Error = String;

        fn base_uri(&self) -> String {
            "http://mock.org".to_string()
        }

        fn list_candidates(&self, _: &str, _: Permission, _: usize, _: usize) -> Result<Vec<RecordSummary>, String> {
            Ok(Vec::new())
        }

        fn search_records(&self, _: &str, _: Option<&str>, _: usize) -> Result<Vec<RecordSummary>, String> {
            Ok(Vec::new())
        }

        fn get_summary(&self, id: &RecordId) -> Result<RecordSummary, String> {
            Err(format!("no summary for {}", id))
        }

        fn get_provenance(&self, id: &RecordId) -> Result<Option<LineageEntity>, String> {
            if self.failing.contains(id) {
                return Err(format!("provenance unavailable for {}", id));
            }
            Ok(self.lineage.get(id).cloned())
        }

        fn set_provenance(&self, _: &RecordId, _: &LineageEntity) -> Result<(), String> {
            Ok(())
        }

        fn get_content(&self, _: &RecordId) -> Result<RecordContent, String> {
            Ok(RecordContent::new(Vec::new()))
        }

        fn create_content(&self, _: RecordContent) -> Result<RecordSummary, String> {
            Err("read-only mock".to_string())
        }

        fn update_content(&self, _: RecordContent) -> Result<RecordSummary, String> {
            Err("read-only mock".to_string())
        }

        fn set_read_only(&self, _: &RecordId, _: bool) -> Result<(), String> {
            Ok(())
        }
    }

    fn record(id: &str) -> RecordSummary {
        RecordSummary::new(id, Timestamp::from_millis(1))
    }

    #[test]
    fn test_lineage_stored_by_id() {
        let mut registry = MockRegistry::new();
        registry
            .lineage
            .insert(RecordId::new("a"), LineageEntity::root(Some("uri-a".to_string())));

        let mut records = vec![record("a"), record("b")];
        let mut lineage = LineageMap::new();
        let quarantined = fetch_lineage(&registry, Side::Source, &mut records, &mut lineage);

        assert!(quarantined.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(lineage.len(), 1);
        assert!(lineage.contains_key(&RecordId::new("a")));
        // No lineage recorded is not a failure
        assert!(!lineage.contains_key(&RecordId::new("b")));
    }

    #[test]
    fn test_failed_read_quarantines_record() {
        let mut registry = MockRegistry::new();
        registry.failing.insert(RecordId::new("s3"));

        let mut records = vec![record("s1"), record("s3"), record("s4")];
        let mut lineage = LineageMap::new();
        let quarantined = fetch_lineage(&registry, Side::Source, &mut records, &mut lineage);

        assert_eq!(quarantined.len(), 1);
        assert_eq!(quarantined[0].id, RecordId::new("s3"));
        assert_eq!(quarantined[0].side, Side::Source);
        assert!(quarantined[0].message.contains("provenance unavailable"));

        let remaining: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(remaining, vec!["s1", "s4"]);
        assert!(!lineage.contains_key(&RecordId::new("s3")));
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Source.to_string(), "source");
        assert_eq!(Side::Target.to_string(), "target");
    }
}
