//! Per-run state shared by the decision engine and the executor

use crate::fetcher::{fetch_lineage, LineageMap, Quarantined, Side};
use netsync_domain::{LineageEntity, RecordId, RecordSummary, Registry};

/// Everything a run reads: both record sets and their lineage
///
/// Built once at the start of a run and read-only afterwards. Passing it
/// explicitly keeps separate runs isolated from one another.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Source records still eligible this run
    pub sources: Vec<RecordSummary>,

    /// Target candidates, in registry order
    pub candidates: Vec<RecordSummary>,

    /// Lineage roots of sources and candidates
    pub lineage: LineageMap,

    /// Records dropped because their lineage could not be read
    pub quarantined: Vec<Quarantined>,
}

impl RunContext {
    /// Assemble a context from records and lineage already at hand
    pub fn new(
        sources: Vec<RecordSummary>,
        candidates: Vec<RecordSummary>,
        lineage: LineageMap,
    ) -> Self {
        Self {
            sources,
            candidates,
            lineage,
            quarantined: Vec::new(),
        }
    }

    /// Fetch lineage for both record sets and quarantine unreadable records
    pub fn populate<S: Registry, T: Registry>(
        mut sources: Vec<RecordSummary>,
        mut candidates: Vec<RecordSummary>,
        source: &S,
        target: &T,
    ) -> Self {
        let mut lineage = LineageMap::new();
        let mut quarantined = fetch_lineage(source, Side::Source, &mut sources, &mut lineage);
        quarantined.extend(fetch_lineage(
            target,
            Side::Target,
            &mut candidates,
            &mut lineage,
        ));

        Self {
            sources,
            candidates,
            lineage,
            quarantined,
        }
    }

    /// Lineage root of a record, if one was recorded
    pub fn lineage_of(&self, id: &RecordId) -> Option<&LineageEntity> {
        self.lineage.get(id)
    }
}
