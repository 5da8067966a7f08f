//! Sync executor
//!
//! Carries out the writes a decision calls for. Every registry call is a
//! separate step with its own recorded outcome, so partial failures stay
//! visible in the run report instead of aborting the run.

use crate::planner::{ActionKind, SyncAction, SyncDecision};
use netsync_domain::lineage::{DESCRIPTION_PROPERTY, RETRIEVED_FROM_PROPERTY, TITLE_PROPERTY};
use netsync_domain::{
    EventKind, LineageEntity, LineageEvent, RecordContent, RecordId, RecordSummary, Registry,
    Timestamp,
};
use std::fmt;

/// A single registry interaction performed by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Read the full source content
    FetchContent,
    /// Create or overwrite the target record
    WriteContent,
    /// Record copy lineage on the target record
    WriteLineage,
    /// Clear the target's read-only flag
    Unlock,
    /// Restore the target's read-only flag
    Relock,
}

impl Step {
    /// Name for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::FetchContent => "fetch_content",
            Step::WriteContent => "write_content",
            Step::WriteLineage => "write_lineage",
            Step::Unlock => "unlock",
            Step::Relock => "relock",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepOutcome {
    /// The step was never reached, or not needed for the action
    #[default]
    NotAttempted,
    /// The registry call succeeded
    Succeeded,
    /// The registry call failed with this message
    Failed(String),
}

impl StepOutcome {
    fn from_result<E: fmt::Display>(result: &Result<impl Sized, E>) -> Self {
        match result {
            Ok(_) => StepOutcome::Succeeded,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }

    /// Whether the step succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    /// Failure message, if the step failed
    pub fn failure(&self) -> Option<&str> {
        match self {
            StepOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Per-step record of one executed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Source record being copied
    pub source: RecordId,
    /// Action that was executed
    pub action: ActionKind,
    /// Target record written, once known
    pub target: Option<RecordId>,
    /// Reading the source content
    pub fetch_content: StepOutcome,
    /// Creating or overwriting the target
    pub write_content: StepOutcome,
    /// Writing the copy lineage
    pub write_lineage: StepOutcome,
    /// Clearing the read-only flag
    pub unlock: StepOutcome,
    /// Restoring the read-only flag
    pub relock: StepOutcome,
}

impl ExecutionRecord {
    fn new(source: RecordId, action: ActionKind, target: Option<RecordId>) -> Self {
        Self {
            source,
            action,
            target,
            fetch_content: StepOutcome::NotAttempted,
            write_content: StepOutcome::NotAttempted,
            write_lineage: StepOutcome::NotAttempted,
            unlock: StepOutcome::NotAttempted,
            relock: StepOutcome::NotAttempted,
        }
    }

    /// Outcome of each step, in execution order
    pub fn steps(&self) -> [(Step, &StepOutcome); 5] {
        [
            (Step::Unlock, &self.unlock),
            (Step::FetchContent, &self.fetch_content),
            (Step::WriteContent, &self.write_content),
            (Step::WriteLineage, &self.write_lineage),
            (Step::Relock, &self.relock),
        ]
    }

    /// Whether content and lineage both reached the target
    pub fn is_complete(&self) -> bool {
        self.write_content.is_success() && self.write_lineage.is_success()
    }

    /// Failed steps with their messages
    pub fn failures(&self) -> Vec<(Step, &str)> {
        self.steps()
            .into_iter()
            .filter_map(|(step, outcome)| outcome.failure().map(|message| (step, message)))
            .collect()
    }

    /// Whether a read-only target was unlocked and could not be locked again
    pub fn left_writable(&self) -> bool {
        self.unlock.is_success() && !self.relock.is_success()
    }
}

/// Executes decided actions against the source and target registries
pub struct SyncExecutor<'a, S: Registry, T: Registry> {
    source: &'a S,
    target: &'a T,
}

impl<'a, S: Registry, T: Registry> SyncExecutor<'a, S, T> {
    /// Create an executor copying from `source` to `target`
    pub fn new(source: &'a S, target: &'a T) -> Self {
        Self { source, target }
    }

    /// Execute a decision; Skip performs nothing and yields no record
    pub fn execute(
        &self,
        decision: &SyncDecision,
        summary: &RecordSummary,
        source_lineage: Option<&LineageEntity>,
    ) -> Option<ExecutionRecord> {
        match &decision.action {
            SyncAction::Create { .. } => Some(self.create(summary, source_lineage)),
            SyncAction::Update { target } => {
                Some(self.update(summary, source_lineage, target, ActionKind::Update))
            }
            SyncAction::UpdateReadOnly { target } => {
                Some(self.update_read_only(summary, source_lineage, target))
            }
            SyncAction::Skip { .. } => None,
        }
    }

    /// Copy the source as a new target record, then write its lineage
    pub fn create(
        &self,
        summary: &RecordSummary,
        source_lineage: Option<&LineageEntity>,
    ) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(summary.id.clone(), ActionKind::Create, None);

        let Some(content) = self.fetch_content(summary, &mut record) else {
            return record;
        };

        let created = self.target.create_content(content);
        record.write_content = StepOutcome::from_result(&created);
        let copied = match created {
            Ok(copied) => {
                tracing::info!("Copied {} to {}", summary.id, copied.id);
                copied
            }
            Err(e) => {
                tracing::error!("Error attempting to copy {}: {}", summary.id, e);
                return record;
            }
        };
        record.target = Some(copied.id.clone());

        self.write_lineage(summary, source_lineage, &copied, &mut record);
        record
    }

    /// Overwrite a writable target copy, then write fresh lineage
    pub fn update(
        &self,
        summary: &RecordSummary,
        source_lineage: Option<&LineageEntity>,
        target: &RecordId,
        action: ActionKind,
    ) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(summary.id.clone(), action, Some(target.clone()));
        self.overwrite(summary, source_lineage, target, &mut record);
        record
    }

    /// Unlock a read-only target, update it and lock it again
    ///
    /// An unlock failure is logged and the update still attempted; the
    /// registry decides whether it accepts the write. The relock runs
    /// whenever the unlock succeeded, whatever the update's outcome.
    pub fn update_read_only(
        &self,
        summary: &RecordSummary,
        source_lineage: Option<&LineageEntity>,
        target: &RecordId,
    ) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(
            summary.id.clone(),
            ActionKind::UpdateReadOnly,
            Some(target.clone()),
        );

        let unlocked = self.target.set_read_only(target, false);
        record.unlock = StepOutcome::from_result(&unlocked);
        if let Err(e) = &unlocked {
            tracing::error!("Unable to clear read-only flag on {}: {}", target, e);
        }

        self.overwrite(summary, source_lineage, target, &mut record);

        if record.unlock.is_success() {
            let relocked = self.target.set_read_only(target, true);
            record.relock = StepOutcome::from_result(&relocked);
            if let Err(e) = relocked {
                tracing::warn!(
                    "Unable to restore read-only flag on {}; it is left writable: {}",
                    target,
                    e
                );
            }
        }

        record
    }

    fn overwrite(
        &self,
        summary: &RecordSummary,
        source_lineage: Option<&LineageEntity>,
        target: &RecordId,
        record: &mut ExecutionRecord,
    ) {
        let Some(content) = self.fetch_content(summary, record) else {
            return;
        };

        let updated = self.target.update_content(content.with_target(target.clone()));
        record.write_content = StepOutcome::from_result(&updated);
        match updated {
            Ok(copied) => {
                tracing::info!("Updated {} from {}", copied.id, summary.id);
                self.write_lineage(summary, source_lineage, &copied, record);
            }
            Err(e) => {
                tracing::error!("Error attempting to update {} from {}: {}", target, summary.id, e);
            }
        }
    }

    fn fetch_content(
        &self,
        summary: &RecordSummary,
        record: &mut ExecutionRecord,
    ) -> Option<RecordContent> {
        let fetched = self.source.get_content(&summary.id);
        record.fetch_content = StepOutcome::from_result(&fetched);
        match fetched {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::error!("Unable to fetch content of source {}: {}", summary.id, e);
                None
            }
        }
    }

    fn write_lineage(
        &self,
        summary: &RecordSummary,
        source_lineage: Option<&LineageEntity>,
        copied: &RecordSummary,
        record: &mut ExecutionRecord,
    ) {
        let lineage = build_copy_lineage(
            source_lineage,
            summary,
            copied,
            &self.source.base_uri(),
            Timestamp::now(),
        );

        let written = self.target.set_provenance(&copied.id, &lineage);
        record.write_lineage = StepOutcome::from_result(&written);
        match written {
            Ok(()) => tracing::info!("Set provenance for copy {}", copied.id),
            Err(e) => tracing::error!("Unable to set provenance for copy {}: {}", copied.id, e),
        }
    }
}

/// Locator of a source record, synthesized from the registry base when the
/// summary has none
pub fn source_locator(source: &RecordSummary, source_base: &str) -> String {
    source.uri.clone().unwrap_or_else(|| {
        format!("{}/network/{}", source_base.trim_end_matches('/'), source.id)
    })
}

/// Lineage for a fresh copy of `source` stored as `copied`
///
/// The single input is the source's own lineage, or a minimal root entity
/// when it has none. Properties are always emitted as title, description,
/// retrieved-from, so the locator sits at position 2.
pub fn build_copy_lineage(
    source_lineage: Option<&LineageEntity>,
    source: &RecordSummary,
    copied: &RecordSummary,
    source_base: &str,
    ended_at: Timestamp,
) -> LineageEntity {
    let locator = source_locator(source, source_base);

    let input = match source_lineage {
        Some(lineage) => lineage.clone(),
        None => {
            let mut minimal = LineageEntity::minimal(source);
            minimal.uri.get_or_insert_with(|| locator.clone());
            minimal
        }
    };

    let event = LineageEvent::new(EventKind::Copy, Some(ended_at)).with_input(input);

    LineageEntity::derived(copied.uri.clone(), event)
        .with_property(TITLE_PROPERTY, source.name.clone().unwrap_or_default())
        .with_property(
            DESCRIPTION_PROPERTY,
            source.description.clone().unwrap_or_default(),
        )
        .with_property(RETRIEVED_FROM_PROPERTY, locator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestry::{AncestryExtractor, KeyedLookup, PositionalLookup};
    use crate::planner::CreateReason;
    use netsync_domain::{Origin, Permission};
    use std::cell::RefCell;
    use std::collections::HashSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Call {
        GetContent,
        Create,
        Update,
        SetProvenance,
        SetReadOnly(bool),
    }

    // Mock registry logging every call and failing the chosen ones
    struct MockRegistry {
        calls: RefCell<Vec<Call>>,
        failing: HashSet<Call>,
        written: RefCell<Vec<LineageEntity>>,
    }

    impl MockRegistry {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                failing: HashSet::new(),
                written: RefCell::new(Vec::new()),
            }
        }

        fn failing(calls: &[Call]) -> Self {
            let mut registry = Self::new();
            registry.failing.extend(calls.iter().copied());
            registry
        }

        fn call(&self, call: Call) -> Result<(), String> {
            self.calls.borrow_mut().push(call);
            if self.failing.contains(&call) {
                Err(format!("{:?} rejected", call))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl Registry for MockRegistry {
        type Error = String;

        fn base_uri(&self) -> String {
            "http://source.org/v2/".to_string()
        }

        fn list_candidates(&self, _: &str, _: Permission, _: usize, _: usize) -> Result<Vec<RecordSummary>, String> {
            Ok(Vec::new())
        }

        fn search_records(&self, _: &str, _: Option<&str>, _: usize) -> Result<Vec<RecordSummary>, String> {
            Ok(Vec::new())
        }

        fn get_summary(&self, id: &RecordId) -> Result<RecordSummary, String> {
            Ok(RecordSummary::new(id.clone(), Timestamp::from_millis(1)))
        }

        fn get_provenance(&self, _: &RecordId) -> Result<Option<LineageEntity>, String> {
            Ok(None)
        }

        fn set_provenance(&self, _: &RecordId, lineage: &LineageEntity) -> Result<(), String> {
            self.call(Call::SetProvenance)?;
            self.written.borrow_mut().push(lineage.clone());
            Ok(())
        }

        fn get_content(&self, id: &RecordId) -> Result<RecordContent, String> {
            self.call(Call::GetContent)?;
            Ok(RecordContent::new(format!("network:{}", id).into_bytes()))
        }

        fn create_content(&self, _: RecordContent) -> Result<RecordSummary, String> {
            self.call(Call::Create)?;
            Ok(RecordSummary::new("new-1", Timestamp::from_millis(100))
                .with_uri("http://target.org/network/new-1"))
        }

        fn update_content(&self, content: RecordContent) -> Result<RecordSummary, String> {
            self.call(Call::Update)?;
            let id = content.target_id.ok_or("missing target id")?;
            Ok(RecordSummary::new(id, Timestamp::from_millis(100)))
        }

        fn set_read_only(&self, _: &RecordId, read_only: bool) -> Result<(), String> {
            self.call(Call::SetReadOnly(read_only))
        }
    }

    fn source_summary() -> RecordSummary {
        RecordSummary::new("s1", Timestamp::from_millis(10))
            .with_name("Pathway")
            .with_description("Signalling pathway")
    }

    #[test]
    fn test_create_writes_content_then_lineage() {
        let source = MockRegistry::new();
        let target = MockRegistry::new();
        let executor = SyncExecutor::new(&source, &target);

        let record = executor.create(&source_summary(), None);

        assert!(record.is_complete());
        assert_eq!(record.target, Some(RecordId::new("new-1")));
        assert_eq!(source.calls(), vec![Call::GetContent]);
        assert_eq!(target.calls(), vec![Call::Create, Call::SetProvenance]);

        let written = target.written.borrow();
        let event = written[0].creation_event().unwrap();
        assert!(event.kind.is_copy());
        assert_eq!(written[0].uri.as_deref(), Some("http://target.org/network/new-1"));
    }

    #[test]
    fn test_create_stops_when_content_fetch_fails() {
        let source = MockRegistry::failing(&[Call::GetContent]);
        let target = MockRegistry::new();
        let record = SyncExecutor::new(&source, &target).create(&source_summary(), None);

        assert!(record.fetch_content.failure().is_some());
        assert_eq!(record.write_content, StepOutcome::NotAttempted);
        assert!(target.calls().is_empty());
    }

    #[test]
    fn test_create_failure_skips_lineage() {
        let source = MockRegistry::new();
        let target = MockRegistry::failing(&[Call::Create]);
        let record = SyncExecutor::new(&source, &target).create(&source_summary(), None);

        assert_eq!(record.failures(), vec![(Step::WriteContent, "Create rejected")]);
        assert_eq!(record.write_lineage, StepOutcome::NotAttempted);
        assert_eq!(record.target, None);
    }

    #[test]
    fn test_lineage_failure_is_recorded() {
        let source = MockRegistry::new();
        let target = MockRegistry::failing(&[Call::SetProvenance]);
        let record = SyncExecutor::new(&source, &target).create(&source_summary(), None);

        assert!(record.write_content.is_success());
        assert!(!record.is_complete());
        assert_eq!(record.failures()[0].0, Step::WriteLineage);
    }

    #[test]
    fn test_update_preserves_target_id() {
        let source = MockRegistry::new();
        let target = MockRegistry::new();
        let record = SyncExecutor::new(&source, &target).update(
            &source_summary(),
            None,
            &RecordId::new("t1"),
            ActionKind::Update,
        );

        assert!(record.is_complete());
        assert_eq!(record.target, Some(RecordId::new("t1")));
        assert_eq!(target.calls(), vec![Call::Update, Call::SetProvenance]);
    }

    #[test]
    fn test_update_read_only_unlocks_and_relocks() {
        let source = MockRegistry::new();
        let target = MockRegistry::new();
        let record = SyncExecutor::new(&source, &target).update_read_only(
            &source_summary(),
            None,
            &RecordId::new("t1"),
        );

        assert!(record.is_complete());
        assert!(!record.left_writable());
        assert_eq!(
            target.calls(),
            vec![
                Call::SetReadOnly(false),
                Call::Update,
                Call::SetProvenance,
                Call::SetReadOnly(true)
            ]
        );
    }

    #[test]
    fn test_update_read_only_relocks_after_failed_update() {
        let source = MockRegistry::new();
        let target = MockRegistry::failing(&[Call::Update]);
        let record = SyncExecutor::new(&source, &target).update_read_only(
            &source_summary(),
            None,
            &RecordId::new("t1"),
        );

        assert!(record.write_content.failure().is_some());
        assert_eq!(record.write_lineage, StepOutcome::NotAttempted);
        assert!(record.relock.is_success());
        assert_eq!(target.calls().last(), Some(&Call::SetReadOnly(true)));
    }

    #[test]
    fn test_update_read_only_attempts_update_after_failed_unlock() {
        let source = MockRegistry::new();
        let target = MockRegistry::failing(&[Call::SetReadOnly(false)]);
        let record = SyncExecutor::new(&source, &target).update_read_only(
            &source_summary(),
            None,
            &RecordId::new("t1"),
        );

        assert!(record.unlock.failure().is_some());
        assert!(record.write_content.is_success());
        assert_eq!(record.relock, StepOutcome::NotAttempted);
        assert!(!target.calls().contains(&Call::SetReadOnly(true)));
    }

    #[test]
    fn test_failed_relock_leaves_record_writable() {
        let source = MockRegistry::new();
        let target = MockRegistry::failing(&[Call::SetReadOnly(true)]);
        let record = SyncExecutor::new(&source, &target).update_read_only(
            &source_summary(),
            None,
            &RecordId::new("t1"),
        );

        assert!(record.is_complete());
        assert!(record.left_writable());
        assert_eq!(record.failures()[0].0, Step::Relock);
    }

    #[test]
    fn test_skip_executes_nothing() {
        let source = MockRegistry::new();
        let target = MockRegistry::new();
        let decision = SyncDecision {
            source: RecordId::new("s1"),
            action: SyncAction::Skip {
                reason: crate::planner::SkipReason::AlreadyCurrent {
                    target: RecordId::new("t1"),
                },
            },
        };

        assert!(SyncExecutor::new(&source, &target)
            .execute(&decision, &source_summary(), None)
            .is_none());
        assert!(source.calls().is_empty());
        assert!(target.calls().is_empty());
    }

    #[test]
    fn test_execute_dispatches_create() {
        let source = MockRegistry::new();
        let target = MockRegistry::new();
        let decision = SyncDecision {
            source: RecordId::new("s1"),
            action: SyncAction::Create {
                reason: CreateReason::NoCopyFound,
            },
        };

        let record = SyncExecutor::new(&source, &target)
            .execute(&decision, &source_summary(), None)
            .unwrap();
        assert_eq!(record.action, ActionKind::Create);
    }

    #[test]
    fn test_copy_lineage_property_order() {
        let copied = RecordSummary::new("t1", Timestamp::from_millis(1));
        let lineage = build_copy_lineage(
            None,
            &RecordSummary::new("s1", Timestamp::from_millis(1)),
            &copied,
            "http://source.org/v2/",
            Timestamp::from_millis(42),
        );

        let names: Vec<&str> = lineage.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![TITLE_PROPERTY, DESCRIPTION_PROPERTY, RETRIEVED_FROM_PROPERTY]);
        assert_eq!(lineage.properties[0].value, "");
        assert_eq!(lineage.properties[1].value, "");
        assert_eq!(lineage.properties[2].value, "http://source.org/v2/network/s1");

        let event = lineage.creation_event().unwrap();
        assert_eq!(event.ended_at, Some(Timestamp::from_millis(42)));
        assert_eq!(event.inputs.len(), 1);
        assert_eq!(event.inputs[0].uri.as_deref(), Some("http://source.org/v2/network/s1"));
        assert_eq!(event.inputs[0].origin, Origin::Root);
    }

    #[test]
    fn test_copy_lineage_uses_source_description() {
        let lineage = build_copy_lineage(
            None,
            &source_summary().with_uri("http://source.org/network/s1"),
            &RecordSummary::new("t1", Timestamp::from_millis(1)),
            "http://ignored.org",
            Timestamp::from_millis(1),
        );

        assert_eq!(lineage.property(TITLE_PROPERTY), Some("Pathway"));
        assert_eq!(lineage.property(DESCRIPTION_PROPERTY), Some("Signalling pathway"));
        assert_eq!(lineage.property(RETRIEVED_FROM_PROPERTY), Some("http://source.org/network/s1"));
    }

    #[test]
    fn test_copy_lineage_keeps_source_history() {
        let history = LineageEntity::derived(
            Some("http://source.org/network/s1".to_string()),
            LineageEvent::new(EventKind::Other("Program Upload".to_string()), Some(Timestamp::from_millis(5))),
        );
        let lineage = build_copy_lineage(
            Some(&history),
            &source_summary(),
            &RecordSummary::new("t1", Timestamp::from_millis(1)),
            "http://source.org",
            Timestamp::from_millis(9),
        );

        assert_eq!(lineage.creation_event().unwrap().parent(), Some(&history));
    }

    #[test]
    fn test_copy_lineage_readable_by_both_lookups() {
        let lineage = build_copy_lineage(
            None,
            &source_summary(),
            &RecordSummary::new("t1", Timestamp::from_millis(1)),
            "http://source.org",
            Timestamp::from_millis(1),
        );

        assert_eq!(PositionalLookup::default().extract(&lineage).unwrap(), RecordId::new("s1"));
        assert_eq!(KeyedLookup::default().extract(&lineage).unwrap(), RecordId::new("s1"));
    }
}
