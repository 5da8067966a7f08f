//! Sync decision engine
//!
//! Classifies each source record into exactly one action by consulting every
//! target candidate through the [`ChainWalker`] and comparing timestamps.
//! Candidates are scanned in registry order and the first definitive outcome
//! wins, so when several candidates are valid direct copies the result
//! depends on that order.

use crate::ancestry::AncestryExtractor;
use crate::config::{StaleCopyPolicy, SyncConfig, SyncMode};
use crate::context::RunContext;
use crate::walker::{Ancestry, ChainWalker};
use netsync_domain::{RecordId, RecordSummary, Timestamp};
use std::fmt;

/// Corrective action for one source record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Copy the source as a new target record
    Create {
        /// Why a new copy is needed
        reason: CreateReason,
    },

    /// Overwrite a stale, writable direct copy
    Update {
        /// Copy to refresh
        target: RecordId,
    },

    /// Unlock, overwrite and relock a stale read-only direct copy
    UpdateReadOnly {
        /// Copy to refresh
        target: RecordId,
    },

    /// Leave the target registry as it is
    Skip {
        /// Why nothing is done
        reason: SkipReason,
    },
}

/// Why a Create was decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateReason {
    /// No candidate descends from the source
    NoCopyFound,

    /// Create-only mode found a stale direct copy and, lacking an in-place
    /// refresh, creates another copy beside it
    StaleCopyFallback {
        /// The stale copy left in place
        target: RecordId,
    },
}

/// Why a Skip was decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A direct copy is at least as new as the source
    AlreadyCurrent {
        /// The current copy
        target: RecordId,
    },

    /// The only stale copy is read-only and may not be touched
    ReadOnlyProtected {
        /// The protected copy
        target: RecordId,
    },

    /// A copy exists but was modified after copying and must be preserved
    DerivedCopyExists {
        /// The modified copy
        target: RecordId,
    },
}

/// Discriminant of a [`SyncAction`], for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    /// [`SyncAction::Create`]
    Create,
    /// [`SyncAction::Update`]
    Update,
    /// [`SyncAction::UpdateReadOnly`]
    UpdateReadOnly,
    /// [`SyncAction::Skip`]
    Skip,
}

impl ActionKind {
    /// Lowercase name for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::UpdateReadOnly => "update_read_only",
            ActionKind::Skip => "skip",
        }
    }
}

impl SyncAction {
    /// Discriminant of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            SyncAction::Create { .. } => ActionKind::Create,
            SyncAction::Update { .. } => ActionKind::Update,
            SyncAction::UpdateReadOnly { .. } => ActionKind::UpdateReadOnly,
            SyncAction::Skip { .. } => ActionKind::Skip,
        }
    }

    /// The existing target record this action concerns, if any
    pub fn target(&self) -> Option<&RecordId> {
        match self {
            SyncAction::Create { reason } => match reason {
                CreateReason::NoCopyFound => None,
                CreateReason::StaleCopyFallback { target } => Some(target),
            },
            SyncAction::Update { target } | SyncAction::UpdateReadOnly { target } => Some(target),
            SyncAction::Skip { reason } => match reason {
                SkipReason::AlreadyCurrent { target }
                | SkipReason::ReadOnlyProtected { target }
                | SkipReason::DerivedCopyExists { target } => Some(target),
            },
        }
    }

    /// Short explanation for reports
    pub fn reason(&self) -> &'static str {
        match self {
            SyncAction::Create { reason: CreateReason::NoCopyFound } => "no copy found",
            SyncAction::Create { reason: CreateReason::StaleCopyFallback { .. } } => {
                "stale copy, refresh not available in create-only mode"
            }
            SyncAction::Update { .. } => "stale copy",
            SyncAction::UpdateReadOnly { .. } => "stale read-only copy",
            SyncAction::Skip { reason: SkipReason::AlreadyCurrent { .. } } => "copy is current",
            SyncAction::Skip { reason: SkipReason::ReadOnlyProtected { .. } } => {
                "stale copy is read-only"
            }
            SyncAction::Skip { reason: SkipReason::DerivedCopyExists { .. } } => {
                "copy modified since copying"
            }
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(target) => write!(f, "{} {} ({})", self.kind().as_str(), target, self.reason()),
            None => write!(f, "{} ({})", self.kind().as_str(), self.reason()),
        }
    }
}

/// The action decided for one source record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDecision {
    /// Source record
    pub source: RecordId,
    /// Decided action
    pub action: SyncAction,
}

/// Decides what each source record needs on the target registry
pub struct DecisionEngine<'a> {
    config: &'a SyncConfig,
    walker: ChainWalker<'a>,
}

impl<'a> DecisionEngine<'a> {
    /// Create a decision engine for one run
    pub fn new(config: &'a SyncConfig, extractor: &'a dyn AncestryExtractor) -> Self {
        Self {
            config,
            walker: ChainWalker::new(extractor),
        }
    }

    /// Decide every source record of the run, in order
    pub fn plan(&self, ctx: &RunContext) -> Vec<SyncDecision> {
        ctx.sources.iter().map(|source| self.decide(ctx, source)).collect()
    }

    /// Decide the action for one source record
    pub fn decide(&self, ctx: &RunContext, source: &RecordSummary) -> SyncDecision {
        let action = match self.config.mode() {
            SyncMode::CreateOnly => self.decide_create_only(ctx, source),
            SyncMode::Update => self.decide_update(ctx, source),
        };

        tracing::info!("Decision for source {}: {}", source.id, action);

        SyncDecision {
            source: source.id.clone(),
            action,
        }
    }

    /// Create-only mode: create unless a current direct copy exists
    fn decide_create_only(&self, ctx: &RunContext, source: &RecordSummary) -> SyncAction {
        tracing::info!(
            "Processing source network {} last modified {}",
            source.label(),
            source.modification_time
        );

        for candidate in &ctx.candidates {
            let ancestry = self
                .walker
                .classify(ctx.lineage_of(&candidate.id), &source.id);

            let Ancestry::DirectCopy { ended_at } = ancestry else {
                continue;
            };

            tracing::info!("Found direct copy {} of source {}", candidate.id, source.id);

            // An unrecorded copy time cannot prove the copy current
            let current = ended_at.is_some_and(|copied| source.modification_time <= copied);
            if current {
                return SyncAction::Skip {
                    reason: SkipReason::AlreadyCurrent {
                        target: candidate.id.clone(),
                    },
                };
            }

            return match self.config.stale_copy_policy {
                StaleCopyPolicy::Duplicate => {
                    tracing::warn!(
                        "Copy {} of source {} needs update, but update is not available in create-only mode; creating another copy",
                        candidate.id,
                        source.id
                    );
                    SyncAction::Create {
                        reason: CreateReason::StaleCopyFallback {
                            target: candidate.id.clone(),
                        },
                    }
                }
                StaleCopyPolicy::Refresh => self.resolve_stale(candidate),
            };
        }

        SyncAction::Create {
            reason: CreateReason::NoCopyFound,
        }
    }

    /// Update mode: refresh the first stale direct copy, create if none exists
    fn decide_update(&self, ctx: &RunContext, source: &RecordSummary) -> SyncAction {
        tracing::info!(
            "Trying to update target network created from source {}; source last modified {}",
            source.label(),
            source.modification_time
        );

        let latest_source = latest_source_time(ctx, source);
        let mut derived_copy: Option<&RecordSummary> = None;

        for candidate in &ctx.candidates {
            match self
                .walker
                .classify(ctx.lineage_of(&candidate.id), &source.id)
            {
                Ancestry::Unrelated(reason) => {
                    tracing::debug!("Candidate {} unrelated to {}: {:?}", candidate.id, source.id, reason);
                }
                Ancestry::DerivedButModified => {
                    tracing::info!(
                        "Candidate {} descends from {} but was modified; it will not be overwritten",
                        candidate.id,
                        source.id
                    );
                    derived_copy.get_or_insert(candidate);
                }
                Ancestry::DirectCopy { ended_at } => {
                    let earliest_target = earliest_target_time(candidate, ended_at);

                    if latest_source < earliest_target {
                        tracing::info!(
                            "latestSourceTime = {}; earliestTargetTime = {}. Not updating target {}",
                            latest_source,
                            earliest_target,
                            candidate.id
                        );
                        return SyncAction::Skip {
                            reason: SkipReason::AlreadyCurrent {
                                target: candidate.id.clone(),
                            },
                        };
                    }

                    return self.resolve_stale(candidate);
                }
            }
        }

        match derived_copy {
            Some(candidate) => SyncAction::Skip {
                reason: SkipReason::DerivedCopyExists {
                    target: candidate.id.clone(),
                },
            },
            None => SyncAction::Create {
                reason: CreateReason::NoCopyFound,
            },
        }
    }

    /// Action for a stale direct copy, honoring its read-only flag
    fn resolve_stale(&self, candidate: &RecordSummary) -> SyncAction {
        let target = candidate.id.clone();

        if !candidate.read_only {
            return SyncAction::Update { target };
        }

        if self.config.update_read_only_network {
            SyncAction::UpdateReadOnly { target }
        } else {
            tracing::warn!(
                "Target network {} is stale but read-only and update_read_only_network is false; leaving it stale",
                candidate.id
            );
            SyncAction::Skip {
                reason: SkipReason::ReadOnlyProtected { target },
            }
        }
    }
}

/// Later of the source's modification time and its latest lineage event end
pub fn latest_source_time(ctx: &RunContext, source: &RecordSummary) -> Timestamp {
    ctx.lineage_of(&source.id)
        .and_then(|root| root.creation_event())
        .and_then(|event| event.ended_at)
        .map_or(source.modification_time, |ended| {
            ended.max(source.modification_time)
        })
}

/// Earlier of the candidate's modification time and its copy event end
pub fn earliest_target_time(candidate: &RecordSummary, copy_ended_at: Option<Timestamp>) -> Timestamp {
    copy_ended_at.map_or(candidate.modification_time, |ended| {
        ended.min(candidate.modification_time)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestry::PositionalLookup;
    use crate::fetcher::LineageMap;
    use netsync_domain::lineage::{DESCRIPTION_PROPERTY, RETRIEVED_FROM_PROPERTY, TITLE_PROPERTY};
    use netsync_domain::{EventKind, LineageEntity, LineageEvent};

    fn ts(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    fn copy_of(source: &str, ended_at: u64) -> LineageEntity {
        let locator = format!("http://source.org/network/{}", source);
        LineageEntity::derived(
            None,
            LineageEvent::new(EventKind::Copy, Some(ts(ended_at)))
                .with_input(LineageEntity::root(Some(locator.clone()))),
        )
        .with_property(TITLE_PROPERTY, "")
        .with_property(DESCRIPTION_PROPERTY, "")
        .with_property(RETRIEVED_FROM_PROPERTY, locator)
    }

    fn edited(input: LineageEntity) -> LineageEntity {
        LineageEntity::derived(
            None,
            LineageEvent::new(EventKind::Other("Update".to_string()), Some(ts(40))).with_input(input),
        )
    }

    struct Fixture {
        sources: Vec<RecordSummary>,
        candidates: Vec<RecordSummary>,
        lineage: LineageMap,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sources: Vec::new(),
                candidates: Vec::new(),
                lineage: LineageMap::new(),
            }
        }

        fn source(mut self, id: &str, modified: u64) -> Self {
            self.sources.push(RecordSummary::new(id, ts(modified)));
            self
        }

        fn candidate(mut self, summary: RecordSummary, lineage: Option<LineageEntity>) -> Self {
            if let Some(root) = lineage {
                self.lineage.insert(summary.id.clone(), root);
            }
            self.candidates.push(summary);
            self
        }

        fn context(self) -> RunContext {
            RunContext::new(self.sources, self.candidates, self.lineage)
        }
    }

    fn decide(config: &SyncConfig, ctx: &RunContext) -> SyncAction {
        let extractor = PositionalLookup::default();
        let engine = DecisionEngine::new(config, &extractor);
        engine.decide(ctx, &ctx.sources[0]).action
    }

    fn target(id: &str) -> RecordId {
        RecordId::new(id)
    }

    // Create-only mode

    #[test]
    fn test_create_only_current_copy_is_skipped() {
        let ctx = Fixture::new()
            .source("s1", 10)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::default(), &ctx),
            SyncAction::Skip {
                reason: SkipReason::AlreadyCurrent { target: target("t1") }
            }
        );
    }

    #[test]
    fn test_create_only_copy_ending_at_modification_is_current() {
        let ctx = Fixture::new()
            .source("s1", 15)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(decide(&SyncConfig::default(), &ctx).kind(), ActionKind::Skip);
    }

    #[test]
    fn test_create_only_stale_copy_duplicates() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::default(), &ctx),
            SyncAction::Create {
                reason: CreateReason::StaleCopyFallback { target: target("t1") }
            }
        );
    }

    #[test]
    fn test_create_only_stale_copy_refresh_policy() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();
        let config = SyncConfig {
            stale_copy_policy: StaleCopyPolicy::Refresh,
            ..Default::default()
        };

        assert_eq!(decide(&config, &ctx), SyncAction::Update { target: target("t1") });
    }

    #[test]
    fn test_create_only_refresh_policy_read_only_copy() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)).read_only(), Some(copy_of("s1", 15)))
            .context();
        let protected = SyncConfig {
            stale_copy_policy: StaleCopyPolicy::Refresh,
            ..Default::default()
        };
        let unlocking = SyncConfig {
            update_read_only_network: true,
            ..protected.clone()
        };

        assert_eq!(
            decide(&protected, &ctx),
            SyncAction::Skip {
                reason: SkipReason::ReadOnlyProtected { target: target("t1") }
            }
        );
        assert_eq!(
            decide(&unlocking, &ctx),
            SyncAction::UpdateReadOnly { target: target("t1") }
        );
    }

    #[test]
    fn test_create_only_unknown_copy_time_is_stale() {
        let mut lineage = copy_of("s1", 0);
        if let netsync_domain::Origin::Derived(event) = &mut lineage.origin {
            event.ended_at = None;
        }
        let ctx = Fixture::new()
            .source("s1", 1)
            .candidate(RecordSummary::new("t1", ts(15)), Some(lineage))
            .context();

        assert_eq!(decide(&SyncConfig::default(), &ctx).kind(), ActionKind::Create);
    }

    #[test]
    fn test_create_only_derived_copy_still_creates() {
        let ctx = Fixture::new()
            .source("s1", 10)
            .candidate(RecordSummary::new("t1", ts(50)), Some(edited(copy_of("s1", 15))))
            .context();

        assert_eq!(
            decide(&SyncConfig::default(), &ctx),
            SyncAction::Create {
                reason: CreateReason::NoCopyFound
            }
        );
    }

    #[test]
    fn test_create_only_no_related_candidate_creates() {
        let ctx = Fixture::new()
            .source("s2", 10)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .candidate(RecordSummary::new("t2", ts(15)), None)
            .context();

        assert_eq!(
            decide(&SyncConfig::default(), &ctx),
            SyncAction::Create {
                reason: CreateReason::NoCopyFound
            }
        );
    }

    #[test]
    fn test_create_only_first_direct_copy_wins() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(30)), Some(copy_of("s1", 30)))
            .candidate(RecordSummary::new("t2", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::default(), &ctx),
            SyncAction::Skip {
                reason: SkipReason::AlreadyCurrent { target: target("t1") }
            }
        );
    }

    // Update mode

    #[test]
    fn test_update_current_copy_is_skipped() {
        let ctx = Fixture::new()
            .source("s1", 10)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Skip {
                reason: SkipReason::AlreadyCurrent { target: target("t1") }
            }
        );
    }

    #[test]
    fn test_update_stale_copy_is_updated() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Update { target: target("t1") }
        );
    }

    #[test]
    fn test_update_equal_times_are_stale() {
        let ctx = Fixture::new()
            .source("s1", 15)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Update { target: target("t1") }
        );
    }

    #[test]
    fn test_update_read_only_copy_protected() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)).read_only(), Some(copy_of("s1", 15)))
            .candidate(RecordSummary::new("t2", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Skip {
                reason: SkipReason::ReadOnlyProtected { target: target("t1") }
            }
        );
    }

    #[test]
    fn test_update_read_only_copy_unlocked_when_allowed() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)).read_only(), Some(copy_of("s1", 15)))
            .context();
        let config = SyncConfig {
            update_read_only_network: true,
            ..SyncConfig::update_mode()
        };

        assert_eq!(
            decide(&config, &ctx),
            SyncAction::UpdateReadOnly { target: target("t1") }
        );
    }

    #[test]
    fn test_update_target_modification_time_bounds_freshness() {
        // Copy finished at 30 but the record reports an older modification time
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(18)), Some(copy_of("s1", 30)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Update { target: target("t1") }
        );
    }

    #[test]
    fn test_update_source_lineage_end_bounds_freshness() {
        // Source modified at 10 but its lineage event ended at 25
        let mut fixture = Fixture::new()
            .source("s1", 10)
            .candidate(RecordSummary::new("t1", ts(20)), Some(copy_of("s1", 20)));
        fixture.lineage.insert(
            RecordId::new("s1"),
            LineageEntity::derived(
                None,
                LineageEvent::new(EventKind::Other("Program Upload".to_string()), Some(ts(25))),
            ),
        );
        let ctx = fixture.context();

        assert_eq!(latest_source_time(&ctx, &ctx.sources[0]), ts(25));
        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Update { target: target("t1") }
        );
    }

    #[test]
    fn test_update_derived_copy_suppresses_create() {
        let ctx = Fixture::new()
            .source("s1", 10)
            .candidate(RecordSummary::new("t1", ts(50)), Some(edited(copy_of("s1", 15))))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Skip {
                reason: SkipReason::DerivedCopyExists { target: target("t1") }
            }
        );
    }

    #[test]
    fn test_update_direct_copy_after_derived_copy_is_updated() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(50)), Some(edited(copy_of("s1", 15))))
            .candidate(RecordSummary::new("t2", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Update { target: target("t2") }
        );
    }

    #[test]
    fn test_update_no_related_candidate_creates() {
        let ctx = Fixture::new()
            .source("s2", 10)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Create {
                reason: CreateReason::NoCopyFound
            }
        );
    }

    #[test]
    fn test_update_only_first_direct_copy_is_updated() {
        let ctx = Fixture::new()
            .source("s1", 20)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .candidate(RecordSummary::new("t2", ts(15)), Some(copy_of("s1", 15)))
            .context();

        assert_eq!(
            decide(&SyncConfig::update_mode(), &ctx),
            SyncAction::Update { target: target("t1") }
        );
    }

    #[test]
    fn test_plan_covers_every_source() {
        let ctx = Fixture::new()
            .source("s1", 10)
            .source("s2", 10)
            .candidate(RecordSummary::new("t1", ts(15)), Some(copy_of("s1", 15)))
            .context();
        let config = SyncConfig::default();
        let extractor = PositionalLookup::default();
        let plan = DecisionEngine::new(&config, &extractor).plan(&ctx);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].source, target("s1"));
        assert_eq!(plan[0].action.kind(), ActionKind::Skip);
        assert_eq!(plan[1].source, target("s2"));
        assert_eq!(plan[1].action.kind(), ActionKind::Create);
    }

    #[test]
    fn test_action_display() {
        let action = SyncAction::Update { target: target("t1") };
        assert_eq!(action.to_string(), "update t1 (stale copy)");

        let action = SyncAction::Create {
            reason: CreateReason::NoCopyFound,
        };
        assert_eq!(action.to_string(), "create (no copy found)");
        assert_eq!(action.target(), None);
    }
}
