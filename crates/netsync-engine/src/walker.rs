//! Chain walking over target lineage
//!
//! Decides whether a target candidate descends from a given source record by
//! following its lineage backwards, one parent (`inputs[0]`) at a time, until
//! the most recent copy event is found.

use crate::ancestry::AncestryExtractor;
use netsync_domain::{LineageEntity, RecordId, Timestamp};

/// Relationship between a target candidate and a source record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ancestry {
    /// The candidate's latest event is a copy of the source
    DirectCopy {
        /// When that copy completed, if recorded
        ended_at: Option<Timestamp>,
    },

    /// The candidate descends from a copy of the source but changed since.
    /// Such a candidate must never be overwritten.
    DerivedButModified,

    /// No usable link to the source
    Unrelated(UnrelatedReason),
}

impl Ancestry {
    /// Whether the candidate descends from the source in any way
    pub fn is_related(&self) -> bool {
        !matches!(self, Ancestry::Unrelated(_))
    }
}

/// Why a candidate was classified as unrelated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrelatedReason {
    /// The registry holds no lineage for the candidate
    NoLineage,
    /// A visited entity has no creation event
    UnknownOrigin,
    /// A copy event was found but its ancestor could not be read
    AncestryUnknown,
    /// The nearest copy event points at another record
    DifferentSource(RecordId),
    /// History ran out before a copy event was found
    ChainExhausted,
}

/// Walks a candidate's lineage looking for the nearest copy event
///
/// The walk is over an owned tree, so every chain it can be handed is finite
/// and acyclic.
pub struct ChainWalker<'a> {
    extractor: &'a dyn AncestryExtractor,
}

impl<'a> ChainWalker<'a> {
    /// Create a walker that reads ancestry through `extractor`
    pub fn new(extractor: &'a dyn AncestryExtractor) -> Self {
        Self { extractor }
    }

    /// Classify a candidate, given its lineage root, against `source`
    pub fn classify(&self, root: Option<&LineageEntity>, source: &RecordId) -> Ancestry {
        let Some(root) = root else {
            return Ancestry::Unrelated(UnrelatedReason::NoLineage);
        };
        let Some(event) = root.creation_event() else {
            return Ancestry::Unrelated(UnrelatedReason::UnknownOrigin);
        };

        if event.kind.is_copy() {
            return match self.extractor.extract(root) {
                Ok(ancestor) if &ancestor == source => Ancestry::DirectCopy {
                    ended_at: event.ended_at,
                },
                Ok(ancestor) => Ancestry::Unrelated(UnrelatedReason::DifferentSource(ancestor)),
                Err(e) => {
                    tracing::info!("Unable to read ancestry of copy event: {}", e);
                    Ancestry::Unrelated(UnrelatedReason::AncestryUnknown)
                }
            };
        }

        self.walk_back(root, source)
    }

    /// Follow first inputs backwards from a non-copy event
    fn walk_back(&self, root: &LineageEntity, source: &RecordId) -> Ancestry {
        let mut parent = root.creation_event().and_then(|event| event.parent());
        let mut depth = 0usize;

        while let Some(entity) = parent {
            depth += 1;
            let Some(event) = entity.creation_event() else {
                tracing::debug!("Lineage reached a root of unknown origin at depth {}", depth);
                return Ancestry::Unrelated(UnrelatedReason::UnknownOrigin);
            };

            if event.kind.is_copy() {
                return match self.extractor.extract(entity) {
                    Ok(ancestor) if &ancestor == source => {
                        tracing::debug!("Copy of {} found at depth {}", source, depth);
                        Ancestry::DerivedButModified
                    }
                    Ok(ancestor) => {
                        Ancestry::Unrelated(UnrelatedReason::DifferentSource(ancestor))
                    }
                    Err(e) => {
                        tracing::info!(
                            "Unable to read ancestry of copy event at depth {}: {}",
                            depth,
                            e
                        );
                        Ancestry::Unrelated(UnrelatedReason::AncestryUnknown)
                    }
                };
            }

            parent = event.parent();
        }

        Ancestry::Unrelated(UnrelatedReason::ChainExhausted)
    }
}
