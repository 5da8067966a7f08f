//! Run reports
//!
//! Collects what a run decided and what happened when it acted, so nothing
//! that failed mid-run goes unnoticed.

use crate::executor::ExecutionRecord;
use crate::fetcher::Quarantined;
use crate::planner::{ActionKind, SyncDecision};
use serde::Serialize;

/// One decision, flattened for output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionEntry {
    /// Source record id
    pub source: String,
    /// Action name
    pub action: String,
    /// Existing target record concerned, if any
    pub target: Option<String>,
    /// Why the action was chosen
    pub reason: String,
}

/// A record excluded before decisions were made
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarantineEntry {
    /// "source" or "target"
    pub side: String,
    /// Record id
    pub id: String,
    /// Registry error message
    pub message: String,
}

/// A failed executor step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    /// Source record being synchronized
    pub record: String,
    /// Step that failed
    pub step: String,
    /// Registry error message
    pub message: String,
}

/// Results of one or more synchronization runs
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Whether writes were suppressed
    pub dry_run: bool,

    /// Decisions in source order
    pub decisions: Vec<DecisionEntry>,

    /// Sources decided as Create
    pub created: usize,

    /// Sources decided as Update
    pub updated: usize,

    /// Sources decided as UpdateReadOnly
    pub updated_read_only: usize,

    /// Sources decided as Skip
    pub skipped: usize,

    /// Records excluded because their lineage could not be read
    pub quarantined: Vec<QuarantineEntry>,

    /// Failed executor steps
    pub failures: Vec<SyncFailure>,

    /// Conditions needing attention that did not fail a step outright
    pub warnings: Vec<String>,

    /// Runs merged into this report
    pub runs: usize,

    /// Wall-clock time spent, in milliseconds
    pub elapsed_ms: u64,
}

impl SyncReport {
    /// Create an empty report
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Record a decision and count its action
    pub fn record_decision(&mut self, decision: &SyncDecision) {
        match decision.action.kind() {
            ActionKind::Create => self.created += 1,
            ActionKind::Update => self.updated += 1,
            ActionKind::UpdateReadOnly => self.updated_read_only += 1,
            ActionKind::Skip => self.skipped += 1,
        }

        self.decisions.push(DecisionEntry {
            source: decision.source.to_string(),
            action: decision.action.kind().as_str().to_string(),
            target: decision.action.target().map(|id| id.to_string()),
            reason: decision.action.reason().to_string(),
        });
    }

    /// Record a quarantined record
    pub fn record_quarantine(&mut self, quarantined: &Quarantined) {
        self.quarantined.push(QuarantineEntry {
            side: quarantined.side.to_string(),
            id: quarantined.id.to_string(),
            message: quarantined.message.clone(),
        });
    }

    /// Record the failed steps of an execution and any record left writable
    pub fn record_execution(&mut self, execution: &ExecutionRecord) {
        for (step, message) in execution.failures() {
            self.failures.push(SyncFailure {
                record: execution.source.to_string(),
                step: step.to_string(),
                message: message.to_string(),
            });
        }

        if execution.left_writable() {
            if let Some(target) = &execution.target {
                self.warnings.push(format!(
                    "Target network {} was unlocked to update it from {} and is left writable",
                    target, execution.source
                ));
            }
        }
    }

    /// Total number of decisions
    pub fn total_decisions(&self) -> usize {
        self.created + self.updated + self.updated_read_only + self.skipped
    }

    /// Whether any step failed or any record was quarantined
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || !self.quarantined.is_empty()
    }

    /// Fold a later run into this one
    ///
    /// Counters accumulate. Decisions, quarantines, failures and warnings
    /// are replaced by those of `other`, so a long-lived report stays
    /// bounded and describes the most recent run in detail.
    pub fn merge(&mut self, other: SyncReport) {
        self.dry_run |= other.dry_run;
        self.created += other.created;
        self.updated += other.updated;
        self.updated_read_only += other.updated_read_only;
        self.skipped += other.skipped;
        self.runs += other.runs;
        self.elapsed_ms += other.elapsed_ms;
        self.decisions = other.decisions;
        self.quarantined = other.quarantined;
        self.failures = other.failures;
        self.warnings = other.warnings;
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Sync Report".to_string(),
            "===========".to_string(),
            format!("Runs: {}", self.runs),
            format!("Elapsed: {}ms", self.elapsed_ms),
        ];
        if self.dry_run {
            lines.push("Mode: dry run (no changes written)".to_string());
        }
        lines.push(String::new());

        lines.push(format!("Decisions: {}", self.total_decisions()));
        lines.push(format!("  Create: {}", self.created));
        lines.push(format!("  Update: {}", self.updated));
        lines.push(format!("  Update read-only: {}", self.updated_read_only));
        lines.push(format!("  Skip: {}", self.skipped));

        if !self.quarantined.is_empty() {
            lines.push(String::new());
            lines.push(format!("Quarantined: {}", self.quarantined.len()));
            for entry in &self.quarantined {
                lines.push(format!("  {} {}: {}", entry.side, entry.id, entry.message));
            }
        }

        if !self.failures.is_empty() {
            lines.push(String::new());
            lines.push(format!("Failures: {}", self.failures.len()));
            for failure in &self.failures {
                lines.push(format!(
                    "  {} ({}): {}",
                    failure.record, failure.step, failure.message
                ));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push("Warnings:".to_string());
            for warning in &self.warnings {
                lines.push(format!("  {}", warning));
            }
        }

        lines.join("\n")
    }
}
