//! Run orchestration
//!
//! One run: select sources, list target candidates, fetch lineage for both,
//! then decide and execute each source in turn.

use crate::ancestry::AncestryExtractor;
use crate::context::RunContext;
use crate::executor::SyncExecutor;
use crate::planner::{DecisionEngine, SyncDecision};
use crate::report::SyncReport;
use crate::{SyncConfig, SyncError};
use netsync_domain::{Permission, Registry, SourceFinder};
use std::fmt::Display;
use std::time::Instant;

/// Synchronizes records from a source registry to a target registry
///
/// # Examples
///
/// ```
/// use netsync_engine::{SyncConfig, SyncEngine};
///
/// let engine = SyncEngine::new(SyncConfig::update_mode()).unwrap();
/// assert!(engine.config().update_target_network);
///
/// let invalid = SyncConfig { candidate_limit: 0, ..SyncConfig::default() };
/// assert!(SyncEngine::new(invalid).is_err());
/// ```
pub struct SyncEngine {
    config: SyncConfig,
    extractor: Box<dyn AncestryExtractor>,
}

impl SyncEngine {
    /// Create an engine, rejecting invalid configuration
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::Config)?;
        let extractor = config.ancestry_lookup.extractor();
        Ok(Self { config, extractor })
    }

    /// Replace the ancestry extractor chosen by the configuration
    pub fn with_extractor(mut self, extractor: Box<dyn AncestryExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Configuration this engine runs with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gather sources, candidates and lineage for one run
    ///
    /// Failing to select sources or to list candidates aborts the run.
    /// Unreadable lineage only quarantines the records concerned.
    pub fn prepare<F, S, T>(
        &self,
        finder: &F,
        source: &S,
        target: &T,
        owner: &str,
    ) -> Result<RunContext, SyncError>
    where
        F: SourceFinder,
        F::Error: Display,
        S: Registry,
        T: Registry,
    {
        let sources = finder
            .find_source_networks()
            .map_err(|e| SyncError::Selection(e.to_string()))?;
        tracing::info!("Found {} source networks", sources.len());

        let limit = self.config.effective_candidate_limit();
        let candidates = target
            .list_candidates(owner, Permission::Admin, limit, 0)
            .map_err(|e| {
                SyncError::Registry(format!("unable to list candidates for {}: {}", owner, e))
            })?;
        tracing::info!(
            "Found {} target candidates owned by {}",
            candidates.len(),
            owner
        );

        Ok(RunContext::populate(sources, candidates, source, target))
    }

    /// Decide every source of a prepared run without writing anything
    pub fn plan(&self, ctx: &RunContext) -> Vec<SyncDecision> {
        DecisionEngine::new(&self.config, self.extractor.as_ref()).plan(ctx)
    }

    /// Run one full synchronization pass
    ///
    /// Sources are handled one at a time: each is decided and, unless this
    /// is a dry run, executed before the next is looked at.
    pub fn run<F, S, T>(
        &self,
        finder: &F,
        source: &S,
        target: &T,
        owner: &str,
    ) -> Result<SyncReport, SyncError>
    where
        F: SourceFinder,
        F::Error: Display,
        S: Registry,
        T: Registry,
    {
        let start = Instant::now();
        let ctx = self.prepare(finder, source, target, owner)?;
        let mut report = self.execute(&ctx, source, target);
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Sync run finished in {}ms: {} created, {} updated, {} read-only updated, {} skipped, {} failures",
            report.elapsed_ms,
            report.created,
            report.updated,
            report.updated_read_only,
            report.skipped,
            report.failures.len()
        );

        Ok(report)
    }

    /// Decide and execute every source of a prepared run
    pub fn execute<S: Registry, T: Registry>(
        &self,
        ctx: &RunContext,
        source: &S,
        target: &T,
    ) -> SyncReport {
        let mut report = SyncReport::new(self.config.dry_run);
        report.runs = 1;
        for quarantined in &ctx.quarantined {
            report.record_quarantine(quarantined);
        }

        let planner = DecisionEngine::new(&self.config, self.extractor.as_ref());
        let executor = SyncExecutor::new(source, target);

        for summary in &ctx.sources {
            let decision = planner.decide(ctx, summary);
            report.record_decision(&decision);

            if self.config.dry_run {
                tracing::info!("Dry run: not executing {}", decision.action);
                continue;
            }

            if let Some(execution) =
                executor.execute(&decision, summary, ctx.lineage_of(&summary.id))
            {
                report.record_execution(&execution);
            }
        }

        report
    }
}
