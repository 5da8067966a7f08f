//! Background worker for periodic synchronization

use crate::{SyncEngine, SyncError, SyncReport};
use netsync_domain::{Registry, SourceFinder};
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Background worker that runs the sync engine on a schedule
///
/// Registry calls block, so each pass runs on tokio's blocking pool while
/// the worker itself only waits on the timer and the shutdown signal.
///
/// # Examples
///
/// ```no_run
/// use netsync_engine::{SyncConfig, SyncEngine, SyncWorker};
/// use netsync_engine::selection::{IdListFinder, SelectionFinder};
/// use netsync_client::MemoryRegistry;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = Arc::new(MemoryRegistry::new("http://source.org"));
///     let target = Arc::new(MemoryRegistry::new("http://target.org"));
///     let finder = SelectionFinder::Ids(IdListFinder::new(source.clone(), vec![]));
///     let engine = SyncEngine::new(SyncConfig::default())?;
///
///     let mut worker = SyncWorker::new(
///         engine, finder, source, target, "curator", Duration::from_secs(3600),
///     )?;
///
///     // Run until Ctrl+C
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct SyncWorker<F, S, T> {
    engine: Arc<SyncEngine>,
    finder: Arc<F>,
    source: Arc<S>,
    target: Arc<T>,
    owner: String,
    interval: Duration,
    report: SyncReport,
}

impl<F, S, T> SyncWorker<F, S, T>
where
    F: SourceFinder + Send + Sync + 'static,
    F::Error: Display,
    S: Registry + Send + Sync + 'static,
    T: Registry + Send + Sync + 'static,
{
    /// Create a worker running `engine` every `interval`
    pub fn new(
        engine: SyncEngine,
        finder: F,
        source: Arc<S>,
        target: Arc<T>,
        owner: impl Into<String>,
        interval: Duration,
    ) -> Result<Self, SyncError> {
        if interval.is_zero() {
            return Err(SyncError::Worker("interval must be greater than 0".to_string()));
        }

        Ok(Self {
            report: SyncReport::new(engine.config().dry_run),
            engine: Arc::new(engine),
            finder: Arc::new(finder),
            source,
            target,
            owner: owner.into(),
            interval,
        })
    }

    /// Run one pass on the blocking pool
    async fn run_once(&self) -> Result<SyncReport, SyncError> {
        let engine = Arc::clone(&self.engine);
        let finder = Arc::clone(&self.finder);
        let source = Arc::clone(&self.source);
        let target = Arc::clone(&self.target);
        let owner = self.owner.clone();

        tokio::task::spawn_blocking(move || {
            engine.run(finder.as_ref(), source.as_ref(), target.as_ref(), &owner)
        })
        .await
        .map_err(|e| SyncError::Worker(format!("sync task failed: {}", e)))?
    }

    /// Run until a shutdown signal (Ctrl+C) is received
    ///
    /// A failed pass is logged and retried on the next tick.
    pub async fn run(&mut self) -> Result<(), SyncError> {
        let mut ticker = interval(self.interval);

        tracing::info!("Sync worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting sync cycle");

                    match self.run_once().await {
                        Ok(report) => {
                            tracing::info!(
                                "Sync cycle completed: {} created, {} updated, {} skipped",
                                report.created,
                                report.updated + report.updated_read_only,
                                report.skipped
                            );
                            self.report.merge(report);
                        }
                        Err(e) => {
                            tracing::error!("Sync cycle failed: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping sync worker");
                    break;
                }
            }
        }

        tracing::info!("Sync worker stopped. Cumulative report:\n{}", self.report.summary());

        Ok(())
    }

    /// Run a fixed number of cycles, stopping at the first failed pass
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<(), SyncError> {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Sync worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting sync cycle {}/{}", cycle + 1, cycles);

            match self.run_once().await {
                Ok(report) => {
                    tracing::info!(
                        "Sync cycle {}/{} completed: {} decisions, {} failures",
                        cycle + 1,
                        cycles,
                        report.total_decisions(),
                        report.failures.len()
                    );
                    self.report.merge(report);
                }
                Err(e) => {
                    tracing::error!("Sync cycle {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Cumulative counters across all completed cycles, with the detail of
    /// the latest one
    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    /// Clear the cumulative report
    pub fn reset_report(&mut self) {
        self.report = SyncReport::new(self.engine.config().dry_run);
    }
}
