//! Command implementations.

pub mod init;
pub mod plan;
pub mod run;
pub mod watch;

pub use self::init::execute_init;
pub use self::plan::execute_plan;
pub use self::run::execute_run;
pub use self::watch::execute_watch;

use crate::config::PlanFile;
use crate::error::Result;
use netsync_client::NdexRegistry;
use netsync_engine::selection::SelectionFinder;
use std::sync::Arc;

/// Registries and source finder for one plan.
pub(crate) struct Connections {
    pub source: Arc<NdexRegistry>,
    pub target: Arc<NdexRegistry>,
    pub finder: SelectionFinder<NdexRegistry>,
}

/// Open both servers named by the plan.
pub(crate) fn connect(plan: &PlanFile) -> Result<Connections> {
    let source = Arc::new(plan.source.connect()?);
    let target = Arc::new(plan.target.connect()?);
    let finder = plan.selection.finder(Arc::clone(&source));

    tracing::debug!(
        "Connected source {} and target {} as {}",
        plan.source.url,
        plan.target.url,
        plan.target.username
    );

    Ok(Connections {
        source,
        target,
        finder,
    })
}
