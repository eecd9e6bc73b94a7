use crate::{
    error::ReplicationError,
    execution::{
        dispatcher::Dispatcher,
        report::{PlanningFailure, RunReport},
    },
};
use engine_config::settings::ReplicationSettings;
use engine_core::{
    connectors::ConnectionProvider,
    context::ReplicationContext,
    worker::{PageSummary, PageTransferWorker},
};
use model::{entity::registry::EntityRegistry, replication::job::WorkerJob};
use planner::plan::PagePlan;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Worker id used for pages transferred outside of a pool.
const STANDALONE_WORKER: usize = 0;

/// Replicates every table named in `settings` and returns the run report.
pub async fn run<P: ConnectionProvider>(
    provider: P,
    registry: EntityRegistry,
    settings: ReplicationSettings,
    cancel: CancellationToken,
) -> Result<RunReport, ReplicationError> {
    let settings = settings.validate()?;
    let ctx = ReplicationContext::new(provider, registry).with_job_timeout(settings.job_timeout);
    info!("Replication run ID: {}", ctx.run_id);

    Dispatcher::new(ctx, settings, cancel).run().await
}

/// Counts rows and computes page plans without moving any data.
pub async fn plan<P: ConnectionProvider>(
    provider: P,
    registry: EntityRegistry,
    settings: ReplicationSettings,
) -> Result<Vec<Result<PagePlan, PlanningFailure>>, ReplicationError> {
    let settings = settings.validate()?;
    let ctx = ReplicationContext::new(provider, registry);

    Dispatcher::new(ctx, settings, CancellationToken::new())
        .plan_only()
        .await
}

/// Re-runs a single page of a single table, typically one reported as
/// failed by an earlier run. Upserts make this safe to repeat.
pub async fn transfer_page<P: ConnectionProvider>(
    provider: P,
    registry: EntityRegistry,
    settings: ReplicationSettings,
    page_index: u64,
) -> Result<PageSummary, ReplicationError> {
    if page_index == 0 {
        return Err(ReplicationError::InvalidPageIndex(page_index));
    }
    let settings = settings.validate()?;
    let [table] = settings.tables.as_slice() else {
        return Err(ReplicationError::SingleTableRequired(settings.tables.len()));
    };
    registry.resolve(table)?;

    let ctx = ReplicationContext::new(provider, registry).with_job_timeout(settings.job_timeout);
    let job = WorkerJob::new(table.clone(), page_index, settings.page_size, settings.mapping());
    info!(run_id = %ctx.run_id, %job, "Transferring single page");

    let worker = PageTransferWorker::new(ctx);
    let summary = worker.transfer(STANDALONE_WORKER, &job).await?;
    Ok(summary)
}
