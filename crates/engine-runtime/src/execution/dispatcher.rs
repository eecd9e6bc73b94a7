use crate::{
    error::ReplicationError,
    execution::{
        pool::WorkerPool,
        report::{PlanningFailure, RunReport},
    },
};
use connectors::sql::base::source::SourceConnection;
use engine_config::settings::ReplicationSettings;
use engine_core::{connectors::ConnectionProvider, context::ReplicationContext};
use model::{entity::descriptor::TableDescriptor, replication::job::WorkerJob};
use planner::plan::PagePlan;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Plans every requested table and feeds one job per page into a bounded
/// worker pool, then waits for all of them.
pub struct Dispatcher<P: ConnectionProvider> {
    ctx: ReplicationContext<P>,
    settings: ReplicationSettings,
    cancel: CancellationToken,
}

impl<P: ConnectionProvider> Dispatcher<P> {
    pub fn new(
        ctx: ReplicationContext<P>,
        settings: ReplicationSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            settings,
            cancel,
        }
    }

    /// Returns only after every submitted job has finished. Table and page
    /// failures end up in the report; only setup problems are errors.
    pub async fn run(self) -> Result<RunReport, ReplicationError> {
        let descriptors = self.ctx.registry.resolve_all(&self.settings.tables)?;
        let mapping = self.settings.mapping();
        let mut source = self.ctx.provider.open_source(&mapping).await?;

        let mut report = RunReport::new(self.ctx.run_id.as_str());
        let mut pool = WorkerPool::start(
            self.ctx.clone(),
            self.settings.max_workers,
            self.cancel.clone(),
        );
        info!(
            run_id = %self.ctx.run_id,
            tables = descriptors.len(),
            max_workers = self.settings.max_workers,
            page_size = self.settings.page_size,
            source_schema = %mapping.source_schema,
            destination_schema = %mapping.destination_schema,
            "Starting replication"
        );

        'tables: for descriptor in descriptors {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let plan = match self.plan_table(&mut source, &descriptor).await {
                Ok(plan) => plan,
                Err(cause) => {
                    error!(table = %descriptor.table, %cause, "Failed to plan table");
                    report.add_planning_failure(&descriptor.table, cause);
                    source.release();
                    continue;
                }
            };
            report.add_plan(&plan);
            self.ctx.progress.pages_planned(plan.total_pages);

            for index in plan.page_indices() {
                let job = WorkerJob::new(
                    descriptor.table.clone(),
                    index,
                    plan.page_size,
                    mapping.clone(),
                );
                info!(table = %descriptor.table, "sending page {index}");

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        warn!(table = %descriptor.table, page = index, "Cancelled, no further pages will be submitted");
                        report.cancelled = true;
                        break 'tables;
                    }
                    submitted = pool.submit(job) => submitted?,
                }
            }

            source.release();
        }

        if let Err(err) = source.close().await {
            warn!(%err, "Failed to close dispatcher source connection");
        }

        info!(submitted = pool.submitted(), "All pages submitted, waiting for workers");
        let outcomes = pool.join().await;
        report.record_outcomes(outcomes);
        report.finish(self.ctx.progress.snapshot());

        info!(
            pages_succeeded = report.pages_succeeded,
            pages_failed = report.job_failures.len(),
            rows = report.rows_transferred,
            tables_failed = report.planning_failures.len(),
            cancelled = report.cancelled,
            "Replication finished"
        );
        Ok(report)
    }

    /// Counts and plans each table without transferring anything.
    pub async fn plan_only(
        self,
    ) -> Result<Vec<Result<PagePlan, PlanningFailure>>, ReplicationError> {
        let descriptors = self.ctx.registry.resolve_all(&self.settings.tables)?;
        let mut source = self.ctx.provider.open_source(&self.settings.mapping()).await?;

        let mut plans = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let plan = self
                .plan_table(&mut source, &descriptor)
                .await
                .map_err(|cause| PlanningFailure {
                    table: descriptor.table.clone(),
                    cause,
                });
            plans.push(plan);
            source.release();
        }

        if let Err(err) = source.close().await {
            warn!(%err, "Failed to close dispatcher source connection");
        }
        Ok(plans)
    }

    async fn plan_table(
        &self,
        source: &mut P::Source,
        descriptor: &Arc<TableDescriptor>,
    ) -> Result<PagePlan, String> {
        let row_count = source
            .count_rows(descriptor)
            .await
            .map_err(|e| e.to_string())?;
        let plan = PagePlan::new(descriptor.table.clone(), row_count, self.settings.page_size)
            .map_err(|e| e.to_string())?;

        info!(
            table = %plan.table,
            rows = plan.row_count,
            pages = plan.total_pages,
            "Planned table"
        );
        if plan.trailing_rows() > 0 {
            warn!(
                table = %plan.table,
                trailing_rows = plan.trailing_rows(),
                "Rows past the last full page will not be transferred"
            );
        }
        Ok(plan)
    }
}
