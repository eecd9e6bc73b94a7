use crate::{
    connectors::ConnectionProvider,
    context::ReplicationContext,
    error::{Side, TransferError},
    progress::ProgressReporter,
};
use connectors::sql::base::{destination::DestinationConnection, source::SourceConnection};
use model::{
    core::identifiers::WorkerId, entity::descriptor::TableDescriptor,
    records::snapshot::RowSnapshot, replication::job::WorkerJob,
};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Outcome of a successful page transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub table: String,
    pub page_index: u64,
    pub worker_id: WorkerId,
    pub rows: u64,
    pub elapsed_ms: u64,
}

/// Transfers one page from source to destination on connections it opens
/// and closes itself.
pub struct PageTransferWorker<P: ConnectionProvider> {
    ctx: ReplicationContext<P>,
}

impl<P: ConnectionProvider> PageTransferWorker<P> {
    pub fn new(ctx: ReplicationContext<P>) -> Self {
        Self { ctx }
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.ctx.progress
    }

    /// Runs `job`, bounded by the context's job timeout when one is set.
    /// On timeout the in-flight future is dropped together with its
    /// connections, so the uncommitted page is rolled back by the store.
    pub async fn transfer(
        &self,
        worker_id: WorkerId,
        job: &WorkerJob,
    ) -> Result<PageSummary, TransferError> {
        match self.ctx.job_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(worker_id, job))
                .await
                .map_err(|_| TransferError::TimedOut(limit))?,
            None => self.run(worker_id, job).await,
        }
    }

    async fn run(&self, worker_id: WorkerId, job: &WorkerJob) -> Result<PageSummary, TransferError> {
        let started = Instant::now();
        let page = job.page();
        if !page.is_addressable() {
            return Err(TransferError::InvalidPage {
                index: page.index,
                size: page.size,
            });
        }
        let provider = &self.ctx.provider;

        let mut source = provider
            .open_source(&job.mapping)
            .await
            .map_err(|source| TransferError::Connect {
                side: Side::Source,
                source,
            })?;
        let mut destination =
            provider
                .open_destination()
                .await
                .map_err(|source| TransferError::Connect {
                    side: Side::Destination,
                    source,
                })?;

        let descriptor = self.ctx.registry.resolve(&job.table)?;

        let snapshots = source
            .fetch_page(&descriptor, &page)
            .await
            .map_err(TransferError::Fetch)?;
        if let Err(err) = source.close().await {
            warn!(%err, table = %job.table, page = job.page_index, "Failed to close source connection");
        }
        debug!(
            table = %job.table,
            page = job.page_index,
            worker = worker_id,
            rows = snapshots.len(),
            "Fetched page"
        );

        self.apply(worker_id, job, &descriptor, &snapshots, &mut destination)
            .await?;

        let rows = snapshots.len() as u64;
        drop(snapshots);
        if let Err(err) = destination.close().await {
            warn!(%err, table = %job.table, page = job.page_index, "Failed to close destination connection");
        }

        Ok(PageSummary {
            table: job.table.clone(),
            page_index: job.page_index,
            worker_id,
            rows,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Upserts every snapshot inside one transaction. Any failure rolls the
    /// whole page back.
    async fn apply(
        &self,
        worker_id: WorkerId,
        job: &WorkerJob,
        descriptor: &TableDescriptor,
        snapshots: &[RowSnapshot],
        destination: &mut P::Destination,
    ) -> Result<(), TransferError> {
        let mut progress = self
            .ctx
            .progress
            .page(job.page_index, worker_id, job.page_size);

        destination.begin().await.map_err(TransferError::Begin)?;

        for row in snapshots {
            trace!(table = %job.table, key = ?row.key, label = progress.label(), "merging row");
            if let Err(source) = destination.upsert(descriptor, row).await {
                rollback(destination, job).await;
                return Err(TransferError::Write {
                    key: format_key(&row.key),
                    source,
                });
            }
            progress.tick();
        }

        if let Err(err) = destination.commit().await {
            rollback(destination, job).await;
            return Err(TransferError::Commit(err));
        }
        progress.finish();
        Ok(())
    }
}

async fn rollback<D: DestinationConnection>(destination: &mut D, job: &WorkerJob) {
    if let Err(err) = destination.rollback().await {
        warn!(%err, table = %job.table, page = job.page_index, "Rollback failed");
    }
}

fn format_key(key: &[model::core::value::Value]) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}
