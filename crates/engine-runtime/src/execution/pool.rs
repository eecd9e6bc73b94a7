use crate::error::ReplicationError;
use engine_core::{
    connectors::ConnectionProvider,
    context::ReplicationContext,
    error::TransferError,
    progress::ProgressReporter,
    worker::{PageSummary, PageTransferWorker},
};
use model::{core::identifiers::WorkerId, replication::job::WorkerJob};
use std::{any::Any, sync::Arc};
use tokio::{
    sync::{Mutex, mpsc},
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Result of one submitted job, successful or not.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: WorkerJob,
    pub worker_id: WorkerId,
    pub result: Result<PageSummary, TransferError>,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<WorkerJob>>>;

/// A fixed set of worker tasks fed through a bounded job queue.
///
/// `submit` waits once the queue holds `max_workers` pending jobs. Each job
/// runs in its own spawned task, so a panicking transfer is reported as a
/// failed outcome and its worker keeps serving the queue.
pub struct WorkerPool {
    jobs: mpsc::Sender<WorkerJob>,
    outcomes: mpsc::UnboundedReceiver<JobOutcome>,
    workers: JoinSet<()>,
    progress: ProgressReporter,
    submitted: u64,
}

impl WorkerPool {
    pub fn start<P: ConnectionProvider>(
        ctx: ReplicationContext<P>,
        max_workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        let max_workers = max_workers.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel::<WorkerJob>(max_workers);
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel::<JobOutcome>();
        let queue: JobQueue = Arc::new(Mutex::new(jobs_rx));
        let progress = ctx.progress.clone();
        let worker = Arc::new(PageTransferWorker::new(ctx));

        let mut workers = JoinSet::new();
        for worker_id in 0..max_workers {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&worker),
                Arc::clone(&queue),
                outcomes_tx.clone(),
                cancel.clone(),
            ));
        }
        debug!(max_workers, "Worker pool started");

        Self {
            jobs: jobs_tx,
            outcomes: outcomes_rx,
            workers,
            progress,
            submitted: 0,
        }
    }

    /// Queues a job, waiting while the queue is full.
    pub async fn submit(&mut self, job: WorkerJob) -> Result<(), ReplicationError> {
        self.jobs
            .send(job)
            .await
            .map_err(|_| ReplicationError::PoolClosed)?;
        self.submitted += 1;
        self.progress.page_submitted();
        Ok(())
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Closes the queue and waits for every submitted job to finish.
    pub async fn join(self) -> Vec<JobOutcome> {
        let WorkerPool {
            jobs,
            mut outcomes,
            mut workers,
            submitted,
            ..
        } = self;
        drop(jobs);

        let mut results = Vec::with_capacity(usize::try_from(submitted).unwrap_or_default());
        while let Some(outcome) = outcomes.recv().await {
            results.push(outcome);
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(%err, "Worker task ended abnormally");
            }
        }

        if results.len() as u64 != submitted {
            warn!(
                submitted,
                finished = results.len(),
                "Some submitted jobs produced no outcome"
            );
        }
        results
    }
}

async fn worker_loop<P: ConnectionProvider>(
    worker_id: WorkerId,
    worker: Arc<PageTransferWorker<P>>,
    queue: JobQueue,
    outcomes: mpsc::UnboundedSender<JobOutcome>,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(job) = next else {
            break;
        };

        let result = if cancel.is_cancelled() {
            Err(TransferError::Cancelled)
        } else {
            run_isolated(worker_id, Arc::clone(&worker), job.clone()).await
        };

        match &result {
            Ok(summary) => {
                worker.progress().page_succeeded();
                debug!(
                    worker = worker_id,
                    table = %summary.table,
                    page = summary.page_index,
                    rows = summary.rows,
                    elapsed_ms = summary.elapsed_ms,
                    "Page transferred"
                );
            }
            Err(err) => {
                worker.progress().page_failed();
                error!(
                    worker = worker_id,
                    table = %job.table,
                    page = job.page_index,
                    kind = err.kind(),
                    %err,
                    "Page transfer failed"
                );
            }
        }

        let outcome = JobOutcome {
            job,
            worker_id,
            result,
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}

async fn run_isolated<P: ConnectionProvider>(
    worker_id: WorkerId,
    worker: Arc<PageTransferWorker<P>>,
    job: WorkerJob,
) -> Result<PageSummary, TransferError> {
    let handle = tokio::spawn(async move { worker.transfer(worker_id, &job).await });
    match handle.await {
        Ok(result) => result,
        Err(err) => Err(TransferError::Panicked(join_error_message(err))),
    }
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
