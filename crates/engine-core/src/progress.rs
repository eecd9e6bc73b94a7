use model::core::identifiers::WorkerId;
use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::debug;

#[derive(Debug, Default)]
struct InnerProgress {
    pages_planned: AtomicU64,
    pages_submitted: AtomicU64,
    pages_succeeded: AtomicU64,
    pages_failed: AtomicU64,
    rows_processed: AtomicU64,
}

/// Run-wide counters shared by the dispatcher and every worker. Purely
/// informational; nothing reads them to make decisions.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    inner: Arc<InnerProgress>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub pages_planned: u64,
    pub pages_submitted: u64,
    pub pages_succeeded: u64,
    pub pages_failed: u64,
    pub rows_processed: u64,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_planned(&self, count: u64) {
        self.inner.pages_planned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn page_submitted(&self) {
        self.inner.pages_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_succeeded(&self) {
        self.inner.pages_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_failed(&self) {
        self.inner.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn row_processed(&self) {
        self.inner.rows_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Starts tracking one page on one worker.
    pub fn page(&self, page_index: u64, worker_id: WorkerId, page_size: u64) -> PageProgress {
        PageProgress {
            label: format!("page {page_index} worker {worker_id}"),
            total: page_size.saturating_add(1),
            done: 0,
            reporter: self.clone(),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            pages_planned: self.inner.pages_planned.load(Ordering::Relaxed),
            pages_submitted: self.inner.pages_submitted.load(Ordering::Relaxed),
            pages_succeeded: self.inner.pages_succeeded.load(Ordering::Relaxed),
            pages_failed: self.inner.pages_failed.load(Ordering::Relaxed),
            rows_processed: self.inner.rows_processed.load(Ordering::Relaxed),
        }
    }
}

/// Worker-side progress for a single page: one tick per row plus a
/// terminal tick, out of `page_size + 1`.
#[derive(Debug)]
pub struct PageProgress {
    label: String,
    total: u64,
    done: u64,
    reporter: ProgressReporter,
}

impl PageProgress {
    pub fn tick(&mut self) {
        self.done += 1;
        self.reporter.row_processed();
    }

    pub fn finish(&mut self) {
        self.done += 1;
        debug!(label = %self.label, done = self.done, total = self.total, "Page progress complete");
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
