use crate::execution::pool::JobOutcome;
use chrono::{DateTime, Utc};
use engine_core::progress::ProgressSnapshot;
use model::core::identifiers::WorkerId;
use planner::plan::PagePlan;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePlanReport {
    pub table: String,
    pub row_count: u64,
    pub page_size: u64,
    pub pages: u64,
    pub rows_scheduled: u64,
    /// Rows past the last full page; never transferred.
    pub trailing_rows: u64,
}

impl From<&PagePlan> for TablePlanReport {
    fn from(plan: &PagePlan) -> Self {
        Self {
            table: plan.table.clone(),
            row_count: plan.row_count,
            page_size: plan.page_size,
            pages: plan.total_pages,
            rows_scheduled: plan.rows_scheduled(),
            trailing_rows: plan.trailing_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningFailure {
    pub table: String,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub table: String,
    pub page: u64,
    pub worker_id: WorkerId,
    pub kind: String,
    pub cause: String,
}

/// Everything an operator needs to decide whether and what to re-run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tables: Vec<TablePlanReport>,
    pub planning_failures: Vec<PlanningFailure>,
    pub job_failures: Vec<JobFailure>,
    pub pages_succeeded: u64,
    pub rows_transferred: u64,
    pub cancelled: bool,
    pub progress: ProgressSnapshot,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            tables: Vec::new(),
            planning_failures: Vec::new(),
            job_failures: Vec::new(),
            pages_succeeded: 0,
            rows_transferred: 0,
            cancelled: false,
            progress: ProgressSnapshot::default(),
        }
    }

    pub fn add_plan(&mut self, plan: &PagePlan) {
        self.tables.push(TablePlanReport::from(plan));
    }

    pub fn add_planning_failure(&mut self, table: &str, cause: impl ToString) {
        self.planning_failures.push(PlanningFailure {
            table: table.to_string(),
            cause: cause.to_string(),
        });
    }

    pub fn record_outcomes(&mut self, outcomes: Vec<JobOutcome>) {
        for outcome in outcomes {
            match outcome.result {
                Ok(summary) => {
                    self.pages_succeeded += 1;
                    self.rows_transferred += summary.rows;
                }
                Err(err) => self.job_failures.push(JobFailure {
                    table: outcome.job.table,
                    page: outcome.job.page_index,
                    worker_id: outcome.worker_id,
                    kind: err.kind().to_string(),
                    cause: err.to_string(),
                }),
            }
        }
        self.job_failures
            .sort_by(|a, b| (&a.table, a.page).cmp(&(&b.table, b.page)));
    }

    pub fn finish(&mut self, progress: ProgressSnapshot) {
        self.progress = progress;
        self.finished_at = Some(Utc::now());
    }

    pub fn pages_planned(&self) -> u64 {
        self.tables.iter().map(|t| t.pages).sum()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.planning_failures.is_empty() && self.job_failures.is_empty()
    }
}
