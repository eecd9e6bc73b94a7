use crate::error::CliError;
use engine_runtime::execution::report::{PlanningFailure, TablePlanReport};
use planner::plan::PagePlan;
use serde::Serialize;
use std::path::PathBuf;

/// Result of the `plan` command.
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub tables: Vec<TablePlanReport>,
    pub failures: Vec<PlanningFailure>,
}

impl PlanOutput {
    pub fn new(plans: Vec<Result<PagePlan, PlanningFailure>>) -> Self {
        let mut output = PlanOutput {
            tables: Vec::new(),
            failures: Vec::new(),
        };
        for plan in plans {
            match plan {
                Ok(plan) => output.tables.push(TablePlanReport::from(&plan)),
                Err(failure) => output.failures.push(failure),
            }
        }
        output
    }
}

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is
/// given.
pub async fn emit<T: Serialize>(value: &T, path: Option<PathBuf>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => tokio::fs::write(path, json).await?,
        None => println!("{json}"),
    }
    Ok(())
}
