use crate::error::PlanError;
use model::replication::page::{MAX_ROW_BOUND, Page};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Pages scheduled for one table.
///
/// The page count is `row_count / page_size` rounded down, so a trailing
/// partial page is never scheduled. `trailing_rows` reports how many rows
/// that leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlan {
    pub table: String,
    pub row_count: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl PagePlan {
    pub fn new(table: impl Into<String>, row_count: u64, page_size: u64) -> Result<Self, PlanError> {
        if page_size == 0 || page_size > MAX_ROW_BOUND {
            return Err(PlanError::InvalidPageSize(page_size));
        }

        Ok(Self {
            table: table.into(),
            row_count,
            page_size,
            total_pages: row_count / page_size,
        })
    }

    /// Page indices in ascending order, starting at 1. Empty when no
    /// full page fits.
    pub fn page_indices(&self) -> RangeInclusive<u64> {
        1..=self.total_pages
    }

    pub fn pages(&self) -> impl Iterator<Item = Page> + '_ {
        self.page_indices()
            .map(move |index| Page::new(self.table.clone(), index, self.page_size))
    }

    pub fn rows_scheduled(&self) -> u64 {
        self.total_pages * self.page_size
    }

    pub fn trailing_rows(&self) -> u64 {
        self.row_count % self.page_size
    }

    pub fn is_empty(&self) -> bool {
        self.total_pages == 0
    }
}
