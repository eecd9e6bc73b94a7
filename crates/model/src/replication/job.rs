use crate::replication::{mapping::SchemaMapping, page::Page};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-contained input for one page transfer. Jobs never reference each
/// other and may run in any order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerJob {
    pub page_index: u64,
    pub table: String,
    pub page_size: u64,
    pub mapping: SchemaMapping,
}

impl WorkerJob {
    pub fn new(
        table: impl Into<String>,
        page_index: u64,
        page_size: u64,
        mapping: SchemaMapping,
    ) -> Self {
        Self {
            page_index,
            table: table.into(),
            page_size,
            mapping,
        }
    }

    pub fn page(&self) -> Page {
        Page::new(self.table.clone(), self.page_index, self.page_size)
    }
}

impl fmt::Display for WorkerJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table, self.page_index)
    }
}
