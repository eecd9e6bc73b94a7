use crate::error::SettingsError;
use model::replication::{mapping::SchemaMapping, page::MAX_ROW_BOUND};
use std::time::Duration;

pub const DEFAULT_MAX_WORKERS: usize = 30;
pub const DEFAULT_PAGE_SIZE: u64 = 30;
pub const DEFAULT_SCHEMA: &str = "public";

/// Immutable, validated parameters of one replication run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationSettings {
    /// Tables to replicate, deduplicated in the order given.
    pub tables: Vec<String>,
    /// Upper bound on concurrently executing page transfers.
    pub max_workers: usize,
    /// Rows per page.
    pub page_size: u64,
    pub source_schema: String,
    pub destination_schema: String,
    /// Optional bound on a single page transfer.
    pub job_timeout: Option<Duration>,
}

impl ReplicationSettings {
    pub fn new(tables: Vec<String>) -> Self {
        Self {
            tables,
            max_workers: DEFAULT_MAX_WORKERS,
            page_size: DEFAULT_PAGE_SIZE,
            source_schema: DEFAULT_SCHEMA.to_string(),
            destination_schema: DEFAULT_SCHEMA.to_string(),
            job_timeout: None,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_schemas(
        mut self,
        source_schema: impl Into<String>,
        destination_schema: impl Into<String>,
    ) -> Self {
        self.source_schema = source_schema.into();
        self.destination_schema = destination_schema.into();
        self
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Trims table names, drops repeats keeping the first occurrence and
    /// checks every bound.
    pub fn validate(mut self) -> Result<Self, SettingsError> {
        let mut tables: Vec<String> = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let table = table.trim();
            if table.is_empty() {
                return Err(SettingsError::EmptyTableName);
            }
            if !tables.iter().any(|t| t == table) {
                tables.push(table.to_string());
            }
        }
        if tables.is_empty() {
            return Err(SettingsError::NoTables);
        }
        if self.max_workers == 0 {
            return Err(SettingsError::InvalidMaxWorkers);
        }
        if self.page_size == 0 {
            return Err(SettingsError::InvalidPageSize);
        }
        if self.page_size > MAX_ROW_BOUND {
            return Err(SettingsError::PageSizeTooLarge(self.page_size));
        }
        if self.source_schema.trim().is_empty() {
            return Err(SettingsError::EmptySchema("source"));
        }
        if self.destination_schema.trim().is_empty() {
            return Err(SettingsError::EmptySchema("destination"));
        }

        self.tables = tables;
        Ok(self)
    }

    pub fn mapping(&self) -> SchemaMapping {
        SchemaMapping::new(self.source_schema.clone(), self.destination_schema.clone())
    }
}

/// Splits a comma-separated table list.
pub fn parse_tables(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
