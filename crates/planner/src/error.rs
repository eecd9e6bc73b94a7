use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Invalid page size {0}: page size must be between 1 and {max}", max = i64::MAX)]
    InvalidPageSize(u64),

    #[error("Page {index} of size {size} cannot be addressed with OFFSET/LIMIT")]
    PageOutOfRange { index: u64, size: u64 },
}
