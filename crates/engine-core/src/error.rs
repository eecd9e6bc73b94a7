use connectors::error::{ConnectorError, DbError};
use model::error::RegistryError;
use serde::Serialize;
use std::{fmt, time::Duration};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Destination => f.write_str("destination"),
        }
    }
}

/// Why a single page transfer failed. A failure never affects other jobs.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Entity lookup failed: {0}")]
    Lookup(#[from] RegistryError),

    #[error("Page {index} of size {size} cannot be addressed with OFFSET/LIMIT")]
    InvalidPage { index: u64, size: u64 },

    #[error("Failed to open {side} connection: {source}")]
    Connect {
        side: Side,
        #[source]
        source: ConnectorError,
    },

    #[error("Failed to fetch page: {0}")]
    Fetch(#[source] DbError),

    #[error("Failed to open destination transaction: {0}")]
    Begin(#[source] DbError),

    #[error("Failed to upsert row {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to commit page: {0}")]
    Commit(#[source] DbError),

    #[error("Page transfer timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Page transfer panicked: {0}")]
    Panicked(String),

    #[error("Page transfer cancelled before it started")]
    Cancelled,
}

impl TransferError {
    /// Short machine-readable category used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Lookup(_) => "lookup",
            TransferError::InvalidPage { .. } => "page",
            TransferError::Connect { .. } => "connect",
            TransferError::Fetch(_) => "fetch",
            TransferError::Begin(_) => "begin",
            TransferError::Write { .. } => "write",
            TransferError::Commit(_) => "commit",
            TransferError::TimedOut(_) => "timeout",
            TransferError::Panicked(_) => "panic",
            TransferError::Cancelled => "cancelled",
        }
    }
}
