use connectors::error::ConnectorError;
use engine_config::error::SettingsError;
use engine_core::error::TransferError;
use model::error::RegistryError;
use thiserror::Error;

/// Errors that stop a whole run. Failures of individual pages or tables are
/// collected in the run report instead.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Entity lookup failed: {0}")]
    Lookup(#[from] RegistryError),

    #[error("Dispatcher could not open the source connection: {0}")]
    Connect(#[from] ConnectorError),

    #[error("Page transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Expected exactly one table, got {0}")]
    SingleTableRequired(usize),

    #[error("Page index must start at 1, got {0}")]
    InvalidPageIndex(u64),

    #[error("Worker pool is no longer accepting jobs")]
    PoolClosed,
}
