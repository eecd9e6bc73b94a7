use connectors::error::ConnectorError;
use engine_config::error::SettingsError;
use engine_runtime::error::ReplicationError;
use model::error::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to load the entity registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to run the replication: {0}")]
    Runner(#[from] ReplicationError),

    #[error("Connection check failed: {0}")]
    Connection(#[from] ConnectorError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error("Replication finished with {failed_pages} failed page(s) and {failed_tables} unplanned table(s)")]
    RunFailed {
        failed_pages: usize,
        failed_tables: usize,
    },

    #[error("Shutdown requested")]
    ShutdownRequested,
}
