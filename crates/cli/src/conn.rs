use crate::{commands::ConnectionTarget, error::CliError};
use async_trait::async_trait;
use connectors::sql::postgres::utils::check_connection;
use engine_config::settings::ConnectionSettings;
use tracing::{error, info};

/// Trait for "pinging" a data store
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

/// Postgres pinger for one side of a replication.
pub struct PostgresConnectionPinger {
    pub target: ConnectionTarget,
    conn_str: String,
}

impl PostgresConnectionPinger {
    pub fn new(target: ConnectionTarget, settings: &ConnectionSettings) -> Self {
        let conn_str = match target {
            ConnectionTarget::Source => settings.source_url.clone(),
            ConnectionTarget::Destination => settings.destination_url.clone(),
        };
        Self { target, conn_str }
    }
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        info!(side = ?self.target, "Pinging Postgres");

        check_connection(&self.conn_str).await.map_err(|e| {
            error!(side = ?self.target, "Postgres ping failed: {}", e);
            CliError::Connection(e)
        })?;

        info!(side = ?self.target, "Postgres ping succeeded");
        Ok(())
    }
}
