use crate::connectors::ConnectionProvider;
use async_trait::async_trait;
use connectors::{
    error::ConnectorError,
    sql::postgres::{destination::PgDestination, source::PgSource},
};
use model::replication::mapping::SchemaMapping;

#[derive(Clone)]
pub struct PgConnectionProvider {
    source_url: String,
    destination_url: String,
}

impl PgConnectionProvider {
    pub fn new(source_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_url: destination_url.into(),
        }
    }
}

impl std::fmt::Debug for PgConnectionProvider {
    // Connection strings may carry credentials.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnectionProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    type Source = PgSource;
    type Destination = PgDestination;

    async fn open_source(&self, mapping: &SchemaMapping) -> Result<PgSource, ConnectorError> {
        PgSource::connect(&self.source_url, mapping.clone()).await
    }

    async fn open_destination(&self) -> Result<PgDestination, ConnectorError> {
        PgDestination::connect(&self.destination_url).await
    }
}
