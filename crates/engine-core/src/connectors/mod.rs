use async_trait::async_trait;
use connectors::{
    error::ConnectorError,
    sql::base::{destination::DestinationConnection, source::SourceConnection},
};
use model::replication::mapping::SchemaMapping;

pub mod postgres;

/// Opens fresh, exclusively owned connections. Every call returns a new
/// connection; nothing is pooled or shared between callers.
#[async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    type Source: SourceConnection + 'static;
    type Destination: DestinationConnection + 'static;

    /// Opens a source connection that reads objects described under
    /// `mapping.destination_schema` from `mapping.source_schema`.
    async fn open_source(&self, mapping: &SchemaMapping) -> Result<Self::Source, ConnectorError>;

    async fn open_destination(&self) -> Result<Self::Destination, ConnectorError>;
}
