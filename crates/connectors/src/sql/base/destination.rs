use crate::error::DbError;
use async_trait::async_trait;
use model::{entity::descriptor::TableDescriptor, records::snapshot::RowSnapshot};

/// Write side of a replication. Every upsert happens inside an explicit
/// transaction so a page is applied all-or-nothing.
#[async_trait]
pub trait DestinationConnection: Send {
    async fn begin(&mut self) -> Result<(), DbError>;

    /// Inserts `row`, or overwrites the non-key columns of the row with the
    /// same primary key. Never deletes.
    async fn upsert(
        &mut self,
        descriptor: &TableDescriptor,
        row: &RowSnapshot,
    ) -> Result<(), DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;

    async fn rollback(&mut self) -> Result<(), DbError>;

    /// Rolls back any open transaction and closes the connection.
    async fn close(self) -> Result<(), DbError>;
}
