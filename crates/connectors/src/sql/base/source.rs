use crate::error::DbError;
use async_trait::async_trait;
use model::{
    entity::descriptor::TableDescriptor, records::snapshot::RowSnapshot, replication::page::Page,
};

/// Read side of a replication. A connection is owned by exactly one worker
/// or dispatcher and is never shared.
#[async_trait]
pub trait SourceConnection: Send {
    async fn count_rows(&mut self, descriptor: &TableDescriptor) -> Result<u64, DbError>;

    /// Fetches the rows of `page` ordered by primary key and detaches them
    /// from the connection.
    async fn fetch_page(
        &mut self,
        descriptor: &TableDescriptor,
        page: &Page,
    ) -> Result<Vec<RowSnapshot>, DbError>;

    /// Drops any query state cached for previously visited tables.
    fn release(&mut self);

    async fn close(self) -> Result<(), DbError>;
}
