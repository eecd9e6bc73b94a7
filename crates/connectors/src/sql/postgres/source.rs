use crate::{
    error::{ConnectorError, DbError},
    sql::{
        base::source::SourceConnection,
        postgres::{
            params::PgParamStore,
            row::to_snapshot,
            utils::{connect_client, ping},
        },
    },
};
use async_trait::async_trait;
use model::{
    entity::descriptor::TableDescriptor,
    records::snapshot::RowSnapshot,
    replication::{mapping::SchemaMapping, page::Page},
};
use planner::query::{self, dialect::Postgres};
use std::collections::HashMap;
use tokio_postgres::{Client, Statement};
use tracing::debug;

/// Source connection that resolves every table reference through a schema
/// mapping, so descriptors bound to the destination schema read the
/// source schema's tables.
pub struct PgSource {
    client: Client,
    dialect: Postgres,
    mapping: SchemaMapping,
    statements: HashMap<String, Statement>,
}

impl PgSource {
    pub async fn connect(url: &str, mapping: SchemaMapping) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        Ok(Self {
            client,
            dialect: Postgres,
            mapping,
            statements: HashMap::new(),
        })
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        ping(&self.client).await
    }

    async fn prepare_cached(&mut self, key: &str, sql: &str) -> Result<Statement, DbError> {
        if let Some(stmt) = self.statements.get(key) {
            return Ok(stmt.clone());
        }
        let stmt = self.client.prepare(sql).await?;
        self.statements.insert(key.to_string(), stmt.clone());
        Ok(stmt)
    }
}

#[async_trait]
impl SourceConnection for PgSource {
    async fn count_rows(&mut self, descriptor: &TableDescriptor) -> Result<u64, DbError> {
        let (sql, _) = query::render(
            &query::count_query(descriptor),
            &self.dialect,
            Some(&self.mapping),
        );
        debug!(table = %descriptor.table, %sql, "Counting rows");

        let row = self.client.query_one(&sql, &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch_page(
        &mut self,
        descriptor: &TableDescriptor,
        page: &Page,
    ) -> Result<Vec<RowSnapshot>, DbError> {
        let (sql, params) = query::render(
            &query::page_query(descriptor, page)?,
            &self.dialect,
            Some(&self.mapping),
        );
        let key = format!("page:{}", descriptor.qualified_name());
        let stmt = self.prepare_cached(&key, &sql).await?;
        debug!(table = %descriptor.table, page = page.index, %sql, "Fetching page");

        let bindings = PgParamStore::for_statement(params, stmt.params());
        let rows = self.client.query(&stmt, &bindings.as_refs()).await?;
        rows.iter()
            .map(|row| to_snapshot(row, descriptor))
            .collect()
    }

    fn release(&mut self) {
        self.statements.clear();
    }

    async fn close(mut self) -> Result<(), DbError> {
        self.statements.clear();
        drop(self.client);
        Ok(())
    }
}
