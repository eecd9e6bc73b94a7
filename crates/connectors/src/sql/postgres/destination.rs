use crate::{
    error::{ConnectorError, DbError},
    sql::{
        base::destination::DestinationConnection,
        postgres::{
            params::PgParamStore,
            utils::{connect_client, ping},
        },
    },
};
use async_trait::async_trait;
use model::{entity::descriptor::TableDescriptor, records::snapshot::RowSnapshot};
use planner::query::{self, dialect::Postgres};
use std::collections::HashMap;
use tokio_postgres::{Client, Statement};
use tracing::{trace, warn};

pub struct PgDestination {
    client: Client,
    dialect: Postgres,
    statements: HashMap<String, Statement>,
    in_transaction: bool,
}

impl PgDestination {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        Ok(Self {
            client,
            dialect: Postgres,
            statements: HashMap::new(),
            in_transaction: false,
        })
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        ping(&self.client).await
    }

    async fn upsert_statement(&mut self, descriptor: &TableDescriptor) -> Result<Statement, DbError> {
        let key = descriptor.qualified_name();
        if let Some(stmt) = self.statements.get(&key) {
            return Ok(stmt.clone());
        }
        let (sql, _) = query::render(
            &query::upsert_query(descriptor),
            &self.dialect,
            None,
        );
        let stmt = self.client.prepare(&sql).await?;
        self.statements.insert(key, stmt.clone());
        Ok(stmt)
    }

    fn ensure_transaction(&self, op: &str) -> Result<(), DbError> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(DbError::Transaction(format!("{op} outside a transaction")))
        }
    }
}

#[async_trait]
impl DestinationConnection for PgDestination {
    async fn begin(&mut self) -> Result<(), DbError> {
        if self.in_transaction {
            return Err(DbError::Transaction("transaction already open".into()));
        }
        self.client.batch_execute("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn upsert(
        &mut self,
        descriptor: &TableDescriptor,
        row: &RowSnapshot,
    ) -> Result<(), DbError> {
        self.ensure_transaction("upsert")?;
        let stmt = self.upsert_statement(descriptor).await?;
        let values = row.values_for(&descriptor.column_names());
        let bindings = PgParamStore::for_statement(values, stmt.params());

        let affected = self.client.execute(&stmt, &bindings.as_refs()).await?;
        trace!(table = %descriptor.table, key = ?row.key, affected, "Upserted row");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.ensure_transaction("commit")?;
        self.in_transaction = false;
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.client.batch_execute("ROLLBACK").await?;
        Ok(())
    }

    async fn close(mut self) -> Result<(), DbError> {
        if self.in_transaction {
            warn!("Closing destination connection with an open transaction, rolling back");
            self.rollback().await?;
        }
        self.statements.clear();
        drop(self.client);
        Ok(())
    }
}
