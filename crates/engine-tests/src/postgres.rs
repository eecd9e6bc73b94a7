#[cfg(test)]
mod tests {
    use crate::{accounts_descriptor, pg_url, registry};
    use connectors::sql::postgres::utils::{check_connection, connect_client};
    use engine_config::settings::ReplicationSettings;
    use engine_core::connectors::postgres::PgConnectionProvider;
    use engine_runtime::execution::{executor, report::RunReport};
    use model::entity::descriptor::{ColumnDescriptor, TableDescriptor};
    use tokio_postgres::Client;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    /// Source and destination schema of one test; tests run concurrently
    /// against the same database so each uses its own pair.
    struct Schemas {
        source: String,
        destination: String,
    }

    impl Schemas {
        fn new(prefix: &str) -> Self {
            Self {
                source: format!("{prefix}_src"),
                destination: format!("{prefix}_dst"),
            }
        }
    }

    /// Recreates both schemas with an `accounts` table; the source gets
    /// `rows` rows.
    async fn reset(client: &Client, schemas: &Schemas, rows: i64) {
        let (src, dst) = (&schemas.source, &schemas.destination);
        client
            .batch_execute(&format!(
                r#"
                DROP SCHEMA IF EXISTS {src} CASCADE;
                DROP SCHEMA IF EXISTS {dst} CASCADE;
                CREATE SCHEMA {src};
                CREATE SCHEMA {dst};
                CREATE TABLE {src}.accounts (
                    id BIGINT PRIMARY KEY,
                    name TEXT NOT NULL,
                    balance BIGINT
                );
                CREATE TABLE {dst}.accounts (
                    id BIGINT PRIMARY KEY,
                    name TEXT NOT NULL,
                    balance BIGINT
                );
                INSERT INTO {src}.accounts (id, name, balance)
                SELECT g, 'account-' || g, CASE WHEN g % 7 = 0 THEN NULL ELSE g * 10 END
                FROM generate_series(1, {rows}) AS g;
                "#
            ))
            .await
            .expect("reset schemas");
    }

    async fn count(client: &Client, sql: &str) -> i64 {
        client.query_one(sql, &[]).await.expect("count").get(0)
    }

    async fn replicate(url: &str, schemas: &Schemas, max_workers: usize) -> RunReport {
        let settings = ReplicationSettings::new(vec!["accounts".into()])
            .with_max_workers(max_workers)
            .with_page_size(30)
            .with_schemas(&schemas.source, &schemas.destination);
        executor::run(
            PgConnectionProvider::new(url, url),
            registry(vec![accounts_descriptor(Some(&schemas.destination))]),
            settings,
            CancellationToken::new(),
        )
        .await
        .expect("replication run")
    }

    #[traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn replicates_full_pages_across_schemas() {
        let Some(url) = pg_url() else {
            return;
        };
        let client = connect_client(&url).await.expect("connect postgres");
        let schemas = Schemas::new("pagecopy_full");
        let dst = &schemas.destination;
        reset(&client, &schemas, 95).await;

        let report = replicate(&url, &schemas, 4).await;

        assert!(report.is_success(), "{:?}", report.job_failures);
        assert_eq!(report.rows_transferred, 90);
        assert_eq!(
            count(&client, &format!("SELECT COUNT(*) FROM {dst}.accounts")).await,
            90
        );
        assert_eq!(
            count(
                &client,
                &format!("SELECT COUNT(*) FROM {dst}.accounts WHERE id > 90")
            )
            .await,
            0
        );
        assert_eq!(
            count(
                &client,
                &format!("SELECT COUNT(*) FROM {dst}.accounts WHERE balance IS NULL")
            )
            .await,
            12
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rerun_updates_in_place_and_keeps_extra_rows() {
        let Some(url) = pg_url() else {
            return;
        };
        let client = connect_client(&url).await.expect("connect postgres");
        let schemas = Schemas::new("pagecopy_rerun");
        let (src, dst) = (&schemas.source, &schemas.destination);
        reset(&client, &schemas, 60).await;
        client
            .batch_execute(&format!(
                "INSERT INTO {dst}.accounts (id, name, balance) VALUES (5000, 'kept', 1);"
            ))
            .await
            .unwrap();

        replicate(&url, &schemas, 2).await;
        client
            .batch_execute(&format!(
                "UPDATE {src}.accounts SET name = 'renamed' WHERE id = 3;"
            ))
            .await
            .unwrap();
        let report = replicate(&url, &schemas, 1).await;

        assert!(report.is_success());
        assert_eq!(
            count(&client, &format!("SELECT COUNT(*) FROM {dst}.accounts")).await,
            61
        );
        let name: String = client
            .query_one(
                &format!("SELECT name FROM {dst}.accounts WHERE id = 3"),
                &[],
            )
            .await
            .unwrap()
            .get(0);
        assert_eq!(name, "renamed");
    }

    #[tokio::test]
    async fn missing_destination_table_fails_every_page() {
        let Some(url) = pg_url() else {
            return;
        };
        let client = connect_client(&url).await.expect("connect postgres");
        let schemas = Schemas::new("pagecopy_missing");
        let dst = &schemas.destination;
        reset(&client, &schemas, 60).await;
        client
            .batch_execute(&format!("DROP TABLE {dst}.accounts;"))
            .await
            .unwrap();

        let report = replicate(&url, &schemas, 2).await;

        assert_eq!(report.job_failures.len(), 2);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn numerics_outside_decimal_range_are_copied_verbatim() {
        let Some(url) = pg_url() else {
            return;
        };
        let client = connect_client(&url).await.expect("connect postgres");
        let schemas = Schemas::new("pagecopy_numeric");
        let (src, dst) = (&schemas.source, &schemas.destination);
        client
            .batch_execute(&format!(
                r#"
                DROP SCHEMA IF EXISTS {src} CASCADE;
                DROP SCHEMA IF EXISTS {dst} CASCADE;
                CREATE SCHEMA {src};
                CREATE SCHEMA {dst};
                CREATE TABLE {src}.ledger (id BIGINT PRIMARY KEY, amount NUMERIC);
                CREATE TABLE {dst}.ledger (id BIGINT PRIMARY KEY, amount NUMERIC);
                INSERT INTO {src}.ledger (id, amount) VALUES
                    (1, 'NaN'),
                    (2, 1234567890123456789012345678901234567890.123456789),
                    (3, -0.0001),
                    (4, 12.50);
                "#
            ))
            .await
            .expect("create ledger");
        let ledger = TableDescriptor {
            entity: "Ledger".into(),
            table: "ledger".into(),
            schema: Some(dst.clone()),
            columns: vec![ColumnDescriptor::new("id"), ColumnDescriptor::new("amount")],
            primary_key: vec!["id".into()],
        };

        let report = executor::run(
            PgConnectionProvider::new(&url, &url),
            registry(vec![ledger]),
            ReplicationSettings::new(vec!["ledger".into()])
                .with_page_size(2)
                .with_schemas(src, dst),
            CancellationToken::new(),
        )
        .await
        .expect("replication run");

        assert!(report.is_success(), "{:?}", report.job_failures);
        let amounts = |schema: String| {
            let client = &client;
            async move {
                client
                    .query(
                        &format!("SELECT amount::text FROM {schema}.ledger ORDER BY id"),
                        &[],
                    )
                    .await
                    .expect("read amounts")
                    .iter()
                    .map(|row| row.get::<_, String>(0))
                    .collect::<Vec<_>>()
            }
        };
        assert_eq!(amounts(src.clone()).await, amounts(dst.clone()).await);
    }

    #[tokio::test]
    async fn connection_check_succeeds() {
        let Some(url) = pg_url() else {
            return;
        };
        check_connection(&url).await.unwrap();
    }
}
