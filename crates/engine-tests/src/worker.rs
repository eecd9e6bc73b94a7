#[cfg(test)]
mod tests {
    use crate::{
        accounts, accounts_descriptor, key_ids,
        memory::{DEFAULT_SCHEMA, MemoryStore},
        order_line, order_lines_descriptor, registry,
    };
    use engine_core::{
        context::ReplicationContext,
        error::{Side, TransferError},
        worker::PageTransferWorker,
    };
    use model::{
        core::value::Value,
        replication::{job::WorkerJob, mapping::SchemaMapping},
    };
    use tracing_test::traced_test;

    fn worker(store: &MemoryStore) -> PageTransferWorker<crate::memory::MemoryProvider> {
        let ctx = ReplicationContext::new(
            store.provider(),
            registry(vec![accounts_descriptor(None), order_lines_descriptor(None)]),
        );
        PageTransferWorker::new(ctx)
    }

    #[traced_test]
    #[tokio::test]
    async fn transfers_exactly_one_page_window() {
        let store = MemoryStore::new();
        store.insert_source(DEFAULT_SCHEMA, "accounts", accounts(&accounts_descriptor(None), 25));
        let worker = worker(&store);

        let job = WorkerJob::new("accounts", 3, 10, SchemaMapping::default());
        let summary = worker.transfer(7, &job).await.unwrap();

        assert_eq!(summary.rows, 5);
        assert_eq!(summary.worker_id, 7);
        assert_eq!(
            key_ids(&store.destination_rows(DEFAULT_SCHEMA, "accounts")),
            (21..=25).collect::<Vec<_>>()
        );
        assert_eq!(worker.progress().snapshot().rows_processed, 5);
        assert!(logs_contain("merging row"));
        assert!(logs_contain("page 3 worker 7"));
    }

    #[tokio::test]
    async fn pages_follow_composite_key_order() {
        let store = MemoryStore::new();
        let lines = order_lines_descriptor(None);
        // Inserted out of order on purpose.
        store.insert_source(
            DEFAULT_SCHEMA,
            "order_lines",
            vec![
                order_line(&lines, 2, 1),
                order_line(&lines, 1, 2),
                order_line(&lines, 1, 1),
                order_line(&lines, 2, 2),
            ],
        );
        let worker = worker(&store);

        let job = WorkerJob::new("order_lines", 1, 3, SchemaMapping::default());
        worker.transfer(0, &job).await.unwrap();

        let keys: Vec<Vec<Value>> = store
            .destination_rows(DEFAULT_SCHEMA, "order_lines")
            .into_iter()
            .map(|row| row.key)
            .collect();
        assert_eq!(
            keys,
            vec![
                vec![Value::Int(1), Value::Int32(1)],
                vec![Value::Int(1), Value::Int32(2)],
                vec![Value::Int(2), Value::Int32(1)],
            ]
        );
    }

    #[tokio::test]
    async fn unknown_table_is_a_lookup_failure() {
        let store = MemoryStore::new();
        let worker = worker(&store);

        let job = WorkerJob::new("invoices", 1, 10, SchemaMapping::default());
        let err = worker.transfer(0, &job).await.unwrap_err();

        assert!(matches!(err, TransferError::Lookup(_)));
        assert_eq!(err.kind(), "lookup");
    }

    #[tokio::test]
    async fn refused_destination_reports_the_side() {
        let store = MemoryStore::new();
        store.insert_source(DEFAULT_SCHEMA, "accounts", accounts(&accounts_descriptor(None), 10));
        store.refuse_destination_connections();
        let worker = worker(&store);

        let job = WorkerJob::new("accounts", 1, 10, SchemaMapping::default());
        let err = worker.transfer(0, &job).await.unwrap_err();

        assert!(matches!(
            err,
            TransferError::Connect {
                side: Side::Destination,
                ..
            }
        ));
        assert_eq!(err.kind(), "connect");
        assert!(err.to_string().contains("destination"));
    }

    #[tokio::test]
    async fn refused_source_reports_the_side() {
        let store = MemoryStore::new();
        store.insert_source(DEFAULT_SCHEMA, "accounts", accounts(&accounts_descriptor(None), 10));
        store.refuse_source_connections();
        let worker = worker(&store);

        let job = WorkerJob::new("accounts", 1, 10, SchemaMapping::default());
        let err = worker.transfer(0, &job).await.unwrap_err();

        assert!(matches!(
            err,
            TransferError::Connect {
                side: Side::Source,
                ..
            }
        ));
        assert_eq!(err.kind(), "connect");
        assert_eq!(store.stats().destinations_opened, 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
    }

    #[tokio::test]
    async fn page_past_the_end_commits_nothing() {
        let store = MemoryStore::new();
        store.insert_source(DEFAULT_SCHEMA, "accounts", accounts(&accounts_descriptor(None), 10));
        let worker = worker(&store);

        let job = WorkerJob::new("accounts", 5, 10, SchemaMapping::default());
        let summary = worker.transfer(0, &job).await.unwrap();

        assert_eq!(summary.rows, 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
        assert_eq!(store.stats().commits, 1);
    }
}
