#[cfg(test)]
mod tests {
    use crate::{
        account, accounts, accounts_descriptor, key_ids,
        memory::{DEFAULT_SCHEMA, MemoryStore},
        order_line, order_lines_descriptor, registry,
    };
    use engine_config::{error::SettingsError, settings::ReplicationSettings};
    use engine_core::error::TransferError;
    use engine_runtime::{
        error::ReplicationError,
        execution::{executor, report::RunReport},
    };
    use model::{core::value::Value, entity::registry::EntityRegistry, error::RegistryError};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn settings(tables: &[&str], max_workers: usize, page_size: u64) -> ReplicationSettings {
        ReplicationSettings::new(tables.iter().map(|t| t.to_string()).collect())
            .with_max_workers(max_workers)
            .with_page_size(page_size)
    }

    async fn run(store: &MemoryStore, settings: ReplicationSettings) -> RunReport {
        let registry = registry(vec![accounts_descriptor(None), order_lines_descriptor(None)]);
        executor::run(store.provider(), registry, settings, CancellationToken::new())
            .await
            .expect("run completes")
    }

    fn seeded(count: i64) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_source(
            DEFAULT_SCHEMA,
            "accounts",
            accounts(&accounts_descriptor(None), count),
        );
        store
    }

    // 95 rows with pages of 30: three pages, 90 rows, rows 91..=95 never copied.
    #[traced_test]
    #[tokio::test]
    async fn trailing_partial_page_is_not_transferred() {
        let store = seeded(95);

        let report = run(&store, settings(&["accounts"], 4, 30)).await;

        let copied = store.destination_rows(DEFAULT_SCHEMA, "accounts");
        assert_eq!(copied.len(), 90);
        assert_eq!(key_ids(&copied), (1..=90).collect::<Vec<_>>());

        assert!(report.is_success());
        assert_eq!(report.pages_planned(), 3);
        assert_eq!(report.pages_succeeded, 3);
        assert_eq!(report.rows_transferred, 90);
        assert_eq!(report.tables[0].trailing_rows, 5);
        assert!(logs_contain("Rows past the last full page will not be transferred"));
    }

    #[tokio::test]
    async fn fewer_rows_than_a_page_plans_nothing() {
        let store = seeded(7);

        let report = run(&store, settings(&["accounts"], 2, 30)).await;

        assert!(report.is_success());
        assert_eq!(report.pages_planned(), 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
        assert_eq!(store.stats().destinations_opened, 0);
    }

    #[tokio::test]
    async fn rerunning_a_page_is_idempotent() {
        let store = seeded(60);
        let page_settings = || settings(&["accounts"], 1, 30);
        let accounts_only = || registry(vec![accounts_descriptor(None)]);

        executor::transfer_page(store.provider(), accounts_only(), page_settings(), 2)
            .await
            .unwrap();
        let once = store.destination_rows(DEFAULT_SCHEMA, "accounts");

        let summary = executor::transfer_page(store.provider(), accounts_only(), page_settings(), 2)
            .await
            .unwrap();
        let twice = store.destination_rows(DEFAULT_SCHEMA, "accounts");

        assert_eq!(summary.rows, 30);
        assert_eq!(once, twice);
        assert_eq!(key_ids(&twice), (31..=60).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn page_zero_is_rejected_before_connecting() {
        let store = seeded(30);

        let err = executor::transfer_page(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 1, 10),
            0,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReplicationError::InvalidPageIndex(0)));
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
        assert_eq!(store.stats().sources_opened, 0);
        assert_eq!(store.stats().destinations_opened, 0);
    }

    #[tokio::test]
    async fn page_size_beyond_bigint_is_rejected() {
        let store = seeded(30);

        let err = executor::transfer_page(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 1, u64::MAX),
            1,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ReplicationError::Settings(SettingsError::PageSizeTooLarge(u64::MAX))
        ));
        assert_eq!(store.stats().sources_opened, 0);
    }

    #[tokio::test]
    async fn overflowing_page_offset_fails_the_page() {
        let store = seeded(30);

        let err = executor::transfer_page(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 1, 1 << 40),
            1 << 40,
        )
        .await
        .unwrap_err();

        let ReplicationError::Transfer(transfer) = err else {
            panic!("expected a transfer failure, got {err:?}");
        };
        assert!(matches!(transfer, TransferError::InvalidPage { .. }));
        assert_eq!(transfer.kind(), "page");
        assert_eq!(store.stats().sources_opened, 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
    }

    #[tokio::test]
    async fn rows_without_source_counterpart_are_kept() {
        let store = seeded(30);
        let descriptor = accounts_descriptor(None);
        store.insert_destination(
            DEFAULT_SCHEMA,
            "accounts",
            vec![account(&descriptor, 1000, "destination-only")],
        );

        run(&store, settings(&["accounts"], 2, 10)).await;

        let rows = store.destination_rows(DEFAULT_SCHEMA, "accounts");
        assert_eq!(rows.len(), 31);
        let kept = rows.last().unwrap();
        assert_eq!(kept.key, vec![Value::Int(1000)]);
        assert_eq!(
            kept.get_value("name"),
            Value::String("destination-only".into())
        );
    }

    #[tokio::test]
    async fn changed_source_row_is_updated_in_place() {
        let store = seeded(20);
        let descriptor = accounts_descriptor(None);
        run(&store, settings(&["accounts"], 2, 10)).await;

        store.insert_source(
            DEFAULT_SCHEMA,
            "accounts",
            vec![account(&descriptor, 4, "renamed")],
        );
        executor::transfer_page(
            store.provider(),
            registry(vec![descriptor.clone()]),
            settings(&["accounts"], 1, 10),
            1,
        )
        .await
        .unwrap();

        let rows = store.destination_rows(DEFAULT_SCHEMA, "accounts");
        assert_eq!(rows.len(), 20);
        let updated: Vec<_> = rows
            .iter()
            .filter(|r| r.key == vec![Value::Int(4)])
            .collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].get_value("name"), Value::String("renamed".into()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sequential_and_parallel_runs_converge() {
        let build = || {
            let store = seeded(200);
            let lines = order_lines_descriptor(None);
            let rows = (1..=40)
                .flat_map(|order| (1..=3).map(move |line| (order, line)))
                .map(|(order, line)| order_line(&lines, order, line))
                .collect();
            store.insert_source(DEFAULT_SCHEMA, "order_lines", rows);
            store
        };

        let sequential = build();
        let parallel = build();
        let seq_report = run(&sequential, settings(&["accounts", "order_lines"], 1, 7)).await;
        let par_report = run(&parallel, settings(&["accounts", "order_lines"], 8, 7)).await;

        assert!(seq_report.is_success() && par_report.is_success());
        assert_eq!(seq_report.rows_transferred, par_report.rows_transferred);
        for table in ["accounts", "order_lines"] {
            assert_eq!(
                sequential.destination_rows(DEFAULT_SCHEMA, table),
                parallel.destination_rows(DEFAULT_SCHEMA, table)
            );
        }
    }

    #[tokio::test]
    async fn failure_on_last_row_discards_whole_page() {
        let store = seeded(30);
        store.fail_on_key("accounts", vec![Value::Int(20)]);

        let report = run(&store, settings(&["accounts"], 3, 10)).await;

        let ids = key_ids(&store.destination_rows(DEFAULT_SCHEMA, "accounts"));
        assert!(ids.iter().all(|id| !(11..=20).contains(id)));
        assert_eq!(ids.len(), 20);

        assert!(!report.is_success());
        assert_eq!(report.job_failures.len(), 1);
        let failure = &report.job_failures[0];
        assert_eq!((failure.table.as_str(), failure.page), ("accounts", 2));
        assert_eq!(failure.kind, "write");
        assert!(failure.cause.contains("20"));
        assert_eq!(store.stats().rollbacks, 1);
    }

    #[tokio::test]
    async fn schema_mapping_reads_source_schema_and_writes_destination_schema() {
        let analytics = accounts_descriptor(Some("analytics"));
        let store = MemoryStore::new();
        store.insert_source("public", "accounts", accounts(&analytics, 30));

        let report = executor::run(
            store.provider(),
            registry(vec![analytics]),
            settings(&["accounts"], 2, 10).with_schemas("public", "analytics"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.is_success());
        assert_eq!(store.destination_rows("analytics", "accounts").len(), 30);
        assert!(store.destination_rows("public", "accounts").is_empty());
    }

    #[tokio::test]
    async fn unregistered_table_fails_before_dispatch() {
        let store = seeded(30);

        let err = executor::run(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts", "audit_log"], 2, 10),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            ReplicationError::Lookup(RegistryError::NotRegistered { table, entity }) => {
                assert_eq!(table, "audit_log");
                assert_eq!(entity, "AuditLog");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.stats().sources_opened, 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
    }

    #[tokio::test]
    async fn planning_failure_does_not_stop_other_tables() {
        // order_lines is registered but missing from the source.
        let store = seeded(30);

        let report = run(&store, settings(&["order_lines", "accounts"], 2, 10)).await;

        assert!(!report.is_success());
        assert_eq!(report.planning_failures.len(), 1);
        assert_eq!(report.planning_failures[0].table, "order_lines");
        assert_eq!(report.pages_succeeded, 3);
        assert_eq!(store.destination_rows(DEFAULT_SCHEMA, "accounts").len(), 30);
    }

    #[tokio::test]
    async fn destination_outage_fails_each_job_individually() {
        let store = seeded(30);
        store.refuse_destination_connections();

        let report = run(&store, settings(&["accounts"], 2, 10)).await;

        assert_eq!(report.job_failures.len(), 3);
        assert!(report.job_failures.iter().all(|f| f.kind == "connect"));
        let pages: Vec<u64> = report.job_failures.iter().map(|f| f.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(report.progress.pages_failed, 3);
    }

    #[tokio::test]
    async fn worker_source_outage_fails_each_job_individually() {
        let store = seeded(30);
        store.insert_source(
            DEFAULT_SCHEMA,
            "order_lines",
            vec![order_line(&order_lines_descriptor(None), 1, 1)],
        );
        store.refuse_worker_source_connections();

        let report = run(&store, settings(&["accounts", "order_lines"], 2, 10)).await;

        assert_eq!(report.pages_planned(), 3);
        assert_eq!(report.job_failures.len(), 3);
        for failure in &report.job_failures {
            assert_eq!(failure.kind, "connect");
            assert!(failure.cause.contains("source connection"), "{}", failure.cause);
        }
        let pages: Vec<u64> = report.job_failures.iter().map(|f| f.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert!(report.planning_failures.is_empty());
        assert_eq!(store.stats().sources_opened, 1);
        assert_eq!(store.stats().destinations_opened, 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
    }

    #[tokio::test]
    async fn source_outage_is_a_run_error() {
        let store = seeded(30);
        store.refuse_source_connections();

        let err = run_err(&store).await;
        assert!(matches!(err, ReplicationError::Connect(_)));
    }

    async fn run_err(store: &MemoryStore) -> ReplicationError {
        executor::run(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 2, 10),
            CancellationToken::new(),
        )
        .await
        .unwrap_err()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_flight_transfers_never_exceed_max_workers() {
        let store = seeded(120);
        store.set_row_delay(Duration::from_millis(2));

        let report = run(&store, settings(&["accounts"], 3, 5)).await;

        assert!(report.is_success());
        assert_eq!(report.pages_succeeded, 24);
        let stats = store.stats();
        assert!(stats.max_open_destinations <= 3);
        assert!(stats.max_open_destinations >= 1);
    }

    #[tokio::test]
    async fn every_connection_is_closed() {
        let store = seeded(50);

        run(&store, settings(&["accounts"], 4, 10)).await;

        let stats = store.stats();
        // One source for the dispatcher plus one per page.
        assert_eq!(stats.sources_opened, 6);
        assert_eq!(stats.sources_closed, 6);
        assert_eq!(stats.destinations_opened, 5);
        assert_eq!(stats.destinations_closed, 5);
        assert_eq!(stats.open_destinations, 0);
        assert_eq!(stats.commits, 5);
    }

    #[tokio::test]
    async fn dispatcher_releases_query_state_between_tables() {
        let store = seeded(20);
        let lines = order_lines_descriptor(None);
        store.insert_source(
            DEFAULT_SCHEMA,
            "order_lines",
            vec![order_line(&lines, 1, 1), order_line(&lines, 1, 2)],
        );

        run(&store, settings(&["accounts", "order_lines"], 2, 10)).await;

        assert!(store.stats().source_releases >= 2);
    }

    #[tokio::test]
    async fn panicking_page_is_reported_and_others_finish() {
        let store = seeded(30);
        store.panic_on_key("accounts", vec![Value::Int(15)]);

        let report = run(&store, settings(&["accounts"], 1, 10)).await;

        assert_eq!(report.pages_succeeded, 2);
        assert_eq!(report.job_failures.len(), 1);
        assert_eq!(report.job_failures[0].kind, "panic");
        assert_eq!(report.job_failures[0].page, 2);
        assert_eq!(store.destination_rows(DEFAULT_SCHEMA, "accounts").len(), 20);
    }

    #[tokio::test]
    async fn timed_out_page_rolls_back() {
        let store = seeded(10);
        store.set_row_delay(Duration::from_millis(50));

        let report = run(
            &store,
            settings(&["accounts"], 1, 10).with_job_timeout(Some(Duration::from_millis(120))),
        )
        .await;

        assert_eq!(report.job_failures.len(), 1);
        assert_eq!(report.job_failures[0].kind, "timeout");
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
        assert_eq!(store.stats().open_destinations, 0);
    }

    #[tokio::test]
    async fn cancelled_before_start_submits_nothing() {
        let store = seeded(30);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = executor::run(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 2, 10),
            cancel,
        )
        .await
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.progress.pages_submitted, 0);
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancellation_mid_run_keeps_committed_pages_whole() {
        let store = seeded(100);
        store.set_row_delay(Duration::from_millis(5));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            trigger.cancel();
        });

        let report = executor::run(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 1, 5),
            cancel,
        )
        .await
        .unwrap();

        assert!(report.cancelled);
        assert!(report.pages_succeeded < 20);
        let copied = store.destination_rows(DEFAULT_SCHEMA, "accounts").len();
        assert_eq!(copied % 5, 0);
        assert_eq!(copied as u64, report.rows_transferred);
    }

    #[traced_test]
    #[tokio::test]
    async fn dispatch_is_logged_per_page() {
        let store = seeded(20);

        let report = run(&store, settings(&["accounts"], 2, 10)).await;

        assert_eq!(report.progress.pages_submitted, 2);
        assert_eq!(report.progress.rows_processed, 20);
        assert!(logs_contain("sending page 1"));
        assert!(logs_contain("sending page 2"));
        assert!(!logs_contain("sending page 3"));
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let store = seeded(10);

        let err = executor::run(
            store.provider(),
            registry(vec![accounts_descriptor(None)]),
            settings(&["accounts"], 0, 10),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReplicationError::Settings(_)));
        assert_eq!(store.stats().sources_opened, 0);
    }

    #[tokio::test]
    async fn plan_reports_trailing_rows_without_copying() {
        let store = seeded(95);

        let plans = executor::plan(
            store.provider(),
            registry(vec![accounts_descriptor(None), order_lines_descriptor(None)]),
            settings(&["accounts", "order_lines"], 2, 30),
        )
        .await
        .unwrap();

        let accounts_plan = plans[0].as_ref().unwrap();
        assert_eq!(accounts_plan.total_pages, 3);
        assert_eq!(accounts_plan.trailing_rows(), 5);
        assert_eq!(plans[1].as_ref().unwrap_err().table, "order_lines");
        assert!(store.destination_rows(DEFAULT_SCHEMA, "accounts").is_empty());
    }

    #[tokio::test]
    async fn registry_file_drives_a_run() {
        let store = seeded(20);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{
                "entities": [
                    {
                        "table": "accounts",
                        "columns": [{ "name": "id" }, { "name": "name" }, { "name": "balance" }],
                        "primary_key": ["id"]
                    }
                ]
            }"#,
        )
        .unwrap();
        let registry = EntityRegistry::load(&path).unwrap();

        let report = executor::run(
            store.provider(),
            registry,
            settings(&["accounts"], 2, 10),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.is_success());
        assert_eq!(store.destination_rows(DEFAULT_SCHEMA, "accounts").len(), 20);
    }

    #[tokio::test]
    async fn report_serialises_failed_pages() {
        let store = seeded(20);
        store.fail_on_key("accounts", vec![Value::Int(3)]);

        let report = run(&store, settings(&["accounts"], 2, 10)).await;
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["job_failures"][0]["table"], "accounts");
        assert_eq!(json["job_failures"][0]["page"], 1);
        assert_eq!(json["job_failures"][0]["kind"], "write");
        assert_eq!(json["tables"][0]["pages"], 2);
        assert_eq!(json["pages_succeeded"], 1);
        assert_eq!(json["cancelled"], false);
    }
}
