use clap::{Args, Subcommand, ValueEnum};
use engine_config::settings::replication::{
    DEFAULT_MAX_WORKERS, DEFAULT_PAGE_SIZE, DEFAULT_SCHEMA, ReplicationSettings,
};
use model::replication::page::MAX_ROW_BOUND;
use std::{path::PathBuf, time::Duration};

#[derive(Subcommand)]
pub enum Commands {
    /// Replicate every page of the given tables into the destination
    MigrateData {
        #[arg(long, help = "Comma-separated list of tables to replicate")]
        tables: String,

        #[arg(long, default_value_t = DEFAULT_MAX_WORKERS, help = "Maximum number of concurrent page transfers")]
        max_workers: usize,

        #[command(flatten)]
        paging: PagingArgs,

        #[arg(long, help = "Abort a single page transfer after this many seconds")]
        job_timeout_secs: Option<u64>,

        #[arg(
            long,
            help = "If specified, writes the JSON run report to this file instead of stdout"
        )]
        output: Option<PathBuf>,
    },
    /// Re-run a single page of one table
    TransferPage {
        #[arg(long, help = "Table to transfer")]
        table: String,

        #[arg(long, value_parser = clap::value_parser!(u64).range(1..), help = "1-based page index")]
        page: u64,

        #[command(flatten)]
        paging: PagingArgs,

        #[arg(long, help = "Abort the transfer after this many seconds")]
        job_timeout_secs: Option<u64>,
    },
    /// Print the page plan of the given tables without transferring anything
    Plan {
        #[arg(long, help = "Comma-separated list of tables to plan")]
        tables: String,

        #[command(flatten)]
        paging: PagingArgs,

        #[arg(long, help = "If specified, writes the JSON plan to this file instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Open a connection and run `SELECT 1`
    TestConn {
        #[arg(long, value_enum)]
        target: ConnectionTarget,
    },
}

/// Options shared by every command that schedules pages.
#[derive(Args, Debug, Clone)]
pub struct PagingArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u64).range(1..=MAX_ROW_BOUND),
        help = "Rows per page"
    )]
    pub page_size: u64,

    #[arg(long, default_value = DEFAULT_SCHEMA, help = "Schema the rows are read from")]
    pub source_schema: String,

    #[arg(long, default_value = DEFAULT_SCHEMA, help = "Schema the entity registry describes and rows are written to")]
    pub destination_schema: String,

    #[arg(long, default_value = "model.json", help = "Entity registry file")]
    pub registry: PathBuf,
}

impl PagingArgs {
    pub fn settings(&self, tables: Vec<String>) -> ReplicationSettings {
        ReplicationSettings::new(tables)
            .with_page_size(self.page_size)
            .with_schemas(&self.source_schema, &self.destination_schema)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionTarget {
    Source,
    Destination,
}

pub fn job_timeout(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}
