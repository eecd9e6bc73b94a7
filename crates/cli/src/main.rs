use crate::{
    commands::{Commands, PagingArgs, job_timeout},
    conn::{ConnectionPinger, PostgresConnectionPinger},
    env::EnvManager,
    error::CliError,
    output::PlanOutput,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::settings::{ConnectionSettings, LogSettings, replication::parse_tables};
use engine_core::connectors::postgres::PgConnectionProvider;
use engine_runtime::execution::executor;
use model::entity::registry::EntityRegistry;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Parser)]
#[command(
    name = "pagecopy",
    version,
    about = "Paginated table replication between PostgreSQL databases"
)]
struct Cli {
    #[arg(long, global = true, help = "Env file to load (defaults to .env when present)")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env = match load_env(cli.env_file.as_deref()) {
        Ok(env) => env,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };
    if let Err(err) = init_logging(&env) {
        eprintln!("{err}");
        std::process::exit(ExitCode::GeneralError.as_i32());
    }

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &env, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => {
            warn!("Replication interrupted by shutdown request");
            ExitCode::ShutdownRequested
        }
        Err(err @ CliError::RunFailed { .. }) => {
            error!("{err}");
            ExitCode::PartialFailure
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

fn load_env(env_file: Option<&Path>) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::new();
    match env_file {
        Some(path) => env.load_from_file(path)?,
        None if Path::new(DEFAULT_ENV_FILE).is_file() => env.load_from_file(DEFAULT_ENV_FILE)?,
        None => {}
    }
    Ok(env)
}

fn init_logging(env: &EnvManager) -> Result<(), CliError> {
    let settings = LogSettings::from_env(env.all())?;
    tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter()?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

async fn run(
    command: Commands,
    env: &EnvManager,
    shutdown: &ShutdownCoordinator,
) -> Result<(), CliError> {
    let connections = ConnectionSettings::from_env(env.all())?;

    match command {
        Commands::MigrateData {
            tables,
            max_workers,
            paging,
            job_timeout_secs,
            output,
        } => {
            let settings = paging
                .settings(parse_tables(&tables))
                .with_max_workers(max_workers)
                .with_job_timeout(job_timeout(job_timeout_secs));
            let (provider, registry) = open(&connections, &paging)?;

            let report =
                executor::run(provider, registry, settings, shutdown.cancel_token()).await?;
            output::emit(&report, output).await?;

            if shutdown.is_shutdown_requested() || report.cancelled {
                return Err(CliError::ShutdownRequested);
            }
            if !report.is_success() {
                return Err(CliError::RunFailed {
                    failed_pages: report.job_failures.len(),
                    failed_tables: report.planning_failures.len(),
                });
            }
            info!(
                pages = report.pages_succeeded,
                rows = report.rows_transferred,
                "Replication completed"
            );
        }
        Commands::TransferPage {
            table,
            page,
            paging,
            job_timeout_secs,
        } => {
            let settings = paging
                .settings(vec![table])
                .with_job_timeout(job_timeout(job_timeout_secs));
            let (provider, registry) = open(&connections, &paging)?;

            let summary = executor::transfer_page(provider, registry, settings, page).await?;
            output::emit(&summary, None).await?;
        }
        Commands::Plan {
            tables,
            paging,
            output,
        } => {
            let settings = paging.settings(parse_tables(&tables));
            let (provider, registry) = open(&connections, &paging)?;

            let plans = executor::plan(provider, registry, settings).await?;
            output::emit(&PlanOutput::new(plans), output).await?;
        }
        Commands::TestConn { target } => {
            PostgresConnectionPinger::new(target, &connections)
                .ping()
                .await?;
        }
    }

    Ok(())
}

fn open(
    connections: &ConnectionSettings,
    paging: &PagingArgs,
) -> Result<(PgConnectionProvider, EntityRegistry), CliError> {
    let registry = EntityRegistry::load(&paging.registry)?;
    info!(
        entities = registry.len(),
        path = %paging.registry.display(),
        "Loaded entity registry"
    );
    debug!(entities = ?registry.entity_names(), "Registered entities");
    let provider = PgConnectionProvider::new(
        connections.source_url.clone(),
        connections.destination_url.clone(),
    );
    Ok((provider, registry))
}
