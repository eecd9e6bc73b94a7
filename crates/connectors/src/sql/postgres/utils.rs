use crate::error::{ConnectorError, DbError};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

/// Opens a client honouring the `sslmode` of `url` and spawns its
/// connection driver.
pub async fn connect_client(url: &str) -> Result<Client, ConnectorError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
    let ssl_mode = config.get_ssl_mode();

    match ssl_mode {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Require => connect_with_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

async fn connect_with_tls(config: Config) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

/// Runs `SELECT 1` and checks the answer.
pub async fn ping(client: &Client) -> Result<(), DbError> {
    let row = client.query_one("SELECT 1", &[]).await?;
    let val: i32 = row.try_get(0)?;
    if val != 1 {
        return Err(DbError::Write(format!(
            "ping returned unexpected result: {val}"
        )));
    }
    Ok(())
}

/// Opens a throwaway connection to `url` and pings it.
pub async fn check_connection(url: &str) -> Result<(), ConnectorError> {
    let client = connect_client(url).await?;
    ping(&client).await?;
    Ok(())
}
