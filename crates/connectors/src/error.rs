use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any SQL driver error.
    #[error("SQL error: {0}")]
    Sql(#[from] tokio_postgres::Error),

    /// A fetched column has a type rows cannot be detached from.
    #[error("Unsupported type `{type_name}` for column `{column}`")]
    UnsupportedType { column: String, type_name: String },

    /// A write or commit was issued without a matching `begin`, or `begin`
    /// was issued twice.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The page could not be turned into a query.
    #[error("Query planning failed: {0}")]
    Plan(#[from] planner::error::PlanError),

    /// Writing rows to the database failed at the application level.
    #[error("Write error: {0}")]
    Write(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Failed to connect: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Connection unavailable: {0}")]
    Unavailable(String),

    #[error("Connection check failed: {0}")]
    Ping(#[from] DbError),
}
