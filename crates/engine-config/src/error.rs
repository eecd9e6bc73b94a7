use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("At least one table must be given")]
    NoTables,

    #[error("Table names must not be empty")]
    EmptyTableName,

    #[error("max_workers must be greater than zero")]
    InvalidMaxWorkers,

    #[error("page_size must be greater than zero")]
    InvalidPageSize,

    #[error("page_size {0} exceeds the largest LIMIT a query can bind ({max})", max = i64::MAX)]
    PageSizeTooLarge(u64),

    #[error("{0} schema must not be empty")]
    EmptySchema(&'static str),
}
