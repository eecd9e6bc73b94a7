use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No entity registered for table `{table}` (looked up as `{entity}`)")]
    NotRegistered { table: String, entity: String },

    #[error("Entity `{0}` is registered more than once")]
    DuplicateEntity(String),

    #[error("Entity `{entity}` declares no columns")]
    NoColumns { entity: String },

    #[error("Entity `{entity}` declares no primary key")]
    NoPrimaryKey { entity: String },

    #[error("Primary key column `{column}` of entity `{entity}` is not among its columns")]
    UnknownKeyColumn { entity: String, column: String },

    #[error("Failed to read entity registry `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid entity registry document: {0}")]
    Json(#[from] serde_json::Error),
}
