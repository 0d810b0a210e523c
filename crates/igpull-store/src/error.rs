use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A table or column name that is not a plain SQL identifier.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// An upsert row lacks a usable value for the conflict column.
    #[error("row has no value for conflict column {column}")]
    MissingConflictKey { column: String },

    /// A plain insert collided with an existing key.
    #[error("duplicate key {key} in table {table}")]
    DuplicateKey { table: String, key: String },

    /// Backend settings that cannot be used (bad URL or key).
    #[error("invalid storage configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST backend answered with a non-2xx status.
    #[error("storage backend returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}
