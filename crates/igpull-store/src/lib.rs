//! Storage gateway: idempotent upsert-by-key persistence for fetched records.
//!
//! [`StorageGateway`] is the seam the aggregator depends on. Three backends
//! implement it: [`SupabaseStore`] (PostgREST over HTTP), [`PostgresStore`]
//! (a JSONB document table via `sqlx`) and [`MemoryStore`] (tests and local
//! runs). [`Store`] picks one from [`StoreConfig`].

mod error;
mod memory;
mod postgres;
mod supabase;

use std::future::Future;

use igpull_core::{Row, StoreConfig};
use serde_json::Value;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use supabase::SupabaseStore;

/// Generic row persistence keyed by table name.
pub trait StorageGateway: Send + Sync {
    /// Inserts `row`, or replaces the existing row whose `on_conflict` column
    /// holds the same value.
    fn upsert(
        &self,
        table: &str,
        row: &Row,
        on_conflict: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Inserts `row` without conflict resolution.
    fn insert(&self, table: &str, row: &Row) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the rows whose columns equal every `(column, value)` filter.
    fn select(
        &self,
        table: &str,
        filters: &[(&str, Value)],
    ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;
}

/// The configured backend.
#[derive(Debug, Clone)]
pub enum Store {
    Memory(MemoryStore),
    Supabase(SupabaseStore),
    Postgres(PostgresStore),
}

impl Store {
    /// Builds the backend described by `config`. Postgres connects and runs
    /// pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the HTTP client cannot be built, the database
    /// is unreachable, or a migration fails.
    pub async fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let store = match config {
            StoreConfig::Memory => Store::Memory(MemoryStore::new()),
            StoreConfig::Supabase { url, key } => Store::Supabase(SupabaseStore::new(url, key)?),
            StoreConfig::Postgres {
                database_url,
                max_connections,
                min_connections,
                acquire_timeout_secs,
            } => {
                let store = PostgresStore::connect(
                    database_url,
                    *max_connections,
                    *min_connections,
                    *acquire_timeout_secs,
                )
                .await?;
                store.migrate().await?;
                Store::Postgres(store)
            }
        };
        tracing::info!(backend = config.kind(), "storage gateway ready");
        Ok(store)
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Supabase(_) => "supabase",
            Store::Postgres(_) => "postgres",
        }
    }
}

impl StorageGateway for Store {
    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<(), StoreError> {
        match self {
            Store::Memory(s) => s.upsert(table, row, on_conflict).await,
            Store::Supabase(s) => s.upsert(table, row, on_conflict).await,
            Store::Postgres(s) => s.upsert(table, row, on_conflict).await,
        }
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        match self {
            Store::Memory(s) => s.insert(table, row).await,
            Store::Supabase(s) => s.insert(table, row).await,
            Store::Postgres(s) => s.insert(table, row).await,
        }
    }

    async fn select(&self, table: &str, filters: &[(&str, Value)]) -> Result<Vec<Row>, StoreError> {
        match self {
            Store::Memory(s) => s.select(table, filters).await,
            Store::Supabase(s) => s.select(table, filters).await,
            Store::Postgres(s) => s.select(table, filters).await,
        }
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`; anything else is rejected before I/O.
///
/// # Errors
///
/// Returns [`StoreError::InvalidIdentifier`] for any other input.
pub fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_owned()))
    }
}

/// The row's value for `column`, rendered as a key string.
pub(crate) fn conflict_key(row: &Row, column: &str) -> Result<String, StoreError> {
    match row.get(column) {
        None | Some(Value::Null) => Err(StoreError::MissingConflictKey {
            column: column.to_owned(),
        }),
        Some(value) => {
            let key = value_as_key(value);
            if key.is_empty() {
                Err(StoreError::MissingConflictKey {
                    column: column.to_owned(),
                })
            } else {
                Ok(key)
            }
        }
    }
}

/// Strings verbatim, everything else as compact JSON.
pub(crate) fn value_as_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn validate_filters(filters: &[(&str, Value)]) -> Result<(), StoreError> {
    for (column, _) in filters {
        validate_identifier(column)?;
    }
    Ok(())
}
