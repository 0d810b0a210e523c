use std::time::Duration;

use chrono::{DateTime, Utc};
use igpull_core::Row;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{conflict_key, validate_filters, validate_identifier, StorageGateway, StoreError};

// Path relative to crates/igpull-store/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Postgres backend storing each row as a JSONB document.
///
/// Tables follow the `instagram_data` shape from the workspace migrations:
/// the conflict column's value goes to `record_key`, the row to `payload`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect a pool with explicit limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the connection cannot be established.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] if any migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Send a `SELECT 1` to verify the pool has a live connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn write(
        &self,
        table: &str,
        key: &str,
        row: &Row,
        on_conflict_update: bool,
    ) -> Result<(), StoreError> {
        let conflict_clause = if on_conflict_update {
            " ON CONFLICT (record_key) DO UPDATE SET \
               data_type = EXCLUDED.data_type, \
               fetched_at = EXCLUDED.fetched_at, \
               payload = EXCLUDED.payload, \
               updated_at = NOW()"
        } else {
            ""
        };
        let sql = format!(
            "INSERT INTO {table} (record_key, data_type, fetched_at, payload) \
             VALUES ($1, $2, $3, $4){conflict_clause}"
        );

        sqlx::query(&sql)
            .bind(key)
            .bind(row.get("data_type").and_then(Value::as_str))
            .bind(fetched_at(row))
            .bind(Value::Object(row.clone()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl StorageGateway for PostgresStore {
    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<(), StoreError> {
        let table = validate_identifier(table)?;
        let key = conflict_key(row, validate_identifier(on_conflict)?)?;
        self.write(table, &key, row, true).await
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        let table = validate_identifier(table)?;
        let key = conflict_key(row, "id").unwrap_or_else(|_| Uuid::new_v4().to_string());
        match self.write(table, &key, row, false).await {
            Err(StoreError::Sqlx(sqlx::Error::Database(db))) if db.is_unique_violation() => {
                Err(StoreError::DuplicateKey {
                    table: table.to_owned(),
                    key,
                })
            }
            other => other,
        }
    }

    async fn select(&self, table: &str, filters: &[(&str, Value)]) -> Result<Vec<Row>, StoreError> {
        let table = validate_identifier(table)?;
        validate_filters(filters)?;

        let containment: Row = filters
            .iter()
            .map(|(column, value)| ((*column).to_owned(), value.clone()))
            .collect();
        let sql = format!("SELECT payload FROM {table} WHERE payload @> $1 ORDER BY record_key");

        let payloads = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(containment))
            .fetch_all(&self.pool)
            .await?;

        Ok(payloads
            .into_iter()
            .filter_map(|payload| match payload {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect())
    }
}

fn fetched_at(row: &Row) -> Option<DateTime<Utc>> {
    row.get("fetched_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
