use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use igpull_core::Row;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    conflict_key, validate_filters, validate_identifier, value_as_key, StorageGateway, StoreError,
};

type Table = BTreeMap<String, Row>;

/// Process-local backend. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row of `table`, ordered by key.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .await
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn len(&self, table: &str) -> usize {
        self.tables.lock().await.get(table).map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }
}

impl StorageGateway for MemoryStore {
    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<(), StoreError> {
        validate_identifier(table)?;
        validate_identifier(on_conflict)?;
        let key = conflict_key(row, on_conflict)?;

        let mut tables = self.tables.lock().await;
        tables
            .entry(table.to_owned())
            .or_default()
            .insert(key, row.clone());
        Ok(())
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        validate_identifier(table)?;
        let key = conflict_key(row, "id").unwrap_or_else(|_| Uuid::new_v4().to_string());

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_owned()).or_default();
        if rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                table: table.to_owned(),
                key,
            });
        }
        rows.insert(key, row.clone());
        Ok(())
    }

    async fn select(&self, table: &str, filters: &[(&str, Value)]) -> Result<Vec<Row>, StoreError> {
        validate_identifier(table)?;
        validate_filters(filters)?;

        let tables = self.tables.lock().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .values()
            .filter(|row| {
                filters.iter().all(|(column, expected)| {
                    row.get(*column).is_some_and(|actual| {
                        actual == expected || value_as_key(actual) == value_as_key(expected)
                    })
                })
            })
            .cloned()
            .collect())
    }
}
