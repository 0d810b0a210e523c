//! Records handed from the aggregator to the storage gateway.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A flat column-name to value mapping, as accepted by the storage gateway.
pub type Row = serde_json::Map<String, Value>;

const RESERVED_KEYS: [&str; 3] = ["id", "fetched_at", "data_type"];

/// Category of a fetched record; persisted in the `data_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Profile,
    Media,
    MediaInsights,
    UserInsights,
    HashtagMedia,
}

impl DataType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Profile => "profile",
            DataType::Media => "media",
            DataType::MediaInsights => "media_insights",
            DataType::UserInsights => "user_insights",
            DataType::HashtagMedia => "hashtag_media",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream payload annotated with capture metadata.
///
/// `id` is the persistence identity. `fields` never contains the reserved
/// keys `id`, `fetched_at` or `data_type`; those are always taken from the
/// struct fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub id: String,
    pub data_type: DataType,
    pub fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Row,
}

impl FetchedRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, data_type: DataType, fields: Row) -> Self {
        Self::captured_at(id, data_type, fields, Utc::now())
    }

    /// Builds a record with an explicit capture time.
    #[must_use]
    pub fn captured_at(
        id: impl Into<String>,
        data_type: DataType,
        mut fields: Row,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }
        Self {
            id: id.into(),
            data_type,
            fetched_at,
            fields,
        }
    }

    /// Sets a non-reserved field. Reserved keys are ignored.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return;
        }
        self.fields.insert(key, value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Flattens the record into the row shape written by the gateway.
    #[must_use]
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.fields {
            row.insert(key.clone(), value.clone());
        }
        row.insert(
            "fetched_at".to_string(),
            Value::String(self.fetched_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        row.insert(
            "data_type".to_string(),
            Value::String(self.data_type.as_str().to_string()),
        );
        row
    }
}
