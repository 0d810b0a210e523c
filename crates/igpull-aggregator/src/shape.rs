//! Field shaping applied before persistence. The gateway schema is flat, so
//! nested structures become JSON strings.

use igpull_core::{DataType, FetchedRecord, Row};
use igpull_graph::{InsightEntry, Media, Profile};
use serde::Serialize;
use serde_json::Value;

fn to_row<T: Serialize>(value: &T) -> Result<Row, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => {
            let mut row = Row::new();
            row.insert("value".to_owned(), other);
            Ok(row)
        }
    }
}

/// Objects and arrays become their JSON text; scalars pass through.
fn flatten_value(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        scalar => scalar.clone(),
    }
}

pub(crate) fn profile_record(profile: &Profile) -> Result<FetchedRecord, serde_json::Error> {
    Ok(FetchedRecord::new(
        profile.id.clone(),
        DataType::Profile,
        to_row(profile)?,
    ))
}

/// A feed media record; `children` is stored as its JSON text.
pub(crate) fn media_record(media: &Media) -> Result<FetchedRecord, serde_json::Error> {
    let mut fields = to_row(media)?;
    if let Some(children) = &media.children {
        fields.insert(
            "children".to_owned(),
            Value::String(serde_json::to_string(children)?),
        );
    }
    Ok(FetchedRecord::new(media.id.clone(), DataType::Media, fields))
}

pub(crate) fn hashtag_media_record(
    media: &Media,
    hashtag: &str,
    hashtag_id: &str,
) -> Result<FetchedRecord, serde_json::Error> {
    let mut record = media_record(media)?;
    record.data_type = DataType::HashtagMedia;
    record.set("hashtag", hashtag);
    record.set("hashtag_id", hashtag_id);
    Ok(record)
}

/// Metric name to first value. Entries without a value are skipped.
pub(crate) fn media_insight_fields(entries: &[InsightEntry]) -> Row {
    let mut fields = Row::new();
    for entry in entries {
        let value = entry
            .values
            .first()
            .and_then(|v| v.value.as_ref())
            .filter(|v| !v.is_null());
        if let Some(value) = value {
            fields.insert(entry.name.clone(), flatten_value(value));
        }
    }
    fields
}

/// Like [`media_insight_fields`], but a first slot without `value` (e.g.
/// per-bucket demographic keys) is stored whole as JSON text.
pub(crate) fn user_insight_fields(entries: &[InsightEntry]) -> Result<Row, serde_json::Error> {
    let mut fields = Row::new();
    for entry in entries {
        let Some(slot) = entry.values.first() else {
            continue;
        };
        let value = match &slot.value {
            Some(value) => flatten_value(value),
            None => Value::String(serde_json::to_string(slot)?),
        };
        fields.insert(entry.name.clone(), value);
    }
    Ok(fields)
}

/// Hashtag name as looked up and stored: trimmed, without a leading `#`.
pub(crate) fn normalize_hashtag(hashtag: &str) -> &str {
    hashtag.trim().trim_start_matches('#')
}

/// Persistence id for an insights record owned by `source_id`.
pub(crate) fn insights_id(source_id: &str) -> String {
    format!("{source_id}_insights")
}

#[cfg(test)]
mod tests {
    use super::*;
    use igpull_graph::{ChildMedia, InsightValue, MediaChildren};
    use serde_json::json;

    fn media(id: &str) -> Media {
        serde_json::from_value(json!({"id": id, "caption": "sunset", "media_type": "IMAGE"}))
            .unwrap()
    }

    fn entry(name: &str, value: Option<Value>) -> InsightEntry {
        InsightEntry {
            name: name.to_owned(),
            period: Some("lifetime".to_owned()),
            title: None,
            description: None,
            id: None,
            values: vec![InsightValue {
                value,
                end_time: None,
                extra: Row::new(),
            }],
        }
    }

    #[test]
    fn nested_children_round_trip_through_flat_string() {
        let children = MediaChildren {
            data: vec![
                ChildMedia {
                    id: "c1".to_owned(),
                    media_url: Some("https://cdn.example.com/c1.jpg".to_owned()),
                },
                ChildMedia {
                    id: "c2".to_owned(),
                    media_url: None,
                },
            ],
        };
        let mut carousel = media("m1");
        carousel.media_type = Some("CAROUSEL_ALBUM".to_owned());
        carousel.children = Some(children.clone());

        let record = media_record(&carousel).unwrap();
        let stored = record.get("children").and_then(Value::as_str).expect("string");
        let restored: MediaChildren = serde_json::from_str(stored).unwrap();
        assert_eq!(restored, children);
    }

    #[test]
    fn media_record_without_children_has_no_children_field() {
        let record = media_record(&media("m1")).unwrap();
        assert_eq!(record.id, "m1");
        assert_eq!(record.data_type, DataType::Media);
        assert!(record.get("children").is_none());
        assert_eq!(record.get("caption"), Some(&json!("sunset")));
    }

    #[test]
    fn hashtag_media_record_carries_hashtag_metadata() {
        let record = hashtag_media_record(&media("h1"), "travel", "1784").unwrap();
        assert_eq!(record.data_type, DataType::HashtagMedia);
        assert_eq!(record.get("hashtag"), Some(&json!("travel")));
        assert_eq!(record.get("hashtag_id"), Some(&json!("1784")));
    }

    #[test]
    fn media_insights_flatten_to_metric_columns() {
        let fields = media_insight_fields(&[
            entry("reach", Some(json!(120))),
            entry("saved", Some(json!(4))),
            entry("impressions", None),
            entry("engagement", Some(Value::Null)),
        ]);
        assert_eq!(fields.get("reach"), Some(&json!(120)));
        assert_eq!(fields.get("saved"), Some(&json!(4)));
        assert!(!fields.contains_key("impressions"));
        assert!(!fields.contains_key("engagement"));
    }

    #[test]
    fn complex_insight_values_become_strings() {
        let fields = media_insight_fields(&[entry("breakdown", Some(json!({"F.18-24": 10})))]);
        assert_eq!(fields.get("breakdown"), Some(&json!(r#"{"F.18-24":10}"#)));
    }

    #[test]
    fn user_insights_serialize_valueless_slots() {
        let mut demographic = entry("audience_gender_age", None);
        demographic.values[0].extra.insert("F.18-24".to_owned(), json!(10));

        let fields = user_insight_fields(&[
            demographic,
            entry("online_followers", Some(json!({"0": 5, "1": 7}))),
        ])
        .unwrap();

        let stored = fields["audience_gender_age"].as_str().expect("string");
        let parsed: Value = serde_json::from_str(stored).unwrap();
        assert_eq!(parsed["F.18-24"], json!(10));
        assert!(fields["online_followers"].is_string());
    }

    #[test]
    fn hashtag_names_lose_whitespace_and_hash() {
        assert_eq!(normalize_hashtag(" #travel "), "travel");
        assert_eq!(normalize_hashtag("travel"), "travel");
    }

    #[test]
    fn insights_id_is_suffixed() {
        assert_eq!(insights_id("m1"), "m1_insights");
    }
}
