//! Per-category result of one `aggregate_all` run.
//!
//! Isolated steps record an explicit [`StepOutcome`] instead of aborting the
//! run; the outcome serializes as `"status": "success"` or
//! `"status": "error", "error": "..."`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Error { error: String },
}

impl StepOutcome {
    #[must_use]
    pub fn failed(err: &impl std::fmt::Display) -> Self {
        StepOutcome::Error {
            error: err.to_string(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HashtagOutcome {
    Success { count: usize },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub username: Option<String>,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub count: usize,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInsightsItem {
    pub media_id: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInsightsSummary {
    pub count: usize,
    pub items: Vec<MediaInsightsItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagItem {
    pub hashtag: String,
    #[serde(flatten)]
    pub outcome: HashtagOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagsSummary {
    pub count: usize,
    pub items: Vec<HashtagItem>,
}

/// Built up step by step during one run and returned at the end; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    pub profile: ProfileSummary,
    pub media: MediaSummary,
    pub media_insights: MediaInsightsSummary,
    pub user_insights: StepOutcome,
    /// Present only when hashtags were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<HashtagsSummary>,
}

impl AggregationSummary {
    /// Number of isolated steps that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        let insights = self
            .media_insights
            .items
            .iter()
            .filter(|i| !i.outcome.is_success())
            .count();
        let user = usize::from(!self.user_insights.is_success());
        let hashtags = self.hashtags.as_ref().map_or(0, |h| {
            h.items
                .iter()
                .filter(|i| matches!(i.outcome, HashtagOutcome::Error { .. }))
                .count()
        });
        insights + user + hashtags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(hashtags: Option<HashtagsSummary>) -> AggregationSummary {
        AggregationSummary {
            profile: ProfileSummary {
                username: Some("jane".to_owned()),
                outcome: StepOutcome::Success,
            },
            media: MediaSummary {
                count: 2,
                outcome: StepOutcome::Success,
            },
            media_insights: MediaInsightsSummary {
                count: 2,
                items: vec![
                    MediaInsightsItem {
                        media_id: "m1".to_owned(),
                        outcome: StepOutcome::Success,
                    },
                    MediaInsightsItem {
                        media_id: "m2".to_owned(),
                        outcome: StepOutcome::failed(&"HTTP 404"),
                    },
                ],
            },
            user_insights: StepOutcome::Success,
            hashtags,
        }
    }

    #[test]
    fn serializes_to_status_shape() {
        let value = serde_json::to_value(summary(None)).unwrap();
        assert_eq!(
            value,
            json!({
                "profile": {"username": "jane", "status": "success"},
                "media": {"count": 2, "status": "success"},
                "media_insights": {
                    "count": 2,
                    "items": [
                        {"media_id": "m1", "status": "success"},
                        {"media_id": "m2", "status": "error", "error": "HTTP 404"}
                    ]
                },
                "user_insights": {"status": "success"}
            })
        );
    }

    #[test]
    fn hashtag_items_carry_count_or_error() {
        let hashtags = HashtagsSummary {
            count: 2,
            items: vec![
                HashtagItem {
                    hashtag: "travel".to_owned(),
                    outcome: HashtagOutcome::Success { count: 3 },
                },
                HashtagItem {
                    hashtag: "food".to_owned(),
                    outcome: HashtagOutcome::Error {
                        error: "not found".to_owned(),
                    },
                },
            ],
        };
        let full = summary(Some(hashtags));
        let value = serde_json::to_value(&full).unwrap();
        assert_eq!(
            value["hashtags"]["items"][0],
            json!({"hashtag": "travel", "status": "success", "count": 3})
        );
        assert_eq!(
            value["hashtags"]["items"][1],
            json!({"hashtag": "food", "status": "error", "error": "not found"})
        );
        assert_eq!(full.failure_count(), 2);

        let back: AggregationSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back, full);
    }
}
