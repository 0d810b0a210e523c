use std::sync::Arc;
use std::time::Duration;

use igpull_core::{AppConfig, DataType, FetchedRecord, Row};
use igpull_graph::GraphClient;
use igpull_store::StorageGateway;

use crate::error::AggregateError;
use crate::shape::{
    hashtag_media_record, insights_id, media_insight_fields, media_record, normalize_hashtag,
    profile_record, user_insight_fields,
};
use crate::summary::{
    AggregationSummary, HashtagItem, HashtagOutcome, HashtagsSummary, MediaInsightsItem,
    MediaInsightsSummary, MediaSummary, ProfileSummary, StepOutcome,
};

/// Overall budget for one `aggregate_all` run unless configured otherwise.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(600);

const DEFAULT_TABLE: &str = "instagram_data";
const DEFAULT_CONFLICT_COLUMN: &str = "id";

/// Sequences graph API fetches and persists each shaped record.
///
/// All calls run one after another; there is no fan-out. Persistence is an
/// upsert keyed by record id, so re-running after a partial failure
/// converges on the same stored state.
#[derive(Debug, Clone)]
pub struct Aggregator<S> {
    graph: Arc<GraphClient>,
    store: S,
    table: String,
    conflict_column: String,
    deadline: Duration,
}

impl<S: StorageGateway> Aggregator<S> {
    #[must_use]
    pub fn new(graph: Arc<GraphClient>, store: S) -> Self {
        Self {
            graph,
            store,
            table: DEFAULT_TABLE.to_owned(),
            conflict_column: DEFAULT_CONFLICT_COLUMN.to_owned(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Table, conflict column and deadline taken from `config`.
    #[must_use]
    pub fn from_config(graph: Arc<GraphClient>, store: S, config: &AppConfig) -> Self {
        Self::new(graph, store)
            .with_table(&config.table_name, &config.conflict_column)
            .with_deadline(Duration::from_secs(config.aggregate_deadline_secs))
    }

    #[must_use]
    pub fn with_table(mut self, table: &str, conflict_column: &str) -> Self {
        self.table = table.to_owned();
        self.conflict_column = conflict_column.to_owned();
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    async fn persist(&self, record: &FetchedRecord) -> Result<(), AggregateError> {
        self.store
            .upsert(&self.table, &record.to_row(), &self.conflict_column)
            .await?;
        Ok(())
    }

    /// Fetches the account profile and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if the fetch or the upsert fails.
    pub async fn fetch_and_store_profile(&self) -> Result<FetchedRecord, AggregateError> {
        tracing::info!("fetching user profile");
        let profile = self.graph.profile().await?;
        let record = profile_record(&profile)?;
        self.persist(&record).await?;
        tracing::info!(username = ?profile.username, "stored profile");
        Ok(record)
    }

    /// Fetches up to `limit` feed media items and stores each one.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if the listing or any upsert fails.
    pub async fn fetch_and_store_media(
        &self,
        limit: usize,
    ) -> Result<Vec<FetchedRecord>, AggregateError> {
        tracing::info!(limit, "fetching media");
        let media = self.graph.user_media(limit).await?;

        let mut stored = Vec::with_capacity(media.len());
        for item in media.iter().filter(|m| !m.id.is_empty()) {
            let record = media_record(item)?;
            self.persist(&record).await?;
            stored.push(record);
        }
        tracing::info!(count = stored.len(), "stored media");
        Ok(stored)
    }

    /// Fetches one media item's insights and stores them as a single
    /// `{media_id}_insights` record.
    ///
    /// An empty insights payload is logged and not persisted; the
    /// metadata-only record is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if the fetch or the upsert fails.
    pub async fn fetch_and_store_media_insights(
        &self,
        media_id: &str,
    ) -> Result<FetchedRecord, AggregateError> {
        let media_id = media_id.trim();
        tracing::info!(media_id, "fetching media insights");
        let entries = self.graph.media_insights(media_id).await?;

        let mut record = FetchedRecord::new(
            insights_id(media_id),
            DataType::MediaInsights,
            media_insight_fields(&entries),
        );
        record.set("media_id", media_id);

        if entries.is_empty() {
            tracing::warn!(media_id, "no insights data returned for media");
            return Ok(record);
        }
        self.persist(&record).await?;
        tracing::info!(media_id, "stored media insights");
        Ok(record)
    }

    /// Fetches account-level insights and stores them as a single
    /// `{user_id}_insights` record. The user id comes from a profile fetch.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::MissingUserId`] if the profile has no id,
    /// otherwise any fetch or upsert failure.
    pub async fn fetch_and_store_user_insights(&self) -> Result<FetchedRecord, AggregateError> {
        tracing::info!("fetching user insights");
        let entries = self.graph.user_insights().await?;
        let profile = self.graph.profile().await?;
        let user_id = profile.id.trim();
        if user_id.is_empty() {
            return Err(AggregateError::MissingUserId);
        }

        let fields = if entries.is_empty() {
            Row::new()
        } else {
            user_insight_fields(&entries)?
        };
        let mut record = FetchedRecord::new(insights_id(user_id), DataType::UserInsights, fields);
        record.set("user_id", user_id);

        if entries.is_empty() {
            tracing::warn!(user_id, "no user insights data returned");
            return Ok(record);
        }
        self.persist(&record).await?;
        tracing::info!(user_id, "stored user insights");
        Ok(record)
    }

    /// Resolves `hashtag` and stores up to `limit` of its recent media.
    ///
    /// Surrounding whitespace and a leading `#` are dropped from the name
    /// before lookup and storage.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Graph`] wrapping `NotFound` when the hashtag
    /// does not resolve, otherwise any fetch or upsert failure.
    pub async fn fetch_and_store_hashtag_media(
        &self,
        hashtag: &str,
        limit: usize,
    ) -> Result<Vec<FetchedRecord>, AggregateError> {
        let hashtag = normalize_hashtag(hashtag);
        tracing::info!(hashtag, limit, "fetching hashtag media");
        let hashtag_id = self.graph.hashtag_id(hashtag).await?;
        let media = self.graph.hashtag_media(&hashtag_id, limit).await?;

        let mut stored = Vec::with_capacity(media.len());
        for item in media.iter().filter(|m| !m.id.is_empty()) {
            let record = hashtag_media_record(item, hashtag, &hashtag_id)?;
            self.persist(&record).await?;
            stored.push(record);
        }
        tracing::info!(hashtag, count = stored.len(), "stored hashtag media");
        Ok(stored)
    }

    /// Runs every step in order and returns the per-category summary.
    ///
    /// Profile and media failures abort the run. Media insights, user
    /// insights and each hashtag are isolated: a failure is recorded in the
    /// summary and the run continues. Hashtag listings use `media_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::DeadlineExceeded`] past the configured
    /// deadline, or the profile/media error that aborted the run.
    pub async fn aggregate_all(
        &self,
        media_limit: usize,
        hashtags: &[String],
    ) -> Result<AggregationSummary, AggregateError> {
        match tokio::time::timeout(self.deadline, self.run_all(media_limit, hashtags)).await {
            Ok(Ok(summary)) => {
                tracing::info!(failures = summary.failure_count(), "completed data aggregation");
                Ok(summary)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "data aggregation aborted");
                Err(e)
            }
            Err(_) => {
                let secs = self.deadline.as_secs();
                tracing::error!(deadline_secs = secs, "data aggregation exceeded deadline");
                Err(AggregateError::DeadlineExceeded { secs })
            }
        }
    }

    async fn run_all(
        &self,
        media_limit: usize,
        hashtags: &[String],
    ) -> Result<AggregationSummary, AggregateError> {
        let profile = self.fetch_and_store_profile().await?;
        let profile = ProfileSummary {
            username: profile
                .get("username")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
            outcome: StepOutcome::Success,
        };

        let media = self.fetch_and_store_media(media_limit).await?;

        let mut insight_items = Vec::with_capacity(media.len());
        for item in &media {
            let outcome = match self.fetch_and_store_media_insights(&item.id).await {
                Ok(_) => StepOutcome::Success,
                Err(e) => {
                    tracing::warn!(media_id = %item.id, error = %e, "media insights failed");
                    StepOutcome::failed(&e)
                }
            };
            insight_items.push(MediaInsightsItem {
                media_id: item.id.clone(),
                outcome,
            });
        }

        let user_insights = match self.fetch_and_store_user_insights().await {
            Ok(_) => StepOutcome::Success,
            Err(e) => {
                tracing::warn!(error = %e, "user insights failed");
                StepOutcome::failed(&e)
            }
        };

        let hashtags = if hashtags.is_empty() {
            None
        } else {
            let mut items = Vec::with_capacity(hashtags.len());
            for hashtag in hashtags {
                let outcome = match self.fetch_and_store_hashtag_media(hashtag, media_limit).await
                {
                    Ok(stored) => HashtagOutcome::Success {
                        count: stored.len(),
                    },
                    Err(e) => {
                        tracing::warn!(hashtag = %hashtag, error = %e, "hashtag media failed");
                        HashtagOutcome::Error {
                            error: e.to_string(),
                        }
                    }
                };
                items.push(HashtagItem {
                    hashtag: normalize_hashtag(hashtag).to_owned(),
                    outcome,
                });
            }
            Some(HashtagsSummary {
                count: items.len(),
                items,
            })
        };

        Ok(AggregationSummary {
            profile,
            media: MediaSummary {
                count: media.len(),
                outcome: StepOutcome::Success,
            },
            media_insights: MediaInsightsSummary {
                count: insight_items.len(),
                items: insight_items,
            },
            user_insights,
            hashtags,
        })
    }
}
