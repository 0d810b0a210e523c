//! Resource accessors: fixed parameter presets over `request` and `list_paged`.

use crate::client::{path_segment, GraphClient};
use crate::error::GraphError;
use crate::types::{HashtagSearchHit, InsightEntry, InsightsEnvelope, Media, Page, Profile};

const PROFILE_FIELDS: &str = "id,username,account_type,media_count";
const MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,permalink,thumbnail_url,timestamp,username,children{media_url}";
const MEDIA_INSIGHT_METRICS: &str = "engagement,impressions,reach,saved";
const USER_INSIGHT_METRICS: &str =
    "audience_gender_age,audience_locale,audience_country,online_followers";
const HASHTAG_MEDIA_FIELDS: &str = "id,caption,media_type,media_url,permalink,timestamp,username";

impl GraphClient {
    /// Fetches the authenticated account's profile.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the request fails or the body does not
    /// contain an `id`.
    pub async fn profile(&self) -> Result<Profile, GraphError> {
        self.request_as("me", &[("fields", PROFILE_FIELDS)]).await
    }

    /// Fetches up to `limit` media items from the account feed, following
    /// pagination as needed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if any page fails after retries.
    pub async fn user_media(&self, limit: usize) -> Result<Vec<Media>, GraphError> {
        let page_size = limit.to_string();
        self.list_paged(
            "me/media",
            &[("fields", MEDIA_FIELDS), ("limit", &page_size)],
            limit,
        )
        .await
    }

    /// Fetches the insight entries for one media object.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Validation`] for a malformed id, otherwise any
    /// request failure.
    pub async fn media_insights(&self, media_id: &str) -> Result<Vec<InsightEntry>, GraphError> {
        let media_id = path_segment("media id", media_id)?;
        let envelope: InsightsEnvelope = self
            .request_as(
                &format!("{media_id}/insights"),
                &[("metric", MEDIA_INSIGHT_METRICS)],
            )
            .await?;
        Ok(envelope.data)
    }

    /// Fetches lifetime audience insights for the authenticated account.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the request fails.
    pub async fn user_insights(&self) -> Result<Vec<InsightEntry>, GraphError> {
        let envelope: InsightsEnvelope = self
            .request_as(
                "me/insights",
                &[("metric", USER_INSIGHT_METRICS), ("period", "lifetime")],
            )
            .await?;
        Ok(envelope.data)
    }

    /// Resolves a hashtag name (without `#`) to its graph id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] when the search yields no hits.
    pub async fn hashtag_id(&self, hashtag: &str) -> Result<String, GraphError> {
        let name = hashtag.trim().trim_start_matches('#');
        if name.is_empty() {
            return Err(GraphError::Validation("hashtag name is empty".to_owned()));
        }
        let page: Page<HashtagSearchHit> = self
            .request_as("ig_hashtag_search", &[("q", name)])
            .await?;
        match page.data.into_iter().next() {
            Some(hit) => Ok(hit.id),
            None => {
                tracing::warn!(hashtag = name, "hashtag search returned no results");
                Err(GraphError::NotFound(format!("hashtag {name} not found")))
            }
        }
    }

    /// Fetches up to `limit` recent media items tagged with `hashtag_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if any page fails after retries.
    pub async fn hashtag_media(
        &self,
        hashtag_id: &str,
        limit: usize,
    ) -> Result<Vec<Media>, GraphError> {
        let hashtag_id = path_segment("hashtag id", hashtag_id)?;
        let page_size = limit.to_string();
        self.list_paged(
            &format!("{hashtag_id}/recent_media"),
            &[("fields", HASHTAG_MEDIA_FIELDS), ("limit", &page_size)],
            limit,
        )
        .await
    }
}
