use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use igpull_aggregator::AggregationSummary;
use igpull_core::FetchedRecord;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_aggregate_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct AggregateBody {
    pub media_limit: Option<i64>,
    pub hashtags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LimitQuery {
    pub limit: Option<i64>,
}

type Recorded<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn limit_from(query: Result<Query<LimitQuery>, QueryRejection>) -> Result<usize, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    Ok(normalize_limit(query.limit))
}

pub(super) async fn aggregate_all(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AggregateBody>, JsonRejection>,
) -> Recorded<AggregationSummary> {
    let Json(body) = body.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let hashtags: Vec<String> = body
        .hashtags
        .unwrap_or_default()
        .into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect();

    let summary = state
        .aggregator
        .aggregate_all(normalize_limit(body.media_limit), &hashtags)
        .await
        .map_err(|e| map_aggregate_error(&req_id, "Error during data aggregation", &e))?;

    Ok(Json(ApiResponse::success(
        "Data aggregation completed successfully",
        summary,
    )))
}

pub(super) async fn fetch_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Recorded<FetchedRecord> {
    let record = state
        .aggregator
        .fetch_and_store_profile()
        .await
        .map_err(|e| map_aggregate_error(&req_id, "Error fetching profile data", &e))?;

    Ok(Json(ApiResponse::success(
        "Profile data fetched and stored successfully",
        record,
    )))
}

pub(super) async fn fetch_media(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Recorded<Vec<FetchedRecord>> {
    let limit = limit_from(query)?;
    let records = state
        .aggregator
        .fetch_and_store_media(limit)
        .await
        .map_err(|e| map_aggregate_error(&req_id, "Error fetching media data", &e))?;

    Ok(Json(ApiResponse::success(
        format!("Fetched and stored {} media items", records.len()),
        records,
    )))
}

pub(super) async fn fetch_media_insights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(media_id): Path<String>,
) -> Recorded<FetchedRecord> {
    let record = state
        .aggregator
        .fetch_and_store_media_insights(&media_id)
        .await
        .map_err(|e| map_aggregate_error(&req_id, "Error fetching media insights", &e))?;

    Ok(Json(ApiResponse::success(
        format!("Fetched and stored insights for media {media_id}"),
        record,
    )))
}

pub(super) async fn fetch_user_insights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Recorded<FetchedRecord> {
    let record = state
        .aggregator
        .fetch_and_store_user_insights()
        .await
        .map_err(|e| map_aggregate_error(&req_id, "Error fetching user insights", &e))?;

    Ok(Json(ApiResponse::success(
        "Fetched and stored user insights",
        record,
    )))
}

pub(super) async fn fetch_hashtag_media(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(hashtag_name): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Recorded<Vec<FetchedRecord>> {
    let limit = limit_from(query)?;
    let records = state
        .aggregator
        .fetch_and_store_hashtag_media(&hashtag_name, limit)
        .await
        .map_err(|e| map_aggregate_error(&req_id, "Error fetching hashtag media", &e))?;

    Ok(Json(ApiResponse::success(
        format!(
            "Fetched and stored {} media items for hashtag #{}",
            records.len(),
            hashtag_name.trim().trim_start_matches('#')
        ),
        records,
    )))
}
