use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use igpull_graph::insights::catalog::{self, SampleRequest};
use igpull_graph::{
    Breakdown, InsightsRequest, InsightsResponse, Metric, MetricType, Period, Timeframe,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{map_insights_error, ApiError, ApiResponse, AppState};

/// Raw query string of `GET /instagram/insights`. Everything is optional here
/// so that missing values surface through the error envelope.
#[derive(Debug, Default, Deserialize)]
pub(super) struct InsightsQuery {
    pub instagram_account_id: Option<String>,
    /// Comma-separated.
    pub metrics: Option<String>,
    pub period: Option<String>,
    pub metric_type: Option<String>,
    /// Comma-separated.
    pub breakdowns: Option<String>,
    pub timeframe: Option<String>,
    pub since: Option<i64>,
    pub until: Option<i64>,
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SampleRequestsResponse {
    samples: BTreeMap<&'static str, SampleRequest>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String, String> {
    non_blank(value).ok_or_else(|| format!("{name} is required"))
}

fn parse_one<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| e.to_string())
}

fn parse_list<T>(raw: &str) -> Result<Vec<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_one)
        .collect()
}

impl InsightsQuery {
    /// Parses the vocabulary fields. Shape rules (demographic metrics need a
    /// timeframe) are left to [`InsightsRequest::validate`].
    fn into_request(self) -> Result<InsightsRequest, String> {
        let instagram_account_id = required(self.instagram_account_id, "instagram_account_id")?;
        let metrics: Vec<Metric> = parse_list(&required(self.metrics, "metrics")?)?;
        let period: Period = parse_one(&required(self.period, "period")?)?;
        let metric_type: MetricType = parse_one(&required(self.metric_type, "metric_type")?)?;
        let breakdowns: Vec<Breakdown> = match non_blank(self.breakdowns) {
            Some(raw) => parse_list(&raw)?,
            None => Vec::new(),
        };
        let timeframe: Option<Timeframe> = non_blank(self.timeframe)
            .map(|raw| parse_one(&raw))
            .transpose()?;

        Ok(InsightsRequest {
            instagram_account_id,
            metrics,
            period,
            metric_type,
            breakdowns,
            timeframe,
            since: self.since,
            until: self.until,
            access_token: non_blank(self.access_token),
        })
    }
}

pub(super) async fn get_insights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<InsightsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<InsightsResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let request = query
        .into_request()
        .map_err(|msg| ApiError::new(StatusCode::BAD_REQUEST, msg))?;

    let response = state
        .insights
        .get_insights(&request)
        .await
        .map_err(|e| map_insights_error(&req_id, &e))?;

    Ok(Json(ApiResponse::success(
        "Successfully retrieved Instagram insights",
        response,
    )))
}

pub(super) async fn get_sample_requests() -> Json<SampleRequestsResponse> {
    Json(SampleRequestsResponse {
        samples: catalog::sample_requests(),
    })
}

pub(super) async fn get_metrics_info() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        "Available metrics information",
        catalog::metrics_info(),
    ))
}

pub(super) async fn get_breakdowns_info() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        "Available breakdowns information",
        catalog::breakdowns_info(),
    ))
}
