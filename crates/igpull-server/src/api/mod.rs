mod aggregator;
mod instagram;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use igpull_aggregator::{AggregateError, Aggregator};
use igpull_graph::{GraphClient, GraphError, InsightsError, InsightsService};
use igpull_store::Store;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

pub const API_PREFIX: &str = "/api/v1";
const SERVICE_NAME: &str = "Instagram Graph Aggregator";
const DEFAULT_LIMIT: i64 = 25;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator<Store>>,
    pub insights: InsightsService,
}

impl AppState {
    /// Both services share the one graph client.
    pub fn new(graph: Arc<GraphClient>, aggregator: Aggregator<Store>) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            insights: InsightsService::new(graph),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: StatusCode,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: "error",
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.code, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> usize {
    let clamped = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
    usize::try_from(clamped).unwrap_or(1)
}

/// Maps a failed fetch-and-store call onto an HTTP error. `context` prefixes
/// the message, e.g. "Error fetching profile data".
pub(super) fn map_aggregate_error(
    req_id: &RequestId,
    context: &str,
    error: &AggregateError,
) -> ApiError {
    tracing::error!(request_id = %req_id.0, error = %error, "{context}");

    let code = match error {
        AggregateError::Graph(
            GraphError::Validation(_)
            | GraphError::MissingCredentials
            | GraphError::InvalidUrl { .. },
        ) => StatusCode::BAD_REQUEST,
        AggregateError::Graph(GraphError::NotFound(_)) => StatusCode::NOT_FOUND,
        AggregateError::Graph(GraphError::Http(_)) => StatusCode::SERVICE_UNAVAILABLE,
        AggregateError::Graph(_) => StatusCode::BAD_GATEWAY,
        AggregateError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        AggregateError::Store(_) | AggregateError::Shape(_) | AggregateError::MissingUserId => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let api_error = ApiError::new(code, format!("{context}: {error}"));
    match error {
        AggregateError::Graph(graph) => match graph.status() {
            Some(status) => api_error.with_details(serde_json::json!({ "upstream_status": status })),
            None => api_error,
        },
        _ => api_error,
    }
}

pub(super) fn map_insights_error(req_id: &RequestId, error: &InsightsError) -> ApiError {
    let code =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if code.is_server_error() {
        tracing::error!(request_id = %req_id.0, error = %error, "insights query failed");
    } else {
        tracing::warn!(request_id = %req_id.0, error = %error, "insights query rejected");
    }
    ApiError::new(code, error.to_string())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/instagram/insights", get(instagram::get_insights))
        .route(
            "/instagram/sample-requests",
            get(instagram::get_sample_requests),
        )
        .route("/instagram/metrics", get(instagram::get_metrics_info))
        .route("/instagram/breakdowns", get(instagram::get_breakdowns_info))
        .route("/aggregator/aggregate", post(aggregator::aggregate_all))
        .route("/aggregator/profile", get(aggregator::fetch_profile))
        .route("/aggregator/media", get(aggregator::fetch_media))
        .route(
            "/aggregator/media/{media_id}/insights",
            get(aggregator::fetch_media_insights),
        )
        .route(
            "/aggregator/user/insights",
            get(aggregator::fetch_user_insights),
        )
        .route(
            "/aggregator/hashtag/{hashtag_name}/media",
            get(aggregator::fetch_hashtag_media),
        )
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(API_PREFIX, api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(
                    // path only: the insights query string may carry an access token
                    |request: &axum::http::Request<_>| {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %request.uri().path(),
                        )
                    },
                ))
                .layer(CompressionLayer::new())
                .layer(build_cors(cors_origins))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct RootInfo {
    message: String,
    version: &'static str,
    api_prefix: &'static str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

async fn root() -> Json<RootInfo> {
    Json(RootInfo {
        message: format!("{SERVICE_NAME} is running"),
        version: env!("CARGO_PKG_VERSION"),
        api_prefix: API_PREFIX,
    })
}

async fn health() -> Json<HealthData> {
    Json(HealthData { status: "healthy" })
}
