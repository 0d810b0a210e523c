use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use super::{build_query, InsightsRequest, InsightsResponse};
use crate::client::{path_segment, GraphClient};
use crate::error::GraphError;

/// Failure classes of an insights query, each with its own HTTP status.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The graph API answered with a non-2xx status.
    #[error("Instagram API error: {body}")]
    Upstream { status: u16, body: String },

    /// The graph API could not be reached.
    #[error("Error connecting to Instagram API: {0}")]
    Unavailable(String),

    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

impl InsightsError {
    /// HTTP status the caller should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            InsightsError::Validation(_) => 400,
            InsightsError::Upstream { status, .. } => *status,
            InsightsError::Unavailable(_) => 503,
            InsightsError::Internal(_) => 500,
        }
    }
}

impl From<GraphError> for InsightsError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Validation(msg) => InsightsError::Validation(msg),
            GraphError::MissingCredentials | GraphError::InvalidUrl { .. } => {
                InsightsError::Validation(err.to_string())
            }
            GraphError::Upstream { status, body } => InsightsError::Upstream { status, body },
            GraphError::NotFound(msg) => InsightsError::Upstream {
                status: 404,
                body: msg,
            },
            GraphError::Http(e) => InsightsError::Unavailable(e.to_string()),
            GraphError::Deserialize { .. } | GraphError::PaginationLimit { .. } => {
                InsightsError::Internal(err.to_string())
            }
        }
    }
}

/// Validated account insights queries over a shared [`GraphClient`].
#[derive(Debug, Clone)]
pub struct InsightsService {
    graph: Arc<GraphClient>,
}

impl InsightsService {
    #[must_use]
    pub fn new(graph: Arc<GraphClient>) -> Self {
        Self { graph }
    }

    /// Runs one insights query.
    ///
    /// The request is validated first; on the happy path exactly one GET is
    /// issued (transient failures go through the client's retry policy).
    ///
    /// # Errors
    ///
    /// See [`InsightsError`] for the failure classes.
    pub async fn get_insights(
        &self,
        request: &InsightsRequest,
    ) -> Result<InsightsResponse, InsightsError> {
        if let Err(reason) = request.validate() {
            tracing::warn!(reason = %reason, "rejected insights request");
            return Err(InsightsError::Validation(reason));
        }
        let account_id = path_segment("instagram_account_id", &request.instagram_account_id)?;

        let query = build_query(request, Utc::now());
        let params: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let body = self
            .graph
            .request_with_token(
                &format!("{account_id}/insights"),
                &params,
                request.access_token.as_deref(),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "insights request failed"))?;

        serde_json::from_value(body).map_err(|e| {
            tracing::error!(error = %e, "unexpected insights payload");
            InsightsError::Internal(e.to_string())
        })
    }
}
