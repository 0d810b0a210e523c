use thiserror::Error;

/// Errors returned by the graph API client.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Network or TLS failure from the underlying HTTP client. The request
    /// URL is stripped so the access token never reaches logs.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The graph API answered with a non-2xx status.
    #[error("graph API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// A lookup returned zero matches (e.g. hashtag search).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected locally before any network call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No access token was configured and none was supplied with the call.
    #[error("Instagram access token is required")]
    MissingCredentials,

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("pagination limit reached for {endpoint}: exceeded {max_pages} pages")]
    PaginationLimit { endpoint: String, max_pages: usize },
}

impl GraphError {
    /// Upstream HTTP status, when the error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Upstream { status, .. } => Some(*status),
            GraphError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
