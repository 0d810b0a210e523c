//! HTTP client for the Instagram Graph API.
//!
//! Every call attaches the access token as a query parameter and runs through
//! [`retry_with_backoff`]. Listing endpoints follow `paging.next` URLs until
//! the caller's limit is reached or the API stops returning a cursor.

use std::time::Duration;

use igpull_core::AppConfig;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GraphError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::Page;

/// Maximum number of pages followed by [`GraphClient::list_paged`].
/// Prevents infinite loops on cycling cursors.
pub(crate) const MAX_PAGES: usize = 200;

/// Client for the Instagram Graph API.
///
/// Use [`GraphClient::from_config`] in binaries or
/// [`GraphClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    access_token: Option<String>,
    base_url: Url,
    retry: RetryPolicy,
}

impl GraphClient {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Http`] if the HTTP client cannot be built, or
    /// [`GraphError::InvalidUrl`] if the configured base URL does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, GraphError> {
        Self::with_base_url(
            &config.api_base_url,
            &config.api_version,
            config.access_token.as_deref(),
            config.request_timeout_secs,
            config.retry.into(),
        )
    }

    /// Creates a client with a custom base URL and API version.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Http`] if the HTTP client cannot be built, or
    /// [`GraphError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        api_version: &str,
        access_token: Option<&str>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self, GraphError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("igpull/0.1 (graph-aggregator)")
            .build()?;

        // Normalise to `<base>/<version>/` so relative endpoints join under
        // the version segment instead of replacing it.
        let version = api_version.trim_matches('/');
        let normalised = if version.is_empty() {
            format!("{}/", base_url.trim_end_matches('/'))
        } else {
            format!("{}/{version}/", base_url.trim_end_matches('/'))
        };
        let base_url = Url::parse(&normalised).map_err(|e| GraphError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            access_token: access_token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
            base_url,
            retry,
        })
    }

    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Issues an authenticated GET against `endpoint` using the configured
    /// token and returns the JSON body.
    ///
    /// # Errors
    ///
    /// - [`GraphError::MissingCredentials`] if no token is configured.
    /// - [`GraphError::Upstream`] for non-2xx responses (5xx/429 after retries).
    /// - [`GraphError::Http`] on network failure after retries.
    /// - [`GraphError::Deserialize`] if the body is not JSON.
    pub async fn request(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, GraphError> {
        self.request_with_token(endpoint, params, None).await
    }

    /// Like [`Self::request`], but `token` overrides the configured token
    /// when present.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn request_with_token(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Value, GraphError> {
        let url = self.build_url(endpoint, params, token)?;
        tracing::debug!(endpoint, "graph API request");
        self.get_json_with_retry(&url, endpoint).await
    }

    /// [`Self::request`] followed by deserialization into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`], plus [`GraphError::Deserialize`] if the body
    /// does not match `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        let body = self.request(endpoint, params).await?;
        serde_json::from_value(body).map_err(|e| GraphError::Deserialize {
            context: endpoint.to_owned(),
            source: e,
        })
    }

    /// Fetches up to `limit` items from a paginated listing.
    ///
    /// The first page is requested with `params`; later pages follow the
    /// `paging.next` URL returned by the API, each through the same retry
    /// policy. Returns exactly `min(limit, available)` items in upstream order.
    ///
    /// # Errors
    ///
    /// Propagates any page failure (no partial lists), and returns
    /// [`GraphError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn list_paged<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<T>, GraphError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let first_url = self.build_url(endpoint, params, None)?;
        let mut page: Page<T> = self.fetch_page(&first_url, endpoint).await?;
        let mut items: Vec<T> = Vec::new();
        let mut page_count = 1usize;

        loop {
            let next = page.next_cursor().map(str::to_owned);
            items.extend(page.data);

            if items.len() >= limit {
                break;
            }
            let Some(next) = next else {
                break;
            };

            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(GraphError::PaginationLimit {
                    endpoint: endpoint.to_owned(),
                    max_pages: MAX_PAGES,
                });
            }

            let next_url = Url::parse(&next).map_err(|e| GraphError::InvalidUrl {
                url: redact_query(&next),
                reason: e.to_string(),
            })?;
            tracing::debug!(endpoint, page = page_count, "following paging.next cursor");
            page = self.fetch_page(&next_url, endpoint).await?;
        }

        items.truncate(limit);
        Ok(items)
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &Url,
        endpoint: &str,
    ) -> Result<Page<T>, GraphError> {
        let body = self.get_json_with_retry(url, endpoint).await?;
        serde_json::from_value(body).map_err(|e| GraphError::Deserialize {
            context: format!("page of {endpoint}"),
            source: e,
        })
    }

    async fn get_json_with_retry(&self, url: &Url, endpoint: &str) -> Result<Value, GraphError> {
        retry_with_backoff(self.retry, endpoint, || self.get_json(url)).await
    }

    /// Sends one GET and parses the body as JSON. Non-2xx statuses become
    /// [`GraphError::Upstream`] carrying the response text.
    async fn get_json(&self, url: &Url) -> Result<Value, GraphError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GraphError::Http(e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GraphError::Http(e.without_url()))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), path = url.path(), "graph API error response");
            return Err(GraphError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GraphError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }

    /// Builds the full request URL with percent-encoded query parameters and
    /// the access token appended last.
    pub(crate) fn build_url(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Url, GraphError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.access_token.as_deref())
            .ok_or(GraphError::MissingCredentials)?;

        let mut url = self
            .base_url
            // `./` keeps a colon in the first segment from reading as a scheme.
            .join(&format!("./{}", endpoint.trim_start_matches('/')))
            .map_err(|e| GraphError::InvalidUrl {
                url: endpoint.to_owned(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("access_token", token);
        }
        Ok(url)
    }
}

/// Drops the query string so cursors carrying a token are safe to log.
fn redact_query(raw: &str) -> String {
    raw.split('?').next().unwrap_or(raw).to_owned()
}

/// Rejects identifiers that would escape their path segment.
pub(crate) fn path_segment<'a>(kind: &str, id: &'a str) -> Result<&'a str, GraphError> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#', '&']) || id == "." || id == ".." {
        return Err(GraphError::Validation(format!("invalid {kind}: {id:?}")));
    }
    Ok(id)
}
