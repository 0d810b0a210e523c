use std::time::Duration;

use igpull_core::Row;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, Url};
use serde_json::Value;

use crate::{
    conflict_key, validate_filters, validate_identifier, value_as_key, StorageGateway, StoreError,
};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Supabase backend speaking PostgREST at `<url>/rest/v1/<table>`.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    rest_url: Url,
}

impl SupabaseStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `url` does not parse or `key`
    /// contains characters not allowed in a header, and
    /// [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(url: &str, key: &str) -> Result<Self, StoreError> {
        let rest_url = Url::parse(&format!("{}/rest/v1/", url.trim_end_matches('/')))
            .map_err(|e| StoreError::Config(format!("invalid Supabase URL: {e}")))?;

        let mut api_key = HeaderValue::from_str(key)
            .map_err(|_| StoreError::Config("Supabase key is not a valid header value".to_owned()))?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| StoreError::Config("Supabase key is not a valid header value".to_owned()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, rest_url })
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        let table = validate_identifier(table)?;
        self.rest_url
            .join(table)
            .map_err(|e| StoreError::Config(format!("invalid table URL: {e}")))
    }

    async fn post(&self, url: Url, row: &Row, prefer: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(url)
            .header("Prefer", prefer)
            .json(&[row])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

impl StorageGateway for SupabaseStore {
    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<(), StoreError> {
        let on_conflict = validate_identifier(on_conflict)?;
        conflict_key(row, on_conflict)?;
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);

        self.post(url, row, "resolution=merge-duplicates,return=minimal")
            .await
            .inspect_err(|e| tracing::error!(table, error = %e, "supabase upsert failed"))
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        let url = self.table_url(table)?;
        self.post(url, row, "return=minimal")
            .await
            .inspect_err(|e| tracing::error!(table, error = %e, "supabase insert failed"))
    }

    async fn select(&self, table: &str, filters: &[(&str, Value)]) -> Result<Vec<Row>, StoreError> {
        validate_filters(filters)?;
        let mut url = self.table_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for (column, value) in filters {
                pairs.append_pair(column, &format!("eq.{}", value_as_key(value)));
            }
        }

        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<Vec<Row>>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Upstream {
        status: status.as_u16(),
        body,
    })
}
