//! Client for the Instagram Graph API.
//!
//! [`GraphClient`] owns the HTTP client, credentials and retry policy and
//! exposes two primitives, [`GraphClient::request`] and
//! [`GraphClient::list_paged`], plus thin resource accessors built on them.
//! [`InsightsService`] layers validated account-insights queries on top.

pub mod client;
mod endpoints;
pub mod error;
pub mod insights;
pub mod retry;
pub mod types;

pub use client::GraphClient;
pub use error::GraphError;
pub use insights::{
    Breakdown, InsightsError, InsightsRequest, InsightsResponse, InsightsService, Metric,
    MetricType, Period, Timeframe,
};
pub use retry::RetryPolicy;
pub use types::{ChildMedia, InsightEntry, InsightValue, Media, MediaChildren, Page, Paging, Profile};
