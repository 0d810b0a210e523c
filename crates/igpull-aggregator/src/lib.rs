//! Data aggregation: fetch account resources from the graph API, shape them
//! into flat records, and persist them through a [`StorageGateway`].
//!
//! [`igpull_store::StorageGateway`]: igpull_store::StorageGateway

mod aggregator;
mod error;
mod shape;
pub mod summary;

pub use aggregator::{Aggregator, DEFAULT_DEADLINE};
pub use error::AggregateError;
pub use summary::{
    AggregationSummary, HashtagItem, HashtagOutcome, HashtagsSummary, MediaInsightsItem,
    MediaInsightsSummary, MediaSummary, ProfileSummary, StepOutcome,
};
