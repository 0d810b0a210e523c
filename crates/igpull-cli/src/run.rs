//! Command execution, kept apart from `main` so it can run against any
//! storage gateway.

use igpull_aggregator::Aggregator;
use igpull_store::StorageGateway;
use serde_json::Value;

use crate::Commands;

/// Runs `command` and returns its JSON result.
///
/// # Errors
///
/// Returns an error if the step fails. For `aggregate`, isolated per-item
/// failures are reported in the summary and logged, not returned.
pub(crate) async fn execute<S: StorageGateway>(
    aggregator: &Aggregator<S>,
    command: &Commands,
) -> anyhow::Result<Value> {
    let value = match command {
        Commands::Aggregate {
            media_limit,
            hashtags,
        } => {
            let summary = aggregator
                .aggregate_all(usize::from(*media_limit), hashtags)
                .await?;
            let failures = summary.failure_count();
            if failures > 0 {
                tracing::warn!(failures, "aggregation completed with isolated failures");
            }
            serde_json::to_value(summary)?
        }
        Commands::Profile => serde_json::to_value(aggregator.fetch_and_store_profile().await?)?,
        Commands::Media { limit } => {
            serde_json::to_value(aggregator.fetch_and_store_media(usize::from(*limit)).await?)?
        }
        Commands::MediaInsights { media_id } => serde_json::to_value(
            aggregator.fetch_and_store_media_insights(media_id).await?,
        )?,
        Commands::UserInsights => {
            serde_json::to_value(aggregator.fetch_and_store_user_insights().await?)?
        }
        Commands::HashtagMedia { name, limit } => serde_json::to_value(
            aggregator
                .fetch_and_store_hashtag_media(name, usize::from(*limit))
                .await?,
        )?,
    };
    Ok(value)
}
