mod run;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use igpull_aggregator::Aggregator;
use igpull_graph::GraphClient;
use igpull_store::Store;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "igpull-cli")]
#[command(about = "Pull Instagram graph data into the configured store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Run every step: profile, media, media insights, user insights and
    /// optionally hashtag media.
    Aggregate {
        #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u16).range(1..=200))]
        media_limit: u16,
        /// Repeat for several hashtags.
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,
    },
    /// Fetch and store the account profile.
    Profile,
    /// Fetch and store feed media.
    Media {
        #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u16).range(1..=200))]
        limit: u16,
    },
    /// Fetch and store insights for one media item.
    MediaInsights { media_id: String },
    /// Fetch and store account-level insights.
    UserInsights,
    /// Fetch and store recent media for a hashtag.
    HashtagMedia {
        name: String,
        #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u16).range(1..=200))]
        limit: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = igpull_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let graph = Arc::new(GraphClient::from_config(&config)?);
    let store = Store::from_config(&config.store).await?;
    tracing::info!(store = store.kind(), table = %config.table_name, "storage gateway ready");
    let aggregator = Aggregator::from_config(graph, store, &config);

    let output = run::execute(&aggregator, &cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests;
