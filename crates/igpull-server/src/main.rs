mod api;
mod middleware;

use std::sync::Arc;

use igpull_aggregator::Aggregator;
use igpull_core::StoreConfig;
use igpull_graph::GraphClient;
use igpull_store::Store;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = igpull_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if matches!(config.store, StoreConfig::Memory) {
        tracing::warn!("no storage backend configured; records are kept in memory only");
    }

    let graph = Arc::new(GraphClient::from_config(&config)?);
    if !graph.has_access_token() {
        tracing::warn!(
            "INSTAGRAM_ACCESS_TOKEN not set; aggregator routes will fail until a token is configured"
        );
    }
    let store = Store::from_config(&config.store).await?;
    tracing::info!(
        store = store.kind(),
        table = %config.table_name,
        api_version = %config.api_version,
        "storage gateway ready"
    );

    let aggregator = Aggregator::from_config(Arc::clone(&graph), store, &config);
    let app = build_app(AppState::new(graph, aggregator), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
