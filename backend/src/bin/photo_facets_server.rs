//! HTTP server for faceted photo navigation backed by ClickHouse.

use std::sync::Arc;

use anyhow::Context;
use backend::{
    EngineConfig, Navigator, db_utils::clickhouse_store::ClickhouseStore,
    server_extra::navigate_route::navigation_router,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(EngineConfig::from_env().context("loading configuration")?);
    let listen_addr = std::env::var("LISTEN_ADDR").unwrap_or("0.0.0.0:8080".to_string());

    let store = ClickhouseStore::from_config(&config);
    let navigator = Arc::new(Navigator::new(store, config));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    tracing::info!(%listen_addr, "serving photo navigation");
    axum::serve(listener, navigation_router(navigator)).await.context("server stopped")?;
    Ok(())
}
