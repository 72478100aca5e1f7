// HTTP API server binary for the top-games service.

use anyhow::Result;
use std::sync::Arc;
use top_games::api::{ApiServer, AppState};
use top_games::database_ops::{feed::HttpFeedFetcher, open_store};
use top_games::logging::{init_tracing, DEFAULT_FILTER};
use top_games::orchestrator::{FeedConfig, IngestionOrchestrator};
use top_games::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_FILTER)?;
    tracing::info!("Initializing top-games API server");

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();
    env_util::preflight_check(
        "api_server",
        &["IOS_FEED_URL", "ANDROID_FEED_URL"],
        &[
            "API_HOST",
            "API_PORT",
            "ALLOWED_ORIGINS",
            "STORE_BACKEND",
            "DATABASE_URL",
            "DB_HOST",
            "DB_PASSWORD",
            "IOS_FEED_URL",
            "ANDROID_FEED_URL",
            "TOP_APP_RANK",
            "APP_ENV",
        ],
    )?;

    let server = ApiServer::from_env()?;
    let feeds = FeedConfig::from_env()?;
    let store = open_store().await?;
    tracing::info!("Game store connected");

    let populator = IngestionOrchestrator::new(Arc::new(HttpFeedFetcher::new()), store.clone(), feeds);
    server.run(AppState { store, populator }).await?;

    Ok(())
}
