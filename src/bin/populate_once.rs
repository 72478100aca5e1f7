// One-shot populate: fetch both feeds and insert the top ranked games.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use top_games::database_ops::{feed::HttpFeedFetcher, memory::MemoryGameStore, open_store};
use top_games::logging::{init_tracing, DEFAULT_FILTER};
use top_games::orchestrator::{FeedConfig, IngestionOrchestrator, DEFAULT_TOP_APP_RANK};
use top_games::util::env as env_util;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "populate_once", version, about = "Populate games from the top-games feeds")]
struct Cli {
    /// Override IOS_FEED_URL
    #[arg(long)]
    ios_url: Option<String>,
    /// Override ANDROID_FEED_URL
    #[arg(long)]
    android_url: Option<String>,
    /// Records kept per platform (overrides TOP_APP_RANK)
    #[arg(long)]
    top: Option<usize>,
    /// Fetch, extract and normalize only; nothing is written
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_FILTER)?;
    env_util::init_env();
    let cli = Cli::parse();

    let feeds = FeedConfig {
        ios_url: cli.ios_url.map_or_else(|| env_util::env_req("IOS_FEED_URL"), Ok)?,
        android_url: cli.android_url.map_or_else(|| env_util::env_req("ANDROID_FEED_URL"), Ok)?,
        top_app_rank: cli
            .top
            .unwrap_or_else(|| env_util::env_parse("TOP_APP_RANK", DEFAULT_TOP_APP_RANK)),
    };
    info!(ios = %feeds.ios_url, android = %feeds.android_url, top = feeds.top_app_rank, dry_run = cli.dry_run, "populate starting");

    let fetcher = Arc::new(HttpFeedFetcher::new());

    if cli.dry_run {
        let orchestrator = IngestionOrchestrator::new(fetcher, Arc::new(MemoryGameStore::new()), feeds);
        let batch = orchestrator.prepare_batch().await?;
        for game in &batch.games {
            println!("{}", serde_json::to_string(game)?);
        }
        println!(
            "{}",
            serde_json::json!({"count": batch.games.len(), "iosCount": batch.ios_count, "androidCount": batch.android_count})
        );
        info!("dry run complete; nothing written");
        return Ok(());
    }

    let store = open_store().await?;
    let summary = IngestionOrchestrator::new(fetcher, store, feeds).populate().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
