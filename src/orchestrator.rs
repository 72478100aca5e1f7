//! Populate pipeline: fetch both platform feeds, keep the top ranked records,
//! normalize them and insert the whole batch in one transaction.

use crate::database_ops::feed::FeedFetcher;
use crate::database_ops::games::{Game, GameFields, GameStore, Platform};
use crate::error::{IngestError, StoreError};
use crate::normalization::game::normalize_games;
use crate::normalization::rank::extract_top_by_rank;
use crate::util::env::{env_parse, env_req};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_TOP_APP_RANK: usize = 100;

/// Feed locations and the per-platform rank cut-off.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ios_url: String,
    pub android_url: String,
    pub top_app_rank: usize,
}

impl FeedConfig {
    /// Env: IOS_FEED_URL, ANDROID_FEED_URL (required), TOP_APP_RANK (default 100)
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ios_url: env_req("IOS_FEED_URL")?,
            android_url: env_req("ANDROID_FEED_URL")?,
            top_app_rank: env_parse("TOP_APP_RANK", DEFAULT_TOP_APP_RANK),
        })
    }
}

/// Normalized iOS rows followed by normalized Android rows.
#[derive(Debug, Clone, Default)]
pub struct IngestionBatch {
    pub games: Vec<GameFields>,
    pub ios_count: usize,
    pub android_count: usize,
}

impl IngestionBatch {
    fn new(ios: Vec<GameFields>, android: Vec<GameFields>) -> Self {
        let ios_count = ios.len();
        let android_count = android.len();
        let mut games = ios;
        games.extend(android);
        Self {
            games,
            ios_count,
            android_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateSummary {
    pub message: String,
    pub count: usize,
    pub ios_count: usize,
    pub android_count: usize,
}

impl PopulateSummary {
    fn new(count: usize, ios_count: usize, android_count: usize) -> Self {
        Self {
            message: format!(
                "Successfully populated {count} games ({ios_count} iOS, {android_count} Android)"
            ),
            count,
            ios_count,
            android_count,
        }
    }
}

#[derive(Clone)]
pub struct IngestionOrchestrator {
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn GameStore>,
    feeds: FeedConfig,
}

impl IngestionOrchestrator {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, store: Arc<dyn GameStore>, feeds: FeedConfig) -> Self {
        Self {
            fetcher,
            store,
            feeds,
        }
    }

    /// Fetch both feeds concurrently and build the batch. Fails only if a fetch
    /// fails; the first failure wins and the other result is discarded.
    #[instrument(skip(self), fields(limit = self.feeds.top_app_rank))]
    pub async fn prepare_batch(&self) -> Result<IngestionBatch, IngestError> {
        let (ios_raw, android_raw) = futures::try_join!(
            self.fetcher.fetch(&self.feeds.ios_url),
            self.fetcher.fetch(&self.feeds.android_url),
        )?;

        let limit = self.feeds.top_app_rank;
        let ios = normalize_games(&extract_top_by_rank(&ios_raw, limit), Platform::Ios);
        let android = normalize_games(&extract_top_by_rank(&android_raw, limit), Platform::Android);
        info!(ios = ios.len(), android = android.len(), "feeds extracted");

        Ok(IngestionBatch::new(ios, android))
    }

    /// Run one full ingestion. Not idempotent: every successful run inserts
    /// fresh rows, duplicates of earlier runs included.
    pub async fn populate(&self) -> Result<PopulateSummary, IngestError> {
        let batch = self.prepare_batch().await?;
        if batch.is_empty() {
            warn!("populate: both feeds extracted to zero games");
            return Err(IngestError::NoData);
        }

        let created = insert_batch(self.store.as_ref(), &batch.games)
            .await
            .map_err(IngestError::Persistence)?;

        let summary = PopulateSummary::new(created.len(), batch.ios_count, batch.android_count);
        info!(
            count = summary.count,
            ios = summary.ios_count,
            android = summary.android_count,
            "populate committed"
        );
        Ok(summary)
    }
}

/// All-or-nothing insert. On failure the transaction is rolled back before the
/// insert error is returned; a failed rollback is logged and never replaces it.
async fn insert_batch(store: &dyn GameStore, games: &[GameFields]) -> Result<Vec<Game>, StoreError> {
    let mut tx = store.begin().await?;
    match tx.bulk_create(games).await {
        Ok(created) => {
            tx.commit().await?;
            Ok(created)
        }
        Err(err) => {
            warn!(error = %err, rows = games.len(), "bulk insert failed; rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "rollback after failed bulk insert failed");
            }
            Err(err)
        }
    }
}
