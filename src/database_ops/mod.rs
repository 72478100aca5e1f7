pub mod db;
pub mod feed;
pub mod games;
pub mod memory;

use crate::util::env::{db_url, env_flag, env_opt, env_parse};
use anyhow::{bail, Context, Result};
use games::GameStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Open the store selected by STORE_BACKEND (`postgres` by default, or `memory`).
/// Postgres env: DATABASE_URL or DB_* parts, DB_MAX_CONNS (10), AUTO_MIGRATE (off).
pub async fn open_store() -> Result<Arc<dyn GameStore>> {
    let backend = env_opt("STORE_BACKEND").unwrap_or_else(|| "postgres".into());
    match backend.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => {
            let url = db_url()?;
            let max_connections: u32 = env_parse("DB_MAX_CONNS", 10u32);
            let db = db::Db::connect(&url, max_connections, env_flag("AUTO_MIGRATE", false))
                .await
                .context("failed to connect to postgres")?;
            info!(max_connections, "postgres game store ready");
            Ok(Arc::new(db))
        }
        "memory" => {
            warn!("using in-memory game store; rows are lost on exit");
            Ok(Arc::new(memory::MemoryGameStore::new()))
        }
        other => bail!("unknown STORE_BACKEND '{other}' (expected postgres or memory)"),
    }
}
