use crate::database_ops::games::{Game, GameFields, GameFilter, GameStore, GameTransaction};
use crate::error::StoreError;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgRow, PgSslMode},
    PgPool, Postgres, QueryBuilder, Row, Transaction,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

const GAME_COLUMNS: &str = "id, publisher_id, name, platform, store_id, bundle_id, app_version, is_published, rank, created_at, updated_at";

// 8 binds per row; keeps every statement well under Postgres' 65535 parameter cap.
const BULK_INSERT_CHUNK: usize = 1000;

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        auto_migrate: bool,
    ) -> Result<Self> {
        let use_prepared = crate::util::env::env_flag("USE_PREPARED", false);
        let mut connect_options = PgConnectOptions::from_str(database_url)?;

        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        if !use_prepared {
            // PgBouncer txn mode safe
            connect_options = connect_options.statement_cache_capacity(0);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");

        if auto_migrate {
            info!("running migrations (AUTO_MIGRATE=on, custom runner)");
            Self::run_migrations(&pool).await?;
        } else {
            info!("AUTO_MIGRATE disabled; skipping migrations");
        }
        Ok(Self { pool })
    }

    // Lightweight runner: applies `./migrations/<version>_<name>.sql` in version order,
    // ignoring files without a numeric prefix.
    async fn run_migrations(pool: &PgPool) -> Result<()> {
        use std::collections::HashSet;
        use std::{fs, path::Path};

        let dir = Path::new("./migrations");
        if !dir.exists() {
            return Ok(());
        }
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _sqlx_migrations (
                version BIGINT PRIMARY KEY,
                description TEXT,
                installed_at TIMESTAMPTZ DEFAULT now()
             )",
        )
        .execute(pool)
        .await?;

        let mut applied: HashSet<i64> = HashSet::new();
        for r in sqlx::raw_sql("SELECT version FROM _sqlx_migrations")
            .fetch_all(pool)
            .await?
        {
            applied.insert(r.try_get::<i64, _>(0)?);
        }

        let mut candidates: Vec<(i64, String, std::path::PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(fname) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(stem) = fname.strip_suffix(".sql") else {
                continue;
            };
            let Some((num, desc)) = stem.split_once('_') else {
                continue;
            };
            if let Ok(version) = num.parse::<i64>() {
                candidates.push((version, desc.to_string(), path.clone()));
            }
        }
        candidates.sort_by_key(|(v, _, _)| *v);

        for (version, desc, path) in candidates {
            if !applied.insert(version) {
                continue;
            }
            let sql = fs::read_to_string(&path)?;
            info!(version, file=?path, "applying migration");
            let mut tx = pool.begin().await?;
            sqlx::raw_sql(&sql).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO _sqlx_migrations(version, description) VALUES ($1, $2)")
                .persistent(false)
                .bind(version)
                .bind(&desc)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }
        info!(applied = applied.len(), "migrations up-to-date (custom)");
        Ok(())
    }
}

fn game_from_row(row: &PgRow) -> Result<Game, StoreError> {
    let platform: String = row.try_get("platform")?;
    Ok(Game {
        id: row.try_get("id")?,
        fields: GameFields {
            publisher_id: row.try_get("publisher_id")?,
            name: row.try_get("name")?,
            platform: platform.parse().map_err(StoreError::Decode)?,
            store_id: row.try_get("store_id")?,
            bundle_id: row.try_get("bundle_id")?,
            app_version: row.try_get("app_version")?,
            is_published: row.try_get("is_published")?,
            rank: row.try_get("rank")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl GameStore for Db {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT true")
            .persistent(false)
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_all(&self, filter: &GameFilter) -> Result<Vec<Game>, StoreError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {GAME_COLUMNS} FROM games WHERE TRUE"));
        if let Some(name) = &filter.name {
            qb.push(" AND name ILIKE ").push_bind(format!("%{name}%"));
        }
        if let Some(platform) = filter.platform {
            qb.push(" AND platform = ").push_bind(platform.as_str());
        }
        qb.push(" ORDER BY id");
        let rows = qb.build().persistent(false).fetch_all(&self.pool).await?;
        rows.iter().map(game_from_row).collect()
    }

    async fn find_by_pk(&self, id: i64) -> Result<Option<Game>, StoreError> {
        let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
            .persistent(false)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn create(&self, fields: &GameFields) -> Result<Game, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO games (publisher_id, name, platform, store_id, bundle_id, app_version, is_published, rank)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {GAME_COLUMNS}"
        ))
        .persistent(false)
        .bind(&fields.publisher_id)
        .bind(&fields.name)
        .bind(fields.platform.as_str())
        .bind(&fields.store_id)
        .bind(&fields.bundle_id)
        .bind(&fields.app_version)
        .bind(fields.is_published)
        .bind(fields.rank)
        .fetch_one(&self.pool)
        .await?;
        game_from_row(&row)
    }

    async fn update(&self, id: i64, fields: &GameFields) -> Result<Option<Game>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE games
             SET publisher_id = $1, name = $2, platform = $3, store_id = $4, bundle_id = $5,
                 app_version = $6, is_published = $7, rank = $8, updated_at = now()
             WHERE id = $9
             RETURNING {GAME_COLUMNS}"
        ))
        .persistent(false)
        .bind(&fields.publisher_id)
        .bind(&fields.name)
        .bind(fields.platform.as_str())
        .bind(&fields.store_id)
        .bind(&fields.bundle_id)
        .bind(&fields.app_version)
        .bind(fields.is_published)
        .bind(fields.rank)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn destroy(&self, id: i64) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM games WHERE id = $1")
            .persistent(false)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn begin(&self) -> Result<Box<dyn GameTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgGameTransaction { tx }))
    }
}

/// sqlx rolls the transaction back if this is dropped unfinished.
struct PgGameTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl GameTransaction for PgGameTransaction {
    #[instrument(skip(self, games), fields(rows = games.len()))]
    async fn bulk_create(&mut self, games: &[GameFields]) -> Result<Vec<Game>, StoreError> {
        let mut created = Vec::with_capacity(games.len());
        for chunk in games.chunks(BULK_INSERT_CHUNK) {
            let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO games (publisher_id, name, platform, store_id, bundle_id, app_version, is_published, rank) ",
            );
            qb.push_values(chunk, |mut b, g| {
                b.push_bind(&g.publisher_id)
                    .push_bind(&g.name)
                    .push_bind(g.platform.as_str())
                    .push_bind(&g.store_id)
                    .push_bind(&g.bundle_id)
                    .push_bind(&g.app_version)
                    .push_bind(g.is_published)
                    .push_bind(g.rank);
            });
            qb.push(" RETURNING ").push(GAME_COLUMNS);
            let rows = qb.build().persistent(false).fetch_all(&mut *self.tx).await?;
            for row in &rows {
                created.push(game_from_row(row)?);
            }
        }
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let PgGameTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let PgGameTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
