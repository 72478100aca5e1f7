//! Game record types and the store seam shared by the Postgres and memory backends.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest name the `games.name VARCHAR(255)` column accepts.
pub const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Writable columns of a game row (everything except id and timestamps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFields {
    pub publisher_id: String,
    pub name: String,
    pub platform: Platform,
    pub store_id: String,
    pub bundle_id: String,
    pub app_version: String,
    pub is_published: bool,
    pub rank: Option<i64>,
}

impl GameFields {
    /// Column checks the schema enforces; the memory backend runs them explicitly.
    pub fn check_columns(&self) -> Result<(), StoreError> {
        if self.name.chars().count() > MAX_NAME_CHARS {
            return Err(StoreError::constraint(
                "name",
                format!("value longer than {MAX_NAME_CHARS} characters"),
            ));
        }
        Ok(())
    }
}

/// A persisted game. The id is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    #[serde(flatten)]
    pub fields: GameFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Search criteria; an empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Case-insensitive substring of the game name.
    pub name: Option<String>,
    pub platform: Option<Platform>,
}

impl GameFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.platform.is_none()
    }

    pub fn matches(&self, game: &Game) -> bool {
        let name_ok = self.name.as_deref().map_or(true, |needle| {
            game.fields
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let platform_ok = self.platform.map_or(true, |p| game.fields.platform == p);
        name_ok && platform_ok
    }
}

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_all(&self, filter: &GameFilter) -> Result<Vec<Game>, StoreError>;

    async fn find_by_pk(&self, id: i64) -> Result<Option<Game>, StoreError>;

    async fn create(&self, fields: &GameFields) -> Result<Game, StoreError>;

    /// Returns `None` when no row has the given id.
    async fn update(&self, id: i64, fields: &GameFields) -> Result<Option<Game>, StoreError>;

    /// Hard delete. Returns whether a row was removed.
    async fn destroy(&self, id: i64) -> Result<bool, StoreError>;

    async fn begin(&self) -> Result<Box<dyn GameTransaction>, StoreError>;
}

/// An open store transaction. `commit` and `rollback` consume the handle, so it
/// cannot be used again once finished. Dropping an unfinished handle discards
/// its writes.
#[async_trait]
pub trait GameTransaction: Send {
    /// Insert every row as given, without duplicate checks.
    async fn bulk_create(&mut self, games: &[GameFields]) -> Result<Vec<Game>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[cfg(test)]
pub(crate) fn sample_fields(name: &str, platform: Platform) -> GameFields {
    GameFields {
        publisher_id: "pub-1".into(),
        name: name.into(),
        platform,
        store_id: format!("store-{name}"),
        bundle_id: String::new(),
        app_version: "1.0".into(),
        is_published: true,
        rank: None,
    }
}
