//! In-process game store. Enforces the same column constraints as the
//! Postgres schema and stages transactional inserts until commit.

use crate::database_ops::games::{Game, GameFields, GameFilter, GameStore, GameTransaction};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Game>,
}

impl Table {
    // Ids are handed out eagerly, so a rolled-back insert burns them like a sequence would.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryGameStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        lock_table(&self.table)
    }
}

fn lock_table(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn new_row(id: i64, fields: &GameFields) -> Game {
    let now = Utc::now();
    Game {
        id,
        fields: fields.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_all(&self, filter: &GameFilter) -> Result<Vec<Game>, StoreError> {
        let table = self.lock();
        Ok(table
            .rows
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect())
    }

    async fn find_by_pk(&self, id: i64) -> Result<Option<Game>, StoreError> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    async fn create(&self, fields: &GameFields) -> Result<Game, StoreError> {
        fields.check_columns()?;
        let mut table = self.lock();
        let id = table.next_id();
        let game = new_row(id, fields);
        table.rows.insert(id, game.clone());
        Ok(game)
    }

    async fn update(&self, id: i64, fields: &GameFields) -> Result<Option<Game>, StoreError> {
        fields.check_columns()?;
        let mut table = self.lock();
        Ok(table.rows.get_mut(&id).map(|game| {
            game.fields = fields.clone();
            game.updated_at = Utc::now();
            game.clone()
        }))
    }

    async fn destroy(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().rows.remove(&id).is_some())
    }

    async fn begin(&self) -> Result<Box<dyn GameTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            table: Arc::clone(&self.table),
            staged: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    table: Arc<Mutex<Table>>,
    staged: Vec<Game>,
}

#[async_trait]
impl GameTransaction for MemoryTransaction {
    async fn bulk_create(&mut self, games: &[GameFields]) -> Result<Vec<Game>, StoreError> {
        let mut created = Vec::with_capacity(games.len());
        for fields in games {
            fields.check_columns()?;
            let id = lock_table(&self.table).next_id();
            let game = new_row(id, fields);
            self.staged.push(game.clone());
            created.push(game);
        }
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { table, staged } = *self;
        let mut table = lock_table(&table);
        debug!(rows = staged.len(), "memory store commit");
        for game in staged {
            table.rows.insert(game.id, game);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(rows = self.staged.len(), "memory store rollback");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::games::{sample_fields, Platform};

    #[tokio::test]
    async fn crud_round_trip() {
        let store = MemoryGameStore::new();
        let created = store
            .create(&sample_fields("Stack", Platform::Ios))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let mut changed = created.fields.clone();
        changed.name = "Stack Ball".into();
        let updated = store.update(created.id, &changed).await.unwrap().unwrap();
        assert_eq!(updated.fields.name, "Stack Ball");
        assert_eq!(
            store.find_by_pk(created.id).await.unwrap().unwrap().fields.name,
            "Stack Ball"
        );

        assert!(store.update(99, &changed).await.unwrap().is_none());
        assert!(store.destroy(created.id).await.unwrap());
        assert!(!store.destroy(created.id).await.unwrap());
        assert!(store.find_all(&GameFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn staged_rows_are_invisible_until_commit() {
        let store = MemoryGameStore::new();
        let mut tx = store.begin().await.unwrap();
        let rows = vec![
            sample_fields("A", Platform::Ios),
            sample_fields("B", Platform::Android),
        ];
        let created = tx.bulk_create(&rows).await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(store.find_all(&GameFilter::default()).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        let all = store.find_all(&GameFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|g| g.fields.name.as_str()).collect::<Vec<_>>(),
            ["A", "B"]
        );
    }

    #[tokio::test]
    async fn rollback_and_drop_discard_staged_rows() {
        let store = MemoryGameStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.bulk_create(&[sample_fields("A", Platform::Ios)])
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.bulk_create(&[sample_fields("B", Platform::Ios)])
                .await
                .unwrap();
        }

        assert!(store.find_all(&GameFilter::default()).await.unwrap().is_empty());
        // Burned ids are not reused.
        let next = store
            .create(&sample_fields("C", Platform::Ios))
            .await
            .unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn over_long_name_is_rejected() {
        let store = MemoryGameStore::new();
        let mut fields = sample_fields("x", Platform::Android);
        fields.name = "x".repeat(300);
        assert!(matches!(
            store.create(&fields).await,
            Err(StoreError::Constraint { .. })
        ));
    }
}
