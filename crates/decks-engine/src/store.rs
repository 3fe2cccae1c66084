//! Async access to the deck repository
//!
//! The SQLite connection lives behind a `std::sync::Mutex`; every call runs
//! on the blocking pool so request tasks never hold the lock across an await.

use decks_core::errors::{ExError, ExErrorKind};
use decks_core::model::{Deck, DeckPatch};
use decks_core::query::{DeckFilter, FindOptions};
use decks_store::{db, migrations, DeckRepo};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub use decks_store::Result;

#[derive(Clone)]
pub struct DeckStore {
    conn: Arc<Mutex<Connection>>,
}

impl DeckStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open (or create) the database at `path` and apply migrations
    pub fn open(path: &str) -> Result<Self> {
        let mut conn = db::open_configured(path)?;
        migrations::apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                ExError::new(ExErrorKind::Concurrency)
                    .with_op(op)
                    .with_message("store lock poisoned")
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op(op)
                .with_message(e.to_string())
        })?
    }

    pub async fn insert(&self, deck: Deck) -> Result<Deck> {
        self.call("store.insert", move |conn| {
            DeckRepo::insert(conn, &deck)?;
            Ok(deck)
        })
        .await
    }

    pub async fn insert_if_absent(&self, deck: Deck) -> Result<bool> {
        self.call("store.insert_if_absent", move |conn| {
            DeckRepo::insert_if_absent(conn, &deck)
        })
        .await
    }

    pub async fn get(&self, deck_id: String) -> Result<Option<Deck>> {
        self.call("store.get", move |conn| DeckRepo::get(conn, &deck_id))
            .await
    }

    pub async fn get_many(&self, ids: Vec<String>) -> Result<Vec<Deck>> {
        self.call("store.get_many", move |conn| DeckRepo::get_many(conn, &ids))
            .await
    }

    pub async fn find(&self, options: FindOptions) -> Result<Vec<Deck>> {
        self.call("store.find", move |conn| DeckRepo::find(conn, &options))
            .await
    }

    pub async fn count(&self, filter: DeckFilter) -> Result<u64> {
        self.call("store.count", move |conn| DeckRepo::count(conn, &filter))
            .await
    }

    pub async fn update(&self, deck_id: String, patch: DeckPatch) -> Result<Option<Deck>> {
        self.call("store.update", move |conn| {
            DeckRepo::update(conn, &deck_id, patch)
        })
        .await
    }

    pub async fn remove(&self, deck_id: String) -> Result<Option<Deck>> {
        self.call("store.remove", move |conn| DeckRepo::remove(conn, &deck_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_blocking_pool() {
        let store = DeckStore::open(":memory:").unwrap();
        store.insert(Deck::new("d1", "Party")).await.unwrap();

        assert_eq!(store.count(DeckFilter::default()).await.unwrap(), 1);
        let loaded = store.get("d1".to_string()).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Party");
    }

    #[tokio::test]
    async fn test_clones_share_one_database() {
        let store = DeckStore::open(":memory:").unwrap();
        let other = store.clone();

        assert!(store.insert_if_absent(Deck::new("x", "X")).await.unwrap());
        assert!(!other.insert_if_absent(Deck::new("x", "Y")).await.unwrap());
    }
}
