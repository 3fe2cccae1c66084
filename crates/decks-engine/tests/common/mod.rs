#![allow(dead_code)]

use async_trait::async_trait;
use decks_core::errors::{ExError, ExErrorKind};
use decks_core::Card;
use decks_engine::collaborators::{CardsService, ServiceRegistry};
use decks_engine::config::{DecksConfig, SeedingConfig};
use decks_engine::store::{DeckStore, Result};
use decks_engine::DecksApp;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory cards service
#[derive(Default)]
pub struct FakeCards {
    cards: Vec<Card>,
    pub find_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub fail: AtomicBool,
    /// Artificial latency of `get_many`, in milliseconds
    pub get_delay_ms: AtomicU64,
}

impl FakeCards {
    pub fn new(cards: Vec<Card>) -> Arc<Self> {
        Arc::new(Self {
            cards,
            ..Default::default()
        })
    }

    pub fn sample() -> Arc<Self> {
        Self::new(vec![
            Card::new("a", "black"),
            Card::new("b", "white"),
            Card::new("c", "black"),
        ])
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExError::new(ExErrorKind::ExternalService)
                .with_op("cards.find")
                .with_message("cards node crashed"));
        }
        Ok(())
    }
}

#[async_trait]
impl CardsService for FakeCards {
    async fn find(&self, _query: Value) -> Result<Vec<Card>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.cards.clone())
    }

    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Card>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.get_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check()?;
        Ok(self
            .cards
            .iter()
            .filter(|c| ids.contains(&c.id))
            .map(|c| (c.id.clone(), c.clone()))
            .collect())
    }
}

/// Registry whose availability the test controls
pub struct FakeRegistry {
    pub available: AtomicBool,
    pub polls: AtomicUsize,
}

impl FakeRegistry {
    pub fn up() -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(true),
            polls: AtomicUsize::new(0),
        })
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(false),
            polls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ServiceRegistry for FakeRegistry {
    async fn is_available(&self, _service: &str) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }
}

/// Seeding settings short enough for tests
pub fn fast_seeding() -> SeedingConfig {
    SeedingConfig {
        enabled: true,
        start_delay_ms: 0,
        dependency_timeout_ms: 2_000,
        poll_interval_ms: 5,
    }
}

pub fn test_config() -> DecksConfig {
    DecksConfig {
        seeding: fast_seeding(),
        ..Default::default()
    }
}

pub fn memory_store() -> DeckStore {
    DeckStore::open(":memory:").unwrap()
}

pub fn app_with(
    config: DecksConfig,
    store: DeckStore,
    cards: Arc<FakeCards>,
    registry: Arc<FakeRegistry>,
) -> DecksApp {
    DecksApp::build(config, store, cards, registry)
}

/// App with seeding disabled, for action tests
pub fn quiet_app(cards: Arc<FakeCards>) -> DecksApp {
    let mut config = test_config();
    config.seeding.enabled = false;
    app_with(config, memory_store(), cards, FakeRegistry::up())
}

pub const WAIT: Duration = Duration::from_secs(5);
