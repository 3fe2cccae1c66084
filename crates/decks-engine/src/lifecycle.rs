//! Deck lifecycle manager
//!
//! Two jobs:
//! - publish `decks.created` / `decks.updated` / `decks.removed` after each
//!   completed mutation (as the service's `EntityHooks`)
//! - seed the store with the "Base cards" deck once storage is connected
//!
//! ## Seeding workflow (in order):
//! 1. Start delay
//! 2. Bounded wait for the cards service
//! 3. Count decks
//! 4. If none: fetch every card, partition by type, insert the seed deck
//!    under its reserved id (insert-if-absent)
//! 5. Broadcast `cache.clean.decks` and purge the local cache
//!
//! Every await in the workflow races the lifecycle's cancellation token.
//! The outcome is published as a `SeedStatus` and reported to the node
//! runtime, so failures surface through health instead of the process.

use async_trait::async_trait;
use decks_core::errors::{ExError, ExErrorKind};
use decks_core::query::DeckFilter;
use decks_core::seeding::{seed_deck, SEED_DECK_ID};
use decks_core::{log_op_end, log_op_error, log_op_start, DeckChange, DeckEvent};
use decks_core_types::topics::{SERVICE_CARDS, SERVICE_DECKS};
use decks_core_types::RequestContext;
use futures::FutureExt;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::broker::EventBroker;
use crate::cache::ActionCache;
use crate::collaborators::{CardsService, ServiceRegistry};
use crate::config::SeedingConfig;
use crate::runtime::{NodeRuntime, ServiceHealth};
use crate::service::{clear_deck_cache, EntityHooks};
use crate::store::{DeckStore, Result};

pub const OP_SEED: &str = "decks.seed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SeedStatus {
    Pending,
    WaitingForDependency,
    Seeding,
    Seeded { deck_id: String },
    /// Decks already existed; nothing was written
    Skipped { existing: u64 },
    Failed { code: String, message: String },
    Cancelled,
}

impl SeedStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SeedStatus::Seeded { .. }
                | SeedStatus::Skipped { .. }
                | SeedStatus::Failed { .. }
                | SeedStatus::Cancelled
        )
    }

    /// Service health entry for this status; only failure degrades
    pub fn health(&self) -> ServiceHealth {
        let details = json!({ "seed": self });
        match self {
            SeedStatus::Failed { .. } => ServiceHealth::degraded(details),
            _ => ServiceHealth::ok(details),
        }
    }
}

pub struct DeckLifecycle {
    store: DeckStore,
    cards: Arc<dyn CardsService>,
    registry: Arc<dyn ServiceRegistry>,
    broker: Arc<dyn EventBroker>,
    cache: Arc<ActionCache>,
    runtime: Arc<NodeRuntime>,
    seeding: SeedingConfig,
    status: watch::Sender<SeedStatus>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DeckLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: DeckStore,
        cards: Arc<dyn CardsService>,
        registry: Arc<dyn ServiceRegistry>,
        broker: Arc<dyn EventBroker>,
        cache: Arc<ActionCache>,
        runtime: Arc<NodeRuntime>,
        seeding: SeedingConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (status, _) = watch::channel(SeedStatus::Pending);
        runtime.report(SERVICE_DECKS, SeedStatus::Pending.health());
        Self {
            store,
            cards,
            registry,
            broker,
            cache,
            runtime,
            seeding,
            status,
            cancel,
            task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> SeedStatus {
        self.status.borrow().clone()
    }

    /// Receiver for status changes; see `watch::Receiver::wait_for`
    pub fn subscribe_status(&self) -> watch::Receiver<SeedStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: SeedStatus) {
        tracing::debug!(op = OP_SEED, ?status, "seed status changed");
        self.runtime.report(SERVICE_DECKS, status.health());
        self.status.send_replace(status);
    }

    /// Storage is connected: start the seeding task
    ///
    /// Returns immediately. Seeding disabled in configuration is a no-op,
    /// and only the first call spawns a task.
    pub fn after_connected(self: &Arc<Self>) {
        if !self.seeding.enabled {
            tracing::info!(op = OP_SEED, "seeding disabled");
            return;
        }

        let Ok(mut task) = self.task.lock() else {
            return;
        };
        if task.is_some() {
            return;
        }

        let this = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            this.run_seeding(this.seeding.start_delay()).await;
        }));
    }

    /// Run the seeding workflow to completion and record the outcome
    pub async fn run_seeding(&self, start_delay: Duration) -> SeedStatus {
        log_op_start!(OP_SEED, start_delay_ms = start_delay.as_millis() as u64);
        let start = std::time::Instant::now();

        let status = match self.seed_impl(start_delay).await {
            Ok(status) => {
                log_op_end!(
                    OP_SEED,
                    duration_ms = start.elapsed().as_millis() as u64,
                    seed_status = ?status
                );
                status
            }
            Err(e) if e.kind() == ExErrorKind::Cancelled => {
                tracing::info!(op = OP_SEED, "seeding cancelled");
                SeedStatus::Cancelled
            }
            Err(e) => {
                log_op_error!(
                    OP_SEED,
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                SeedStatus::Failed {
                    code: e.code().to_string(),
                    message: e.to_string(),
                }
            }
        };

        self.set_status(status.clone());
        status
    }

    async fn seed_impl(&self, start_delay: Duration) -> Result<SeedStatus> {
        self.until_cancelled(tokio::time::sleep(start_delay).map(Ok))
            .await?;

        self.set_status(SeedStatus::WaitingForDependency);
        self.until_cancelled(self.registry.wait_for_services(
            &[SERVICE_CARDS],
            self.seeding.dependency_timeout(),
            self.seeding.poll_interval(),
        ))
        .await?;

        self.set_status(SeedStatus::Seeding);
        let existing = self
            .until_cancelled(self.store.count(DeckFilter::default()))
            .await?;

        let outcome = if existing == 0 {
            self.create_seed_deck().await?
        } else {
            SeedStatus::Skipped { existing }
        };

        clear_deck_cache(self.broker.as_ref(), &self.cache).await?;
        Ok(outcome)
    }

    async fn create_seed_deck(&self) -> Result<SeedStatus> {
        let cards = self.until_cancelled(self.cards.find(json!({}))).await?;
        let deck = seed_deck(&cards).into_deck(SEED_DECK_ID);
        tracing::debug!(
            op = OP_SEED,
            card_count = cards.len() as u64,
            white = deck.white_cards.len() as u64,
            black = deck.black_cards.len() as u64,
            "cards partitioned"
        );

        let written = self
            .until_cancelled(self.store.insert_if_absent(deck.clone()))
            .await?;
        if !written {
            // Another instance sharing the store seeded first
            let existing = self
                .until_cancelled(self.store.count(DeckFilter::default()))
                .await?;
            return Ok(SeedStatus::Skipped { existing });
        }

        let event = DeckEvent::new(DeckChange::Created, deck);
        if let Err(e) = self.entity_changed(&event, &RequestContext::new()).await {
            tracing::warn!(op = OP_SEED, error = %e, "seed deck event not published");
        }

        Ok(SeedStatus::Seeded {
            deck_id: event.deck.id,
        })
    }

    async fn until_cancelled<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ExError::new(ExErrorKind::Cancelled)
                .with_op(OP_SEED)
                .with_message("seeding cancelled")),
            result = fut => result,
        }
    }

    /// Cancel the seeding task and wait for it to finish
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(op = OP_SEED, error = %e, "seeding task ended abnormally");
            }
        }
    }
}

#[async_trait]
impl EntityHooks for DeckLifecycle {
    async fn entity_changed(&self, event: &DeckEvent, ctx: &RequestContext) -> Result<()> {
        self.broker.emit(event.topic(), event.payload()?).await?;
        tracing::debug!(
            topic = event.topic(),
            deck_id = %event.deck.id,
            request_id = %ctx.request_id,
            "lifecycle event emitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::HealthStatus;

    #[test]
    fn test_status_wire_shape() {
        let status = SeedStatus::Seeded {
            deck_id: "base-cards".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"state": "seeded", "deck_id": "base-cards"})
        );
        assert_eq!(
            serde_json::to_value(SeedStatus::WaitingForDependency).unwrap(),
            json!({"state": "waiting_for_dependency"})
        );
    }

    #[test]
    fn test_only_failure_degrades() {
        let failed = SeedStatus::Failed {
            code: "ERR_TIMEOUT".to_string(),
            message: "cards never came up".to_string(),
        };
        assert_eq!(failed.health().status, HealthStatus::Degraded);
        assert_eq!(SeedStatus::Cancelled.health().status, HealthStatus::Ok);
        assert!(failed.is_terminal());
        assert!(!SeedStatus::Seeding.is_terminal());
    }
}
