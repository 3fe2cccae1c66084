//! Process assembly: builds every component from configuration, starts
//! background tasks and runs the HTTP surface until shutdown.

use axum::Router;
use decks_core::errors::{ExError, ExErrorKind};
use decks_core_types::topics::SERVICE_CARDS;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::broker::LocalBroker;
use crate::cache::{spawn_cache_cleaner, ActionCache};
use crate::cards_client::HttpCardsClient;
use crate::collaborators::{CardsService, ServiceRegistry};
use crate::config::DecksConfig;
use crate::http::{self, AppState};
use crate::lifecycle::DeckLifecycle;
use crate::registry::HttpServiceRegistry;
use crate::runtime::NodeRuntime;
use crate::service::DeckService;
use crate::store::{DeckStore, Result};

pub struct DecksApp {
    config: DecksConfig,
    runtime: Arc<NodeRuntime>,
    broker: Arc<LocalBroker>,
    cache: Arc<ActionCache>,
    service: Arc<DeckService>,
    lifecycle: Arc<DeckLifecycle>,
    cancel: CancellationToken,
    cleaner: Mutex<Option<JoinHandle<()>>>,
}

impl DecksApp {
    /// Assemble the service around the given store and collaborators
    pub fn build(
        config: DecksConfig,
        store: DeckStore,
        cards: Arc<dyn CardsService>,
        registry: Arc<dyn ServiceRegistry>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let runtime = Arc::new(NodeRuntime::new(&config.node.node_id));
        let broker = Arc::new(LocalBroker::new());
        let cache = Arc::new(ActionCache::new());

        let lifecycle = Arc::new(DeckLifecycle::new(
            store.clone(),
            cards.clone(),
            registry,
            broker.clone(),
            cache.clone(),
            runtime.clone(),
            config.seeding.clone(),
            cancel.child_token(),
        ));

        let service = Arc::new(DeckService::new(
            store,
            cards,
            broker.clone(),
            cache.clone(),
            runtime.clone(),
            lifecycle.clone(),
        ));

        Self {
            config,
            runtime,
            broker,
            cache,
            service,
            lifecycle,
            cancel,
            cleaner: Mutex::new(None),
        }
    }

    /// Open the configured database and reach the cards service over HTTP
    pub fn from_config(config: DecksConfig) -> Result<Self> {
        let store = DeckStore::open(&config.database.path)?;
        let cards = Arc::new(HttpCardsClient::new(&config.cards.url)?);
        let registry =
            Arc::new(HttpServiceRegistry::new()?.with_service(SERVICE_CARDS, &config.cards.url));

        Ok(Self::build(config, store, cards, registry))
    }

    pub fn config(&self) -> &DecksConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Arc<NodeRuntime> {
        &self.runtime
    }

    pub fn broker(&self) -> &Arc<LocalBroker> {
        &self.broker
    }

    pub fn cache(&self) -> &Arc<ActionCache> {
        &self.cache
    }

    pub fn service(&self) -> &Arc<DeckService> {
        &self.service
    }

    pub fn lifecycle(&self) -> &Arc<DeckLifecycle> {
        &self.lifecycle
    }

    /// Start the cache cleaner and the seeding task
    ///
    /// Storage is already connected once the app is built.
    pub fn start(&self) {
        if let Ok(mut cleaner) = self.cleaner.lock() {
            if cleaner.is_none() {
                *cleaner = Some(spawn_cache_cleaner(
                    self.cache.clone(),
                    self.broker.subscribe(),
                    self.cancel.child_token(),
                ));
            }
        }
        self.lifecycle.after_connected();
    }

    pub fn router(&self) -> Router {
        http::router(AppState {
            service: self.service.clone(),
            runtime: self.runtime.clone(),
            broker: self.broker.clone(),
        })
    }

    /// Serve HTTP until `shutdown` resolves, then stop background tasks
    ///
    /// # Errors
    ///
    /// `Io` if the listener cannot bind or the server fails.
    pub async fn serve<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| io_error("bind", &e))?;

        self.start();
        tracing::info!(
            node_id = self.runtime.node_id(),
            addr = %addr,
            "decks service listening"
        );

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| io_error("serve", &e));

        self.shutdown().await;
        served
    }

    /// Cancel background work and wait for it to stop
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.lifecycle.shutdown().await;

        let cleaner = self.cleaner.lock().ok().and_then(|mut c| c.take());
        if let Some(handle) = cleaner {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "cache cleaner ended abnormally");
            }
        }
        tracing::info!(node_id = self.runtime.node_id(), "decks service stopped");
    }
}

fn io_error(op: &str, err: &std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(op.to_string())
        .with_message(err.to_string())
}
