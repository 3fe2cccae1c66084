//! In-process event broker
//!
//! `emit` targets one instance of each interested service, `broadcast`
//! targets every node. With a single process both reach every local
//! subscriber; the kind is kept on the delivered event.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::store::Result;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Emit,
    Broadcast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerEvent {
    pub name: String,
    pub payload: Value,
    pub kind: EventKind,
}

#[async_trait]
pub trait EventBroker: Send + Sync {
    /// Balanced event
    async fn emit(&self, event: &str, payload: Value) -> Result<()>;

    /// Event for all nodes
    async fn broadcast(&self, event: &str, payload: Value) -> Result<()>;
}

/// Broker backed by a `tokio::sync::broadcast` channel
#[derive(Debug, Clone)]
pub struct LocalBroker {
    tx: broadcast::Sender<BrokerEvent>,
}

impl Default for LocalBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBroker {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BrokerEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: &str, payload: Value, kind: EventKind) -> Result<()> {
        let delivered = self
            .tx
            .send(BrokerEvent {
                name: event.to_string(),
                payload,
                kind,
            })
            // No subscribers is not a failure for a fire-and-forget event
            .unwrap_or(0);

        tracing::debug!(event, ?kind, delivered, "event published");
        Ok(())
    }
}

#[async_trait]
impl EventBroker for LocalBroker {
    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        self.publish(event, payload, EventKind::Emit)
    }

    async fn broadcast(&self, event: &str, payload: Value) -> Result<()> {
        self.publish(event, payload, EventKind::Broadcast)
    }
}
