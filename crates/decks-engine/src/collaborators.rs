//! Seams to the rest of the mesh
//!
//! The service only talks to other services through these traits, so tests
//! can substitute in-process fakes for the HTTP implementations.

use async_trait::async_trait;
use decks_core::errors::{ExError, ExErrorKind};
use decks_core::Card;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::store::Result;

#[async_trait]
pub trait CardsService: Send + Sync {
    /// `cards.find`
    async fn find(&self, query: Value) -> Result<Vec<Card>>;

    /// `cards.get` with `mapping: true`; unknown ids are absent from the map
    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Card>>;
}

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn is_available(&self, service: &str) -> bool;

    /// Poll until every service in `services` is available
    ///
    /// # Errors
    ///
    /// `Timeout` when `timeout` elapses first.
    async fn wait_for_services(
        &self,
        services: &[&str],
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        let poll = async {
            loop {
                let mut ready = true;
                for service in services {
                    if !self.is_available(service).await {
                        ready = false;
                        break;
                    }
                }
                if ready {
                    return;
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            ExError::new(ExErrorKind::Timeout)
                .with_op("wait_for_services")
                .with_message(format!(
                    "services not available after {}ms: {}",
                    timeout.as_millis(),
                    services.join(", ")
                ))
        })
    }
}
