//! Static service registry with HTTP health probes

use async_trait::async_trait;
use decks_core::errors::{ExError, ExErrorKind};
use std::collections::HashMap;
use std::time::Duration;

use crate::collaborators::ServiceRegistry;
use crate::store::Result;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Registry of known service endpoints
///
/// A service is available when `GET {url}/health` answers 2xx. Names that
/// were never registered are never available.
#[derive(Debug, Clone)]
pub struct HttpServiceRegistry {
    client: reqwest::Client,
    endpoints: HashMap<String, String>,
}

impl HttpServiceRegistry {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::Internal)
                    .with_op("service_registry")
                    .with_message(e.to_string())
            })?;
        Ok(Self {
            client,
            endpoints: HashMap::new(),
        })
    }

    pub fn with_service(mut self, name: impl Into<String>, url: &str) -> Self {
        self.endpoints
            .insert(name.into(), url.trim_end_matches('/').to_string());
        self
    }
}

#[async_trait]
impl ServiceRegistry for HttpServiceRegistry {
    async fn is_available(&self, service: &str) -> bool {
        let Some(endpoint) = self.endpoints.get(service) else {
            return false;
        };

        match self.client.get(format!("{}/health", endpoint)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(service, error = %e, "health probe failed");
                false
            }
        }
    }
}
