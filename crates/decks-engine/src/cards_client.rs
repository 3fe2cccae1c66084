use async_trait::async_trait;
use decks_core::errors::{ExError, ExErrorKind};
use decks_core::Card;
use decks_core_types::topics::{CARDS_FIND, CARDS_GET};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::collaborators::CardsService;
use crate::store::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors encountered while calling the cards service
#[derive(Debug, Error)]
pub enum CardsClientError {
    #[error("request to {action} failed: {source}")]
    Http {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{action} returned {status}: {body}")]
    Status {
        action: &'static str,
        status: u16,
        body: String,
    },
    #[error("{action} returned an unreadable body: {source}")]
    Json {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl From<CardsClientError> for ExError {
    fn from(err: CardsClientError) -> Self {
        let op = match &err {
            CardsClientError::Http { action, .. }
            | CardsClientError::Status { action, .. }
            | CardsClientError::Json { action, .. } => *action,
        };
        let kind = match &err {
            CardsClientError::Http { source, .. } if source.is_timeout() => ExErrorKind::Timeout,
            _ => ExErrorKind::ExternalService,
        };
        ExError::new(kind).with_op(op).with_message(err.to_string())
    }
}

/// Cards service reached over its HTTP action surface
#[derive(Debug, Clone)]
pub struct HttpCardsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCardsClient {
    /// Client for a cards node at `endpoint` (e.g. `http://localhost:3002`)
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::Internal)
                    .with_op("cards_client")
                    .with_message(e.to_string())
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: &'static str,
        params: Value,
    ) -> std::result::Result<T, CardsClientError> {
        let url = format!("{}/{}", self.endpoint, action);
        let response = self
            .client
            .post(url)
            .json(&params)
            .send()
            .await
            .map_err(|source| CardsClientError::Http { action, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CardsClientError::Status {
                action,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|source| CardsClientError::Json { action, source })
    }
}

#[async_trait]
impl CardsService for HttpCardsClient {
    async fn find(&self, query: Value) -> Result<Vec<Card>> {
        Ok(self.call(CARDS_FIND, query).await?)
    }

    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Card>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .call(CARDS_GET, json!({ "id": ids, "mapping": true }))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_is_dropped() {
        let client = HttpCardsClient::new("http://cards:3000/").unwrap();
        assert_eq!(client.endpoint, "http://cards:3000");
    }

    #[test]
    fn test_status_error_is_external_service() {
        let err: ExError = CardsClientError::Status {
            action: CARDS_FIND,
            status: 503,
            body: "down".to_string(),
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::ExternalService);
        assert_eq!(err.op(), Some("cards.find"));
        assert!(err.message().contains("503"));
    }

    #[tokio::test]
    async fn test_empty_id_list_skips_the_network() {
        // Nothing listens on port 9; a request would fail
        let client = HttpCardsClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.get_many(&[]).await.unwrap().is_empty());
    }
}
