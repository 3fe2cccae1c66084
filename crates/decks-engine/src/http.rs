//! HTTP surface
//!
//! - `POST /{action}`: JSON params (empty body means `{}`), action result
//! - `GET /health`: runtime health
//! - `POST /events/{event}`: inbound mesh event, republished locally

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use decks_core::errors::{DecksError, ExError, ExErrorKind};
use decks_core_types::RequestContext;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::broker::EventBroker;
use crate::runtime::{NodeRuntime, RuntimeHealth};
use crate::service::DeckService;

pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_TRACE_ID: &str = "x-trace-id";
pub const HEADER_CALLER: &str = "x-caller";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DeckService>,
    pub runtime: Arc<NodeRuntime>,
    pub broker: Arc<dyn EventBroker>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events/:event", post(inbound_event))
        .route("/:action", post(call_action))
        .with_state(state)
}

/// Error response carrying the canonical error
#[derive(Debug)]
pub struct ApiError(pub ExError);

impl From<ExError> for ApiError {
    fn from(err: ExError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(kind: ExErrorKind) -> StatusCode {
    match kind {
        ExErrorKind::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
        ExErrorKind::NotFound | ExErrorKind::NotImplemented => StatusCode::NOT_FOUND,
        ExErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ExErrorKind::ExternalService => StatusCode::BAD_GATEWAY,
        ExErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_name(kind: ExErrorKind) -> &'static str {
    match kind {
        ExErrorKind::InvalidInput => "ValidationError",
        ExErrorKind::NotFound => "EntityNotFoundError",
        ExErrorKind::NotImplemented => "ActionNotFoundError",
        ExErrorKind::AlreadyExists => "EntityAlreadyExistsError",
        ExErrorKind::ExternalService => "ServiceNotAvailableError",
        ExErrorKind::Timeout => "RequestTimeoutError",
        _ => "InternalError",
    }
}

/// `{name, message, code, type, data}` body for an error
pub fn error_body(err: &ExError) -> Value {
    let data = if !err.field_errors().is_empty() {
        json!(err.field_errors())
    } else if let Some(id) = err.entity_id() {
        json!({ "id": id })
    } else {
        Value::Null
    };
    let message = if err.message().is_empty() {
        err.to_string()
    } else {
        err.message().to_string()
    };

    json!({
        "name": error_name(err.kind()),
        "message": message,
        "code": status_for(err.kind()).as_u16(),
        "type": err.code(),
        "data": data,
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(self.0.kind()), Json(error_body(&self.0))).into_response()
    }
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    RequestContext::from_parts(
        header(HEADER_REQUEST_ID),
        header(HEADER_TRACE_ID),
        header(HEADER_CALLER),
    )
}

fn parse_body(body: &Bytes, empty: Value) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(empty);
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError(
            DecksError::InvalidParams {
                reason: format!("body is not valid JSON: {}", e),
            }
            .into(),
        )
    })
}

async fn call_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let params = parse_body(&body, json!({}))?;
    let ctx = request_context(&headers);
    let result = state.service.call(&action, params, &ctx).await?;
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> Json<RuntimeHealth> {
    Json(state.runtime.health())
}

async fn inbound_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let payload = parse_body(&body, Value::Null)?;
    state.broker.broadcast(&event, payload).await?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use decks_core::FieldError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ExErrorKind::InvalidInput), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ExErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ExErrorKind::NotImplemented), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ExErrorKind::ExternalService), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ExErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(ExErrorKind::Persistence),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let err: ExError = DecksError::Validation {
            errors: vec![FieldError::new("name", "field is required")],
        }
        .into();

        let body = error_body(&err);
        assert_eq!(body["name"], "ValidationError");
        assert_eq!(body["code"], 422);
        assert_eq!(body["type"], "ERR_INVALID_INPUT");
        assert_eq!(body["data"][0]["field"], "name");
    }

    #[test]
    fn test_not_found_body_carries_id() {
        let err: ExError = DecksError::DeckNotFound {
            deck_id: "d9".to_string(),
        }
        .into();

        let body = error_body(&err);
        assert_eq!(body["name"], "EntityNotFoundError");
        assert_eq!(body["data"], json!({"id": "d9"}));
    }

    #[test]
    fn test_headers_become_context() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_REQUEST_ID, "req-1".parse().unwrap());
        headers.insert(HEADER_CALLER, "gateway".parse().unwrap());

        let ctx = request_context(&headers);
        assert_eq!(ctx.request_id.as_str(), "req-1");
        assert_eq!(ctx.caller.as_deref(), Some("gateway"));
        assert!(ctx.trace_id.is_none());
    }

    #[test]
    fn test_empty_body_defaults() {
        assert_eq!(parse_body(&Bytes::from_static(b"  "), json!({})).unwrap(), json!({}));
        assert!(parse_body(&Bytes::from_static(b"{oops"), json!({})).is_err());
    }
}
