use decks_core_types::{RequestId, TraceId};
use serde::Serialize;
use thiserror::Error;

/// Result type alias using DecksError
pub type Result<T> = std::result::Result<T, DecksError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code. Callers on the mesh branch on the
/// code, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Request validation
    InvalidInput,
    NotFound,
    AlreadyExists,
    NotImplemented,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    ExternalService,
    Timeout,
    Concurrency,
    Cancelled,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::NotImplemented => "ERR_NOT_IMPLEMENTED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::NotFound
                | ExErrorKind::AlreadyExists
                | ExErrorKind::NotImplemented
        )
    }
}

/// One failing field of a validated payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) plus the context needed to report the
/// failure back over the mesh or into the health surface.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    field_errors: Vec<FieldError>,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            field_errors: Vec::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach per-field validation failures
    pub fn with_field_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.field_errors = errors;
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        for field_error in &self.field_errors {
            write!(f, " [{}: {}]", field_error.field, field_error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors raised by the deck model and its rules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecksError {
    /// Deck not found in the store
    #[error("Deck not found: {deck_id}")]
    DeckNotFound { deck_id: String },

    /// Deck already exists (duplicate ID)
    #[error("Deck already exists: {deck_id}")]
    DeckAlreadyExists { deck_id: String },

    /// Payload failed schema validation
    #[error("Parameters validation error: {}", summarize(.errors))]
    Validation { errors: Vec<FieldError> },

    /// Request parameters have the wrong overall shape
    #[error("Invalid parameters: {reason}")]
    InvalidParams { reason: String },

    /// Sort requested on a field that is not sortable
    #[error("Unsupported sort field: {field}")]
    UnsupportedSort { field: String },

    /// Query filter on a field that is not filterable
    #[error("Unsupported query field: {field}")]
    UnsupportedQueryField { field: String },

    /// Unknown action name
    #[error("Action not found: {action}")]
    ActionNotFound { action: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<DecksError> for ExError {
    fn from(err: DecksError) -> Self {
        match err {
            DecksError::DeckNotFound { deck_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(deck_id)
                .with_message("Deck not found"),

            DecksError::DeckAlreadyExists { deck_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_entity_id(deck_id)
                    .with_message("Deck already exists")
            }

            DecksError::Validation { errors } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("validate")
                .with_message("Parameters validation error")
                .with_field_errors(errors),

            DecksError::InvalidParams { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            DecksError::UnsupportedSort { field } => ExError::new(ExErrorKind::InvalidInput)
                .with_message(format!("Unsupported sort field: {}", field)),

            DecksError::UnsupportedQueryField { field } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_message(format!("Unsupported query field: {}", field))
            }

            DecksError::ActionNotFound { action } => ExError::new(ExErrorKind::NotImplemented)
                .with_op(action.clone())
                .with_message(format!("Action '{}' is not found", action)),

            DecksError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            DecksError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for DecksError {
    fn from(err: serde_json::Error) -> Self {
        DecksError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            ExErrorKind::InvalidInput,
            ExErrorKind::NotFound,
            ExErrorKind::AlreadyExists,
            ExErrorKind::NotImplemented,
            ExErrorKind::Io,
            ExErrorKind::Serialization,
            ExErrorKind::Persistence,
            ExErrorKind::ExternalService,
            ExErrorKind::Timeout,
            ExErrorKind::Concurrency,
            ExErrorKind::Cancelled,
            ExErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_code_and_fields() {
        let err = ExError::new(ExErrorKind::InvalidInput)
            .with_op("decks.create")
            .with_message("bad")
            .with_field_errors(vec![FieldError::new("name", "must not be empty")]);

        let text = err.to_string();
        assert!(text.starts_with("[ERR_INVALID_INPUT]"));
        assert!(text.contains("decks.create"));
        assert!(text.contains("name: must not be empty"));
    }

    #[test]
    fn test_source_chain_is_exposed() {
        let inner = ExError::new(ExErrorKind::Timeout).with_message("cards never came up");
        let outer = ExError::new(ExErrorKind::ExternalService).with_source(inner);

        let source = std::error::Error::source(&outer).expect("source");
        assert!(source.to_string().contains("ERR_TIMEOUT"));
    }
}
