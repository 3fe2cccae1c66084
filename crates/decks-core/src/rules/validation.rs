//! Declarative parameter validation for deck payloads
//!
//! The deck schema is a static table of field rules. `validate_create`
//! enforces required fields; `validate_update` treats every field as
//! optional but applies the same type rules to those present. All failing
//! fields are reported together.

use serde_json::{Map, Value};

use crate::errors::{DecksError, FieldError, Result};
use crate::model::{DeckPatch, NewDeck};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string containing at least one non-whitespace character
    NonEmptyString,
    /// An array whose elements are all strings
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

pub const FIELD_NAME: &str = "name";
pub const FIELD_WHITE_CARDS: &str = "whiteCards";
pub const FIELD_BLACK_CARDS: &str = "blackCards";

/// Entity schema for decks
pub const DECK_SCHEMA: &[FieldRule] = &[
    FieldRule {
        name: FIELD_NAME,
        kind: FieldKind::NonEmptyString,
        required: true,
    },
    FieldRule {
        name: FIELD_WHITE_CARDS,
        kind: FieldKind::StringList,
        required: false,
    },
    FieldRule {
        name: FIELD_BLACK_CARDS,
        kind: FieldKind::StringList,
        required: false,
    },
];

/// Check `params` against `rules`
///
/// With `partial` set, missing required fields are not reported.
pub fn check_fields(
    params: &Map<String, Value>,
    rules: &[FieldRule],
    partial: bool,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for rule in rules {
        match params.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required && !partial {
                    errors.push(FieldError::new(rule.name, "field is required"));
                }
            }
            Some(value) => {
                if let Some(message) = check_kind(value, rule.kind) {
                    errors.push(FieldError::new(rule.name, message));
                }
            }
        }
    }

    errors
}

fn check_kind(value: &Value, kind: FieldKind) -> Option<String> {
    match kind {
        FieldKind::NonEmptyString => match value.as_str() {
            None => Some("must be a string".to_string()),
            Some(s) if s.trim().is_empty() => Some("must not be empty".to_string()),
            Some(_) => None,
        },
        FieldKind::StringList => match value.as_array() {
            None => Some("must be an array".to_string()),
            Some(items) => items
                .iter()
                .position(|item| !item.is_string())
                .map(|idx| format!("element {} must be a string", idx)),
        },
    }
}

/// Require `params` to be a JSON object
pub fn as_object(params: &Value) -> Result<&Map<String, Value>> {
    params.as_object().ok_or_else(|| DecksError::InvalidParams {
        reason: "parameters must be an object".to_string(),
    })
}

/// Extract a required, non-empty string `id` parameter
pub fn require_id(params: &Value) -> Result<String> {
    let object = as_object(params)?;
    match object.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(DecksError::Validation {
            errors: vec![FieldError::new("id", "must be a non-empty string")],
        }),
        None => Err(DecksError::Validation {
            errors: vec![FieldError::new("id", "field is required")],
        }),
    }
}

fn string_list(object: &Map<String, Value>, field: &str) -> Option<Vec<String>> {
    object.get(field).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    })
}

/// Validate a create payload
///
/// # Errors
///
/// `InvalidParams` if `params` is not an object, `Validation` listing every
/// failing field otherwise.
pub fn validate_create(params: &Value) -> Result<NewDeck> {
    let object = as_object(params)?;
    let errors = check_fields(object, DECK_SCHEMA, false);
    if !errors.is_empty() {
        return Err(DecksError::Validation { errors });
    }

    Ok(NewDeck {
        name: object
            .get(FIELD_NAME)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        white_cards: string_list(object, FIELD_WHITE_CARDS).unwrap_or_default(),
        black_cards: string_list(object, FIELD_BLACK_CARDS).unwrap_or_default(),
    })
}

/// Validate an update payload, returning the target id and the patch
///
/// # Errors
///
/// As `validate_create`, plus a `Validation` error when `id` is missing.
pub fn validate_update(params: &Value) -> Result<(String, DeckPatch)> {
    let id = require_id(params)?;
    let object = as_object(params)?;
    let errors = check_fields(object, DECK_SCHEMA, true);
    if !errors.is_empty() {
        return Err(DecksError::Validation { errors });
    }

    let patch = DeckPatch {
        name: object
            .get(FIELD_NAME)
            .and_then(Value::as_str)
            .map(str::to_string),
        white_cards: string_list(object, FIELD_WHITE_CARDS),
        black_cards: string_list(object, FIELD_BLACK_CARDS),
    };

    Ok((id, patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_names(err: DecksError) -> Vec<String> {
        match err {
            DecksError::Validation { errors } => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_defaults_card_lists() {
        let deck = validate_create(&json!({"name": "Family"})).unwrap();
        assert_eq!(deck.name, "Family");
        assert!(deck.white_cards.is_empty());
        assert!(deck.black_cards.is_empty());
    }

    #[test]
    fn test_create_accepts_unresolved_ids() {
        let deck = validate_create(&json!({
            "name": "Family",
            "whiteCards": ["does-not-exist"],
            "blackCards": ["b1", "b2"]
        }))
        .unwrap();
        assert_eq!(deck.white_cards, vec!["does-not-exist"]);
        assert_eq!(deck.black_cards, vec!["b1", "b2"]);
    }

    #[test]
    fn test_create_requires_name() {
        let err = validate_create(&json!({"whiteCards": []})).unwrap_err();
        assert_eq!(field_names(err), vec!["name"]);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let err = validate_create(&json!({"name": "   "})).unwrap_err();
        assert_eq!(field_names(err), vec!["name"]);
    }

    #[test]
    fn test_create_reports_all_failures() {
        let err = validate_create(&json!({
            "name": 7,
            "whiteCards": "w1",
            "blackCards": ["b1", 2]
        }))
        .unwrap_err();
        assert_eq!(field_names(err), vec!["name", "whiteCards", "blackCards"]);
    }

    #[test]
    fn test_create_rejects_non_object() {
        let err = validate_create(&json!(["name"])).unwrap_err();
        assert!(matches!(err, DecksError::InvalidParams { .. }));
    }

    #[test]
    fn test_update_is_partial() {
        let (id, patch) = validate_update(&json!({"id": "d1", "blackCards": ["b9"]})).unwrap();
        assert_eq!(id, "d1");
        assert_eq!(patch.name, None);
        assert_eq!(patch.white_cards, None);
        assert_eq!(patch.black_cards, Some(vec!["b9".to_string()]));
    }

    #[test]
    fn test_update_still_type_checks() {
        let err = validate_update(&json!({"id": "d1", "name": ""})).unwrap_err();
        assert_eq!(field_names(err), vec!["name"]);
    }

    #[test]
    fn test_update_requires_id() {
        let err = validate_update(&json!({"name": "x"})).unwrap_err();
        assert_eq!(field_names(err), vec!["id"]);
    }
}
