//! Error handling for decks-store
//!
//! Wraps decks-core ExError with store-specific helpers

use decks_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_entity_id(migration_id)
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Applied migration no longer matches the embedded SQL
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// A stored card list column could not be decoded
pub fn corrupt_column(deck_id: &str, column: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("decode_deck")
        .with_entity_id(deck_id)
        .with_message(format!("column {}: {}", column, err))
}

pub fn encode_error(err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("encode_deck")
        .with_message(err.to_string())
}
