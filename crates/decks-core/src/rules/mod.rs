pub mod validation;

pub use validation::{validate_create, validate_update, DECK_SCHEMA};
