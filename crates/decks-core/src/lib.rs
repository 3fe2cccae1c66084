//! Decks Core - deck domain model and rules
//!
//! - Deck and Card models with their wire shapes
//! - Declarative validation of create/update payloads
//! - Read-side parameter parsing (filters, sort, paging, populate)
//! - Seed deck construction from the full card set
//! - Domain events for completed mutations
//! - Error and logging facilities shared by every layer

pub mod errors;
pub mod events;
pub mod logging_facility;
pub mod model;
pub mod query;
pub mod rules;
pub mod seeding;

// Re-export commonly used types
pub use errors::{DecksError, ExError, ExErrorKind, FieldError, Result};
pub use events::{DeckChange, DeckEvent};
pub use model::{Card, CardColor, Deck, DeckPatch, NewDeck};

// Used by the exported logging macros
#[doc(hidden)]
pub use decks_core_types as __types;
#[doc(hidden)]
pub use tracing as __tracing;
