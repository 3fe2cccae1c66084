//! Domain events republished after completed deck mutations

use decks_core_types::topics::{EVENT_DECK_CREATED, EVENT_DECK_REMOVED, EVENT_DECK_UPDATED};
use serde_json::Value;

use crate::errors::Result;
use crate::model::Deck;

/// The kind of completed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckChange {
    Created,
    Updated,
    Removed,
}

impl DeckChange {
    /// Event name published for this change
    pub fn topic(&self) -> &'static str {
        match self {
            DeckChange::Created => EVENT_DECK_CREATED,
            DeckChange::Updated => EVENT_DECK_UPDATED,
            DeckChange::Removed => EVENT_DECK_REMOVED,
        }
    }
}

/// A change together with the affected record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEvent {
    pub change: DeckChange,
    pub deck: Deck,
}

impl DeckEvent {
    pub fn new(change: DeckChange, deck: Deck) -> Self {
        Self { change, deck }
    }

    pub fn topic(&self) -> &'static str {
        self.change.topic()
    }

    /// Payload is the record exactly as stored
    pub fn payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.deck)?)
    }
}
