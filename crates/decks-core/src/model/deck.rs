use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::CardColor;

/// Generate an id for a newly created deck (UUID v7)
pub fn new_deck_id() -> String {
    Uuid::now_v7().to_string()
}

/// Deck - a named collection of card references
///
/// Card lists hold ids only. They are resolved against the cards service at
/// read time and are never checked on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Assigned on creation, immutable afterwards
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    #[serde(rename = "whiteCards", default)]
    pub white_cards: Vec<String>,

    #[serde(rename = "blackCards", default)]
    pub black_cards: Vec<String>,
}

impl Deck {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            white_cards: Vec::new(),
            black_cards: Vec::new(),
        }
    }

    /// Card ids of one color, in stored order
    pub fn cards(&self, color: CardColor) -> &[String] {
        match color {
            CardColor::White => &self.white_cards,
            CardColor::Black => &self.black_cards,
        }
    }

    pub fn card_count(&self) -> usize {
        self.white_cards.len() + self.black_cards.len()
    }

    /// Apply a validated partial update; fields absent from the patch are kept
    pub fn apply(&mut self, patch: DeckPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(white_cards) = patch.white_cards {
            self.white_cards = white_cards;
        }
        if let Some(black_cards) = patch.black_cards {
            self.black_cards = black_cards;
        }
    }
}

/// Validated payload for a deck that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewDeck {
    pub name: String,
    pub white_cards: Vec<String>,
    pub black_cards: Vec<String>,
}

impl NewDeck {
    pub fn into_deck(self, id: impl Into<String>) -> Deck {
        Deck {
            id: id.into(),
            name: self.name,
            white_cards: self.white_cards,
            black_cards: self.black_cards,
        }
    }
}

/// Validated partial update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeckPatch {
    pub name: Option<String>,
    pub white_cards: Option<Vec<String>>,
    pub black_cards: Option<Vec<String>>,
}

impl DeckPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.white_cards.is_none() && self.black_cards.is_none()
    }
}
