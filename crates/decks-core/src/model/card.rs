use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `cardType` value that marks a black (prompt) card
pub const BLACK_CARD_TYPE: &str = "black";

/// Which deck list a card belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    White,
    Black,
}

impl CardColor {
    /// Deck field holding ids of this color
    pub fn deck_field(&self) -> &'static str {
        match self {
            CardColor::White => "whiteCards",
            CardColor::Black => "blackCards",
        }
    }

    pub fn from_deck_field(field: &str) -> Option<Self> {
        match field {
            "whiteCards" => Some(CardColor::White),
            "blackCards" => Some(CardColor::Black),
            _ => None,
        }
    }
}

/// A card record as served by the cards service
///
/// Only `_id` and `cardType` are interpreted here; every other field is kept
/// verbatim so populated decks return the card exactly as the cards service
/// sent it. `cardType` is taken as any JSON value: a malformed type makes
/// the card white rather than rejecting the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "cardType", default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    pub fn new(id: impl Into<String>, card_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            card_type: Some(Value::String(card_type.into())),
            extra: Map::new(),
        }
    }

    /// Exactly `"black"` is black; any other value, or none, is white
    pub fn color(&self) -> CardColor {
        match self.card_type.as_ref().and_then(Value::as_str) {
            Some(BLACK_CARD_TYPE) => CardColor::Black,
            _ => CardColor::White,
        }
    }
}
