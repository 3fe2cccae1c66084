pub mod card;
pub mod deck;

pub use card::{Card, CardColor};
pub use deck::{new_deck_id, Deck, DeckPatch, NewDeck};
