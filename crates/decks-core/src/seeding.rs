//! Pure parts of the startup seeding workflow
//!
//! The async orchestration (delay, dependency wait, store access) lives in
//! the engine; this module only decides what the seed deck contains.

use crate::model::{Card, CardColor, NewDeck};

/// Name of the deck created on an empty store
pub const SEED_DECK_NAME: &str = "Base cards";

/// Reserved id for the seed deck.
///
/// Writing the seed under a fixed id with insert-if-absent semantics means
/// two instances racing through the empty-store check still produce one
/// deck.
pub const SEED_DECK_ID: &str = "base-cards";

/// Card ids split by color, each list in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedCards {
    pub white: Vec<String>,
    pub black: Vec<String>,
}

/// Split cards into white and black id lists
pub fn partition_cards(cards: &[Card]) -> PartitionedCards {
    cards
        .iter()
        .fold(PartitionedCards::default(), |mut acc, card| {
            match card.color() {
                CardColor::Black => acc.black.push(card.id.clone()),
                CardColor::White => acc.white.push(card.id.clone()),
            }
            acc
        })
}

/// Build the seed deck payload from every known card
pub fn seed_deck(cards: &[Card]) -> NewDeck {
    let PartitionedCards { white, black } = partition_cards(cards);
    NewDeck {
        name: SEED_DECK_NAME.to_string(),
        white_cards: white,
        black_cards: black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_cards_partition() {
        let cards = vec![
            Card::new("a", "black"),
            Card::new("b", "white"),
            Card::new("c", "black"),
        ];

        let deck = seed_deck(&cards);
        assert_eq!(deck.name, "Base cards");
        assert_eq!(deck.black_cards, vec!["a", "c"]);
        assert_eq!(deck.white_cards, vec!["b"]);
    }

    #[test]
    fn test_empty_card_set() {
        let deck = seed_deck(&[]);
        assert_eq!(deck.name, SEED_DECK_NAME);
        assert!(deck.white_cards.is_empty());
        assert!(deck.black_cards.is_empty());
    }
}
