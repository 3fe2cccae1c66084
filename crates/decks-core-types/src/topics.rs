//! Names this service uses on the mesh
//!
//! Action and event names are part of the wire contract with other services
//! and must stay stable.

/// Name under which this service registers
pub const SERVICE_DECKS: &str = "decks";
/// The collaborator that owns card records
pub const SERVICE_CARDS: &str = "cards";

pub const ACTION_CREATE: &str = "decks.create";
pub const ACTION_LIST: &str = "decks.list";
pub const ACTION_FIND: &str = "decks.find";
pub const ACTION_COUNT: &str = "decks.count";
pub const ACTION_GET: &str = "decks.get";
pub const ACTION_UPDATE: &str = "decks.update";
pub const ACTION_REMOVE: &str = "decks.remove";
pub const ACTION_HEALTH: &str = "decks.health";

pub const CARDS_FIND: &str = "cards.find";
pub const CARDS_GET: &str = "cards.get";

pub const EVENT_DECK_CREATED: &str = "decks.created";
pub const EVENT_DECK_UPDATED: &str = "decks.updated";
pub const EVENT_DECK_REMOVED: &str = "decks.removed";

/// Broadcast after any change that invalidates cached deck reads
pub const CACHE_CLEAN_DECKS: &str = "cache.clean.decks";
/// Broadcast by the cards service; populated decks embed cards
pub const CACHE_CLEAN_CARDS: &str = "cache.clean.cards";

/// Cache key pattern covering every cached deck action
pub const CACHE_PATTERN_DECKS: &str = "decks.*";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_are_namespaced_by_service() {
        for action in [
            ACTION_CREATE,
            ACTION_LIST,
            ACTION_FIND,
            ACTION_COUNT,
            ACTION_GET,
            ACTION_UPDATE,
            ACTION_REMOVE,
            ACTION_HEALTH,
        ] {
            assert!(action.starts_with("decks."), "{action}");
        }
    }

    #[test]
    fn test_cache_topics_name_their_domain() {
        assert!(CACHE_CLEAN_DECKS.ends_with(SERVICE_DECKS));
        assert!(CACHE_CLEAN_CARDS.ends_with(SERVICE_CARDS));
    }
}
