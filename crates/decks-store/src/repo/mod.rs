//! Repository layer for persisting decks to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::DeckRepo;
