//! Decks Store - SQLite persistence for deck records
//!
//! Provides:
//! - Connection management and PRAGMA setup
//! - Embedded, checksummed migrations
//! - `DeckRepo`, the deck table repository

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use errors::Result;
pub use repo::DeckRepo;
