//! Decks Engine - the running deck service
//!
//! Wires the core rules and the SQLite store into an async service:
//! the action table, lifecycle hooks and startup seeding, the action cache,
//! the event broker, the cards/registry collaborators and the HTTP surface.

pub mod app;
pub mod broker;
pub mod cache;
pub mod cards_client;
pub mod collaborators;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod registry;
pub mod runtime;
pub mod service;
pub mod store;

pub use app::DecksApp;
pub use config::DecksConfig;
pub use lifecycle::{DeckLifecycle, SeedStatus};
pub use runtime::NodeRuntime;
pub use service::DeckService;
