//! Seed command
//!
//! Usage: decks seed [--db <PATH>] [--cards-url <URL>]
//!
//! Runs the startup seeding workflow once, without the start delay, and
//! prints the resulting status as JSON. A failed seed exits non-zero.

use clap::Args;
use decks_engine::lifecycle::SeedStatus;
use decks_engine::DecksApp;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Database file (overrides `database.path`)
    #[arg(long)]
    pub db: Option<String>,

    /// Base URL of the cards service (overrides `cards.url`)
    #[arg(long)]
    pub cards_url: Option<String>,
}

/// Execute seed command
pub async fn execute(config: Option<&Path>, args: SeedArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(config)?;
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if let Some(url) = args.cards_url {
        config.cards.url = url;
    }

    let app = DecksApp::from_config(config)?;
    let status = app.lifecycle().run_seeding(Duration::ZERO).await;
    app.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&status)?);
    match status {
        SeedStatus::Failed { message, .. } => Err(anyhow::anyhow!(message)),
        _ => Ok(()),
    }
}
