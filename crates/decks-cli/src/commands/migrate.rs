//! Migrate command
//!
//! Usage: decks migrate [--db <PATH>]

use clap::Args;
use std::path::Path;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Database file (overrides `database.path`)
    #[arg(long)]
    pub db: Option<String>,
}

/// Execute migrate command
pub fn execute(config: Option<&Path>, args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let path = args.db.unwrap_or(config.database.path);

    let mut conn = decks_store::db::open_configured(&path)?;
    decks_store::migrations::apply_migrations(&mut conn)?;

    tracing::info!(path = %path, "migrations applied");
    println!("✓ Database ready: {}", path);
    Ok(())
}
