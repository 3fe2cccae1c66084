//! Serve command
//!
//! Usage: decks serve [--port <PORT>]

use clap::Args;
use decks_engine::DecksApp;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen port (overrides `http.port`)
    #[arg(long)]
    pub port: Option<u16>,

    /// Skip startup seeding
    #[arg(long)]
    pub no_seed: bool,
}

/// Execute serve command
pub async fn execute(config: Option<&Path>, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(config)?;
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if args.no_seed {
        config.seeding.enabled = false;
    }

    let app = DecksApp::from_config(config)?;
    app.serve(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for interrupt");
        }
    })
    .await?;
    Ok(())
}
