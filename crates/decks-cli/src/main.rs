//! Decks CLI
//!
//! Runs the decks service node and its maintenance tasks.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "decks")]
#[command(about = "Decks - card deck service node", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./decks.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the service until interrupted
    Serve(commands::serve::ServeArgs),
    /// Apply pending database migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Run the seeding workflow once and print its outcome
    Seed(commands::seed::SeedArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(config, args).await,
        Commands::Migrate(args) => commands::migrate::execute(config, args),
        Commands::Seed(args) => commands::seed::execute(config, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
