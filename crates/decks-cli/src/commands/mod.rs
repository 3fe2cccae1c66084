pub mod migrate;
pub mod seed;
pub mod serve;

use anyhow::Context;
use decks_core::logging_facility::{init, Profile};
use decks_engine::DecksConfig;
use std::path::Path;

/// Load configuration and start logging with its profile
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DecksConfig> {
    let config = DecksConfig::load(path).context("failed to load configuration")?;
    let profile: Profile = config
        .logging
        .profile
        .parse()
        .map_err(anyhow::Error::msg)?;
    init(profile);
    Ok(config)
}
