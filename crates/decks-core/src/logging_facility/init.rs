//! Logging initialization

use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Default directives when `RUST_LOG` is not set, per verbosity
const DEV_DIRECTIVES: &str = "decks_core=debug,decks_store=debug,decks_engine=debug,decks_cli=debug";
const PROD_DIRECTIVES: &str = "decks_core=info,decks_store=info,decks_engine=info,decks_cli=info";

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode; see `init_test_capture`
    Test,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default directives.
///
/// - **Development**: human-readable, debug level for the decks crates
/// - **Production**: JSON lines, info level
/// - **Test**: bare registry; tests install a capture layer instead
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = |default: &str| {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
        };

        // try_init: a host binary may already own the global subscriber
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter(DEV_DIRECTIVES))
                .with_target(true)
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter(PROD_DIRECTIVES))
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}
