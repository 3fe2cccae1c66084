//! Service configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `DECKS__SECTION__KEY` environment variables. The loaded value
//! is immutable for the life of the process.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "DECKS";
pub const DEFAULT_CONFIG_FILE: &str = "decks.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identity reported in health; generated when empty
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "decks.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardsConfig {
    /// Base URL of the cards service action surface
    pub url: String,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3002".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    pub enabled: bool,
    pub start_delay_ms: u64,
    pub dependency_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_delay_ms: 1_000,
            dependency_timeout_ms: 30_000,
            poll_interval_ms: 500,
        }
    }
}

impl SeedingConfig {
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.dependency_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `development` or `production`
    pub profile: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecksConfig {
    pub node: NodeConfig,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub cards: CardsConfig,
    pub seeding: SeedingConfig,
    pub logging: LoggingConfig,
}

impl DecksConfig {
    /// Load configuration
    ///
    /// An explicit `path` must exist; without one, `decks.toml` in the
    /// working directory is used if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unreadable files or values of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::load_from(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(
        file: File<config::FileSourceFile, config::FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&DecksConfig::default())?)
            .add_source(file)
            .add_source(
                env.prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Address the HTTP surface binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    fn missing_file() -> File<config::FileSourceFile, config::FileFormat> {
        File::with_name("definitely-not-here.toml").required(false)
    }

    #[test]
    fn test_defaults() {
        let config = DecksConfig::load_from(missing_file(), env(&[])).unwrap();
        assert_eq!(config, DecksConfig::default());
        assert_eq!(config.seeding.start_delay(), Duration::from_secs(1));
        assert_eq!(config.seeding.dependency_timeout(), Duration::from_secs(30));
        assert_eq!(config.seeding.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[http]\nport = 4000\n\n[cards]\nurl = \"http://cards:3000\"\n\n[seeding]\nstart_delay_ms = 0"
        )
        .unwrap();

        let config = DecksConfig::load_from(
            File::from(path.as_path()).required(true),
            env(&[("DECKS__HTTP__PORT", "5000"), ("DECKS__DATABASE__PATH", ":memory:")]),
        )
        .unwrap();

        assert_eq!(config.http.port, 5000);
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.cards.url, "http://cards:3000");
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.seeding.start_delay_ms, 0);
        assert!(config.seeding.enabled);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let result = DecksConfig::load(Some(Path::new("/nonexistent/decks.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let seeding = SeedingConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(seeding.poll_interval(), Duration::from_millis(1));
    }
}
