//! Engine configuration
//!
//! Owned by the wiring layer and consumed read-only by the engine. Loaded
//! from `config/seawall.toml` when present, with `SEAWALL`-prefixed
//! environment variables taking precedence (e.g. `SEAWALL__ENGINE__LEDGER_TABLE`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Engine-facing settings
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Default search locations for change-unit sources
    #[serde(default = "default_unit_paths")]
    pub unit_paths: Vec<String>,
    /// Default target store name; `None` uses the wiring layer's default
    #[serde(default)]
    pub default_store: Option<String>,
    /// Name of the ledger table/collection in the backing store
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,
}

fn default_unit_paths() -> Vec<String> {
    vec!["updates".to_string()]
}

fn default_ledger_table() -> String {
    "applied_units".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unit_paths: default_unit_paths(),
            default_store: None,
            ledger_table: default_ledger_table(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `config/seawall.toml`, falling back to env vars.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither the file nor the environment yields a
    /// readable `engine` section.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/seawall.toml").required(false))
            .add_source(Environment::with_prefix("SEAWALL").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // File present but unreadable: warn and retry with env only
                if std::path::Path::new("config/seawall.toml").exists() {
                    log::warn!("failed to load config file, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix("SEAWALL").separator("__"))
                    .build()?
            }
        };

        match settings.get::<EngineConfig>("engine") {
            Ok(cfg) => Ok(cfg),
            // No engine section anywhere: the defaults are the configuration
            Err(ConfigError::NotFound(_)) => Ok(EngineConfig::default()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.unit_paths, vec!["updates"]);
        assert_eq!(cfg.default_store, None);
        assert_eq!(cfg.ledger_table, "applied_units");
    }
}
