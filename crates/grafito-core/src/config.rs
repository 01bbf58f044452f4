//! Configuration for opening a Grafito store.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`GRAFITO_STORE__` prefix)
//! 2. Config file (`grafito.toml`, `[store]` section)
//! 3. Defaults

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;

/// Settings applied to the backing connection when a store is opened.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the database file (default: "grafito.db").
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Durability level for committed transactions.
    #[serde(default)]
    pub synchronous: Synchronous,
}

/// Maps to SQLite's `PRAGMA synchronous` levels.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("grafito.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            synchronous: Synchronous::default(),
        }
    }
}

impl StoreConfig {
    /// Config for the file at `path`, everything else defaulted.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Load from `{file_prefix}.toml` (optional) layered under the
    /// environment. A missing `[store]` section yields defaults.
    pub fn load(file_prefix: &str) -> Result<Self> {
        Self::load_with_env(file_prefix, None)
    }

    /// Values stay strings until deserialized so that a numeric-looking
    /// `path` is still read as a path; number fields parse on demand.
    fn load_with_env(file_prefix: &str, env: Option<config::Map<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("GRAFITO")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        match cfg.get::<StoreConfig>("store") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => {
                tracing::debug!(file_prefix, "No [store] config found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.path, PathBuf::from("grafito.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.synchronous, Synchronous::Normal);
    }

    #[test]
    fn test_synchronous_pragmas() {
        assert_eq!(Synchronous::Off.as_pragma(), "OFF");
        assert_eq!(Synchronous::Full.as_pragma(), "FULL");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("grafito");
        std::fs::write(
            dir.path().join("grafito.toml"),
            "[store]\npath = \"grid.db\"\nbusy_timeout_ms = 250\nsynchronous = \"full\"\n",
        )
        .unwrap();

        let config = StoreConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.path, PathBuf::from("grid.db"));
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.synchronous, Synchronous::Full);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("grafito");
        std::fs::write(
            dir.path().join("grafito.toml"),
            "[store]\npath = \"grid.db\"\nbusy_timeout_ms = 250\n",
        )
        .unwrap();

        let env = [
            ("GRAFITO_STORE__PATH", "123"),
            ("GRAFITO_STORE__BUSY_TIMEOUT_MS", "750"),
            ("GRAFITO_STORE__SYNCHRONOUS", "extra"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = StoreConfig::load_with_env(prefix.to_str().unwrap(), Some(env)).unwrap();
        assert_eq!(config.path, PathBuf::from("123"));
        assert_eq!(config.busy_timeout_ms, 750);
        assert_eq!(config.synchronous, Synchronous::Extra);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = StoreConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config, StoreConfig::default());
    }
}
