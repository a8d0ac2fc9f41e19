//! Layered configuration
//!
//! Configuration is assembled from ordered sources: JSON settings files,
//! process environment variables and in-memory pairs. Keys are section paths
//! joined with `:` and compared case-insensitively; a key defined by a later
//! source replaces the same key from an earlier one.
//!
//! # Example
//!
//! ```rust,no_run
//! use kit::Configuration;
//!
//! let config = Configuration::builder()
//!     .set_base_path("/srv/ucubot")
//!     .add_json_file("appsettings.json", false)
//!     .add_json_file("appsettings.Development.json", true)
//!     .add_environment_variables()
//!     .build()
//!     .expect("configuration");
//!
//! let port: u16 = config.get_or("Server:Port", 8080);
//! ```

pub mod env;
pub mod providers;
mod source;

pub use env::{load_dotenv, Environment};
pub use providers::{ServerConfig, ServerConfigBuilder};
pub use source::KEY_DELIMITER;

use source::Source;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building or reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required settings file does not exist
    #[error("required configuration file '{}' was not found", path.display())]
    MissingFile { path: PathBuf },

    /// A settings file exists but could not be read
    #[error("failed to read configuration file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file is not valid JSON
    #[error("failed to parse configuration file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A settings file's top-level value is not an object
    #[error("configuration file '{}' must contain a JSON object", path.display())]
    InvalidRoot { path: PathBuf },

    /// A required key has no value
    #[error("configuration key '{key}' is not set")]
    MissingKey { key: String },

    /// A value could not be converted to the requested type
    #[error("configuration key '{key}' has invalid value '{value}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// A stored value, keeping the key's casing from the source that set it
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    value: String,
}

/// Merged, immutable configuration
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    /// Lowercased key -> entry
    entries: BTreeMap<String, Entry>,
}

impl Configuration {
    /// Create a builder for layering sources
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Get a raw value by key (e.g. `ConnectionStrings:BotDatabase`)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&normalize(key))
            .map(|entry| entry.value.as_str())
    }

    /// Get a required value, failing with [`ConfigError::MissingKey`]
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Parse a value, returning `Ok(None)` when the key is absent
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                    expected: std::any::type_name::<T>(),
                }
            }),
        }
    }

    /// Parse a value, falling back to `default` when absent or invalid
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get_parsed(key).ok().flatten().unwrap_or(default)
    }

    /// Shorthand for `ConnectionStrings:{name}`
    pub fn connection_string(&self, name: &str) -> Option<&str> {
        self.get(&format!("ConnectionStrings{}{}", KEY_DELIMITER, name))
    }

    /// Sub-configuration rooted at `name`, with the section prefix removed
    pub fn section(&self, name: &str) -> Configuration {
        let prefix = format!("{}{}", normalize(name), KEY_DELIMITER);
        let entries = self
            .entries
            .iter()
            .filter(|(normalized, _)| normalized.starts_with(&prefix))
            .map(|(normalized, entry)| {
                let key = entry.key[prefix.len()..].to_string();
                (normalized[prefix.len()..].to_string(), Entry { key, value: entry.value.clone() })
            })
            .collect();
        Configuration { entries }
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    /// Keys in key order, with the casing of the source that set them
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.key.as_str())
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no keys are set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, key: String, value: String) {
        self.entries.insert(normalize(&key), Entry { key, value });
    }
}

fn normalize(key: &str) -> String {
    key.to_ascii_lowercase()
}

/// Builder that layers configuration sources in registration order
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    base_path: Option<PathBuf>,
    sources: Vec<Source>,
}

impl ConfigurationBuilder {
    /// Directory against which relative file names are resolved
    pub fn set_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add a JSON settings file
    ///
    /// A missing file is skipped when `optional`, otherwise `build` fails.
    pub fn add_json_file(mut self, name: impl AsRef<Path>, optional: bool) -> Self {
        let path = match &self.base_path {
            Some(base) => base.join(name),
            None => name.as_ref().to_path_buf(),
        };
        self.sources.push(Source::Json { path, optional });
        self
    }

    /// Add every process environment variable
    pub fn add_environment_variables(mut self) -> Self {
        self.sources.push(Source::EnvironmentVariables { prefix: None });
        self
    }

    /// Add the environment variables starting with `prefix`, prefix removed
    pub fn add_prefixed_environment_variables(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(Source::EnvironmentVariables {
            prefix: Some(prefix.into()),
        });
        self
    }

    /// Add literal key/value pairs
    pub fn add_in_memory<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.sources.push(Source::Memory(pairs));
        self
    }

    /// Read every source in order and merge them
    pub fn build(self) -> Result<Configuration, ConfigError> {
        let mut config = Configuration::default();
        for source in &self.sources {
            match source.load()? {
                Some(pairs) => {
                    tracing::debug!(source = %source.describe(), keys = pairs.len(), "configuration source loaded");
                    for (key, value) in pairs {
                        config.set(key, value);
                    }
                }
                None => {
                    tracing::debug!(source = %source.describe(), "optional configuration source absent");
                }
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r#"{"A": "base", "B": "base", "C": "base"}"#);
        write(dir.path(), "appsettings.Development.json", r#"{"B": "env", "C": "env"}"#);
        write(dir.path(), "appsettings.Db.json", r#"{"C": "db"}"#);

        let config = Configuration::builder()
            .set_base_path(dir.path())
            .add_json_file("appsettings.json", false)
            .add_json_file("appsettings.Development.json", true)
            .add_json_file("appsettings.Db.json", false)
            .build()
            .unwrap();

        assert_eq!(config.get("A"), Some("base"));
        assert_eq!(config.get("B"), Some("env"));
        assert_eq!(config.get("C"), Some("db"));
    }

    #[test]
    fn test_environment_variables_win() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r#"{"Server": {"Port": 8080}}"#);
        write(dir.path(), "appsettings.Db.json", r#"{"Server": {"Port": 8081}}"#);
        std::env::set_var("KIT_CFG_TEST_WIN_Server__Port", "9090");

        let config = Configuration::builder()
            .set_base_path(dir.path())
            .add_json_file("appsettings.json", false)
            .add_json_file("appsettings.Db.json", false)
            .add_prefixed_environment_variables("KIT_CFG_TEST_WIN_")
            .build()
            .unwrap();

        assert_eq!(config.get_or("Server:Port", 0u16), 9090);
    }

    #[test]
    fn test_missing_required_file_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", "{}");

        let result = Configuration::builder()
            .set_base_path(dir.path())
            .add_json_file("appsettings.json", false)
            .add_json_file("appsettings.Db.json", false)
            .build();

        match result {
            Err(ConfigError::MissingFile { path }) => assert!(path.ends_with("appsettings.Db.json")),
            other => panic!("expected MissingFile, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.Db.json", r#"{"ConnectionStrings": "#);

        let result = Configuration::builder()
            .set_base_path(dir.path())
            .add_json_file("appsettings.Db.json", false)
            .build();

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let config = Configuration::builder()
            .add_in_memory([("ConnectionStrings:BotDatabase", "first")])
            .add_in_memory([("connectionstrings:BOTDATABASE", "second")])
            .build()
            .unwrap();

        assert_eq!(config.len(), 1);
        assert_eq!(config.connection_string("botdatabase"), Some("second"));
        assert_eq!(config.iter().next(), Some(("connectionstrings:BOTDATABASE", "second")));
    }

    #[test]
    fn test_typed_access() {
        let config = Configuration::builder()
            .add_in_memory([("Server:Port", "80"), ("Server:Host", "example")])
            .build()
            .unwrap();

        assert_eq!(config.get_parsed::<u16>("Server:Port").unwrap(), Some(80));
        assert_eq!(config.get_parsed::<u16>("Server:Missing").unwrap(), None);
        assert!(matches!(
            config.get_parsed::<u16>("Server:Host"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(config.get_or("Server:Host", 7u16), 7);
        assert!(matches!(config.require("Nope"), Err(ConfigError::MissingKey { .. })));
    }

    #[test]
    fn test_section_strips_prefix() {
        let config = Configuration::builder()
            .add_in_memory([("Database:MaxConnections", "4"), ("Server:Port", "1")])
            .build()
            .unwrap();

        let database = config.section("database");
        assert_eq!(database.len(), 1);
        assert_eq!(database.get("MaxConnections"), Some("4"));
    }
}
