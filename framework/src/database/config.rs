//! Database configuration

use crate::config::Configuration;
use crate::error::FrameworkError;
use std::path::Path;

/// Supported database backends, detected from the URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Postgres,
    MySql,
    Sqlite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Connection settings for one database
///
/// # Example
///
/// ```rust,ignore
/// let config = DatabaseConfig::from_configuration(&configuration, "BotDatabase")?;
/// let conn = DbConnection::connect(&config).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// sea-orm connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds
    pub connect_timeout: u64,
    /// Log every SQL statement
    pub logging: bool,
}

impl DatabaseConfig {
    /// Read `ConnectionStrings:{name}` and the `Database` section
    pub fn from_configuration(config: &Configuration, name: &str) -> Result<Self, FrameworkError> {
        let url = config
            .connection_string(name)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                FrameworkError::Configuration(format!("connection string '{}' is not set", name))
            })?;

        let mut builder = Self::builder()
            .url(url)
            .logging(config.get_parsed("Database:Logging")?.unwrap_or(false));
        if let Some(max) = config.get_parsed("Database:MaxConnections")? {
            builder = builder.max_connections(max);
        }
        if let Some(min) = config.get_parsed("Database:MinConnections")? {
            builder = builder.min_connections(min);
        }
        if let Some(timeout) = config.get_parsed("Database:ConnectTimeout")? {
            builder = builder.connect_timeout(timeout);
        }
        Ok(builder.build())
    }

    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    pub fn database_type(&self) -> Option<DatabaseType> {
        DatabaseType::from_url(&self.url)
    }

    /// In-memory SQLite keeps its data per connection
    pub fn is_sqlite_memory(&self) -> bool {
        self.database_type() == Some(DatabaseType::Sqlite) && self.url.contains(":memory:")
    }

    /// Anchor a relative `sqlite://` file path at `base`
    ///
    /// Other backends, in-memory and absolute paths are left as they are.
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.database_type() != Some(DatabaseType::Sqlite) || self.is_sqlite_memory() {
            return self;
        }
        let Some(rest) = self.url.strip_prefix("sqlite://") else {
            return self;
        };
        let (path, query) = match rest.find('?') {
            Some(at) => rest.split_at(at),
            None => (rest, ""),
        };
        let path = Path::new(path.trim_start_matches("./"));
        if !path.is_absolute() {
            self.url = format!("sqlite://{}{}", base.join(path).display(), query);
        }
        self
    }
}

/// Builder for DatabaseConfig
#[derive(Debug, Default)]
pub struct DatabaseConfigBuilder {
    url: Option<String>,
    max_connections: Option<u32>,
    min_connections: Option<u32>,
    connect_timeout: Option<u64>,
    logging: Option<bool>,
}

impl DatabaseConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = Some(min);
        self
    }

    pub fn connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout = Some(seconds);
        self
    }

    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = Some(enabled);
        self
    }

    pub fn build(self) -> DatabaseConfig {
        let url = self.url.unwrap_or_else(|| "sqlite::memory:".to_string());
        let memory = url.starts_with("sqlite") && url.contains(":memory:");
        // every pooled connection to an in-memory database is a separate database
        let (max, min) = if memory {
            (1, 1)
        } else {
            (self.max_connections.unwrap_or(10), self.min_connections.unwrap_or(1))
        };

        DatabaseConfig {
            url,
            max_connections: max,
            min_connections: min.min(max),
            connect_timeout: self.connect_timeout.unwrap_or(30),
            logging: self.logging.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration(pairs: &[(&str, &str)]) -> Configuration {
        Configuration::builder()
            .add_in_memory(pairs.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn test_reads_connection_string_and_pool() {
        let config = configuration(&[
            ("ConnectionStrings:BotDatabase", "postgres://bot@localhost/ucubot"),
            ("Database:MaxConnections", "4"),
            ("Database:MinConnections", "2"),
            ("Database:Logging", "true"),
        ]);

        let db = DatabaseConfig::from_configuration(&config, "BotDatabase").unwrap();
        assert_eq!(db.url, "postgres://bot@localhost/ucubot");
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.min_connections, 2);
        assert_eq!(db.connect_timeout, 30);
        assert!(db.logging);
        assert_eq!(db.database_type(), Some(DatabaseType::Postgres));
    }

    #[test]
    fn test_missing_connection_string() {
        let config = configuration(&[("ConnectionStrings:BotDatabase", "  ")]);
        assert!(matches!(
            DatabaseConfig::from_configuration(&config, "BotDatabase"),
            Err(FrameworkError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_pool_size() {
        let config = configuration(&[
            ("ConnectionStrings:BotDatabase", "sqlite::memory:"),
            ("Database:MaxConnections", "many"),
        ]);
        assert!(DatabaseConfig::from_configuration(&config, "BotDatabase").is_err());
    }

    #[test]
    fn test_sqlite_memory_uses_single_connection() {
        let db = DatabaseConfig::builder()
            .url("sqlite::memory:")
            .max_connections(8)
            .build();
        assert!(db.is_sqlite_memory());
        assert_eq!((db.max_connections, db.min_connections), (1, 1));
    }

    #[test]
    fn test_relative_sqlite_path_anchored_at_base() {
        let base = Path::new("/srv/ucubot");
        let relative = DatabaseConfig::builder().url("sqlite://./data/bot.db?mode=rwc").build();
        assert_eq!(
            relative.relative_to(base).url,
            format!("sqlite://{}?mode=rwc", base.join("data/bot.db").display())
        );

        for url in ["sqlite:///var/bot.db", "sqlite::memory:", "postgres://localhost/bot"] {
            let db = DatabaseConfig::builder().url(url).build();
            assert_eq!(db.relative_to(base).url, url);
        }
    }
}
