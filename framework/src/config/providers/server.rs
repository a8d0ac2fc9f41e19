use crate::config::Configuration;

/// Default maximum request body size (10MB)
const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum request body size in bytes (default: 10MB)
    pub max_body_size: usize,
}

impl ServerConfig {
    /// Build config from the `Server` section
    ///
    /// Reads `Server:Host`, `Server:Port` and `Server:MaxBodySize`; absent or
    /// unparsable values fall back to the defaults.
    pub fn from_configuration(config: &Configuration) -> Self {
        let defaults = Self::default();
        Self {
            host: config
                .get("Server:Host")
                .map(str::to_string)
                .unwrap_or(defaults.host),
            port: config.get_or("Server:Port", defaults.port),
            max_body_size: config.get_or("Server:MaxBodySize", defaults.max_body_size),
        }
    }

    /// Create a builder for customizing config
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    base: Option<ServerConfig>,
    host: Option<String>,
    port: Option<u16>,
    max_body_size: Option<usize>,
}

impl ServerConfigBuilder {
    /// Start from values already read from configuration
    pub fn base(mut self, config: ServerConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the maximum request body size in bytes
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = Some(size);
        self
    }

    /// Build the ServerConfig
    pub fn build(self) -> ServerConfig {
        let base = self.base.unwrap_or_default();
        ServerConfig {
            host: self.host.unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            max_body_size: self.max_body_size.unwrap_or(base.max_body_size),
        }
    }
}
