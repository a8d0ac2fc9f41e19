use std::path::Path;

/// Environment variable holding the environment name
pub const ENVIRONMENT_VARIABLE: &str = "APP_ENV";

/// Hosting environment the process runs in
///
/// The name selects the optional `appsettings.{name}.json` overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    #[default]
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Detect environment from APP_ENV or default to Production
    pub fn detect() -> Self {
        match std::env::var(ENVIRONMENT_VARIABLE).ok() {
            Some(name) => Self::parse(&name),
            None => Self::Production,
        }
    }

    /// Parse an environment name, case-insensitively
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            "testing" => Self::Testing,
            "local" => Self::Local,
            _ => Self::Custom(name.trim().to_string()),
        }
    }

    /// Name used in settings file names, e.g. `appsettings.Development.json`
    pub fn name(&self) -> &str {
        match self {
            Self::Local => "Local",
            Self::Development => "Development",
            Self::Staging => "Staging",
            Self::Production => "Production",
            Self::Testing => "Testing",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment (local or development)
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Load `.env` files from the content root into the process environment
///
/// Precedence (later overrides earlier):
/// 1. .env
/// 2. .env.local
/// 3. Actual system environment variables (highest priority)
///
/// Returns the number of files that were loaded.
pub fn load_dotenv(content_root: &Path) -> usize {
    // dotenvy never overwrites existing variables, so load the most specific file first
    [".env.local", ".env"]
        .iter()
        .filter(|name| dotenvy::from_path(content_root.join(name)).is_ok())
        .count()
}
