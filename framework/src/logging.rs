//! Logging setup and category loggers
//!
//! Events go through `tracing`. [`init`] installs a formatting subscriber
//! filtered by `RUST_LOG` (default `info`). The [`LoggerFactory`] is bound in
//! the container so controllers can log under their own category.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Calling it again is harmless; only the first subscriber is kept.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

/// Creates category-tagged loggers
#[derive(Debug, Clone, Default)]
pub struct LoggerFactory {
    application: String,
}

impl LoggerFactory {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Logger for `category`, usually a type or module name
    pub fn create_logger(&self, category: impl Into<String>) -> Logger {
        Logger {
            application: self.application.clone(),
            category: category.into(),
        }
    }

    /// Logger named after `T`
    pub fn logger_for<T: ?Sized>(&self) -> Logger {
        let name = std::any::type_name::<T>();
        self.create_logger(name.rsplit("::").next().unwrap_or(name))
    }
}

/// Writes events tagged with its category
#[derive(Debug, Clone)]
pub struct Logger {
    application: String,
    category: String,
}

impl Logger {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn debug(&self, message: impl std::fmt::Display) {
        tracing::debug!(app = %self.application, category = %self.category, "{}", message);
    }

    pub fn info(&self, message: impl std::fmt::Display) {
        tracing::info!(app = %self.application, category = %self.category, "{}", message);
    }

    pub fn warn(&self, message: impl std::fmt::Display) {
        tracing::warn!(app = %self.application, category = %self.category, "{}", message);
    }

    pub fn error(&self, message: impl std::fmt::Display) {
        tracing::error!(app = %self.application, category = %self.category, "{}", message);
    }
}
