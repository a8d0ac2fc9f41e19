//! Framework-wide error types
//!
//! Provides a unified error type that can be used throughout the framework
//! and automatically converts to appropriate HTTP responses.

use thiserror::Error;

/// Framework-wide error type
///
/// Every variant maps to an HTTP status, so controller actions can use `?`
/// and let the error become the response.
///
/// # Example
///
/// ```rust,ignore
/// use kit::{FrameworkError, Request, Response};
///
/// pub async fn show(req: Request) -> Response {
///     let students = req.resolve::<dyn StudentRepository>()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// Service not found in the dependency injection container
    #[error("Service '{type_name}' not registered in container")]
    ServiceNotFound {
        /// The type name of the service that was not found
        type_name: &'static str,
    },

    /// A request-scoped service was resolved outside of any request scope
    #[error("Service '{type_name}' is request scoped but no request scope is active")]
    ScopeMissing {
        /// The type name of the scoped service
        type_name: &'static str,
    },

    /// Configuration could not be loaded or a value was invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parameter extraction failed (missing or invalid parameter)
    #[error("Missing required parameter: {param_name}")]
    ParamError {
        /// The name of the parameter that failed extraction
        param_name: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Generic internal server error
    #[error("Internal server error: {message}")]
    Internal {
        /// The error message
        message: String,
    },

    /// Domain/application error with custom status code
    #[error("{message}")]
    Domain {
        /// The error message
        message: String,
        /// HTTP status code
        status_code: u16,
    },

    /// Model not found (404 Not Found)
    #[error("{model_name} not found")]
    ModelNotFound {
        /// The name of the model that was not found
        model_name: String,
    },

    /// Parameter parse error (400 Bad Request)
    #[error("Invalid parameter '{param}': expected {expected_type}")]
    ParamParse {
        /// The parameter value that failed to parse
        param: String,
        /// The expected type (e.g., "i32")
        expected_type: &'static str,
    },
}

impl FrameworkError {
    /// Create a ServiceNotFound error for a given type
    pub fn service_not_found<T: ?Sized>() -> Self {
        Self::ServiceNotFound {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a ScopeMissing error for a given type
    pub fn scope_missing<T: ?Sized>() -> Self {
        Self::ScopeMissing {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a ParamError for a missing parameter
    pub fn param(name: impl Into<String>) -> Self {
        Self::ParamError {
            param_name: name.into(),
        }
    }

    /// Create a DatabaseError
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a Domain error with custom status code
    pub fn domain(message: impl Into<String>, status_code: u16) -> Self {
        Self::Domain {
            message: message.into(),
            status_code,
        }
    }

    /// 400 Bad Request domain error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::domain(message, 400)
    }

    /// 409 Conflict domain error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::domain(message, 409)
    }

    /// Create a ModelNotFound error (404)
    pub fn model_not_found(name: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model_name: name.into(),
        }
    }

    /// Create a ParamParse error (400)
    pub fn param_parse(param: impl Into<String>, expected_type: &'static str) -> Self {
        Self::ParamParse {
            param: param.into(),
            expected_type,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ServiceNotFound { .. } => 500,
            Self::ScopeMissing { .. } => 500,
            Self::Configuration(_) => 500,
            Self::ParamError { .. } => 400,
            Self::Database(_) => 500,
            Self::Internal { .. } => 500,
            Self::Domain { status_code, .. } => *status_code,
            Self::ModelNotFound { .. } => 404,
            Self::ParamParse { .. } => 400,
        }
    }
}

impl From<crate::config::ConfigError> for FrameworkError {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

// Implement From<DbErr> for automatic error conversion with ?
impl From<sea_orm::DbErr> for FrameworkError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FrameworkError::service_not_found::<String>().status_code(), 500);
        assert_eq!(FrameworkError::scope_missing::<String>().status_code(), 500);
        assert_eq!(FrameworkError::param("id").status_code(), 400);
        assert_eq!(FrameworkError::param_parse("abc", "i32").status_code(), 400);
        assert_eq!(FrameworkError::model_not_found("Student").status_code(), 404);
        assert_eq!(FrameworkError::conflict("taken").status_code(), 409);
    }

    #[test]
    fn test_service_not_found_names_the_type() {
        let err = FrameworkError::service_not_found::<dyn std::fmt::Debug>();
        assert!(err.to_string().contains("Debug"));
    }
}
