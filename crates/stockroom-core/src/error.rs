//! Error types for the Stockroom search core.
//!
//! Only the I/O-bound collaborators (custom-field catalog, index service)
//! produce these. The query compiler is total and never returns an error.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Stockroom operations.
#[derive(Debug, Error)]
pub enum StockroomError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    // Index service errors
    #[error("Index service returned {status}: {message}")]
    IndexService {
        status: u16,
        /// Machine-readable error code from the service body, if any.
        code: Option<String>,
        message: String,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Stockroom operations.
pub type Result<T> = std::result::Result<T, StockroomError>;

impl From<serde_json::Error> for StockroomError {
    fn from(err: serde_json::Error) -> Self {
        StockroomError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for StockroomError {
    fn from(err: rusqlite::Error) -> Self {
        StockroomError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for StockroomError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StockroomError::Timeout(Duration::from_secs(0))
        } else {
            StockroomError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl StockroomError {
    /// Build a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StockroomError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            StockroomError::Network { .. }
            | StockroomError::Timeout(_)
            | StockroomError::RateLimited { .. } => true,
            StockroomError::IndexService { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-requested wait before the next attempt, from `Retry-After`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StockroomError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Whether the failure means the external service could not be reached
    /// or could not serve the request, as opposed to a bad request or an
    /// empty result.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StockroomError::Network { .. }
            | StockroomError::Timeout(_)
            | StockroomError::RateLimited { .. }
            | StockroomError::Database { .. } => true,
            StockroomError::IndexService { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
