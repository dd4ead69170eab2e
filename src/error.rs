//! Error types for Warden audits

use crate::session::DriverError;
use thiserror::Error;

/// Main error type for Warden operations
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Browser session could not be started: {0}")]
    Connection(String),

    #[error("Login rejected: {0}")]
    Auth(String),

    #[error("Frame '{context}' unavailable: {source}")]
    Navigation {
        context: String,
        #[source]
        source: DriverError,
    },

    #[error("Control '{control}' unavailable: {source}")]
    Lookup {
        control: String,
        #[source]
        source: DriverError,
    },

    #[error("Invalid target address: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Audit deadline of {0} seconds exceeded")]
    DeadlineExceeded(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WardenError {
    /// Whether this error ends the whole audit rather than a single check
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            WardenError::Navigation { .. } | WardenError::Lookup { .. }
        )
    }
}

/// Result type alias for Warden operations
pub type Result<T> = std::result::Result<T, WardenError>;
