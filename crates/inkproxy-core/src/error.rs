use thiserror::Error;

use crate::models::Mode;

/// Application-wide error types for inkproxy.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request carried no target URL.
    #[error("Missing URL")]
    MissingUrl,

    /// The query string could not be decoded (e.g. a repeated key).
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    /// The `type` parameter named a mode we do not extract.
    #[error("Unsupported type: {0}")]
    UnsupportedMode(String),

    /// The browser could not be started (or did not start in time).
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// The target answered with an error status, or the load never completed.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The expected elements never appeared within the bound.
    #[error("Timed out after {secs}s waiting for selector {selector}")]
    SelectorTimeout { selector: String, secs: u64 },

    /// The page was searched but nothing survived the filters.
    #[error("No {0} found")]
    EmptyResult(Mode),

    /// Any other browser/CDP failure after launch.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Invalid startup configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filesystem failure (debug snapshots).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true if the failure is the caller's fault (HTTP 4xx, no browser involved).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingUrl | AppError::InvalidQuery(_) | AppError::UnsupportedMode(_)
        )
    }
}
