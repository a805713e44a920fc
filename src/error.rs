//! Error types for EmojiApp
//!
//! All errors in the application are converted to `AppError`.
//! Repository-layer calls bubble them up with `?`; presenters turn
//! them into displayable messages.

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream resource not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transport-level HTTP failure (connect, timeout, TLS, body read)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    /// Stored or received data could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Coarse error classification used for metrics and presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Network,
    Storage,
    Validation,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Validation => "validation",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    /// Classify the error and record it in the `errors_total` metric.
    pub fn kind(&self) -> ErrorKind {
        let kind = match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::HttpClient(_) | AppError::UpstreamStatus { .. } => ErrorKind::Network,
            AppError::Database(_) => ErrorKind::Storage,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Config(_) => ErrorKind::Config,
            AppError::Decode(_) | AppError::Internal(_) => ErrorKind::Internal,
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();

        kind
    }

    /// True for failures of the network layer (I/O or non-2xx, including 404)
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            AppError::HttpClient(_) | AppError::UpstreamStatus { .. } | AppError::NotFound(_)
        )
    }
}
