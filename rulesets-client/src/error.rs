//! Client error types

use reqwest::header::HeaderMap;
use rulesets_core::CoreError;
use thiserror::Error;

/// Result alias used by every client operation
pub type Result<T> = std::result::Result<T, RulesetsError>;

#[derive(Error, Debug)]
pub enum RulesetsError {
    /// Required operation parameters were missing; no request was sent
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("service URL is empty")]
    MissingServiceUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("Request serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Request compression error: {0}")]
    Compression(#[from] std::io::Error),

    /// The service answered with a non-2xx status
    #[error("{message}")]
    Service {
        status_code: u16,
        message: String,
        headers: HeaderMap,
        body: Option<serde_json::Value>,
    },

    /// A 2xx response whose body is not the expected JSON
    #[error("An error occurred while processing the operation response: {source}")]
    ResponseProcessing {
        status_code: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl RulesetsError {
    pub fn is_validation(&self) -> bool {
        matches!(self, RulesetsError::Validation(_))
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, RulesetsError::DeadlineExceeded)
    }

    /// HTTP status of the response that produced this error, if one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RulesetsError::Service { status_code, .. }
            | RulesetsError::ResponseProcessing { status_code, .. } => Some(*status_code),
            RulesetsError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
