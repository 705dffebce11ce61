//! Error types for remote API calls.

use thiserror::Error;

/// Result type for remote API calls.
pub type AiResult<T> = Result<T, AiError>;

/// Errors from the transcription and highlight clients.
#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AiError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure happened because the request exceeded its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AiError::Network(e) if e.is_timeout())
    }
}
