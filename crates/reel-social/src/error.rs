//! Scheduler error types.

use thiserror::Error;

pub type SocialResult<T> = Result<T, SocialError>;

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scheduler returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SocialError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
