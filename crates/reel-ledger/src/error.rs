//! Ledger error types.

use reel_models::{LedgerStage, ModelError};
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Row {row_id} cannot move from {from} to {to}")]
    InvalidTransition {
        row_id: String,
        from: LedgerStage,
        to: LedgerStage,
    },

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(row_id: impl Into<String>) -> Self {
        Self::NotFound(row_id.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

impl From<ModelError> for LedgerError {
    fn from(err: ModelError) -> Self {
        Self::InvalidRow(err.to_string())
    }
}
