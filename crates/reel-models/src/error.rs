//! Model validation errors.

use thiserror::Error;

/// Result type for model validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating or decoding shared models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Resolution {width}x{height} must be divisible by 64")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown ledger stage: {0}")]
    UnknownStage(String),

    #[error("Ledger row has no {0}")]
    MissingField(&'static str),
}

impl ModelError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// True if the error is a resolution validation failure.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, ModelError::InvalidResolution { .. })
    }
}
