//! Inference client error types.

use reel_models::ModelError;
use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resolution {width}x{height} must be divisible by 64")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Inference backend returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Job {job_id} timed out after {secs} seconds")]
    Timeout { job_id: String, secs: u64 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::JobFailed { .. })
    }

    /// Errors raised before anything was sent.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidResolution { .. } | Self::InvalidParameter(_)
        )
    }
}

impl From<ModelError> for InferenceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidResolution { width, height } => {
                Self::InvalidResolution { width, height }
            }
            ModelError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            other => Self::MalformedResponse(other.to_string()),
        }
    }
}
