//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown account: {id}. Available: {available:?}")]
    UnknownAccount { id: String, available: Vec<String> },

    #[error("No prompts generated")]
    NoPrompts,

    #[error("Row {0} has no stored video")]
    NoStoredVideo(String),

    #[error("Inference error: {0}")]
    Inference(#[from] reel_inference::InferenceError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] reel_ledger::LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Scheduler error: {0}")]
    Social(#[from] reel_social::SocialError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] reel_prompts::PromptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Timeouts and remote job failures end a job the same way.
    pub fn is_job_failure(&self) -> bool {
        matches!(self, WorkerError::Inference(e) if e.is_timeout() || e.is_job_failure())
    }
}
