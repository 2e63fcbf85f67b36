//! Request and response bodies.

use chrono::{DateTime, Utc};
use reel_models::frame_count;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

fn default_duration() -> f64 {
    5.0
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    24
}

fn default_steps() -> u32 {
    8
}

/// Body of `POST /generate` and `POST /generate/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    /// Seconds, 1 to 10
    /// Seconds, fractional allowed
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_steps")]
    pub steps: u32,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            duration: default_duration(),
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            seed: None,
            steps: default_steps(),
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ApiError::validation("prompt must not be empty"));
        }
        if !(1.0..=10.0).contains(&self.duration) {
            return Err(ApiError::validation("duration must be between 1 and 10 seconds"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ApiError::validation("width and height must be positive"));
        }
        if self.fps == 0 || self.steps == 0 {
            return Err(ApiError::validation("fps and steps must be positive"));
        }
        Ok(())
    }

    pub fn num_frames(&self) -> u32 {
        frame_count(self.duration, self.fps)
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Lifecycle of a server-side job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Output of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub video_path: String,
    pub download_url: String,
    pub duration: f64,
    pub resolution: String,
    pub frames: u32,
}

/// Everything the server tracks about one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row of `GET /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
}

/// Reply to `POST /generate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobState,
    pub progress: String,
}

/// Reply to `POST /generate/sync`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncGenerateResponse {
    pub status: String,
    pub job_id: String,
    pub video_base64: String,
    pub duration: f64,
    pub resolution: String,
    pub frames: u32,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: GenerateRequest = serde_json::from_str(r#"{"prompt": "a fox"}"#).unwrap();
        assert_eq!(request.duration, 5.0);
        assert_eq!(request.resolution(), "1280x720");
        assert_eq!(request.fps, 24);
        assert_eq!(request.steps, 8);
        assert!(request.negative_prompt.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_num_frames_is_eight_k_plus_one() {
        // 5s at 24fps = 120 frames, rounded down to 113
        assert_eq!(GenerateRequest::new("x").num_frames(), 113);
    }

    #[test]
    fn test_duration_bounds() {
        let mut request = GenerateRequest::new("x");
        request.duration = 0.5;
        assert!(matches!(request.validate(), Err(ApiError::Validation(_))));
        request.duration = 10.5;
        assert!(request.validate().is_err());
        request.duration = f64::NAN;
        assert!(request.validate().is_err());
        request.duration = 10.0;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_fractional_duration_accepted() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt": "a fox", "duration": 7.5}"#).unwrap();
        assert_eq!(request.duration, 7.5);
        assert!(request.validate().is_ok());
        // 7.5s at 24fps = 180 frames, rounded down to 177
        assert_eq!(request.num_frames(), 177);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobState::Processing).unwrap(), "\"processing\"");
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
    }
}
