//! Remote job status document.
//!
//! The inference backend reports job progress as a JSON document:
//! `{id, status, output?, executionTime?, error?}`. Status strings outside the
//! known set are kept as [`JobStatus::Unknown`] and treated as still running.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Remote job status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    /// Waiting for a worker
    #[default]
    InQueue,
    /// Worker is generating
    InProgress,
    /// Finished with an output payload
    Completed,
    /// Finished with an error
    Failed,
    /// Any status string the backend sends that we don't recognise
    Unknown(String),
}

impl JobStatus {
    /// Parse a status string as sent by the backend.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "IN_QUEUE" => JobStatus::InQueue,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::InQueue => "IN_QUEUE",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown(raw) => raw,
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// True for statuses the poller keeps waiting on.
    ///
    /// Unknown statuses count as running.
    pub fn is_running(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(JobStatus::parse(raw.as_deref().unwrap_or_default()))
    }
}

impl JsonSchema for JobStatus {
    fn schema_name() -> String {
        "JobStatus".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Output block of a completed job.
///
/// Every field is optional on the wire; a completed job without
/// `video_base64` is a malformed success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_base64: Option<String>,
    /// Clip length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// `WxH`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<u32>,
    /// Handler-level error reported inside a completed job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status document returned by the inference status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Missing or null reads as an empty unknown status
    #[serde(default = "unreported_status")]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,
    /// Execution time in milliseconds
    #[serde(
        default,
        rename = "executionTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn unreported_status() -> JobStatus {
    JobStatus::Unknown(String::new())
}

impl StatusDocument {
    /// Create a bare document with the given status.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Execution time in seconds (0 when the backend did not report it).
    pub fn execution_secs(&self) -> f64 {
        self.execution_time_ms.unwrap_or(0.0) / 1000.0
    }

    /// Error text for a failed job.
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.output.as_ref().and_then(|o| o.error.clone()))
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing() {
        assert_eq!(JobStatus::parse("IN_QUEUE"), JobStatus::InQueue);
        assert_eq!(JobStatus::parse("IN_PROGRESS"), JobStatus::InProgress);
        assert_eq!(JobStatus::parse("COMPLETED"), JobStatus::Completed);
        assert_eq!(JobStatus::parse("FAILED"), JobStatus::Failed);
        assert_eq!(
            JobStatus::parse("CANCELLED"),
            JobStatus::Unknown("CANCELLED".to_string())
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::InQueue.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Unknown("TIMED_OUT".into()).is_running());
    }

    #[test]
    fn test_document_deserialization() {
        let doc: StatusDocument = serde_json::from_value(json!({
            "id": "job-1",
            "status": "COMPLETED",
            "executionTime": 84000,
            "output": {
                "video_base64": "AAAA",
                "duration": 15,
                "resolution": "576x1024",
                "frames": 361
            }
        }))
        .unwrap();

        assert_eq!(doc.status, JobStatus::Completed);
        assert_eq!(doc.execution_secs(), 84.0);
        let output = doc.output.unwrap();
        assert_eq!(output.video_base64.as_deref(), Some("AAAA"));
        assert_eq!(output.frames, Some(361));
    }

    #[test]
    fn test_unknown_status_survives_round_trip() {
        let doc: StatusDocument = serde_json::from_value(json!({"status": "WARMING"})).unwrap();
        assert_eq!(doc.status, JobStatus::Unknown("WARMING".into()));
        assert_eq!(serde_json::to_value(&doc).unwrap()["status"], "WARMING");
    }

    #[test]
    fn test_null_or_missing_status_is_unknown() {
        let doc: StatusDocument = serde_json::from_value(json!({"id": "job-1", "status": null})).unwrap();
        assert_eq!(doc.status, JobStatus::Unknown(String::new()));
        assert!(doc.status.is_running());

        let doc: StatusDocument = serde_json::from_value(json!({"id": "job-1"})).unwrap();
        assert_eq!(doc.status, JobStatus::Unknown(String::new()));
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let doc = StatusDocument {
            error: Some("CUDA out of memory".into()),
            ..StatusDocument::with_status(JobStatus::Failed)
        };
        assert_eq!(doc.failure_message(), "CUDA out of memory");

        let doc = StatusDocument {
            output: Some(JobOutput {
                error: Some("prompt is required".into()),
                ..Default::default()
            }),
            ..StatusDocument::with_status(JobStatus::Failed)
        };
        assert_eq!(doc.failure_message(), "prompt is required");

        assert_eq!(
            StatusDocument::with_status(JobStatus::Failed).failure_message(),
            "Unknown error"
        );
    }
}
