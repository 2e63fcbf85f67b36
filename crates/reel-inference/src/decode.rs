//! Result decoding.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reel_models::{estimate_cost, JobStatus, StatusDocument};
use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// Metadata reported alongside a generated video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration: Option<f64>,
    pub resolution: Option<String>,
    pub frames: Option<u32>,
    /// Remote execution time in seconds
    pub execution_secs: f64,
    /// Estimated cost in dollars
    pub cost: f64,
}

/// Decoded output of a completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVideo {
    pub job_id: String,
    pub bytes: Vec<u8>,
    pub metadata: VideoMetadata,
}

impl GeneratedVideo {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Decode the video payload of a `COMPLETED` status document.
///
/// A completed document without `output.video_base64` is a malformed
/// success, reported as [`InferenceError::MalformedResponse`].
pub fn decode_video(job_id: &str, document: &StatusDocument) -> InferenceResult<GeneratedVideo> {
    if document.status != JobStatus::Completed {
        return Err(InferenceError::malformed(format!(
            "job {} is {}, not COMPLETED",
            job_id, document.status
        )));
    }

    let output = document
        .output
        .as_ref()
        .ok_or_else(|| InferenceError::malformed(format!("job {} has no output", job_id)))?;

    let encoded = output
        .video_base64
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            InferenceError::malformed(format!("job {} output has no video_base64", job_id))
        })?;

    let bytes = decode_base64(encoded)?;
    let execution_secs = document.execution_secs();

    Ok(GeneratedVideo {
        job_id: job_id.to_string(),
        bytes,
        metadata: VideoMetadata {
            duration: output.duration,
            resolution: output.resolution.clone(),
            frames: output.frames,
            execution_secs,
            cost: estimate_cost(execution_secs),
        },
    })
}

pub fn decode_base64(encoded: &str) -> InferenceResult<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Read an image file and encode it for image-conditioned generation.
pub async fn image_to_base64(path: impl AsRef<Path>) -> InferenceResult<String> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    Ok(encode_base64(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobOutput;

    fn completed(output: Option<JobOutput>) -> StatusDocument {
        StatusDocument {
            output,
            execution_time_ms: Some(100_000.0),
            ..StatusDocument::with_status(JobStatus::Completed)
        }
    }

    #[test]
    fn test_decodes_video_bytes_and_metadata() {
        let payload = b"\x00\x00\x00\x18ftypmp42 fake video".to_vec();
        let document = completed(Some(JobOutput {
            video_base64: Some(encode_base64(&payload)),
            duration: Some(15.0),
            resolution: Some("576x1024".into()),
            frames: Some(361),
            error: None,
        }));

        let video = decode_video("job-1", &document).unwrap();
        assert_eq!(video.bytes, payload);
        assert_eq!(video.metadata.execution_secs, 100.0);
        assert_eq!(video.metadata.cost, 0.106);
        assert_eq!(video.metadata.frames, Some(361));
    }

    #[test]
    fn test_missing_video_is_malformed_not_failure() {
        let document = completed(Some(JobOutput {
            duration: Some(15.0),
            ..Default::default()
        }));
        let err = decode_video("job-2", &document).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedResponse(_)));
        assert!(!err.is_timeout());
        assert!(!err.is_job_failure());

        let err = decode_video("job-3", &completed(None)).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let document = completed(Some(JobOutput {
            video_base64: Some("not base64 !!".into()),
            ..Default::default()
        }));
        assert!(matches!(
            decode_video("job-4", &document),
            Err(InferenceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_image_to_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        tokio::fs::write(&path, b"png bytes").await.unwrap();

        let encoded = image_to_base64(&path).await.unwrap();
        assert_eq!(decode_base64(&encoded).unwrap(), b"png bytes");
    }
}
