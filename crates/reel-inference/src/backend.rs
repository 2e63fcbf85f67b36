//! Inference backend seam used by the pipeline.

use async_trait::async_trait;
use reel_models::GenerationRequest;

use crate::decode::GeneratedVideo;
use crate::error::InferenceResult;

/// Submit-then-wait access to a video generation backend.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Queue a job and return its identifier.
    async fn submit(&self, request: &GenerationRequest) -> InferenceResult<String>;

    /// Block until `job_id` is terminal and decode its video.
    async fn wait_for_video(&self, job_id: &str) -> InferenceResult<GeneratedVideo>;

    /// Whether the backend is reachable. Never errors.
    async fn check_health(&self) -> bool;

    /// Submit, wait and decode in one call.
    async fn generate(&self, request: &GenerationRequest) -> InferenceResult<GeneratedVideo> {
        let job_id = self.submit(request).await?;
        self.wait_for_video(&job_id).await
    }
}
