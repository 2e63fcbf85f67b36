//! Serverless endpoint HTTP client.

use async_trait::async_trait;
use reel_models::{GenerationRequest, StatusDocument};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::InferenceBackend;
use crate::config::InferenceConfig;
use crate::decode::{decode_video, GeneratedVideo};
use crate::error::{InferenceError, InferenceResult};
use crate::poller::{poll_until_terminal, StatusSource};

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    input: &'a GenerationRequest,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: Option<String>,
}

/// Client for the serverless inference endpoint.
pub struct InferenceClient {
    http: Client,
    config: InferenceConfig,
}

impl InferenceClient {
    /// Create a new inference client.
    pub fn new(config: InferenceConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("reel-inference/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(InferenceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> InferenceResult<Self> {
        Self::new(InferenceConfig::from_env())
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Validate `request` and queue it. Returns the remote job id.
    ///
    /// Missing credentials and invalid parameters fail before any request is made.
    pub async fn submit(&self, request: &GenerationRequest) -> InferenceResult<String> {
        let (api_key, endpoint) = self.config.credentials()?;
        request.validate()?;

        let url = format!("{}/run", endpoint);
        debug!(
            mode = %request.mode(),
            resolution = %request.resolution(),
            duration = request.duration,
            steps = request.steps,
            "Submitting generation job"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&SubmitBody { input: request })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: SubmitResponse = response.json().await?;
        let job_id = body
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| InferenceError::malformed("submit response has no job id"))?;

        info!(job_id = %job_id, "Generation job submitted");
        Ok(job_id)
    }

    /// Fetch the current status document of `job_id`.
    pub async fn status(&self, job_id: &str) -> InferenceResult<StatusDocument> {
        let (api_key, endpoint) = self.config.credentials()?;
        let url = format!("{}/status/{}", endpoint, job_id);

        let response = self.http.get(&url).bearer_auth(api_key).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| InferenceError::malformed(format!("status document: {}", e)))
    }

    /// Poll `job_id` until terminal using the configured policy.
    pub async fn wait_for_completion(&self, job_id: &str) -> InferenceResult<StatusDocument> {
        poll_until_terminal(self, job_id, self.config.poll).await
    }

    /// Check if the endpoint is reachable.
    pub async fn health_check(&self) -> bool {
        let Ok((api_key, endpoint)) = self.config.credentials() else {
            warn!("Inference health check skipped: endpoint not configured");
            return false;
        };
        let url = format!("{}/health", endpoint);

        match self.http.get(&url).bearer_auth(api_key).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Inference health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Inference health check error: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl StatusSource for InferenceClient {
    async fn fetch_status(&self, job_id: &str) -> InferenceResult<StatusDocument> {
        self.status(job_id).await
    }
}

#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn submit(&self, request: &GenerationRequest) -> InferenceResult<String> {
        InferenceClient::submit(self, request).await
    }

    async fn wait_for_video(&self, job_id: &str) -> InferenceResult<GeneratedVideo> {
        let document = self.wait_for_completion(job_id).await?;
        let video = decode_video(job_id, &document)?;
        info!(
            job_id = %job_id,
            bytes = video.size(),
            execution_secs = video.metadata.execution_secs,
            cost = video.metadata.cost,
            "Video decoded"
        );
        Ok(video)
    }

    async fn check_health(&self) -> bool {
        self.health_check().await
    }
}
