//! Inference endpoint configuration.

use std::time::Duration;

use crate::error::{InferenceError, InferenceResult};
use crate::poller::PollPolicy;

/// Base URL of the serverless endpoint API.
pub const RUNPOD_API_BASE: &str = "https://api.runpod.ai/v2";

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// API key sent as a bearer token
    pub api_key: Option<String>,
    /// Full endpoint URL, e.g. `https://api.runpod.ai/v2/{endpoint_id}`
    pub endpoint_url: Option<String>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Status polling policy
    pub poll: PollPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint_url: None,
            request_timeout: Duration::from_secs(30),
            poll: PollPolicy::default(),
        }
    }
}

impl InferenceConfig {
    /// Create config from environment variables.
    ///
    /// `RUNPOD_ENDPOINT_URL` wins over `RUNPOD_ENDPOINT_ID` when both are set.
    pub fn from_env() -> Self {
        let endpoint_url = std::env::var("RUNPOD_ENDPOINT_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                std::env::var("RUNPOD_ENDPOINT_ID")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(|id| endpoint_url_for(&id))
            });

        let defaults = PollPolicy::default();

        Self {
            api_key: std::env::var("RUNPOD_API_KEY").ok().filter(|s| !s.is_empty()),
            endpoint_url,
            request_timeout: Duration::from_secs(
                std::env::var("RUNPOD_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            poll: PollPolicy {
                interval: poll_interval_secs(std::env::var("RUNPOD_POLL_INTERVAL").ok().as_deref())
                    .unwrap_or(defaults.interval),
                deadline: std::env::var("RUNPOD_MAX_POLL_TIME")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.deadline),
            },
        }
    }

    /// Config pointing at an explicit endpoint URL.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            endpoint_url: Some(endpoint_url.into()),
            ..Default::default()
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Credentials required for any call, or a configuration error.
    pub fn credentials(&self) -> InferenceResult<(&str, &str)> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| InferenceError::config_error("RUNPOD_API_KEY not set"))?;
        let endpoint = self.endpoint_url.as_deref().ok_or_else(|| {
            InferenceError::config_error("RUNPOD_ENDPOINT_ID or RUNPOD_ENDPOINT_URL not set")
        })?;
        Ok((api_key, endpoint.trim_end_matches('/')))
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }
}

/// Poll interval from a seconds value; zero is raised to one second.
fn poll_interval_secs(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs.max(1)))
}

/// Endpoint URL for a serverless endpoint id.
pub fn endpoint_url_for(endpoint_id: &str) -> String {
    format!("{}/{}", RUNPOD_API_BASE, endpoint_id)
}
