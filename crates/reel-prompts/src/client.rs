//! Grok chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PromptError, PromptResult};
use crate::prompt::{build_user_message, parse_ideas, SYSTEM_PROMPT};
use crate::types::{PromptBrief, PromptIdea};

pub const GROK_API_BASE: &str = "https://api.x.ai/v1";
pub const GROK_DEFAULT_MODEL: &str = "grok-2-latest";

/// Source of fresh video ideas.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn generate(&self, brief: &PromptBrief) -> PromptResult<Vec<PromptIdea>>;
}

/// Grok client configuration.
#[derive(Debug, Clone)]
pub struct GrokConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub timeout: Duration,
}

impl Default for GrokConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: GROK_API_BASE.to_string(),
            model: GROK_DEFAULT_MODEL.to_string(),
            temperature: 0.8,
            timeout: Duration::from_secs(60),
        }
    }
}

impl GrokConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GROK_API_KEY").ok().filter(|s| !s.is_empty()),
            base_url: std::env::var("GROK_BASE_URL").unwrap_or_else(|_| GROK_API_BASE.to_string()),
            model: std::env::var("GROK_MODEL").unwrap_or_else(|_| GROK_DEFAULT_MODEL.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

pub struct GrokClient {
    http: Client,
    config: GrokConfig,
}

impl GrokClient {
    pub fn new(config: GrokConfig) -> PromptResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-prompts/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PromptError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> PromptResult<Self> {
        Self::new(GrokConfig::from_env())
    }
}

#[async_trait]
impl PromptSource for GrokClient {
    async fn generate(&self, brief: &PromptBrief) -> PromptResult<Vec<PromptIdea>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| PromptError::config_error("GROK_API_KEY not set"))?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_user_message(brief)},
            ],
            "temperature": self.config.temperature,
        });

        debug!(count = brief.count, past = brief.past_prompts.len(), "Requesting prompts");
        let response = self.http.post(&url).bearer_auth(api_key).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PromptError::invalid_response("no choices in completion"))?;

        let ideas = parse_ideas(&content)?;
        info!(requested = brief.count, received = ideas.len(), "Prompts generated");
        Ok(ideas)
    }
}
