//! Later API client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{SocialError, SocialResult};
use crate::scheduler::SocialScheduler;
use crate::types::{Profile, ScheduledPost};

/// Later REST API base.
pub const LATER_API_BASE: &str = "https://api.later.com/v1";

/// Later client configuration.
#[derive(Debug, Clone)]
pub struct LaterConfig {
    pub api_key: Option<String>,
    /// Default destination profile
    pub profile_id: Option<String>,
    pub base_url: String,
    /// Timeout for metadata calls
    pub timeout: Duration,
    /// Timeout for media uploads
    pub upload_timeout: Duration,
}

impl Default for LaterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            profile_id: None,
            base_url: LATER_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(120),
        }
    }
}

impl LaterConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("LATER_API_KEY").ok().filter(|s| !s.is_empty()),
            profile_id: std::env::var("LATER_PROFILE_ID").ok().filter(|s| !s.is_empty()),
            base_url: std::env::var("LATER_API_URL").unwrap_or_else(|_| LATER_API_BASE.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    media_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    posts: Vec<ScheduledPost>,
}

#[derive(Debug, Deserialize)]
struct ProfilesResponse {
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// Client for the Later scheduling API.
pub struct LaterClient {
    http: Client,
    config: LaterConfig,
}

impl LaterClient {
    pub fn new(config: LaterConfig) -> SocialResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-social/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SocialError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> SocialResult<Self> {
        Self::new(LaterConfig::from_env())
    }

    pub fn config(&self) -> &LaterConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> SocialResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| SocialError::config_error("LATER_API_KEY not set"))
    }

    async fn send(builder: RequestBuilder) -> SocialResult<reqwest::Response> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SocialError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SocialScheduler for LaterClient {
    async fn upload_media(&self, bytes: &[u8], filename: &str) -> SocialResult<String> {
        let api_key = self.api_key()?;

        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("video/mp4")?;
        let form = Form::new().part("file", part);

        debug!(filename = %filename, bytes = bytes.len(), "Uploading media");
        let response = Self::send(
            self.http
                .post(self.url("/media"))
                .bearer_auth(api_key)
                .timeout(self.config.upload_timeout)
                .multipart(form),
        )
        .await?;

        let body: MediaResponse = response.json().await?;
        body.id
            .or(body.media_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SocialError::invalid_response("media upload returned no id"))
    }

    async fn schedule_post(
        &self,
        media_id: &str,
        caption: &str,
        scheduled_at: DateTime<Utc>,
        profile_id: Option<&str>,
    ) -> SocialResult<ScheduledPost> {
        let api_key = self.api_key()?;
        let profile = profile_id
            .or(self.config.profile_id.as_deref())
            .ok_or_else(|| SocialError::config_error("LATER_PROFILE_ID not set"))?;

        let payload = json!({
            "media_id": media_id,
            "profile_id": profile,
            "caption": caption,
            "scheduled_time": scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        });

        let response = Self::send(
            self.http
                .post(self.url("/posts"))
                .bearer_auth(api_key)
                .json(&payload),
        )
        .await?;

        Ok(response.json().await?)
    }

    async fn scheduled_posts(&self) -> SocialResult<Vec<ScheduledPost>> {
        let api_key = self.api_key()?;
        let response = Self::send(
            self.http
                .get(self.url("/posts"))
                .bearer_auth(api_key)
                .query(&[("status", "scheduled")]),
        )
        .await?;

        let body: PostsResponse = response.json().await?;
        Ok(body.posts)
    }

    async fn delete_post(&self, post_id: &str) -> SocialResult<bool> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .delete(self.url(&format!("/posts/{}", post_id)))
            .bearer_auth(api_key)
            .send()
            .await?;

        let deleted = response.status().is_success();
        if !deleted {
            warn!(post_id = %post_id, status = %response.status(), "Post delete rejected");
        }
        Ok(deleted)
    }

    async fn profiles(&self) -> SocialResult<Vec<Profile>> {
        let api_key = self.api_key()?;
        let response =
            Self::send(self.http.get(self.url("/profiles")).bearer_auth(api_key)).await?;

        let body: ProfilesResponse = response.json().await?;
        Ok(body.profiles)
    }
}
