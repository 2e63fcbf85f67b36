//! Scheduler seam used by the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::caption::compose_caption;
use crate::error::{SocialError, SocialResult};
use crate::types::{Profile, ScheduleReceipt, ScheduledPost};

#[async_trait]
pub trait SocialScheduler: Send + Sync {
    /// Upload a video and return its media id.
    async fn upload_media(&self, bytes: &[u8], filename: &str) -> SocialResult<String>;

    /// Schedule a post of `media_id` at `scheduled_at`.
    ///
    /// `profile_id` overrides the configured destination profile.
    async fn schedule_post(
        &self,
        media_id: &str,
        caption: &str,
        scheduled_at: DateTime<Utc>,
        profile_id: Option<&str>,
    ) -> SocialResult<ScheduledPost>;

    /// Posts still waiting to go out.
    async fn scheduled_posts(&self) -> SocialResult<Vec<ScheduledPost>>;

    /// Delete a scheduled post. Returns whether the scheduler accepted it.
    async fn delete_post(&self, post_id: &str) -> SocialResult<bool>;

    async fn profiles(&self) -> SocialResult<Vec<Profile>>;

    /// Upload then schedule, with the hashtags folded into the caption.
    async fn schedule_video(
        &self,
        bytes: &[u8],
        filename: &str,
        caption: &str,
        hashtags: &[String],
        scheduled_at: DateTime<Utc>,
        profile_id: Option<&str>,
    ) -> SocialResult<ScheduleReceipt> {
        let full_caption = compose_caption(caption, hashtags);

        let media_id = self.upload_media(bytes, filename).await?;
        let post = self
            .schedule_post(&media_id, &full_caption, scheduled_at, profile_id)
            .await?;
        let post_id = post
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SocialError::invalid_response("scheduled post has no id"))?;

        info!(
            media_id = %media_id,
            post_id = %post_id,
            scheduled_at = %scheduled_at,
            "Video scheduled"
        );

        Ok(ScheduleReceipt {
            media_id,
            post_id,
            scheduled_time: scheduled_at,
        })
    }
}
