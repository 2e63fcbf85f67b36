//! Scheduler API types.

use serde::{Deserialize, Serialize};

/// A post as reported by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPost {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A connected social profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Result of uploading and scheduling one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReceipt {
    pub media_id: String,
    pub post_id: String,
    pub scheduled_time: chrono::DateTime<chrono::Utc>,
}
