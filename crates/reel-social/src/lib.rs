//! Social-media scheduling.
//!
//! Upload a video to obtain a media id, then schedule a post referencing
//! it with a caption and a time. Plain request/response calls, no retries.

pub mod caption;
pub mod client;
pub mod error;
pub mod scheduler;
pub mod types;

pub use caption::{compose_caption, default_slot, slot_after};
pub use client::{LaterClient, LaterConfig};
pub use error::{SocialError, SocialResult};
pub use scheduler::SocialScheduler;
pub use types::{Profile, ScheduleReceipt, ScheduledPost};
