//! Run summaries.

use reel_social::ScheduleReceipt;
use serde::Serialize;

/// A video produced, stored and recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoOutcome {
    pub row_id: String,
    pub job_id: String,
    pub filename: String,
    pub url: String,
    pub execution_secs: f64,
    pub cost: f64,
}

/// A row whose job ended in an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub row_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Rows that were queued for generation
    pub requested: usize,
    pub videos: Vec<VideoOutcome>,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    pub fn generated(&self) -> usize {
        self.videos.len()
    }

    pub fn total_cost(&self) -> f64 {
        self.videos.iter().map(|v| v.cost).sum()
    }
}

/// One scheduled post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledRow {
    pub row_id: String,
    pub receipt: ScheduleReceipt,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleReport {
    pub scheduled: Vec<ScheduledRow>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyReport {
    pub prompts: usize,
    pub videos: BatchReport,
    pub schedule: ScheduleReport,
}

/// Result of posting one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PostOutcome {
    /// Nothing was uploaded.
    DryRun {
        row_id: String,
        filename: String,
        caption: String,
    },
    Posted {
        row_id: String,
        filename: String,
        receipt: ScheduleReceipt,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostReport {
    /// Rows that were waiting to be posted
    pub pending: usize,
    pub outcomes: Vec<PostOutcome>,
    pub failures: Vec<RowFailure>,
}

impl PostReport {
    pub fn posted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PostOutcome::Posted { .. }))
            .count()
    }
}
