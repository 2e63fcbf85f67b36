//! Ledger row model.
//!
//! The ledger keeps one row per prompt/video with a fixed set of 16 ordered
//! columns. A row's lifecycle stage only moves forward
//! (`pending -> generating -> generated -> scheduled -> published`), except
//! for `error`, which is reachable from any live stage and is final.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Lifecycle stage of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStage {
    /// Prompt saved, no job yet
    #[default]
    Pending,
    /// Job submitted to the inference backend
    Generating,
    /// Video produced and stored
    Generated,
    /// Post scheduled with the social scheduler
    Scheduled,
    /// Post went live
    Published,
    /// Failed at some stage
    Error,
}

impl LedgerStage {
    pub const ALL: [LedgerStage; 6] = [
        LedgerStage::Pending,
        LedgerStage::Generating,
        LedgerStage::Generated,
        LedgerStage::Scheduled,
        LedgerStage::Published,
        LedgerStage::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStage::Pending => "pending",
            LedgerStage::Generating => "generating",
            LedgerStage::Generated => "generated",
            LedgerStage::Scheduled => "scheduled",
            LedgerStage::Published => "published",
            LedgerStage::Error => "error",
        }
    }

    /// Parse a stage cell. An empty cell is not a stage.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ModelError::MissingField("stage"));
        }
        LedgerStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| ModelError::UnknownStage(raw.to_string()))
    }

    /// Position along the forward path. `Error` sits off the path.
    fn rank(&self) -> Option<u8> {
        match self {
            LedgerStage::Pending => Some(0),
            LedgerStage::Generating => Some(1),
            LedgerStage::Generated => Some(2),
            LedgerStage::Scheduled => Some(3),
            LedgerStage::Published => Some(4),
            LedgerStage::Error => None,
        }
    }

    /// Whether a row in this stage may move to `next`.
    pub fn can_transition_to(&self, next: LedgerStage) -> bool {
        match (self.rank(), next.rank()) {
            // error is final
            (None, _) => false,
            (Some(_), None) => true,
            (Some(current), Some(next)) => next > current,
        }
    }

    /// Check if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LedgerStage::Published | LedgerStage::Error)
    }
}

impl std::fmt::Display for LedgerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 16 ledger columns, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerColumn {
    Id,
    CreatedAt,
    Prompt,
    Category,
    Status,
    JobId,
    VideoUrl,
    Duration,
    Resolution,
    Cost,
    ScheduledAt,
    PublishedAt,
    LaterId,
    Caption,
    Hashtags,
    Error,
}

impl LedgerColumn {
    pub const COUNT: usize = 16;

    pub const ALL: [LedgerColumn; Self::COUNT] = [
        LedgerColumn::Id,
        LedgerColumn::CreatedAt,
        LedgerColumn::Prompt,
        LedgerColumn::Category,
        LedgerColumn::Status,
        LedgerColumn::JobId,
        LedgerColumn::VideoUrl,
        LedgerColumn::Duration,
        LedgerColumn::Resolution,
        LedgerColumn::Cost,
        LedgerColumn::ScheduledAt,
        LedgerColumn::PublishedAt,
        LedgerColumn::LaterId,
        LedgerColumn::Caption,
        LedgerColumn::Hashtags,
        LedgerColumn::Error,
    ];

    /// Zero-based column position.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Spreadsheet column letter (`A`..`P`).
    pub fn letter(&self) -> char {
        (b'A' + self.index() as u8) as char
    }

    /// Header name.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerColumn::Id => "id",
            LedgerColumn::CreatedAt => "created_at",
            LedgerColumn::Prompt => "prompt",
            LedgerColumn::Category => "category",
            LedgerColumn::Status => "status",
            LedgerColumn::JobId => "job_id",
            LedgerColumn::VideoUrl => "video_url",
            LedgerColumn::Duration => "duration",
            LedgerColumn::Resolution => "resolution",
            LedgerColumn::Cost => "cost",
            LedgerColumn::ScheduledAt => "scheduled_at",
            LedgerColumn::PublishedAt => "published_at",
            LedgerColumn::LaterId => "later_id",
            LedgerColumn::Caption => "caption",
            LedgerColumn::Hashtags => "hashtags",
            LedgerColumn::Error => "error",
        }
    }

    /// Header row in sheet order.
    pub fn headers() -> Vec<String> {
        Self::ALL.iter().map(|c| c.name().to_string()).collect()
    }
}

/// A new prompt to append to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewLedgerEntry {
    pub prompt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// One ledger row.
///
/// Numeric columns are kept as the text stored in the sheet; the ledger is
/// written by hand as often as by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerRow {
    pub id: String,
    pub created_at: String,
    pub prompt: String,
    pub category: String,
    pub status: LedgerStage,
    pub job_id: String,
    pub video_url: String,
    pub duration: String,
    pub resolution: String,
    pub cost: String,
    pub scheduled_at: String,
    pub published_at: String,
    pub later_id: String,
    pub caption: String,
    pub hashtags: String,
    pub error: String,
}

impl LedgerRow {
    /// Build a fresh pending row from a new entry.
    pub fn from_entry(id: impl Into<String>, entry: &NewLedgerEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.to_rfc3339(),
            prompt: entry.prompt.clone(),
            category: entry.category.clone(),
            status: LedgerStage::Pending,
            caption: entry.caption.clone(),
            hashtags: entry.hashtags.join(","),
            ..Default::default()
        }
    }

    /// Decode a row from sheet cells. Short rows are padded with empty cells.
    ///
    /// A row needs an identifier and a stage.
    pub fn from_cells(cells: &[String]) -> ModelResult<Self> {
        let cell = |column: LedgerColumn| cells.get(column.index()).cloned().unwrap_or_default();

        let id = cell(LedgerColumn::Id);
        if id.trim().is_empty() {
            return Err(ModelError::MissingField("id"));
        }

        Ok(Self {
            id,
            created_at: cell(LedgerColumn::CreatedAt),
            prompt: cell(LedgerColumn::Prompt),
            category: cell(LedgerColumn::Category),
            status: LedgerStage::parse(&cell(LedgerColumn::Status))?,
            job_id: cell(LedgerColumn::JobId),
            video_url: cell(LedgerColumn::VideoUrl),
            duration: cell(LedgerColumn::Duration),
            resolution: cell(LedgerColumn::Resolution),
            cost: cell(LedgerColumn::Cost),
            scheduled_at: cell(LedgerColumn::ScheduledAt),
            published_at: cell(LedgerColumn::PublishedAt),
            later_id: cell(LedgerColumn::LaterId),
            caption: cell(LedgerColumn::Caption),
            hashtags: cell(LedgerColumn::Hashtags),
            error: cell(LedgerColumn::Error),
        })
    }

    /// Encode the row as 16 sheet cells.
    pub fn to_cells(&self) -> Vec<String> {
        LedgerColumn::ALL.iter().map(|c| self.get(*c)).collect()
    }

    /// Read one column as text.
    pub fn get(&self, column: LedgerColumn) -> String {
        match column {
            LedgerColumn::Id => self.id.clone(),
            LedgerColumn::CreatedAt => self.created_at.clone(),
            LedgerColumn::Prompt => self.prompt.clone(),
            LedgerColumn::Category => self.category.clone(),
            LedgerColumn::Status => self.status.as_str().to_string(),
            LedgerColumn::JobId => self.job_id.clone(),
            LedgerColumn::VideoUrl => self.video_url.clone(),
            LedgerColumn::Duration => self.duration.clone(),
            LedgerColumn::Resolution => self.resolution.clone(),
            LedgerColumn::Cost => self.cost.clone(),
            LedgerColumn::ScheduledAt => self.scheduled_at.clone(),
            LedgerColumn::PublishedAt => self.published_at.clone(),
            LedgerColumn::LaterId => self.later_id.clone(),
            LedgerColumn::Caption => self.caption.clone(),
            LedgerColumn::Hashtags => self.hashtags.clone(),
            LedgerColumn::Error => self.error.clone(),
        }
    }

    /// Write one column from text.
    pub fn set(&mut self, column: LedgerColumn, value: impl Into<String>) -> ModelResult<()> {
        let value = value.into();
        match column {
            LedgerColumn::Id => self.id = value,
            LedgerColumn::CreatedAt => self.created_at = value,
            LedgerColumn::Prompt => self.prompt = value,
            LedgerColumn::Category => self.category = value,
            LedgerColumn::Status => self.status = LedgerStage::parse(&value)?,
            LedgerColumn::JobId => self.job_id = value,
            LedgerColumn::VideoUrl => self.video_url = value,
            LedgerColumn::Duration => self.duration = value,
            LedgerColumn::Resolution => self.resolution = value,
            LedgerColumn::Cost => self.cost = value,
            LedgerColumn::ScheduledAt => self.scheduled_at = value,
            LedgerColumn::PublishedAt => self.published_at = value,
            LedgerColumn::LaterId => self.later_id = value,
            LedgerColumn::Caption => self.caption = value,
            LedgerColumn::Hashtags => self.hashtags = value,
            LedgerColumn::Error => self.error = value,
        }
        Ok(())
    }

    /// Hashtags split from the comma-joined cell.
    pub fn hashtag_list(&self) -> Vec<String> {
        self.hashtags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// File name component of the stored video URL.
    pub fn video_filename(&self) -> Option<&str> {
        self.video_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && name.ends_with(".mp4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        use LedgerStage::*;
        assert!(Pending.can_transition_to(Generating));
        assert!(Generating.can_transition_to(Generated));
        assert!(Generated.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(Published));
        assert!(Pending.can_transition_to(Generated));

        assert!(!Generated.can_transition_to(Pending));
        assert!(!Generated.can_transition_to(Generating));
        assert!(!Generated.can_transition_to(Generated));
        assert!(!Published.can_transition_to(Scheduled));
    }

    #[test]
    fn test_error_reachable_from_any_live_stage_and_final() {
        use LedgerStage::*;
        for stage in [Pending, Generating, Generated, Scheduled, Published] {
            assert!(stage.can_transition_to(Error), "{stage} -> error");
        }
        for stage in LedgerStage::ALL {
            assert!(!Error.can_transition_to(stage));
        }
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!(LedgerStage::parse(" ").unwrap_err(), ModelError::MissingField("stage"));
        assert_eq!(LedgerStage::parse("Generated").unwrap(), LedgerStage::Generated);
        assert!(LedgerStage::parse("archived").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(LedgerColumn::Id.letter(), 'A');
        assert_eq!(LedgerColumn::Status.letter(), 'E');
        assert_eq!(LedgerColumn::Error.letter(), 'P');
        assert_eq!(LedgerColumn::headers().len(), 16);
    }

    #[test]
    fn test_short_row_is_padded() {
        let cells: Vec<String> = ["3", "2026-01-01T00:00:00Z", "prompt", "", "pending"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row = LedgerRow::from_cells(&cells).unwrap();
        assert_eq!(row.id, "3");
        assert_eq!(row.status, LedgerStage::Pending);
        assert_eq!(row.to_cells().len(), 16);
    }

    #[test]
    fn test_row_without_id_or_stage_is_rejected() {
        assert_eq!(LedgerRow::from_cells(&[]).unwrap_err(), ModelError::MissingField("id"));

        let no_stage = vec!["3".to_string(), String::new(), "prompt".to_string()];
        assert_eq!(
            LedgerRow::from_cells(&no_stage).unwrap_err(),
            ModelError::MissingField("stage")
        );
    }

    #[test]
    fn test_entry_hashtags_joined_and_split() {
        let entry = NewLedgerEntry {
            prompt: "p".into(),
            caption: "c".into(),
            hashtags: vec!["samurai".into(), "drone".into()],
            ..Default::default()
        };
        let row = LedgerRow::from_entry("1", &entry, Utc::now());
        assert_eq!(row.hashtags, "samurai,drone");
        assert_eq!(row.hashtag_list(), vec!["samurai", "drone"]);
    }

    #[test]
    fn test_video_filename_from_url() {
        let row = LedgerRow {
            video_url: "http://example.com/buzz/anachronism/anachronism_20260101_090000_1.mp4".into(),
            ..Default::default()
        };
        assert_eq!(row.video_filename(), Some("anachronism_20260101_090000_1.mp4"));

        let row = LedgerRow {
            video_url: "job:abc".into(),
            ..Default::default()
        };
        assert_eq!(row.video_filename(), None);
    }
}
