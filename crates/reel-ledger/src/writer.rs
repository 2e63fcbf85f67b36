//! Lifecycle "mark" operations.
//!
//! Each mark reads the row, checks that the move is forward (or into
//! `error`), then writes a partial update of exactly that row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reel_models::{LedgerColumn, LedgerStage};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::store::{Ledger, LedgerUpdate};

/// Stage transitions on top of a [`Ledger`].
#[derive(Clone)]
pub struct LedgerWriter {
    ledger: Arc<dyn Ledger>,
}

impl LedgerWriter {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Job submitted for this row.
    pub async fn mark_generating(&self, row_id: &str, job_id: &str) -> LedgerResult<()> {
        let update = LedgerUpdate::new().set(LedgerColumn::JobId, job_id);
        self.transition(row_id, LedgerStage::Generating, update).await
    }

    /// Video produced and stored at `video_url`.
    pub async fn mark_generated(
        &self,
        row_id: &str,
        video_url: &str,
        duration: Option<f64>,
        resolution: Option<&str>,
        cost: f64,
    ) -> LedgerResult<()> {
        let update = LedgerUpdate::new()
            .set(LedgerColumn::VideoUrl, video_url)
            .set(
                LedgerColumn::Duration,
                duration.map(|d| d.to_string()).unwrap_or_default(),
            )
            .set(LedgerColumn::Resolution, resolution.unwrap_or_default())
            .set(LedgerColumn::Cost, format!("{:.4}", cost));
        self.transition(row_id, LedgerStage::Generated, update).await
    }

    /// Post scheduled on the social scheduler.
    pub async fn mark_scheduled(
        &self,
        row_id: &str,
        post_id: &str,
        scheduled_at: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let update = LedgerUpdate::new()
            .set(LedgerColumn::LaterId, post_id)
            .set(LedgerColumn::ScheduledAt, scheduled_at.to_rfc3339());
        self.transition(row_id, LedgerStage::Scheduled, update).await
    }

    /// Post went live.
    pub async fn mark_published(&self, row_id: &str, published_at: DateTime<Utc>) -> LedgerResult<()> {
        let update = LedgerUpdate::new().set(LedgerColumn::PublishedAt, published_at.to_rfc3339());
        self.transition(row_id, LedgerStage::Published, update).await
    }

    /// Record a failure. Allowed from every stage except `error` itself.
    pub async fn mark_error(&self, row_id: &str, message: &str) -> LedgerResult<()> {
        let update = LedgerUpdate::new().set(LedgerColumn::Error, message);
        self.transition(row_id, LedgerStage::Error, update).await
    }

    async fn transition(
        &self,
        row_id: &str,
        to: LedgerStage,
        update: LedgerUpdate,
    ) -> LedgerResult<()> {
        let row = self
            .ledger
            .get(row_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(row_id))?;

        if !row.status.can_transition_to(to) {
            warn!(row_id = %row_id, from = %row.status, to = %to, "Refusing backwards ledger transition");
            return Err(LedgerError::InvalidTransition {
                row_id: row_id.to_string(),
                from: row.status,
                to,
            });
        }

        let update = update.stage(to);
        if !self.ledger.update_fields(row_id, &update).await? {
            return Err(LedgerError::not_found(row_id));
        }

        debug!(row_id = %row_id, from = %row.status, to = %to, "Ledger row advanced");
        Ok(())
    }
}
