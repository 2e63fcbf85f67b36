//! Posting generated videos and syncing published posts back to the ledger.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use reel_ledger::LedgerError;
use reel_models::{LedgerRow, LedgerStage};
use reel_social::default_slot;
use tracing::{info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::Pipeline;
use crate::report::{PostOutcome, PostReport, RowFailure};

impl Pipeline {
    /// Rows with a stored video that have not been scheduled yet.
    pub async fn pending_posts(&self) -> WorkerResult<Vec<LedgerRow>> {
        Ok(self.ledger().rows_with_stage(LedgerStage::Generated).await?)
    }

    /// Schedule one row for the next default slot, or describe it when `dry_run`.
    ///
    /// A scheduler rejection is written to the row; a missing file is not.
    pub async fn post_row(&self, row_id: &str, dry_run: bool) -> WorkerResult<PostOutcome> {
        let row = self
            .ledger()
            .get(row_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(row_id))?;
        let filename = row
            .video_filename()
            .ok_or_else(|| WorkerError::NoStoredVideo(row.id.clone()))?
            .to_string();

        if dry_run {
            info!(row_id = %row.id, filename = %filename, "Dry run, not posting");
            return Ok(PostOutcome::DryRun {
                row_id: row.id,
                filename,
                caption: row.caption,
            });
        }

        match self.schedule_row(&row, default_slot(Utc::now())).await {
            Ok(receipt) => Ok(PostOutcome::Posted {
                row_id: row.id,
                filename,
                receipt,
            }),
            Err(WorkerError::Social(e)) => {
                self.fail_row(&row.id, format!("Later: {}", e)).await;
                Err(WorkerError::Social(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Post the oldest pending row, if any.
    pub async fn post_next(&self, dry_run: bool) -> WorkerResult<Option<PostOutcome>> {
        match self.pending_posts().await?.first() {
            Some(row) => self.post_row(&row.id, dry_run).await.map(Some),
            None => Ok(None),
        }
    }

    /// Post up to `limit` pending rows, oldest first.
    pub async fn post_all(&self, dry_run: bool, limit: usize) -> WorkerResult<PostReport> {
        let pending = self.pending_posts().await?;
        let mut report = PostReport {
            pending: pending.len(),
            ..Default::default()
        };

        for row in pending.iter().take(limit) {
            match self.post_row(&row.id, dry_run).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    warn!(row_id = %row.id, "Post failed: {}", e);
                    report.failures.push(RowFailure {
                        row_id: row.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(posted = report.posted(), pending = report.pending, "Posting complete");
        Ok(report)
    }

    /// Mark scheduled rows whose post left the scheduler's queue as published.
    ///
    /// Returns the ids of the rows marked.
    pub async fn sync_published(&self, now: DateTime<Utc>) -> WorkerResult<Vec<String>> {
        let queued: HashSet<String> = self
            .scheduler()?
            .scheduled_posts()
            .await?
            .into_iter()
            .filter_map(|post| post.id)
            .collect();

        let scheduled = self.ledger().rows_with_stage(LedgerStage::Scheduled).await?;
        let mut published = Vec::new();
        for row in scheduled {
            if row.later_id.is_empty() || queued.contains(&row.later_id) {
                continue;
            }
            match self.writer.mark_published(&row.id, now).await {
                Ok(()) => published.push(row.id),
                Err(e) => warn!(row_id = %row.id, "Could not mark published: {}", e),
            }
        }

        info!(count = published.len(), "Published rows synced");
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use reel_ledger::{Ledger, MemoryLedger};
    use reel_models::{LedgerRow, LedgerStage};

    use super::*;
    use crate::testing::{harness, harness_with_ledger, FakePrompts};

    #[tokio::test]
    async fn test_dry_run_leaves_row_untouched() {
        let h = harness(FakePrompts::new(&["knight and tesla"]));
        h.pipeline.run_single(false).await.unwrap();

        let outcome = h.pipeline.post_row("1", true).await.unwrap();
        match outcome {
            PostOutcome::DryRun { caption, filename, .. } => {
                assert_eq!(caption, "caption for knight and tesla");
                assert!(filename.ends_with("_1.mp4"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(h.scheduler.posts.lock().unwrap().is_empty());
        assert_eq!(
            h.ledger.get("1").await.unwrap().unwrap().status,
            LedgerStage::Generated
        );
    }

    #[tokio::test]
    async fn test_post_next_schedules_oldest() {
        let h = harness(FakePrompts::new(&["first", "second"]));
        h.pipeline.run_batch(2).await.unwrap();

        let outcome = h.pipeline.post_next(false).await.unwrap().unwrap();
        assert!(matches!(outcome, PostOutcome::Posted { ref row_id, .. } if row_id == "1"));
        assert_eq!(h.pipeline.pending_posts().await.unwrap().len(), 1);

        h.pipeline.post_next(false).await.unwrap();
        assert!(h.pipeline.post_next(false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_row_without_video() {
        let row = LedgerRow {
            id: "7".into(),
            prompt: "unused".into(),
            status: LedgerStage::Generated,
            ..Default::default()
        };
        let h = harness_with_ledger(FakePrompts::new(&[]), MemoryLedger::with_rows(vec![row]));

        let err = h.pipeline.post_row("7", false).await.unwrap_err();
        assert!(matches!(err, WorkerError::NoStoredVideo(ref id) if id == "7"));

        let err = h.pipeline.post_row("99", false).await.unwrap_err();
        assert!(matches!(err, WorkerError::Ledger(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_post_all_respects_limit_and_collects_failures() {
        let h = harness(FakePrompts::new(&["a", "b", "c"]));
        h.pipeline.run_batch(3).await.unwrap();
        let second = h.ledger.get("2").await.unwrap().unwrap();
        std::fs::remove_file(h.dir.path().join(second.video_filename().unwrap())).unwrap();

        let report = h.pipeline.post_all(false, 2).await.unwrap();
        assert_eq!(report.pending, 3);
        assert_eq!(report.posted(), 1);
        assert_eq!(report.failures[0].row_id, "2");

        // a missing file is not written to the row
        assert_eq!(
            h.ledger.get("2").await.unwrap().unwrap().status,
            LedgerStage::Generated
        );
        assert_eq!(
            h.ledger.get("3").await.unwrap().unwrap().status,
            LedgerStage::Generated
        );
    }

    #[tokio::test]
    async fn test_sync_published_marks_rows_that_left_the_queue() {
        let h = harness(FakePrompts::new(&["a", "b"]));
        h.pipeline.run_single(true).await.unwrap();
        h.pipeline.run_single(true).await.unwrap();

        assert!(h.pipeline.sync_published(Utc::now()).await.unwrap().is_empty());

        h.scheduler.pending.lock().unwrap().retain(|id| id != "post-1");
        let published = h.pipeline.sync_published(Utc::now()).await.unwrap();
        assert_eq!(published, vec!["1"]);

        let row = h.ledger.get("1").await.unwrap().unwrap();
        assert_eq!(row.status, LedgerStage::Published);
        assert!(!row.published_at.is_empty());
        assert_eq!(
            h.ledger.get("2").await.unwrap().unwrap().status,
            LedgerStage::Scheduled
        );
    }

    #[tokio::test]
    async fn test_sync_published_skips_rows_without_post_id() {
        let row = LedgerRow {
            id: "1".into(),
            status: LedgerStage::Scheduled,
            ..Default::default()
        };
        let h = harness_with_ledger(FakePrompts::new(&[]), MemoryLedger::with_rows(vec![row]));

        assert!(h.pipeline.sync_published(Utc::now()).await.unwrap().is_empty());
    }
}
