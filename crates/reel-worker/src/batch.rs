//! Batch and single-video runs.

use chrono::Utc;
use reel_social::default_slot;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::Pipeline;
use crate::report::{BatchReport, ScheduledRow, VideoOutcome};

/// Result of [`Pipeline::run_single`].
#[derive(Debug, Clone, Serialize)]
pub struct SingleReport {
    pub video: VideoOutcome,
    /// Set when the video was handed to the scheduler
    pub scheduled: Option<ScheduledRow>,
}

impl Pipeline {
    /// Generate `count` prompts and their videos.
    ///
    /// The first job runs alone to warm the remote worker; the remaining jobs
    /// are then all submitted before each is waited on in turn.
    pub async fn run_batch(&self, count: usize) -> WorkerResult<BatchReport> {
        info!(account = %self.account.id, count, "Batch run starting");

        let ideas = self.ideas(count, &self.account.theme).await?;
        if ideas.is_empty() {
            return Err(WorkerError::NoPrompts);
        }
        let rows = self.record_ideas(&ideas, "").await?;

        let mut report = BatchReport::new(rows.len());
        let Some(((first_row, first_prompt), rest)) = rows.split_first() else {
            return Ok(report);
        };

        info!(row_id = %first_row, "Warm-up job");
        match self.generate_row(first_row, first_prompt, 1).await {
            Ok(video) => report.videos.push(video),
            Err(e) => report.failures.push(self.fail_row(first_row, e.to_string()).await),
        }

        let mut submitted = Vec::with_capacity(rest.len());
        for (offset, (row_id, prompt)) in rest.iter().enumerate() {
            let index = offset + 2;
            match self.submit(row_id, prompt).await {
                Ok(job_id) => submitted.push((row_id, job_id, index)),
                Err(e) => report.failures.push(self.fail_row(row_id, e.to_string()).await),
            }
        }

        for (row_id, job_id, index) in submitted {
            match self.collect(row_id, &job_id, index).await {
                Ok(video) => report.videos.push(video),
                Err(e) => {
                    if e.is_job_failure() {
                        warn!(row_id = %row_id, job_id = %job_id, "Remote job did not finish");
                    }
                    report.failures.push(self.fail_row(row_id, e.to_string()).await);
                }
            }
        }

        info!(
            generated = report.generated(),
            requested = report.requested,
            total_cost = report.total_cost(),
            "Batch run complete"
        );
        Ok(report)
    }

    /// One prompt, one video, optionally scheduled for the next default slot.
    ///
    /// A scheduling failure leaves the row `generated` so `post` can retry it.
    pub async fn run_single(&self, schedule: bool) -> WorkerResult<SingleReport> {
        let ideas = self.ideas(1, &self.account.theme).await?;
        let rows = self.record_ideas(&ideas, "").await?;
        let (row_id, prompt) = rows.into_iter().next().ok_or(WorkerError::NoPrompts)?;

        let video = match self.generate_row(&row_id, &prompt, 1).await {
            Ok(video) => video,
            Err(e) => {
                self.fail_row(&row_id, e.to_string()).await;
                return Err(e);
            }
        };

        if !schedule || self.services.scheduler.is_none() {
            info!(row_id = %row_id, "Skipping scheduling");
            return Ok(SingleReport {
                video,
                scheduled: None,
            });
        }

        let row = self
            .ledger()
            .get(&row_id)
            .await?
            .ok_or_else(|| WorkerError::from(reel_ledger::LedgerError::not_found(&row_id)))?;

        let scheduled = match self.schedule_row(&row, default_slot(Utc::now())).await {
            Ok(receipt) => Some(ScheduledRow { row_id, receipt }),
            Err(e) => {
                warn!(row_id = %row.id, "Could not schedule: {}", e);
                None
            }
        };

        Ok(SingleReport { video, scheduled })
    }
}

#[cfg(test)]
mod tests {
    use reel_ledger::Ledger;
    use reel_models::LedgerStage;

    use crate::testing::{harness, FakePrompts};

    #[tokio::test]
    async fn test_batch_warms_up_then_submits_rest_before_waiting() {
        let h = harness(FakePrompts::new(&["samurai vs drone", "knight and tesla", "pharaoh flashlight"]));

        let report = h.pipeline.run_batch(3).await.unwrap();
        assert_eq!(report.requested, 3);
        assert_eq!(report.generated(), 3);
        assert!(report.failures.is_empty());

        let events = h.inference.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "submit job-1",
                "wait job-1",
                "submit job-2",
                "submit job-3",
                "wait job-2",
                "wait job-3",
            ]
        );

        let rows = h.ledger.all_rows().await.unwrap();
        assert!(rows.iter().all(|r| r.status == LedgerStage::Generated));
        assert_eq!(rows[0].job_id, "job-1");
        assert_eq!(rows[0].cost, "0.1060");
        assert_eq!(rows[0].resolution, "576x1024");
        assert!(rows[2].video_url.starts_with("http://cdn.test/reels/anachronism_"));
        assert!(rows[2].video_url.ends_with("_3.mp4"));
        assert!((report.total_cost() - 0.318).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_batch_failures_are_recorded_and_run_continues() {
        let h = harness(FakePrompts::new(&[
            "FAIL on warm-up",
            "REJECT at submit",
            "fine one",
        ]));

        let report = h.pipeline.run_batch(3).await.unwrap();
        assert_eq!(report.generated(), 1);
        assert_eq!(report.failures.len(), 2);

        let first = h.ledger.get("1").await.unwrap().unwrap();
        assert_eq!(first.status, LedgerStage::Error);
        assert_eq!(first.error, "Inference error: Job job-1 failed: CUDA out of memory");

        let second = h.ledger.get("2").await.unwrap().unwrap();
        assert_eq!(second.status, LedgerStage::Error);
        assert!(second.job_id.is_empty());

        let third = h.ledger.get("3").await.unwrap().unwrap();
        assert_eq!(third.status, LedgerStage::Generated);
    }

    #[tokio::test]
    async fn test_batch_prompt_failure_is_fatal() {
        let h = harness(FakePrompts::failing());
        assert!(h.pipeline.run_batch(2).await.is_err());
        assert!(h.ledger.is_empty().await);

        let h = harness(FakePrompts::new(&[]));
        assert!(matches!(
            h.pipeline.run_batch(2).await,
            Err(crate::error::WorkerError::NoPrompts)
        ));
    }

    #[tokio::test]
    async fn test_batch_brief_uses_account_and_past_prompts() {
        let h = harness(FakePrompts::new(&["first", "second"]));
        h.pipeline.run_batch(1).await.unwrap();
        h.pipeline.run_batch(1).await.unwrap();

        let briefs = h.prompts.briefs.lock().unwrap().clone();
        assert!(briefs[0].past_prompts.is_empty());
        assert_eq!(briefs[1].past_prompts, vec!["first"]);
        assert!(briefs[1].include_dialogue);
        assert_eq!(briefs[1].style.as_deref(), Some(h.pipeline.account().style.as_str()));
    }

    #[tokio::test]
    async fn test_single_schedules_next_default_slot() {
        let h = harness(FakePrompts::new(&["caveman meets roomba"]));

        let report = h.pipeline.run_single(true).await.unwrap();
        let scheduled = report.scheduled.unwrap();
        assert_eq!(scheduled.receipt.post_id, "post-1");

        let row = h.ledger.get(&report.video.row_id).await.unwrap().unwrap();
        assert_eq!(row.status, LedgerStage::Scheduled);
        assert_eq!(row.later_id, "post-1");

        let posts = h.scheduler.posts.lock().unwrap().clone();
        assert_eq!(posts[0].0, "caption for caveman meets roomba\n\n#history #ai");
        assert_eq!(posts[0].2.as_deref(), Some("profile-anachronism"));
    }

    #[tokio::test]
    async fn test_single_failure_marks_row_and_returns_error() {
        let h = harness(FakePrompts::new(&["FAIL please"]));

        let err = h.pipeline.run_single(false).await.unwrap_err();
        assert!(err.is_job_failure());
        assert_eq!(h.ledger.get("1").await.unwrap().unwrap().status, LedgerStage::Error);
    }

    #[tokio::test]
    async fn test_single_without_scheduling_stays_generated() {
        let h = harness(FakePrompts::new(&["viking with airpods"]));

        let report = h.pipeline.run_single(false).await.unwrap();
        assert!(report.scheduled.is_none());
        assert_eq!(
            h.ledger.get("1").await.unwrap().unwrap().status,
            LedgerStage::Generated
        );
        assert!(h.scheduler.posts.lock().unwrap().is_empty());
    }
}
