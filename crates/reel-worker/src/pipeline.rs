//! Pipeline wiring and the per-job steps shared by every run mode.
//!
//! A job flows strictly downward: submit, poll, decode, store, record.
//! Every per-job error is written to the row's `error` column by the run
//! modes; one failed job never aborts the rest of a run.

use std::sync::Arc;

use chrono::Utc;
use reel_inference::{GeneratedVideo, InferenceBackend};
use reel_ledger::{Ledger, LedgerWriter};
use reel_models::{video_filename, AccountProfile, LedgerRow, NewLedgerEntry};
use reel_prompts::{PromptBrief, PromptIdea, PromptSource};
use reel_social::{ScheduleReceipt, SocialScheduler};
use reel_storage::FileStore;
use tracing::{info, warn, Instrument};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::report::{RowFailure, VideoOutcome};

/// External collaborators of a run.
#[derive(Clone)]
pub struct Services {
    pub inference: Arc<dyn InferenceBackend>,
    pub ledger: Arc<dyn Ledger>,
    pub store: Arc<dyn FileStore>,
    pub prompts: Arc<dyn PromptSource>,
    /// `None` when no scheduler is configured
    pub scheduler: Option<Arc<dyn SocialScheduler>>,
}

/// One account's content pipeline. Assumes it is the only ledger writer.
pub struct Pipeline {
    pub(crate) account: AccountProfile,
    pub(crate) config: WorkerConfig,
    pub(crate) services: Services,
    pub(crate) writer: LedgerWriter,
}

impl Pipeline {
    pub fn new(account: AccountProfile, config: WorkerConfig, services: Services) -> Self {
        let writer = LedgerWriter::new(Arc::clone(&services.ledger));
        Self {
            account,
            config,
            services,
            writer,
        }
    }

    pub fn account(&self) -> &AccountProfile {
        &self.account
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.services.ledger
    }

    pub(crate) fn scheduler(&self) -> WorkerResult<&Arc<dyn SocialScheduler>> {
        self.services
            .scheduler
            .as_ref()
            .ok_or_else(|| WorkerError::config_error("no social scheduler configured"))
    }

    /// Prompts already in the ledger. A read failure only costs de-duplication.
    pub(crate) async fn past_prompts(&self) -> Vec<String> {
        match self.services.ledger.past_prompts().await {
            Ok(past) => {
                info!(count = past.len(), "Found past prompts to avoid");
                past
            }
            Err(e) => {
                warn!("Could not fetch past prompts: {}", e);
                Vec::new()
            }
        }
    }

    /// Ask the prompt source for `count` ideas on `theme`.
    pub(crate) async fn ideas(&self, count: usize, theme: &str) -> WorkerResult<Vec<PromptIdea>> {
        let brief = PromptBrief::new(count)
            .with_theme(theme)
            .with_style(&self.account.style)
            .with_dialogue(true)
            .avoiding(self.past_prompts().await);

        let ideas = self.services.prompts.generate(&brief).await?;
        if ideas.len() < count {
            warn!(requested = count, received = ideas.len(), "Fewer prompts than requested");
        }
        Ok(ideas)
    }

    /// Append ideas as pending rows; returns `(row_id, prompt)` pairs.
    pub(crate) async fn record_ideas(
        &self,
        ideas: &[PromptIdea],
        category: &str,
    ) -> WorkerResult<Vec<(String, String)>> {
        let entries: Vec<NewLedgerEntry> = ideas
            .iter()
            .map(|idea| NewLedgerEntry {
                prompt: idea.prompt.clone(),
                category: category.to_string(),
                caption: idea.caption.clone(),
                hashtags: idea.hashtags.clone(),
            })
            .collect();

        let ids = self.services.ledger.append(&entries).await?;
        Ok(ids
            .into_iter()
            .zip(ideas.iter().map(|idea| idea.prompt.clone()))
            .collect())
    }

    /// Submit the job for a row and record it as generating.
    pub(crate) async fn submit(&self, row_id: &str, prompt: &str) -> WorkerResult<String> {
        let request = self.config.request_for(prompt);
        let job_id = self.services.inference.submit(&request).await?;
        self.writer.mark_generating(row_id, &job_id).await?;
        JobLogger::new(&job_id, "generate").log_start(&format!("row {}", row_id));
        Ok(job_id)
    }

    /// Wait for a submitted job, then store and record its video.
    pub(crate) async fn collect(
        &self,
        row_id: &str,
        job_id: &str,
        index: usize,
    ) -> WorkerResult<VideoOutcome> {
        let logger = JobLogger::new(job_id, "generate");

        async {
            logger.log_progress("waiting for completion");
            let result = self.wait_and_store(row_id, job_id, index).await;
            match &result {
                Ok(outcome) => logger.log_completion(&format!(
                    "{} in {:.1}s (${:.4})",
                    outcome.filename, outcome.execution_secs, outcome.cost
                )),
                Err(e) => logger.log_error(&e.to_string()),
            }
            result
        }
        .instrument(logger.create_span())
        .await
    }

    async fn wait_and_store(
        &self,
        row_id: &str,
        job_id: &str,
        index: usize,
    ) -> WorkerResult<VideoOutcome> {
        let video = self.services.inference.wait_for_video(job_id).await?;
        self.store_video(row_id, &video, index).await
    }

    /// Submit and collect in one go.
    pub(crate) async fn generate_row(
        &self,
        row_id: &str,
        prompt: &str,
        index: usize,
    ) -> WorkerResult<VideoOutcome> {
        let job_id = self.submit(row_id, prompt).await?;
        self.collect(row_id, &job_id, index).await
    }

    async fn store_video(
        &self,
        row_id: &str,
        video: &GeneratedVideo,
        index: usize,
    ) -> WorkerResult<VideoOutcome> {
        let filename = video_filename(&self.account.id, Utc::now(), index);
        let url = self.services.store.upload(&video.bytes, &filename).await?;

        let metadata = &video.metadata;
        self.writer
            .mark_generated(
                row_id,
                &url,
                metadata.duration,
                metadata.resolution.as_deref(),
                metadata.cost,
            )
            .await?;

        Ok(VideoOutcome {
            row_id: row_id.to_string(),
            job_id: video.job_id.clone(),
            filename,
            url,
            execution_secs: metadata.execution_secs,
            cost: metadata.cost,
        })
    }

    /// Download a row's stored video and schedule it at `at`.
    pub(crate) async fn schedule_row(
        &self,
        row: &LedgerRow,
        at: chrono::DateTime<Utc>,
    ) -> WorkerResult<ScheduleReceipt> {
        let scheduler = self.scheduler()?;
        let filename = row
            .video_filename()
            .ok_or_else(|| WorkerError::NoStoredVideo(row.id.clone()))?;

        let bytes = self.services.store.download(filename).await?;
        let receipt = scheduler
            .schedule_video(
                &bytes,
                filename,
                &row.caption,
                &row.hashtag_list(),
                at,
                self.account.destination_profile_id.as_deref(),
            )
            .await?;

        if let Err(e) = self.writer.mark_scheduled(&row.id, &receipt.post_id, at).await {
            warn!(row_id = %row.id, "Scheduled but could not update ledger: {}", e);
        }
        Ok(receipt)
    }

    /// Write `message` to the row's error column.
    pub(crate) async fn fail_row(&self, row_id: &str, message: String) -> RowFailure {
        warn!(row_id = %row_id, "Row failed: {}", message);
        if let Err(e) = self.writer.mark_error(row_id, &message).await {
            warn!(row_id = %row_id, "Could not record error: {}", e);
        }
        RowFailure {
            row_id: row_id.to_string(),
            error: message,
        }
    }
}
