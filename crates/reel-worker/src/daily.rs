//! Daily three-phase run: prompts, videos, scheduling.

use chrono::{DateTime, Utc};
use reel_models::LedgerStage;
use reel_social::{default_slot, slot_after};
use tracing::{info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::Pipeline;
use crate::report::{BatchReport, DailyReport, ScheduleReport, ScheduledRow};

impl Pipeline {
    /// Phase 1: generate prompts for each category and append them as pending rows.
    ///
    /// Each category gets `count / categories` prompts, at least one. A failing
    /// category is skipped.
    pub async fn phase_prompts(&self, count: usize) -> WorkerResult<usize> {
        let categories = &self.config.categories;
        if categories.is_empty() {
            return Err(WorkerError::config_error("no prompt categories configured"));
        }
        let per_category = (count / categories.len()).max(1);

        let mut appended = 0;
        for category in categories {
            match self.ideas(per_category, category).await {
                Ok(ideas) if ideas.is_empty() => {
                    warn!(category = %category, "No prompts generated");
                }
                Ok(ideas) => {
                    appended += self.record_ideas(&ideas, category).await?.len();
                    info!(category = %category, count = ideas.len(), "Prompts saved");
                }
                Err(e) => warn!(category = %category, "Prompt generation failed: {}", e),
            }
        }

        Ok(appended)
    }

    /// Phase 2: generate videos for up to `limit` pending rows, oldest first.
    pub async fn phase_videos(&self, limit: usize) -> WorkerResult<BatchReport> {
        let pending = self.ledger().rows_with_stage(LedgerStage::Pending).await?;
        let rows: Vec<_> = pending.into_iter().take(limit).collect();
        info!(count = rows.len(), "Generating videos for pending rows");

        let mut report = BatchReport::new(rows.len());
        for (offset, row) in rows.iter().enumerate() {
            match self.generate_row(&row.id, &row.prompt, offset + 1).await {
                Ok(video) => report.videos.push(video),
                Err(e) => report.failures.push(self.fail_row(&row.id, e.to_string()).await),
            }
        }

        Ok(report)
    }

    /// Phase 3: schedule up to `limit` generated rows, two hours apart from
    /// 09:00 UTC the day after `now`.
    pub async fn phase_schedule(&self, limit: usize, now: DateTime<Utc>) -> WorkerResult<ScheduleReport> {
        self.scheduler()?;

        let generated = self.ledger().rows_with_stage(LedgerStage::Generated).await?;
        let first_slot = default_slot(now);

        let mut report = ScheduleReport::default();
        for (offset, row) in generated.iter().take(limit).enumerate() {
            let at = slot_after(first_slot, offset);
            match self.schedule_row(row, at).await {
                Ok(receipt) => report.scheduled.push(ScheduledRow {
                    row_id: row.id.clone(),
                    receipt,
                }),
                Err(e) => {
                    let failure = self
                        .fail_row(&row.id, format!("Schedule failed: {}", e))
                        .await;
                    report.failures.push(failure);
                }
            }
        }

        Ok(report)
    }

    /// All three phases with the configured daily counts.
    pub async fn run_daily(&self, now: DateTime<Utc>) -> WorkerResult<DailyReport> {
        if let Err(e) = self.ledger().init().await {
            warn!("Could not initialise ledger: {}", e);
        }

        let prompts = self.phase_prompts(self.config.daily_prompt_count).await?;
        info!(prompts, "Phase 1 complete");

        let videos = self.phase_videos(self.config.daily_video_count).await?;
        info!(
            generated = videos.generated(),
            total = videos.requested,
            "Phase 2 complete"
        );

        let schedule = if self.services.scheduler.is_some() {
            self.phase_schedule(self.config.daily_video_count, now).await?
        } else {
            warn!("No scheduler configured, skipping phase 3");
            ScheduleReport::default()
        };
        info!(scheduled = schedule.scheduled.len(), "Phase 3 complete");

        Ok(DailyReport {
            prompts,
            videos,
            schedule,
        })
    }
}
