//! `reel` command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use reel_inference::{InferenceBackend, InferenceClient};
use reel_ledger::{SheetsConfig, SheetsLedger};
use reel_prompts::GrokClient;
use reel_social::{LaterClient, LaterConfig, SocialScheduler};
use reel_storage::{FileStore, FtpStore, LocalStore};
use reel_worker::{
    init_tracing, AccountRegistry, BatchReport, DailyReport, Pipeline, PostOutcome, PostReport,
    ScheduleReport, Services, WorkerConfig, DEFAULT_ACCOUNT,
};

/// Short-form video content pipeline.
#[derive(Parser)]
#[command(name = "reel", version, about = "Short-form video content pipeline")]
struct Cli {
    /// Account to run for
    #[arg(long, short, global = true, default_value = DEFAULT_ACCOUNT)]
    account: String,

    /// Keep videos in a local directory instead of the FTP server
    #[arg(long, global = true, value_name = "DIR")]
    local_store: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate prompts and videos: one warm-up job, then the rest
    Batch {
        /// Number of videos
        #[arg(default_value_t = 5)]
        count: usize,
    },

    /// Generate one video and schedule it for tomorrow 09:00 UTC
    Single {
        /// Store the video without scheduling it
        #[arg(long)]
        skip_post: bool,
    },

    /// Daily run. Without phase flags all three phases run.
    Daily {
        /// Phase 1: generate prompts per category
        #[arg(long)]
        prompts: bool,
        /// Phase 2: generate videos for pending rows
        #[arg(long)]
        videos: bool,
        /// Phase 3: schedule generated videos
        #[arg(long)]
        schedule: bool,
        /// Overrides the configured daily count
        #[arg(long)]
        count: Option<usize>,
    },

    /// Post generated videos to the scheduler
    Post {
        /// List rows waiting to be posted
        #[arg(long)]
        list: bool,
        /// Post the oldest waiting row
        #[arg(long)]
        next: bool,
        /// Post every waiting row, up to --limit
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Post a specific row
        #[arg(long)]
        row: Option<String>,
        /// Show what would be posted without uploading
        #[arg(long)]
        dry_run: bool,
    },

    /// Mark scheduled rows whose post has gone out as published
    SyncPublished,

    /// List known accounts
    Accounts,

    /// List profiles connected to the scheduler
    Profiles,

    /// List stored videos
    Videos,

    /// Check the inference endpoint
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let registry = AccountRegistry::from_env();

    match cli.command {
        Commands::Accounts => {
            for account in registry.accounts() {
                let profile = account
                    .destination_profile_id
                    .as_deref()
                    .unwrap_or("(default profile)");
                println!("{:<16} {:<28} sheet={} profile={}", account.id, account.name, account.sheet_name, profile);
            }
            return Ok(());
        }
        Commands::Health => {
            let client = InferenceClient::from_env()?;
            let healthy = client.check_health().await;
            println!("inference endpoint: {}", if healthy { "healthy" } else { "unreachable" });
            if !healthy {
                anyhow::bail!("inference endpoint is not healthy");
            }
            return Ok(());
        }
        Commands::Profiles => {
            let later = LaterClient::from_env()?;
            for profile in later.profiles().await? {
                println!(
                    "{:<24} {:<12} {}",
                    profile.id.unwrap_or_default(),
                    profile.platform.unwrap_or_default(),
                    profile.username.unwrap_or_default()
                );
            }
            return Ok(());
        }
        Commands::Videos => {
            let store = file_store(cli.local_store.as_ref())?;
            for name in store.list_videos().await? {
                println!("{}", store.public_url(&name));
            }
            return Ok(());
        }
        _ => {}
    }

    let account = registry.get(&cli.account)?.clone();
    let config = WorkerConfig::from_env();
    info!(account = %account.id, "Using account {}", account.name);

    let services = build_services(&account.sheet_name, cli.local_store.as_ref())?;
    let pipeline = Pipeline::new(account, config, services);
    let json = cli.json;

    match cli.command {
        Commands::Batch { count } => {
            let report = pipeline.run_batch(count).await?;
            emit(json, &report, print_batch)?;
        }
        Commands::Single { skip_post } => {
            let report = pipeline.run_single(!skip_post).await?;
            emit(json, &report, |r| {
                println!("Video: {}", r.video.url);
                match &r.scheduled {
                    Some(s) => println!("Scheduled: {} at {}", s.receipt.post_id, s.receipt.scheduled_time),
                    None => println!("Not scheduled"),
                }
            })?;
        }
        Commands::Daily {
            prompts,
            videos,
            schedule,
            count,
        } => {
            let now = Utc::now();
            if !(prompts || videos || schedule) {
                let report = pipeline.run_daily(now).await?;
                emit(json, &report, print_daily)?;
            } else {
                let mut report = DailyReport::default();
                if prompts {
                    let n = count.unwrap_or(pipeline.config().daily_prompt_count);
                    report.prompts = pipeline.phase_prompts(n).await?;
                }
                if videos {
                    let n = count.unwrap_or(pipeline.config().daily_video_count);
                    report.videos = pipeline.phase_videos(n).await?;
                }
                if schedule {
                    let n = count.unwrap_or(pipeline.config().daily_video_count);
                    report.schedule = pipeline.phase_schedule(n, now).await?;
                }
                emit(json, &report, print_daily)?;
            }
        }
        Commands::Post {
            list,
            next,
            all,
            limit,
            row,
            dry_run,
        } => {
            if let Some(row_id) = row {
                let outcome = pipeline.post_row(&row_id, dry_run).await?;
                emit(json, &outcome, print_outcome)?;
            } else if next {
                match pipeline.post_next(dry_run).await? {
                    Some(outcome) => emit(json, &outcome, print_outcome)?,
                    None => println!("No videos waiting to be posted"),
                }
            } else if all {
                let report = pipeline.post_all(dry_run, limit).await?;
                emit(json, &report, print_posts)?;
            } else {
                if !list {
                    println!("Nothing to do: pass --list, --next, --all or --row");
                }
                for row in pipeline.pending_posts().await? {
                    println!("{:<6} {:<50} {}", row.id, truncate(&row.prompt, 48), row.video_url);
                }
            }
        }
        Commands::SyncPublished => {
            let published = pipeline.sync_published(Utc::now()).await?;
            emit(json, &published, |rows| {
                println!("Marked {} row(s) published", rows.len());
            })?;
        }
        Commands::Accounts | Commands::Health | Commands::Profiles | Commands::Videos => {}
    }

    Ok(())
}

fn file_store(local: Option<&PathBuf>) -> anyhow::Result<Arc<dyn FileStore>> {
    Ok(match local {
        Some(dir) => Arc::new(LocalStore::new(dir, format!("file://{}", dir.display()))),
        None => Arc::new(FtpStore::from_env().context("FTP store is not configured")?),
    })
}

fn build_services(sheet_name: &str, local: Option<&PathBuf>) -> anyhow::Result<Services> {
    let sheets = SheetsConfig::from_env()?.for_sheet(sheet_name);

    let later_config = LaterConfig::from_env();
    let scheduler: Option<Arc<dyn SocialScheduler>> = if later_config.api_key.is_some() {
        Some(Arc::new(LaterClient::new(later_config)?))
    } else {
        info!("LATER_API_KEY not set, scheduling disabled");
        None
    };

    Ok(Services {
        inference: Arc::new(InferenceClient::from_env()?),
        ledger: Arc::new(SheetsLedger::new(sheets)?),
        store: file_store(local)?,
        prompts: Arc::new(GrokClient::from_env()?),
        scheduler,
    })
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn print_batch(report: &BatchReport) {
    println!("Generated {}/{} videos", report.generated(), report.requested);
    for video in &report.videos {
        println!("  row {:<4} {} ({:.1}s, ${:.4})", video.row_id, video.url, video.execution_secs, video.cost);
    }
    for failure in &report.failures {
        println!("  row {:<4} FAILED: {}", failure.row_id, failure.error);
    }
    println!("Total cost: ${:.4}", report.total_cost());
}

fn print_schedule(report: &ScheduleReport) {
    println!("Scheduled {} videos", report.scheduled.len());
    for row in &report.scheduled {
        println!("  row {:<4} post {} at {}", row.row_id, row.receipt.post_id, row.receipt.scheduled_time);
    }
    for failure in &report.failures {
        println!("  row {:<4} FAILED: {}", failure.row_id, failure.error);
    }
}

fn print_daily(report: &DailyReport) {
    println!("Prompts saved: {}", report.prompts);
    print_batch(&report.videos);
    print_schedule(&report.schedule);
}

fn print_outcome(outcome: &PostOutcome) {
    match outcome {
        PostOutcome::DryRun {
            row_id,
            filename,
            caption,
        } => println!("[dry run] row {}: {} \"{}\"", row_id, filename, truncate(caption, 60)),
        PostOutcome::Posted {
            row_id, receipt, ..
        } => println!("row {}: post {} at {}", row_id, receipt.post_id, receipt.scheduled_time),
    }
}

fn print_posts(report: &PostReport) {
    println!("Posted {} of {} waiting", report.posted(), report.pending);
    for outcome in &report.outcomes {
        print_outcome(outcome);
    }
    for failure in &report.failures {
        println!("row {} FAILED: {}", failure.row_id, failure.error);
    }
}
