use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use clipclock_client::{DefaultResolver, HttpFetcher, ProcessRunner, SiteResolver};
use clipclock_core::job::page_count;
use clipclock_core::{
    ClipclockConfig, Dispatcher, DispatcherConfig, Job, JobStatus, JobStore, ListQuery,
    PollOptions, TracingDispatchReporter, validate_submission,
};
use clipclock_db::{Database, DatabaseConfig, JobRepository};

#[derive(Parser)]
#[command(name = "clipclock", version, about = "Queue video URLs and measure their duration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a video URL for duration extraction
    Submit {
        /// Video page URL (http or https)
        url: String,
    },

    /// Show job counts per status
    Status,

    /// List jobs, newest first
    List {
        /// Only jobs in this status (queued, processing, completed, failed)
        #[arg(short, long)]
        status: Option<JobStatus>,

        /// Only jobs whose domain equals this (e.g. "youtube.com")
        #[arg(short, long)]
        domain: Option<String>,

        /// Rows per page (defaults to CLIPCLOCK_PAGE_SIZE)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Rows to skip
        #[arg(long, conflicts_with = "page")]
        offset: Option<usize>,

        /// 1-based page number
        #[arg(short, long)]
        page: Option<usize>,
    },

    /// Show one job as JSON
    Show {
        /// Job id
        id: i64,
    },

    /// Process at most one queued job and print the outcome as JSON
    Advance,

    /// Keep advancing the queue until interrupted
    Work {
        /// Seconds to sleep when the queue is idle or at capacity
        #[arg(short, long, default_value_t = 2, env = "CLIPCLOCK_POLL_INTERVAL_SECS")]
        interval: u64,

        /// Exit once the queue is empty
        #[arg(long, default_value_t = false)]
        until_idle: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("clipclock=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClipclockConfig::from_env()?;
    let repo = connect_db().await?;

    match cli.command {
        Commands::Submit { url } => cmd_submit(&repo, &url).await?,
        Commands::Status => cmd_status(&repo).await?,
        Commands::List {
            status,
            domain,
            limit,
            offset,
            page,
        } => {
            let page_size = limit.unwrap_or(config.page_size).max(1);
            let mut query = ListQuery::new(page_size);
            if let Some(status) = status {
                query = query.with_status(status);
            }
            if let Some(domain) = domain {
                query = query.with_domain(domain);
            }
            query = match (page, offset) {
                (Some(page), _) => query.with_page(page, page_size),
                (None, Some(offset)) => query.with_offset(offset),
                (None, None) => query,
            };
            cmd_list(&repo, &query).await?;
        }
        Commands::Show { id } => cmd_show(&repo, id).await?,
        Commands::Advance => {
            let dispatcher = build_dispatcher(repo, &config)?;
            cmd_advance(&dispatcher).await?;
        }
        Commands::Work {
            interval,
            until_idle,
        } => {
            let dispatcher = build_dispatcher(repo, &config)?;
            let options = PollOptions {
                interval: Duration::from_secs(interval.max(1)),
                until_idle,
            };
            cmd_work(&dispatcher, options).await;
        }
    }

    Ok(())
}

/// Open the SQLite database named by DATABASE_URL and apply migrations.
async fn connect_db() -> Result<JobRepository> {
    let db_config = DatabaseConfig::from_env()?;
    let db = Database::connect(&db_config)
        .await
        .with_context(|| format!("Failed to open database at {}", db_config.url))?;
    db.migrate().await?;
    Ok(db.job_repo())
}

fn build_dispatcher(
    repo: JobRepository,
    config: &ClipclockConfig,
) -> Result<Dispatcher<JobRepository, DefaultResolver>> {
    let fetcher = HttpFetcher::with_timeout(config.extractor.fetch_timeout)
        .context("Failed to create HTTP client")?;
    let resolver = SiteResolver::new(ProcessRunner::new(), fetcher, config.extractor.clone());
    Ok(Dispatcher::new(
        repo,
        resolver,
        DispatcherConfig::from(config),
    ))
}

async fn cmd_submit(repo: &JobRepository, raw_url: &str) -> Result<()> {
    let url = validate_submission(raw_url)?;
    let id = repo.enqueue(&url).await?;
    tracing::info!(job_id = id, %url, "Job queued");
    println!("Queued job {id}: {url}");
    Ok(())
}

async fn cmd_status(repo: &JobRepository) -> Result<()> {
    let counts = repo.counts().await?;
    for status in JobStatus::ALL {
        println!("{:<12}{:>8}", status.as_str(), counts.get(status));
    }
    println!("{:<12}{:>8}", "total", counts.total);
    Ok(())
}

async fn cmd_list(repo: &JobRepository, query: &ListQuery) -> Result<()> {
    let jobs = repo.list(query).await?;
    let total = repo.count_matching(query).await?;

    if jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }

    println!(
        "{:>6}  {:<10}  {:>10}  {:<20}  URL",
        "ID", "STATUS", "DURATION", "CREATED"
    );
    for job in &jobs {
        print_row(job);
    }

    let page = query.offset / query.limit.max(1) + 1;
    println!(
        "\nPage {page} of {} ({total} jobs)",
        page_count(total, query.limit)
    );
    Ok(())
}

fn print_row(job: &Job) {
    let duration = match job.status {
        JobStatus::Completed => job.duration_display.as_deref().unwrap_or("-"),
        JobStatus::Failed => "error",
        _ => "-",
    };
    println!(
        "{:>6}  {:<10}  {:>10}  {:<20}  {}",
        job.id,
        job.status.as_str(),
        duration,
        job.created_at.format("%Y-%m-%d %H:%M:%S"),
        job.url
    );
}

async fn cmd_show(repo: &JobRepository, id: i64) -> Result<()> {
    let Some(job) = repo.get(id).await? else {
        bail!("Job {id} not found");
    };
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

async fn cmd_advance(dispatcher: &Dispatcher<JobRepository, DefaultResolver>) -> Result<()> {
    let outcome = dispatcher.advance(&TracingDispatchReporter).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn cmd_work(dispatcher: &Dispatcher<JobRepository, DefaultResolver>, options: PollOptions) {
    let cancel_token = CancellationToken::new();
    let shutdown = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, stopping after the current job");
            shutdown.cancel();
        }
    });

    tracing::info!(
        interval_secs = options.interval.as_secs(),
        until_idle = options.until_idle,
        max_concurrent = dispatcher.max_concurrent(),
        "Worker started"
    );
    let summary = dispatcher
        .run(cancel_token, options, &TracingDispatchReporter)
        .await;
    println!(
        "Processed {} jobs ({} completed, {} failed)",
        summary.completed + summary.failed,
        summary.completed,
        summary.failed
    );
}
