use clipclock_client::{DefaultResolver, HttpFetcher, ProcessRunner, SiteResolver};
use clipclock_core::{AppError, ClipclockConfig, Dispatcher, DispatcherConfig};
use clipclock_db::{Database, JobRepository};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub dispatcher: Dispatcher<JobRepository, DefaultResolver>,
    pub config: ClipclockConfig,
    /// Used by the health check to probe the extraction tool.
    pub runner: ProcessRunner,
}

impl AppState {
    /// Wire the dispatcher to the real process runner and HTTP fetcher.
    pub fn new(db: Database, config: ClipclockConfig) -> Result<Self, AppError> {
        let runner = ProcessRunner::new();
        let fetcher = HttpFetcher::with_timeout(config.extractor.fetch_timeout)?;
        let resolver = SiteResolver::new(runner, fetcher, config.extractor.clone());
        let dispatcher = Dispatcher::new(db.job_repo(), resolver, DispatcherConfig::from(&config));

        Ok(Self {
            db,
            dispatcher,
            config,
            runner,
        })
    }
}
