//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::dispatcher::{DispatchEvent, DispatchReporter};
use crate::error::AppError;
use crate::job::{CompletedExtraction, ExtractionResult, Job, JobCounts, JobStatus, ListQuery};
use crate::job_store::JobStore;
use crate::traits::{CommandOutput, CommandRunner, Extractor, ExtractorResolver, Fetcher};
use crate::util::domain_of;

// ---------------------------------------------------------------------------
// MockJobStore
// ---------------------------------------------------------------------------

/// Mock job store backed by an in-memory Vec, ids starting at 1.
#[derive(Clone)]
pub struct MockJobStore {
    jobs: Arc<Mutex<Vec<Job>>>,
    claim_error: Arc<Mutex<Option<AppError>>>,
    write_error: Arc<Mutex<Option<AppError>>>,
}

impl MockJobStore {
    pub fn empty() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Vec::new())),
            claim_error: Arc::new(Mutex::new(None)),
            write_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Store whose next claim fails with `error`.
    pub fn with_claim_error(error: AppError) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Vec::new())),
            claim_error: Arc::new(Mutex::new(Some(error))),
            write_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Make the next `mark_completed`/`mark_failed` fail with `error`.
    pub fn fail_next_write(&self, error: AppError) {
        *self.write_error.lock().unwrap() = Some(error);
    }

    fn take_write_error(&self) -> Result<(), AppError> {
        match self.write_error.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn transition<F>(&self, id: i64, from: JobStatus, apply: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.iter_mut().find(|j| j.id == id && j.status == from) {
            Some(job) => {
                apply(job);
                true
            }
            None => false,
        }
    }

    fn matches(job: &Job, query: &ListQuery) -> bool {
        query.status.is_none_or(|s| job.status == s)
            && query.domain.as_deref().is_none_or(|d| job.domain == d)
    }
}

impl JobStore for MockJobStore {
    async fn enqueue(&self, url: &str) -> Result<i64, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let id = jobs.last().map_or(1, |j| j.id + 1);
        jobs.push(Job {
            id,
            url: url.to_string(),
            domain: domain_of(url),
            status: JobStatus::Queued,
            site_title: None,
            video_title: None,
            duration_seconds: None,
            duration_display: None,
            error_message: None,
            extractor_used: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        });
        Ok(id)
    }

    async fn next_queued(&self) -> Result<Option<Job>, AppError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .filter(|j| j.status == JobStatus::Queued)
            .min_by_key(|j| j.id)
            .cloned())
    }

    async fn claim_next(&self, max_concurrent: u32) -> Result<Option<Job>, AppError> {
        if let Some(e) = self.claim_error.lock().unwrap().take() {
            return Err(e);
        }

        let mut jobs = self.jobs.lock().unwrap();
        let processing = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Processing)
            .count();
        if processing >= max_concurrent as usize {
            return Ok(None);
        }
        let next = jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Queued)
            .min_by_key(|j| j.id);
        Ok(next.map(|job| {
            job.status = JobStatus::Processing;
            job.started_at = Some(Utc::now());
            job.clone()
        }))
    }

    async fn mark_processing(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.transition(id, JobStatus::Queued, |job| {
            job.status = JobStatus::Processing;
            job.started_at = Some(Utc::now());
        }))
    }

    async fn mark_completed(
        &self,
        id: i64,
        result: &CompletedExtraction,
    ) -> Result<bool, AppError> {
        self.take_write_error()?;
        Ok(self.transition(id, JobStatus::Processing, |job| {
            job.status = JobStatus::Completed;
            job.site_title = result.site_title.clone();
            job.video_title = result.video_title.clone();
            job.duration_seconds = Some(result.duration_seconds);
            job.duration_display = Some(result.duration_display.clone());
            job.extractor_used = Some(result.extractor_used.clone());
            job.completed_at = Some(Utc::now());
        }))
    }

    async fn mark_failed(&self, id: i64, error_message: &str) -> Result<bool, AppError> {
        self.take_write_error()?;
        Ok(self.transition(id, JobStatus::Processing, |job| {
            job.status = JobStatus::Failed;
            job.error_message = Some(error_message.to_string());
            job.completed_at = Some(Utc::now());
        }))
    }

    async fn counts(&self) -> Result<JobCounts, AppError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(JobCounts::from_rows(jobs.iter().map(|j| (j.status, 1))))
    }

    async fn processing_count(&self) -> Result<i64, AppError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .filter(|j| j.status == JobStatus::Processing)
            .count() as i64)
    }

    async fn get(&self, id: i64) -> Result<Option<Job>, AppError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Job>, AppError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .rev()
            .filter(|j| Self::matches(j, query))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn count_matching(&self, query: &ListQuery) -> Result<i64, AppError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().filter(|j| Self::matches(j, query)).count() as i64)
    }
}

// ---------------------------------------------------------------------------
// MockExtractor / MockResolver
// ---------------------------------------------------------------------------

/// Mock extractor that returns a configurable result and counts calls.
#[derive(Clone)]
pub struct MockExtractor {
    responses: Arc<Mutex<Vec<Result<ExtractionResult, AppError>>>>,
    urls: Arc<Mutex<Vec<String>>>,
    fallback: ExtractionResult,
    delay: Option<Duration>,
}

impl MockExtractor {
    pub fn new(result: ExtractionResult) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            urls: Arc::new(Mutex::new(Vec::new())),
            fallback: result,
            delay: None,
        }
    }

    /// Sleep for `delay` inside every `extract` call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Extractor whose first call fails with `error`.
    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            urls: Arc::new(Mutex::new(Vec::new())),
            fallback: ExtractionResult::new(1),
            delay: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Extractor for MockExtractor {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn extract(&self, url: &str) -> Result<ExtractionResult, AppError> {
        self.urls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.fallback.clone())
        } else {
            responses.remove(0)
        }
    }
}

/// Resolver that hands out the same mock extractor for every URL.
#[derive(Clone)]
pub struct MockResolver {
    extractor: MockExtractor,
}

impl MockResolver {
    pub fn new(extractor: MockExtractor) -> Self {
        Self { extractor }
    }
}

impl ExtractorResolver for MockResolver {
    type Extractor = MockExtractor;

    fn resolve(&self, _url: &str) -> MockExtractor {
        self.extractor.clone()
    }
}

// ---------------------------------------------------------------------------
// MockRunner
// ---------------------------------------------------------------------------

/// Recorded invocation: (program, args, timeout).
pub type RunRecord = (String, Vec<String>, Duration);

/// Mock command runner returning canned outputs and recording invocations.
#[derive(Clone)]
pub struct MockRunner {
    responses: Arc<Mutex<Vec<Result<CommandOutput, AppError>>>>,
    pub calls: Arc<Mutex<Vec<RunRecord>>>,
}

impl MockRunner {
    /// Runner whose single call exits 0 with `stdout`.
    pub fn stdout(stdout: &str) -> Self {
        Self::with_output(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
            timed_out: false,
        })
    }

    pub fn with_output(output: CommandOutput) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(output)])),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Arguments of the most recent call.
    pub fn last_args(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, args, _)| args.clone())
            .unwrap_or_default()
    }
}

impl CommandRunner for MockRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, AppError> {
        self.calls.lock().unwrap().push((
            program.display().to_string(),
            args.iter().map(|a| a.to_string()).collect(),
            timeout,
        ));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: "no canned response".to_string(),
                exit_code: 1,
                timed_out: false,
            })
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable body and records requested URLs.
#[derive(Clone)]
pub struct MockFetcher {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(body.to_string())])),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(AppError::HttpError("no canned response".to_string()))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock dispatch reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchReporter for MockReporter {
    fn report(&self, event: DispatchEvent<'_>) {
        let label = match &event {
            DispatchEvent::Idle => "Idle",
            DispatchEvent::Waiting { .. } => "Waiting",
            DispatchEvent::JobClaimed { .. } => "JobClaimed",
            DispatchEvent::JobStarted { .. } => "JobStarted",
            DispatchEvent::JobCompleted { .. } => "JobCompleted",
            DispatchEvent::JobFailed { .. } => "JobFailed",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}
