use serde::Serialize;

use crate::config::ClipclockConfig;
use crate::error::AppError;
use crate::job::{CompletedExtraction, Job};
use crate::job_store::JobStore;
use crate::traits::{Extractor, ExtractorResolver};

/// Events emitted by the dispatcher on every transition.
#[derive(Debug, Clone)]
pub enum DispatchEvent<'a> {
    Idle,
    Waiting {
        processing: i64,
        max_concurrent: u32,
    },
    JobClaimed {
        job: &'a Job,
    },
    JobStarted {
        job_id: i64,
        url: &'a str,
        extractor: &'a str,
    },
    JobCompleted {
        job_id: i64,
        result: &'a CompletedExtraction,
    },
    JobFailed {
        job_id: i64,
        error: &'a str,
    },
}

/// Trait for receiving dispatcher events (decoupled logging).
pub trait DispatchReporter: Send + Sync {
    fn report(&self, event: DispatchEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDispatchReporter;

impl DispatchReporter for TracingDispatchReporter {
    fn report(&self, event: DispatchEvent<'_>) {
        match event {
            DispatchEvent::Idle => {
                tracing::debug!("No jobs in the queue");
            }
            DispatchEvent::Waiting {
                processing,
                max_concurrent,
            } => {
                tracing::debug!(%processing, %max_concurrent, "Concurrency cap reached");
            }
            DispatchEvent::JobClaimed { job } => {
                tracing::info!(job_id = %job.id, url = %job.url, "Job claimed");
            }
            DispatchEvent::JobStarted {
                job_id,
                url,
                extractor,
            } => {
                tracing::info!(%job_id, %url, %extractor, "Processing job");
            }
            DispatchEvent::JobCompleted { job_id, result } => {
                tracing::info!(
                    %job_id,
                    duration = %result.duration_display,
                    title = result.video_title.as_deref().unwrap_or(""),
                    "Job completed"
                );
            }
            DispatchEvent::JobFailed { job_id, error } => {
                tracing::warn!(%job_id, %error, "Job failed");
            }
        }
    }
}

/// Outcome of one [`Dispatcher::advance`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Advance {
    /// Nothing queued.
    Idle,
    /// Jobs may be queued, but the concurrency cap is reached.
    Waiting,
    Completed {
        job_id: i64,
        result: CompletedExtraction,
    },
    Failed {
        job_id: i64,
        error: String,
    },
}

impl Advance {
    /// True when this call claimed and finished a job.
    pub fn processed_job(&self) -> bool {
        matches!(self, Advance::Completed { .. } | Advance::Failed { .. })
    }
}

/// Settings for the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub max_concurrent: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { max_concurrent: 3 }
    }
}

impl From<&ClipclockConfig> for DispatcherConfig {
    fn from(config: &ClipclockConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
        }
    }
}

/// Advances the queue by at most one job per call.
///
/// There is no background loop: an external poller calls
/// [`advance`](Self::advance) repeatedly. Several callers may run it
/// concurrently; the store's atomic claim keeps one job from being claimed
/// twice and the number in flight within `max_concurrent`.
#[derive(Clone)]
pub struct Dispatcher<S, R>
where
    S: JobStore,
    R: ExtractorResolver,
{
    store: S,
    resolver: R,
    config: DispatcherConfig,
}

impl<S, R> Dispatcher<S, R>
where
    S: JobStore,
    R: ExtractorResolver,
{
    pub fn new(store: S, resolver: R, config: DispatcherConfig) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_concurrent(&self) -> u32 {
        self.config.max_concurrent
    }

    /// Claim and process the next queued job, if the cap allows.
    ///
    /// Extraction failures are recorded on the job and returned as
    /// [`Advance::Failed`]; only storage errors are returned as `Err`.
    pub async fn advance<DR: DispatchReporter>(&self, reporter: &DR) -> Result<Advance, AppError> {
        let max = self.config.max_concurrent;

        let processing = self.store.processing_count().await?;
        if processing >= i64::from(max) {
            reporter.report(DispatchEvent::Waiting {
                processing,
                max_concurrent: max,
            });
            return Ok(Advance::Waiting);
        }

        let Some(job) = self.store.claim_next(max).await? else {
            // Another caller may have filled the last slot since the first read.
            let processing = self.store.processing_count().await?;
            if processing >= i64::from(max) {
                reporter.report(DispatchEvent::Waiting {
                    processing,
                    max_concurrent: max,
                });
                return Ok(Advance::Waiting);
            }
            reporter.report(DispatchEvent::Idle);
            return Ok(Advance::Idle);
        };

        reporter.report(DispatchEvent::JobClaimed { job: &job });
        self.process_job(&job, reporter).await
    }

    async fn process_job<DR: DispatchReporter>(
        &self,
        job: &Job,
        reporter: &DR,
    ) -> Result<Advance, AppError> {
        let extractor = self.resolver.resolve(&job.url);
        reporter.report(DispatchEvent::JobStarted {
            job_id: job.id,
            url: &job.url,
            extractor: extractor.name(),
        });

        let outcome = match extractor.extract(&job.url).await {
            Ok(result) if result.duration_seconds > 0 => {
                Ok(CompletedExtraction::from_result(result, extractor.name()))
            }
            Ok(result) => Err(format!(
                "Extractor returned a non-positive duration: {}",
                result.duration_seconds
            )),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(completed) => {
                if self.store.mark_completed(job.id, &completed).await? {
                    reporter.report(DispatchEvent::JobCompleted {
                        job_id: job.id,
                        result: &completed,
                    });
                } else {
                    tracing::warn!(job_id = %job.id, "Job was no longer processing; completion not recorded");
                }
                Ok(Advance::Completed {
                    job_id: job.id,
                    result: completed,
                })
            }
            Err(error) => {
                if self.store.mark_failed(job.id, &error).await? {
                    reporter.report(DispatchEvent::JobFailed {
                        job_id: job.id,
                        error: &error,
                    });
                } else {
                    tracing::warn!(job_id = %job.id, "Job was no longer processing; failure not recorded");
                }
                Ok(Advance::Failed {
                    job_id: job.id,
                    error,
                })
            }
        }
    }
}

impl<S, R> Dispatcher<S, R>
where
    S: JobStore + 'static,
    R: ExtractorResolver + 'static,
{
    /// Run one [`advance`](Self::advance) step on its own task.
    ///
    /// The step keeps going if the returned future is dropped, so a job
    /// claimed here still ends up `completed` or `failed` when the caller
    /// goes away (an HTTP client disconnecting mid-extraction).
    pub async fn advance_detached<DR>(&self, reporter: DR) -> Result<Advance, AppError>
    where
        DR: DispatchReporter + 'static,
    {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.advance(&reporter).await })
            .await
            .map_err(|e| AppError::InternalError(format!("Dispatch task failed: {e}")))?
    }
}
