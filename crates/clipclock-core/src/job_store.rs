use std::future::Future;

use crate::error::AppError;
use crate::job::{CompletedExtraction, Job, JobCounts, ListQuery};

/// Durable ledger of jobs and their status.
///
/// Every write must be persisted before the returned future resolves.
/// Transition methods are guarded: they only apply from the expected source
/// state and return `false` when the guard did not match.
pub trait JobStore: Send + Sync + Clone {
    /// Insert a new `queued` job for `url`. Performs no validation.
    fn enqueue(&self, url: &str) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Oldest (lowest-id) queued job, if any.
    ///
    /// Reading this and then calling [`mark_processing`](Self::mark_processing)
    /// is not atomic; concurrent callers should use
    /// [`claim_next`](Self::claim_next) instead.
    fn next_queued(&self) -> impl Future<Output = Result<Option<Job>, AppError>> + Send;

    /// Atomically move the oldest queued job to `processing`, but only while
    /// fewer than `max_concurrent` jobs are processing.
    ///
    /// Returns `None` if the queue is empty or the cap is reached.
    fn claim_next(
        &self,
        max_concurrent: u32,
    ) -> impl Future<Output = Result<Option<Job>, AppError>> + Send;

    /// `queued → processing`; sets `started_at`.
    fn mark_processing(&self, id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// `processing → completed`; sets result fields and `completed_at`.
    fn mark_completed(
        &self,
        id: i64,
        result: &CompletedExtraction,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// `processing → failed`; sets `error_message` and `completed_at`.
    fn mark_failed(
        &self,
        id: i64,
        error_message: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn counts(&self) -> impl Future<Output = Result<JobCounts, AppError>> + Send;

    fn processing_count(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = Result<Option<Job>, AppError>> + Send;

    /// Jobs matching the query, newest first by `created_at`.
    fn list(&self, query: &ListQuery) -> impl Future<Output = Result<Vec<Job>, AppError>> + Send;

    /// Number of jobs matching the query's filters, ignoring its window.
    fn count_matching(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;
}
