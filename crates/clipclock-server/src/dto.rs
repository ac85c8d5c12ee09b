use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clipclock_core::dispatcher::Advance;
use clipclock_core::job::{CompletedExtraction, Job, JobCounts};

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateJobRequest {
    /// Video page URL (http or https).
    pub url: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateJobResponse {
    pub job_id: i64,
    pub status: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    pub id: i64,
    pub url: String,
    pub domain: String,
    pub status: String,
    pub site_title: Option<String>,
    pub video_title: Option<String>,
    pub duration_seconds: Option<i64>,
    pub duration_display: Option<String>,
    pub error_message: Option<String>,
    pub extractor_used: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            url: job.url,
            domain: job.domain,
            status: job.status.to_string(),
            site_title: job.site_title,
            video_title: job.video_title,
            duration_seconds: job.duration_seconds,
            duration_display: job.duration_display,
            error_message: job.error_message,
            extractor_used: job.extractor_used,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListJobsQuery {
    /// queued, processing, completed or failed
    pub status: Option<String>,
    /// Exact domain, e.g. `youtube.com`
    pub domain: Option<String>,
    /// Page size; defaults to the configured page size, capped at 500
    pub limit: Option<usize>,
    /// Rows to skip; ignored when `page` is given
    pub offset: Option<usize>,
    /// 1-based page number
    pub page: Option<usize>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    /// Jobs matching the filters, across all pages.
    pub total: i64,
    pub page: usize,
    pub pages: i64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CountsResponse {
    pub queued: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}

impl From<JobCounts> for CountsResponse {
    fn from(counts: JobCounts) -> Self {
        Self {
            queued: counts.queued,
            processing: counts.processing,
            completed: counts.completed,
            failed: counts.failed,
            total: counts.total,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ExtractionResponse {
    pub duration_seconds: i64,
    pub duration_display: String,
    pub video_title: Option<String>,
    pub site_title: Option<String>,
    pub extractor_used: String,
}

impl From<CompletedExtraction> for ExtractionResponse {
    fn from(result: CompletedExtraction) -> Self {
        Self {
            duration_seconds: result.duration_seconds,
            duration_display: result.duration_display,
            video_title: result.video_title,
            site_title: result.site_title,
            extractor_used: result.extractor_used,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdvanceResponse {
    /// idle, waiting, completed or failed
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Advance> for AdvanceResponse {
    fn from(outcome: Advance) -> Self {
        match outcome {
            Advance::Idle => Self::bare("idle"),
            Advance::Waiting => Self::bare("waiting"),
            Advance::Completed { job_id, result } => Self {
                action: "completed",
                job_id: Some(job_id),
                result: Some(result.into()),
                error: None,
            },
            Advance::Failed { job_id, error } => Self {
                action: "failed",
                job_id: Some(job_id),
                result: None,
                error: Some(error),
            },
        }
    }
}

impl AdvanceResponse {
    fn bare(action: &'static str) -> Self {
        Self {
            action,
            job_id: None,
            result: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub extractor: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
