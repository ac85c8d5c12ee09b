use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a job in the queue.
///
/// Transitions are forward-only: `Queued → Processing → {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether `self → next` is an edge of the job state machine.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

/// One submitted URL, tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub url: String,
    /// Host of `url` without a leading `www.`.
    pub domain: String,
    pub status: JobStatus,
    pub site_title: Option<String>,
    pub video_title: Option<String>,
    pub duration_seconds: Option<i64>,
    /// Cached rendering of `duration_seconds`, fixed at completion time.
    pub duration_display: Option<String>,
    pub error_message: Option<String>,
    pub extractor_used: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What a strategy hands back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub duration_seconds: i64,
    pub video_title: Option<String>,
    pub site_title: Option<String>,
}

impl ExtractionResult {
    pub fn new(duration_seconds: i64) -> Self {
        Self {
            duration_seconds,
            video_title: None,
            site_title: None,
        }
    }

    pub fn with_video_title(mut self, title: impl Into<String>) -> Self {
        self.video_title = Some(title.into());
        self
    }

    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }
}

/// Everything written to a job when it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedExtraction {
    pub duration_seconds: i64,
    pub duration_display: String,
    pub video_title: Option<String>,
    pub site_title: Option<String>,
    pub extractor_used: String,
}

impl CompletedExtraction {
    /// Render the display duration once and attach the strategy name.
    pub fn from_result(result: ExtractionResult, extractor_used: impl Into<String>) -> Self {
        Self {
            duration_display: crate::util::format_duration(result.duration_seconds),
            duration_seconds: result.duration_seconds,
            video_title: result.video_title,
            site_title: result.site_title,
            extractor_used: extractor_used.into(),
        }
    }
}

/// Per-status snapshot of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub queued: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}

impl JobCounts {
    /// Build counts from `(status, count)` rows; `total` is their sum.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (JobStatus, i64)>,
    {
        let mut counts = JobCounts::default();
        for (status, n) in rows {
            match status {
                JobStatus::Queued => counts.queued += n,
                JobStatus::Processing => counts.processing += n,
                JobStatus::Completed => counts.completed += n,
                JobStatus::Failed => counts.failed += n,
            }
            counts.total += n;
        }
        counts
    }

    pub fn get(&self, status: JobStatus) -> i64 {
        match status {
            JobStatus::Queued => self.queued,
            JobStatus::Processing => self.processing,
            JobStatus::Completed => self.completed,
            JobStatus::Failed => self.failed,
        }
    }
}

/// Filter and window for listing jobs, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<JobStatus>,
    pub domain: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            domain: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Window for a 1-based page number; page 0 is treated as page 1.
    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.limit = page_size;
        self.offset = page.max(1).saturating_sub(1) * page_size;
        self
    }
}

/// Number of pages needed to show `total` rows, never less than one.
pub fn page_count(total: i64, page_size: usize) -> i64 {
    if page_size == 0 || total <= 0 {
        return 1;
    }
    let size = page_size as i64;
    ((total + size - 1) / size).max(1)
}
