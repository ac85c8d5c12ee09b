use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};

use clipclock_core::error::AppError;
use clipclock_core::job::{CompletedExtraction, Job, JobCounts, JobStatus, ListQuery};
use clipclock_core::job_store::JobStore;
use clipclock_core::util::domain_of;

/// SQLite-backed job store.
///
/// Claims go through a single conditional `UPDATE ... RETURNING`, so two
/// dispatchers sharing a database never pick the same job or exceed the
/// concurrency cap.
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Sqlite>,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    url: String,
    domain: String,
    status: String,
    site_title: Option<String>,
    video_title: Option<String>,
    duration_seconds: Option<i64>,
    duration_display: Option<String>,
    error_message: Option<String>,
    extractor_used: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

fn parse_status(raw: &str) -> Result<JobStatus, AppError> {
    raw.parse()
        .map_err(|e| AppError::DatabaseError(format!("Corrupt job row: {e}")))
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            url: row.url,
            domain: row.domain,
            status: parse_status(&row.status)?,
            site_title: row.site_title,
            video_title: row.video_title,
            duration_seconds: row.duration_seconds,
            duration_display: row.duration_display,
            error_message: row.error_message,
            extractor_used: row.extractor_used,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

impl JobStore for JobRepository {
    async fn enqueue(&self, url: &str) -> Result<i64, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO jobs (url, domain, status, created_at)
            VALUES (?1, ?2, 'queued', ?3)
            RETURNING id
            "#,
        )
        .bind(url)
        .bind(domain_of(url))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(job_id = id, url, "Job enqueued");
        Ok(id)
    }

    async fn next_queued(&self) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"SELECT * FROM jobs WHERE status = 'queued' ORDER BY id ASC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(Job::try_from).transpose()
    }

    async fn claim_next(&self, max_concurrent: u32) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET status = 'processing', started_at = ?1
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'queued'
                ORDER BY id ASC
                LIMIT 1
            )
              AND status = 'queued'
              AND (SELECT COUNT(*) FROM jobs WHERE status = 'processing') < ?2
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(i64::from(max_concurrent))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(Job::try_from).transpose()
    }

    async fn mark_processing(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'processing', started_at = ?2
            WHERE id = ?1 AND status = 'queued'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(
        &self,
        id: i64,
        result: &CompletedExtraction,
    ) -> Result<bool, AppError> {
        let outcome = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed',
                site_title = ?2,
                video_title = ?3,
                duration_seconds = ?4,
                duration_display = ?5,
                extractor_used = ?6,
                error_message = NULL,
                completed_at = ?7
            WHERE id = ?1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(&result.site_title)
        .bind(&result.video_title)
        .bind(result.duration_seconds)
        .bind(&result.duration_display)
        .bind(&result.extractor_used)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn mark_failed(&self, id: i64, error_message: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', error_message = ?2, completed_at = ?3
            WHERE id = ?1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn counts(&self) -> Result<JobCounts, AppError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as(r#"SELECT status, COUNT(*) FROM jobs GROUP BY status"#)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let rows = rows
            .into_iter()
            .map(|(status, n)| Ok((parse_status(&status)?, n)))
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(JobCounts::from_rows(rows))
    }

    async fn processing_count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM jobs WHERE status = 'processing'"#)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(count)
    }

    async fn get(&self, id: i64) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>(r#"SELECT * FROM jobs WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(Job::try_from).transpose()
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Job>, AppError> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR domain = ?2)
            ORDER BY created_at DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.domain.as_deref())
        .bind(query.limit as i64)
        .bind(query.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn count_matching(&self, query: &ListQuery) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM jobs
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR domain = ?2)
            "#,
        )
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.domain.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(count)
    }
}
