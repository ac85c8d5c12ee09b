use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use clipclock_core::error::AppError;
use clipclock_core::job::{JobStatus, ListQuery, page_count};
use clipclock_core::job_store::JobStore;
use clipclock_core::{TracingDispatchReporter, validate_submission};

use crate::dto::{
    AdvanceResponse, CountsResponse, CreateJobRequest, CreateJobResponse, HealthResponse,
    JobListResponse, JobResponse, ListJobsQuery,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

const MAX_PAGE_SIZE: usize = 500;
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/jobs", post(create_job).get(list_jobs))
        .route("/v1/jobs/{id}", get(get_job))
        .route("/v1/counts", get(counts))
        .route("/v1/advance", post(advance))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 202, description = "Job queued", body = CreateJobResponse),
        (status = 400, description = "Invalid URL", body = crate::dto::ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let url = validate_submission(&body.url)?;
    let job_id = state.db.job_repo().enqueue(&url).await?;
    tracing::info!(job_id, %url, "Job queued");

    let response = CreateJobResponse {
        job_id,
        status: JobStatus::Queued.to_string(),
    };

    Ok((StatusCode::ACCEPTED, axum::Json(response)))
}

#[utoipa::path(
    get,
    path = "/v1/jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Jobs, newest first", body = JobListResponse),
        (status = 400, description = "Unknown status filter", body = crate::dto::ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<JobStatus>().map_err(AppError::ValidationError))
        .transpose()?;

    let limit = query
        .limit
        .unwrap_or(state.config.page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let mut list_query = ListQuery::new(limit);
    if let Some(status) = status {
        list_query = list_query.with_status(status);
    }
    if let Some(domain) = query.domain.filter(|d| !d.is_empty()) {
        list_query = list_query.with_domain(domain);
    }
    list_query = match (query.page, query.offset) {
        (Some(page), _) => list_query.with_page(page, limit),
        (None, Some(offset)) => list_query.with_offset(offset),
        (None, None) => list_query,
    };

    let repo = state.db.job_repo();
    let jobs = repo.list(&list_query).await?;
    let total = repo.count_matching(&list_query).await?;

    let response = JobListResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        page: list_query.offset / limit + 1,
        pages: page_count(total, limit),
        limit,
        offset: list_query.offset,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = JobResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state
        .db
        .job_repo()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(axum::Json(JobResponse::from(job)))
}

#[utoipa::path(
    get,
    path = "/v1/counts",
    responses(
        (status = 200, description = "Jobs per status", body = CountsResponse),
    ),
    tag = "jobs"
)]
pub async fn counts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let counts = state.db.job_repo().counts().await?;
    Ok(axum::Json(CountsResponse::from(counts)))
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/advance",
    responses(
        (status = 200, description = "Outcome of one dispatch step", body = AdvanceResponse),
        (status = 500, description = "Storage failure", body = crate::dto::ErrorResponse),
    ),
    tag = "dispatcher"
)]
pub async fn advance(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    // Detached so a disconnecting client cannot strand the claimed job in `processing`.
    let outcome = state
        .dispatcher
        .advance_detached(TracingDispatchReporter)
        .await?;
    Ok(axum::Json(AdvanceResponse::from(outcome)))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = state.db.health_check().await.is_ok();
    let tool_ok = state.runner.probe(&state.config.extractor.ytdlp_bin).await;

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: match (db_ok, tool_ok) {
            (true, true) => "healthy",
            (true, false) => "degraded",
            (false, _) => "unhealthy",
        },
        database: if db_ok { "ok" } else { "error" },
        extractor: if tool_ok { "ok" } else { "unavailable" },
    };

    (status, axum::Json(response))
}
