use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "clipclock API",
        version = "0.1.0",
        description = "Queue video URLs and measure their duration."
    ),
    paths(
        crate::routes::create_job,
        crate::routes::list_jobs,
        crate::routes::get_job,
        crate::routes::counts,
        crate::routes::advance,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::CreateJobRequest,
        crate::dto::CreateJobResponse,
        crate::dto::JobResponse,
        crate::dto::JobListResponse,
        crate::dto::CountsResponse,
        crate::dto::ExtractionResponse,
        crate::dto::AdvanceResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "jobs", description = "Job submission and lookup"),
        (name = "dispatcher", description = "Queue advancement"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
