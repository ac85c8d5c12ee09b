use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use clipclock_core::job_store::JobStore;

use crate::integration::common::setup_test_app;
#[cfg(unix)]
use crate::integration::common::{setup_test_app_with_slow_tool, setup_test_app_with_tool};

#[tokio::test]
async fn health_reports_missing_tool_as_degraded() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["database"], "ok");
    assert_eq!(json["extractor"], "unavailable");
}

#[tokio::test]
async fn submit_returns_202_with_job_id() {
    let app = setup_test_app().await;

    let (status, json) = app
        .post_json("/v1/jobs", json!({"url": "https://www.youtube.com/watch?v=abc"}))
        .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "queued");
    let id = json["job_id"].as_i64().expect("job_id is an integer");

    let (status, job) = app.get(&format!("/v1/jobs/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["url"], "https://www.youtube.com/watch?v=abc");
    assert_eq!(job["domain"], "youtube.com");
    assert_eq!(job["status"], "queued");
    assert!(job["completed_at"].is_null());
}

#[tokio::test]
async fn submit_rejects_invalid_urls() {
    let app = setup_test_app().await;

    for url in ["", "   ", "not a url", "ftp://example.com/video", "javascript:alert(1)"] {
        let (status, json) = app.post_json("/v1/jobs", json!({ "url": url })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{url:?}");
        assert_eq!(json["error"], "validation_error");
    }

    let (_, counts) = app.get("/v1/counts").await;
    assert_eq!(counts["total"], 0);
}

#[tokio::test]
async fn submit_without_url_field_is_client_error() {
    let app = setup_test_app().await;

    let response = app
        .send(
            Request::post("/v1/jobs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"link": "https://example.com"}"#))
                .unwrap(),
        )
        .await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn get_missing_job_returns_404() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/v1/jobs/4242").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn counts_track_submissions() {
    let app = setup_test_app().await;
    for i in 0..3 {
        app.post_json("/v1/jobs", json!({ "url": format!("https://example.com/{i}") }))
            .await;
    }

    let (status, json) = app.get("/v1/counts").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["queued"], 3);
    assert_eq!(json["processing"], 0);
    assert_eq!(json["completed"], 0);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["total"], 3);
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let app = setup_test_app().await;
    let mut ids = Vec::new();
    for i in 0..5 {
        let (_, json) = app
            .post_json("/v1/jobs", json!({ "url": format!("https://example.com/{i}") }))
            .await;
        ids.push(json["job_id"].as_i64().unwrap());
    }

    let (status, json) = app.get("/v1/jobs?limit=2&page=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 5);
    assert_eq!(json["pages"], 3);
    assert_eq!(json["page"], 2);
    assert_eq!(json["offset"], 2);
    let listed: Vec<i64> = json["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[2], ids[1]]);

    let (_, json) = app.get("/v1/jobs?limit=2&offset=4").await;
    assert_eq!(json["jobs"].as_array().unwrap().len(), 1);
    assert_eq!(json["page"], 3);
}

#[tokio::test]
async fn list_filters_by_status_and_domain() {
    let app = setup_test_app().await;
    app.post_json("/v1/jobs", json!({"url": "https://vimeo.com/1"}))
        .await;
    app.post_json("/v1/jobs", json!({"url": "https://www.example.com/a"}))
        .await;
    app.post_json("/v1/jobs", json!({"url": "https://example.com/b"}))
        .await;

    let (_, json) = app.get("/v1/jobs?domain=example.com").await;
    assert_eq!(json["total"], 2);

    let (_, json) = app.get("/v1/jobs?status=queued").await;
    assert_eq!(json["total"], 3);

    let (_, json) = app.get("/v1/jobs?status=completed").await;
    assert_eq!(json["total"], 0);
    assert_eq!(json["pages"], 1);
    assert!(json["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_rejects_unknown_status() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/v1/jobs?status=pending").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn advance_on_empty_queue_is_idle() {
    let app = setup_test_app().await;

    let (status, json) = app.post_empty("/v1/advance").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["action"], "idle");
    assert!(json.get("job_id").is_none());

    let (_, counts) = app.get("/v1/counts").await;
    assert_eq!(counts["total"], 0);
}

#[tokio::test]
async fn advance_at_capacity_is_waiting() {
    let app = setup_test_app().await;
    let repo = app.state.db.job_repo();
    for i in 0..4 {
        repo.enqueue(&format!("https://example.com/{i}")).await.unwrap();
    }
    for _ in 0..3 {
        repo.claim_next(3).await.unwrap().expect("claimable");
    }

    let (status, json) = app.post_empty("/v1/advance").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["action"], "waiting");

    let (_, counts) = app.get("/v1/counts").await;
    assert_eq!(counts["processing"], 3);
    assert_eq!(counts["queued"], 1);
}

#[tokio::test]
async fn advance_records_launch_failure_on_job() {
    let app = setup_test_app().await;
    let (_, submitted) = app
        .post_json("/v1/jobs", json!({"url": "https://example.com/video"}))
        .await;
    let id = submitted["job_id"].as_i64().unwrap();

    let (status, json) = app.post_empty("/v1/advance").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["action"], "failed");
    assert_eq!(json["job_id"], id);
    assert!(json["error"].as_str().unwrap().contains("Failed to launch"));

    let (_, job) = app.get(&format!("/v1/jobs/{id}")).await;
    assert_eq!(job["status"], "failed");
    assert!(job["duration_seconds"].is_null());
    assert!(!job["completed_at"].is_null());
}

#[cfg(unix)]
#[tokio::test]
async fn advance_completes_job_end_to_end() {
    let app = setup_test_app_with_tool("125.2\nA short film\nexample.com", 3).await;
    let (_, submitted) = app
        .post_json("/v1/jobs", json!({"url": "https://example.com/film"}))
        .await;
    let id = submitted["job_id"].as_i64().unwrap();

    let (status, json) = app.post_empty("/v1/advance").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["action"], "completed");
    assert_eq!(json["job_id"], id);
    assert_eq!(json["result"]["duration_seconds"], 125);
    assert_eq!(json["result"]["duration_display"], "2m 5s");
    assert_eq!(json["result"]["extractor_used"], "Generic (yt-dlp)");

    let (_, job) = app.get(&format!("/v1/jobs/{id}")).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["video_title"], "A short film");
    assert_eq!(job["site_title"], "example.com");
    assert_eq!(job["duration_display"], "2m 5s");

    let (_, counts) = app.get("/v1/counts").await;
    assert_eq!(counts["completed"], 1);

    let (_, health) = app.get("/health").await;
    assert_eq!(health["status"], "healthy");
}

#[cfg(unix)]
#[tokio::test]
async fn abandoned_advance_request_still_finishes_job() {
    let app = setup_test_app_with_slow_tool("61\nLate upload\nexample.com", 1, 1).await;
    let (_, submitted) = app
        .post_json("/v1/jobs", json!({"url": "https://example.com/late"}))
        .await;
    let id = submitted["job_id"].as_i64().unwrap();

    let request = Request::post("/v1/advance").body(Body::empty()).unwrap();
    let abandoned = tokio::time::timeout(Duration::from_millis(200), app.send(request)).await;
    assert!(abandoned.is_err(), "the tool should still be running");

    let mut job = serde_json::Value::Null;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        (_, job) = app.get(&format!("/v1/jobs/{id}")).await;
        if job["status"] != "processing" {
            break;
        }
    }
    assert_eq!(job["status"], "completed");
    assert_eq!(job["duration_display"], "1m 1s");
    assert!(!job["completed_at"].is_null());

    let (_, counts) = app.get("/v1/counts").await;
    assert_eq!(counts["processing"], 0);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["title"], "clipclock API");
    assert!(json["paths"]["/v1/advance"].is_object());
}
