use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use clipclock_core::ClipclockConfig;
use clipclock_db::{Database, DatabaseConfig};
use clipclock_server::routes;
use clipclock_server::state::AppState;

pub const MISSING_TOOL: &str = "/nonexistent/clipclock-test/yt-dlp";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub dir: TempDir,
}

impl TestApp {
    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        split(response).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = self
            .send(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        split(response).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .send(Request::post(uri).body(Body::empty()).unwrap())
            .await;
        split(response).await
    }
}

async fn split(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// App backed by a fresh SQLite file whose extraction tool does not exist.
pub async fn setup_test_app() -> TestApp {
    setup_with_tool(|_| PathBuf::from(MISSING_TOOL), 3).await
}

/// App whose extraction tool is a shell script printing `stdout`.
#[cfg(unix)]
pub async fn setup_test_app_with_tool(stdout: &str, max_concurrent: u32) -> TestApp {
    setup_test_app_with_slow_tool(stdout, 0, max_concurrent).await
}

/// Like [`setup_test_app_with_tool`], but the script sleeps `delay_secs` before printing.
#[cfg(unix)]
pub async fn setup_test_app_with_slow_tool(
    stdout: &str,
    delay_secs: u32,
    max_concurrent: u32,
) -> TestApp {
    let stdout = stdout.to_string();
    setup_with_tool(
        move |dir| write_fake_tool(dir, &stdout, delay_secs),
        max_concurrent,
    )
    .await
}

async fn setup_with_tool<F>(tool: F, max_concurrent: u32) -> TestApp
where
    F: FnOnce(&Path) -> PathBuf,
{
    let dir = TempDir::new().expect("Failed to create temp dir");
    let tool_path = tool(dir.path());

    let db_config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("api.sqlite").display()),
        max_connections: 5,
    };
    let db = Database::connect(&db_config)
        .await
        .expect("Failed to open SQLite database");
    db.migrate().await.expect("Failed to run migrations");

    let config = ClipclockConfig::default()
        .with_ytdlp_bin(tool_path)
        .with_max_concurrent(max_concurrent);
    let state = Arc::new(AppState::new(db, config).expect("Failed to build app state"));

    TestApp {
        router: routes::router(state.clone()),
        state,
        dir,
    }
}

#[cfg(unix)]
fn write_fake_tool(dir: &Path, stdout: &str, delay_secs: u32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-yt-dlp");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 2025.01.01; exit 0; fi\nsleep {delay_secs}\nprintf '%s\\n' '{}'\n",
        stdout.replace('\'', "")
    );
    std::fs::write(&path, script).expect("Failed to write fake tool");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod fake tool");
    path
}
