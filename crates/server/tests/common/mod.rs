//! Common test utilities: an in-process router over a real temp store and a
//! fake extraction tool, so the full HTTP surface is testable without
//! yt-dlp or network access.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use clipfetch_core::{
    extractor::Supervisor, testing::MockInspector, Config, JobRunner, Reaper, TempStore,
    VariantInspector,
};
use clipfetch_server::state::AppState;

// Test binaries only link what they use
#[allow(dead_code)]
pub struct TestFixture {
    pub router: Router,
    pub store: TempStore,
    pub inspector: Arc<MockInspector>,
    pub temp_dir: TempDir,
    _script_dir: TempDir,
}

#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    /// Parses an SSE body into its JSON data frames.
    pub fn sse_frames(&self) -> Vec<Value> {
        String::from_utf8_lossy(&self.body)
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .filter_map(|data| serde_json::from_str(data).ok())
            .collect()
    }
}

/// Fake extractor script: recovers the job-id output prefix from the
/// `--output` argument, like the preamble the core tests use.
#[allow(dead_code)]
pub const PREFIX_FROM_ARGS: &str = r#"
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--output" ]; then out="$a"; fi
  prev="$a"
done
prefix=$(printf '%s' "$out" | sed 's/_%(title)s\.%(ext)s$//')
"#;

fn write_script(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[allow(dead_code)]
impl TestFixture {
    /// Fixture with a fake extractor that exits immediately.
    pub async fn new() -> Self {
        Self::with_script("exit 0\n").await
    }

    /// Fixture whose fake extractor runs the given shell body.
    pub async fn with_script(script_body: &str) -> Self {
        Self::with_script_and_config(script_body, |_| {}).await
    }

    /// Fixture with a custom script and config tweaks.
    pub async fn with_script_and_config(
        script_body: &str,
        configure: impl FnOnce(&mut Config),
    ) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let script_dir = TempDir::new().unwrap();
        let script = write_script(script_dir.path(), script_body);

        let mut config = Config::default();
        config.extractor.temp_dir = temp_dir.path().to_path_buf();
        config.extractor.yt_dlp_path = script.clone();
        config.retention.grace_delete_secs = 0;
        configure(&mut config);

        let store = TempStore::new(config.extractor.temp_dir.clone());
        store.ensure_root().await.unwrap();

        let runner = JobRunner::new(Supervisor::new(script), store.clone())
            .with_heartbeat(Duration::from_millis(20));
        let reaper = Reaper::new(store.clone());
        let inspector = Arc::new(MockInspector::new());

        let state = Arc::new(AppState::with_parts(
            config,
            store.clone(),
            runner,
            reaper,
            Arc::clone(&inspector) as Arc<dyn VariantInspector>,
        ));
        let router = clipfetch_server::api::create_router(state);

        Self {
            router,
            store,
            inspector,
            temp_dir,
            _script_dir: script_dir,
        }
    }

    /// Drops a file into the store.
    pub async fn put_file(&self, name: &str, contents: &[u8]) {
        tokio::fs::write(self.temp_dir.path().join(name), contents)
            .await
            .unwrap();
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response: Response<_> = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}
