//! Shared helpers for video-service integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use video_service::config::VideoConfig;
use video_service::services::VideoProvider;
use video_service::startup::{build_router, AppState, Application};

pub const INDEX_HTML: &str = "<!doctype html><title>Veo 3 Video Generator</title>";

/// A static directory holding `index.html` and `app.css`.
pub fn static_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create static dir");
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).expect("Failed to write index");
    std::fs::write(dir.path().join("app.css"), "body { margin: 0; }").expect("Failed to write css");
    dir
}

pub fn test_config(static_dir: &TempDir) -> VideoConfig {
    let mut config = VideoConfig::default();
    config.common.port = 0; // Random port for testing
    config.static_dir = static_dir.path().to_path_buf();
    config
}

/// Router wired exactly as in production, for `oneshot` tests.
pub fn router(provider: Option<Arc<dyn VideoProvider>>) -> (axum::Router, TempDir) {
    let dir = static_dir();
    let state = AppState::new(test_config(&dir), provider);
    (build_router(state), dir)
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    _static_dir: TempDir,
}

impl TestApp {
    pub async fn spawn(provider: Option<Arc<dyn VideoProvider>>) -> Self {
        let dir = static_dir();
        let app = Application::build(test_config(&dir), provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            _static_dir: dir,
        }
    }

    pub async fn generate(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/generate-video", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
