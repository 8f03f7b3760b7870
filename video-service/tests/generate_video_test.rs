mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, post_json, router, TestApp};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use video_service::models::{ProviderLog, QueueStatus, QueueUpdate};
use video_service::services::providers::mock::{MockOutcome, MockVideoProvider};
use video_service::services::VideoProvider;

const GENERATE: &str = "/api/generate-video";

#[tokio::test]
async fn generate_before_client_configured_returns_500() {
    let (app, _dir) = router(None);

    let response = app
        .oneshot(post_json(GENERATE, &json!({ "prompt": "A fox in the snow" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "FAL client not initialized" })
    );
}

#[tokio::test]
async fn not_initialized_wins_over_malformed_body() {
    let (app, _dir) = router(None);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri(GENERATE)
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "FAL client not initialized");
}

#[tokio::test]
async fn successful_generation_returns_provider_payload_verbatim() {
    let payload = json!({
        "data": {
            "video": {
                "url": "https://v3.fal.media/files/penguin/out.mp4",
                "content_type": "video/mp4",
                "file_size": 3145728
            }
        },
        "requestId": "764cabcf-b745-4b3e-ae38-1200304cf45b"
    });
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Resolve(payload.clone())));
    let (app, _dir) = router(Some(mock.clone() as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(post_json(GENERATE, &json!({ "prompt": "A penguin surfing" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        serde_json::to_vec(&payload).unwrap()
    );
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn request_body_is_forwarded_unchanged() {
    let body = json!({
        "prompt": "Timelapse of a city at night",
        "aspect_ratio": "16:9",
        "duration": "8s",
        "generate_audio": true,
        "custom_field": { "keep": ["me", 1] }
    });
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Echo));
    let (app, _dir) = router(Some(mock.clone() as Arc<dyn VideoProvider>));

    let response = app.oneshot(post_json(GENERATE, &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.inputs(), vec![body.clone()]);
    assert_eq!(body_json(response).await["data"], body);
}

#[tokio::test]
async fn provider_rejection_returns_error_and_details() {
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Reject {
        status: 403,
        message: "quota exceeded".into(),
        body: Some(json!({ "detail": "quota exceeded" })),
    }));
    let (app, _dir) = router(Some(mock as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(post_json(GENERATE, &json!({ "prompt": "anything" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "quota exceeded", "details": { "detail": "quota exceeded" } })
    );
}

#[tokio::test]
async fn provider_rejection_without_body_uses_fallback_details() {
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Reject {
        status: 500,
        message: "upstream exploded".into(),
        body: None,
    }));
    let (app, _dir) = router(Some(mock as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(post_json(GENERATE, &json!({ "prompt": "anything" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "upstream exploded", "details": "No additional details" })
    );
}

fn raw_post(
    content_type: Option<&str>,
    body: &'static str,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder().method("POST").uri(GENERATE);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(axum::body::Body::from(body)).unwrap()
}

#[tokio::test]
async fn array_body_is_forwarded_as_is() {
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Echo));
    let (app, _dir) = router(Some(mock.clone() as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(post_json(GENERATE, &json!(["not", "an", "object"])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!(["not", "an", "object"]));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn body_without_json_content_type_is_forwarded_as_empty_object() {
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Echo));
    let (app, _dir) = router(Some(mock.clone() as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(raw_post(None, r#"{"prompt":"ignored"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.inputs(), vec![json!({})]);
}

#[tokio::test]
async fn empty_json_body_is_forwarded_as_empty_object() {
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Echo));
    let (app, _dir) = router(Some(mock.clone() as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(raw_post(Some("application/json"), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.inputs(), vec![json!({})]);
}

#[tokio::test]
async fn malformed_json_returns_generic_500_without_calling_provider() {
    let mock = Arc::new(MockVideoProvider::new(MockOutcome::Echo));
    let (app, _dir) = router(Some(mock.clone() as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(raw_post(Some("application/json"), "{bad"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal server error" })
    );
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn queue_updates_do_not_leak_into_response() {
    let mock = MockVideoProvider::new(MockOutcome::Resolve(json!({ "data": {}, "requestId": "r" })))
        .with_updates(vec![
            QueueUpdate::new(QueueStatus::InQueue),
            QueueUpdate {
                status: QueueStatus::InProgress,
                queue_position: None,
                logs: vec![ProviderLog {
                    message: "Generating video".into(),
                    level: Some("INFO".into()),
                    source: Some("user".into()),
                    timestamp: None,
                }],
            },
        ]);
    let (app, _dir) = router(Some(Arc::new(mock) as Arc<dyn VideoProvider>));

    let response = app
        .oneshot(post_json(GENERATE, &json!({ "prompt": "clouds" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "data": {}, "requestId": "r" }));
}

#[tokio::test]
async fn concurrent_requests_reach_provider_independently() {
    let mock = Arc::new(
        MockVideoProvider::new(MockOutcome::Echo).with_delay(Duration::from_millis(200)),
    );
    let app = TestApp::spawn(Some(mock.clone() as Arc<dyn VideoProvider>)).await;

    let body = json!({ "prompt": "Same prompt twice" });
    let (first, second) = tokio::join!(app.generate(&body), app.generate(&body));

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first: serde_json::Value = first.json().await.unwrap();
    let second: serde_json::Value = second.json().await.unwrap();
    assert_ne!(first["requestId"], second["requestId"]);
    assert_eq!(first["data"], body);
    assert_eq!(second["data"], body);

    assert_eq!(mock.calls(), 2);
    assert_eq!(mock.completed(), 2);
    assert_eq!(mock.max_in_flight(), 2);
}

#[tokio::test]
async fn disconnected_client_does_not_cancel_provider_call() {
    let mock = Arc::new(
        MockVideoProvider::new(MockOutcome::Echo).with_delay(Duration::from_millis(300)),
    );
    let app = TestApp::spawn(Some(mock.clone() as Arc<dyn VideoProvider>)).await;

    let request = app
        .client
        .post(format!("{}/api/generate-video", app.address))
        .json(&json!({ "prompt": "abandoned" }))
        .timeout(Duration::from_millis(50))
        .send()
        .await;
    assert!(request.is_err());

    // The job keeps running upstream and eventually completes.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(mock.calls(), 1);
    assert_eq!(mock.completed(), 1);
}
