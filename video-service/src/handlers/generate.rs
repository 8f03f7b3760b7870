use crate::models::GenerationRequest;
use crate::services::{metrics, relay_queue_updates};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde_json::Value;
use service_core::error::AppError;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Forward a generation request to the provider and relay its result.
///
/// The provider call runs in its own task, so a caller that disconnects
/// does not cancel a job that is already queued upstream.
pub async fn generate_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let provider = state.provider()?.clone();
    let request = GenerationRequest::from_body(is_json(&headers), &body)
        .map_err(|e| AppError::InternalError(e.into()))?;

    tracing::info!(
        model = provider.model(),
        "Starting video generation with prompt: {}",
        request.prompt_preview()
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let relay = tokio::spawn(relay_queue_updates(rx).in_current_span());

    let input = request.into_input();
    let started = Instant::now();
    let call = tokio::spawn(
        async move { provider.subscribe(input, tx).await }.in_current_span(),
    );

    let outcome = call
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("generation task failed: {e}")))?;
    // The relay ends once the provider has dropped its sender.
    let _ = relay.await;

    match outcome {
        Ok(result) => {
            metrics::record_generation("success", started.elapsed());
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Video generation completed"
            );
            Ok(Json(result))
        }
        Err(e) => {
            metrics::record_generation("error", started.elapsed());
            tracing::error!(error = %e, "Video generation error");
            Err(e.into())
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
