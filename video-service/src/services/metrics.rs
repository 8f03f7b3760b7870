//! Prometheus metrics for video-service.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, so handlers
//! can be exercised in tests without a registry.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Generation metrics
pub static GENERATION_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static QUEUE_UPDATES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are ignored.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    let generation_requests = IntCounterVec::new(
        Opts::new(
            "video_generation_requests_total",
            "Video generation requests by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create video_generation_requests_total metric");

    // Video jobs take minutes, so buckets stretch well past typical HTTP latencies.
    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "video_provider_latency_seconds",
            "Time from submit to resolution of a provider call",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["outcome"],
    )
    .expect("Failed to create video_provider_latency_seconds metric");

    let queue_updates = IntCounterVec::new(
        Opts::new(
            "video_queue_updates_total",
            "Queue status updates received from the provider",
        ),
        &["status"],
    )
    .expect("Failed to create video_queue_updates_total metric");

    for collector in [
        Box::new(requests_total.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(request_duration.clone()),
        Box::new(generation_requests.clone()),
        Box::new(provider_latency.clone()),
        Box::new(queue_updates.clone()),
    ] {
        registry
            .register(collector)
            .expect("collector can be registered");
    }

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = GENERATION_REQUESTS_TOTAL.set(generation_requests);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = QUEUE_UPDATES_TOTAL.set(queue_updates);
}

/// Render the registry in Prometheus text format.
pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_generation(outcome: &str, elapsed: Duration) {
    if let Some(counter) = GENERATION_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn record_queue_update(status: &str) {
    if let Some(counter) = QUEUE_UPDATES_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Count and time every HTTP request.
///
/// Routes are labelled by their matched pattern; static files share one label.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "static".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method.as_str(), path.as_str(), status.as_str()]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method.as_str(), path.as_str()])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}
