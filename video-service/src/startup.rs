//! Application startup and lifecycle management.

use crate::config::{load_fal_key, FalConfig, VideoConfig};
use crate::handlers::{generate_video, health_check, metrics, status};
use crate::services::metrics::http_metrics_middleware;
use crate::services::providers::fal::FalVideoProvider;
use crate::services::VideoProvider;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    panic::panic_response, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

const NOT_INITIALIZED: &str = "FAL client not initialized";

/// Shared application state.
///
/// Built once at startup and read-only afterwards. `provider` is `None`
/// when the service runs without a configured client.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<VideoConfig>,
    provider: Option<Arc<dyn VideoProvider>>,
}

impl AppState {
    pub fn new(config: VideoConfig, provider: Option<Arc<dyn VideoProvider>>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.provider.is_some()
    }

    /// The configured provider, or the error generation requests report
    /// when there is none.
    pub fn provider(&self) -> Result<&Arc<dyn VideoProvider>, AppError> {
        self.provider
            .as_ref()
            .ok_or_else(|| AppError::NotInitialized(NOT_INITIALIZED.to_string()))
    }
}

/// Load the credential and build the fal.ai client.
///
/// Runs once, before the listener is bound. An error here must stop the
/// process.
pub fn configure_fal_client(config: &FalConfig) -> anyhow::Result<Arc<dyn VideoProvider>> {
    let api_key = load_fal_key(&config.credentials_path)?;

    let provider = FalVideoProvider::builder()
        .api_key(api_key)
        .model(config.model.clone())
        .queue_url(config.queue_url.clone())
        .poll_interval(config.poll_interval())
        .build()?;

    Ok(Arc::new(provider))
}

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/api/generate-video", post(generate_video))
        .route("/api/status", get(status))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(from_fn(http_metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Bind the listener (port 0 picks a free port) and assemble the router.
    pub async fn build(
        config: VideoConfig,
        provider: Option<Arc<dyn VideoProvider>>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            static_dir = %config.static_dir.display(),
            fal_client_ready = provider.is_some(),
            "Video service listening"
        );

        let router = build_router(AppState::new(config, provider));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
