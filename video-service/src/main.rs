use dotenvy::dotenv;
use service_core::observability::init_tracing;
use tracing::info;
use video_service::config::VideoConfig;
use video_service::services::metrics::init_metrics;
use video_service::startup::{configure_fal_client, Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = VideoConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("video-service", "info", config.otlp_endpoint.as_deref());
    init_metrics();

    // No client means no service: a missing credential ends startup here.
    let provider = configure_fal_client(&config.fal).map_err(|e| {
        tracing::error!(error = %e, "Error loading FAL API key");
        e
    })?;
    info!(
        model = provider.model(),
        credentials = %config.fal.credentials_path.display(),
        "FAL API key loaded successfully"
    );

    let app = Application::build(config, Some(provider)).await?;
    info!(
        "Veo 3 Video Generator running on http://localhost:{}",
        app.port()
    );

    app.run_until_stopped().await?;

    Ok(())
}
