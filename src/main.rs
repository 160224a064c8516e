// Main entry point - Dependency injection and server setup
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use traffic_monitor::application::ingest_service::IngestService;
use traffic_monitor::application::widget_service::WidgetService;
use traffic_monitor::domain::frame::StreamStatus;
use traffic_monitor::domain::window::WindowChain;
use traffic_monitor::infrastructure::config::load_monitor_config;
use traffic_monitor::infrastructure::memory_repository::InMemoryTrafficLog;
use traffic_monitor::presentation::app_state::AppState;
use traffic_monitor::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_monitor_config()?;

    // Reject bad window settings at startup rather than on the first widget
    WindowChain::new(config.widget.bucket_count, config.widget.spans())?;

    // Create repository (infrastructure layer)
    let retention = config.ingest.retention_policy(&config.widget);
    let repository = Arc::new(InMemoryTrafficLog::new(retention));
    tracing::info!("Sample retention: {:?}", retention);

    // Create services (application layer)
    let (status_tx, status_rx) = watch::channel(StreamStatus::Open);
    let ingest_service = IngestService::new(repository.clone(), Arc::new(status_tx));
    let widget_service = WidgetService::new(repository, config.widget.clone(), status_rx);

    // Create application state
    let state = Arc::new(AppState {
        ingest_service,
        widget_service,
        timestamp_resolution_ms: config.ingest.timestamp_resolution_ms,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = config.server.listen_addr;
    tracing::info!("Starting traffic-monitor service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
