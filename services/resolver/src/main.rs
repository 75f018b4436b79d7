use anyhow::{Context, Result};
use cctv_resolver::api::{start_api_server, AppState};
use cctv_resolver::logging::{init_tracing, LogLevel};
use cctv_resolver::{CctvResolver, Config, UticClient, ViewerUrlBuilder};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    let log_level: LogLevel = config
        .service
        .log_level
        .parse()
        .context("Invalid service.log_level")?;
    let log_control = Arc::new(init_tracing(log_level, &config.service.log_format));

    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        log_level = %log_level,
        "Starting CCTV resolver"
    );

    // Initialize metrics
    if config.service.metrics_enabled {
        init_metrics(config.service.metrics_port)?;
    }

    let fetcher = UticClient::new(&config.upstream).context("Failed to build upstream client")?;
    let urls = ViewerUrlBuilder::new(
        config.upstream.viewer_host.clone(),
        config.upstream.api_key.clone(),
    );
    let resolver = Arc::new(CctvResolver::new(Arc::new(fetcher), urls));

    let state = AppState::new(resolver, log_control, &config.api, config.service.name.clone());

    start_api_server(state, &config.api, shutdown_signal()).await?;

    info!("CCTV resolver stopped");

    Ok(())
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
