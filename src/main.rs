//! Ops Telemetry - Binary Entry Point
//!
//! Loads configuration, starts the metrics tasks and serves the REST API
//! until Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use ops_telemetry::api::{create_router, AppState};
use ops_telemetry::config::DEFAULT_LOG_FILTER;
use ops_telemetry::{AppConfig, AuditLog, LogType, SystemMonitor, NAME, VERSION};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load()?;
    let addr = config.bind_addr();

    let audit = Arc::new(AuditLog::new(config.audit_config()?));
    let monitor = Arc::new(SystemMonitor::new(config.monitor_config()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tasks = monitor.start(shutdown_rx);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            let details = format!("bind {}: {}", addr, e);
            audit.fatal(LogType::System, "", "", "server start failed", &details)
        }
    };

    let started = format!("{} {} listening on {}", NAME, VERSION, addr);
    tracing::info!("{}", started);
    audit.log_system_operation("", "", "server start", &started)?;

    let app = create_router(Arc::new(AppState::new(Arc::clone(&audit), monitor)));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the background tasks before the final entry
    let _ = shutdown_tx.send(true);
    tasks.join().await;
    audit.log_system_operation("", "", "server stop", "graceful shutdown")?;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
