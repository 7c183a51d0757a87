use std::sync::Arc;
use suite_core::observability::init_tracing;
use timebill_service::config::TimebillConfig;
use timebill_service::services::{init_metrics, PgStore};
use timebill_service::startup::Application;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Config comes first so the subscriber can honor the configured level.
    let config = TimebillConfig::load()
        .map_err(|e| std::io::Error::other(format!("Configuration error: {}", e)))?;

    init_tracing("timebill-service", &config.common.log_level);
    init_metrics();

    let store = PgStore::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::other(format!("Database connection error: {}", e))
    })?;

    store.run_migrations().await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        std::io::Error::other(format!("Database migration error: {}", e))
    })?;

    let app = Application::build(config, Arc::new(store))
        .await
        .map_err(|e| {
            tracing::error!("Failed to build application: {}", e);
            std::io::Error::other(format!("Startup error: {}", e))
        })?;

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}
