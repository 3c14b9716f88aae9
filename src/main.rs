//! subtrack-service - always-on SubTrack
//!
//! Serves the web API and runs the twice-daily check pass until stopped.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use subtrack::api::{self, AppState};
use subtrack::jobs::{CheckScheduler, SchedulerConfig};
use subtrack::{db, telemetry, Config, SqliteSubscriptionStore, SubscriptionService, TelegramNotifier};
use tokio::sync::watch;

/// Upper bound for in-flight requests to finish after a stop signal
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    telemetry::init_tracing("subtrack=info,tower_http=info");

    // Load configuration
    let config = Config::from_env()?;
    let credentials = config.require_web_credentials()?;
    let addr: SocketAddr = config.bind_address().parse()?;

    tracing::info!("Starting SubTrack service");

    let pool = db::connect(&config.db_path).await?;
    if !db::check_schema(&pool).await? {
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    let store = Arc::new(SqliteSubscriptionStore::new(pool.clone()));
    let notifier = Arc::new(TelegramNotifier::new(
        config.telegram_api_url.clone(),
        config.telegram_bot_token.clone(),
        config.telegram_chat_id,
    )?);
    let service = Arc::new(SubscriptionService::new(store, notifier));

    let scheduler = CheckScheduler::with_config(
        service.clone(),
        SchedulerConfig {
            schedule: config.check_schedule.clone(),
        },
    )?
    .start();
    tracing::info!(schedule = %config.check_schedule, "Check scheduler running");

    let app = api::build_router(AppState::new(service, credentials));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server exited on its own; nothing left to drain
            scheduler.stop().await;
            pool.close().await;
            return Ok(result??);
        }
        _ = shutdown_signal() => {}
    }

    let _ = stop_tx.send(true);
    match tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("In-flight requests did not finish in time, aborting");
            server.abort();
        }
    }

    // Cleanup
    scheduler.stop().await;
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
