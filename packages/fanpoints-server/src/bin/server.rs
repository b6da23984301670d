//! Fanpoints reward service binary.

use fanpoints_server::{create_router, AppState, Config};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fanpoints reward service");

    // Missing file falls back to defaults inside `load`; bad values fail hard.
    let config = Config::load().unwrap_or_else(|e| {
        error!(error = %e, "FATAL: Config error, fix FANPOINTS_* env vars or fanpoints.toml");
        std::process::exit(1);
    });

    if config.api_key.is_some() {
        info!("API key auth enabled");
    } else {
        warn!("FANPOINTS_API_KEY not set, /api is unprotected (dev mode)");
    }

    info!(
        bind = %config.bind_address,
        snapshot = ?config.snapshot_path,
        max_settle_attempts = config.max_settle_attempts,
        "Configuration loaded"
    );

    let bind_address = config.bind_address.clone();
    let interval_secs = config.snapshot_interval_secs;
    let state = Arc::new(AppState::new(config)?);

    let cancel = CancellationToken::new();
    let snapshot_task = if state.snapshots.is_some() && interval_secs > 0 {
        let state_bg = Arc::clone(&state);
        let cancel_bg = cancel.clone();
        Some(tokio::spawn(async move {
            run_snapshots(state_bg, Duration::from_secs(interval_secs), cancel_bg).await;
        }))
    } else {
        None
    };

    let app = create_router(state.clone());

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Graceful shutdown: stop periodic saves, persist once more ---
    info!("HTTP server stopped, persisting state...");
    cancel.cancel();
    if let Some(task) = snapshot_task {
        let _ = task.await;
    }

    let state_final = Arc::clone(&state);
    match tokio::task::spawn_blocking(move || state_final.save_snapshot()).await {
        Ok(Ok(true)) => info!("Final snapshot written"),
        Ok(Ok(false)) => info!("Persistence disabled, nothing to save"),
        Ok(Err(e)) => error!(error = %e, "Failed to write final snapshot"),
        Err(e) => error!(error = %e, "Snapshot task panicked"),
    }

    info!("Fanpoints reward service shut down gracefully");
    Ok(())
}

async fn run_snapshots(state: Arc<AppState>, every: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let state = Arc::clone(&state);
                match tokio::task::spawn_blocking(move || state.save_snapshot()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!(error = %e, "Periodic snapshot failed"),
                    Err(e) => error!(error = %e, "Snapshot task panicked"),
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
