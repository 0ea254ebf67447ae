//! seatwatch entry point.
//!
//! Starts the poller in the background and serves the history over HTTP
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use seatwatch::api;
use seatwatch::app_state::AppState;
use seatwatch::config::WatcherConfig;
use seatwatch::domain::{DetectionWindow, HistoryStore};
use seatwatch::poller::{HttpItemSource, Poller, PollerSettings, notifier};
use seatwatch::service::HistoryService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = WatcherConfig::from_env()?;

    // Initialize tracing
    init_tracing(config.json_logs);
    tracing::info!(addr = %config.listen_addr, "starting seatwatch");

    if let Err(e) = DetectionWindow::parse(&config.window_start, &config.window_end) {
        tracing::warn!(error = %e, "detection window is invalid; poll cycles will fail");
    }

    // Build domain and poller
    let store = Arc::new(HistoryStore::new());
    let source = HttpItemSource::new(&config.request)?;
    tracing::info!(url = %source.url(), interval = ?config.poll_interval, "watching endpoint");
    let notifier = notifier::from_config(&config.notify)?;
    let poller = Poller::new(
        source,
        Arc::clone(&store),
        notifier,
        PollerSettings::from(&config),
    );

    // Build service layer and application state
    let history_service = Arc::new(HistoryService::new(store, poller.stats()));
    let app = api::build_app(AppState { history_service });

    let cancel = CancellationToken::new();
    let poller_task = tokio::spawn(poller.run(cancel.child_token()));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let server_cancel = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_cancel.cancelled_owned())
            .await
    });

    let finished = tokio::select! {
        signal = shutdown_signal() => {
            tracing::info!(signal, "received signal, shutting down");
            None
        }
        result = &mut server => {
            tracing::error!("server exited unexpectedly");
            Some(result)
        }
    };
    cancel.cancel();

    let server_result = match finished {
        Some(result) => Ok(result),
        None => tokio::time::timeout(config.shutdown_timeout, &mut server).await,
    };
    match server_result {
        Ok(Ok(Ok(()))) => tracing::info!("server stopped"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "server task failed"),
        Err(_) => {
            tracing::warn!(timeout = ?config.shutdown_timeout, "graceful shutdown timed out");
            server.abort();
        }
    }

    match tokio::time::timeout(config.shutdown_timeout, poller_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "poller task failed"),
        Err(_) => tracing::warn!("poller did not stop in time"),
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
