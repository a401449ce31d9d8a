//! Process entrypoint: wires configuration, downstream clients, the saga
//! orchestrator, the retry queue worker, and the HTTP server together,
//! then serves until `ctrl_c` with a graceful shutdown of both the HTTP
//! listener and the retry worker.

use library_gateway::clients::{LibraryClient, RatingClient, ReservationClient};
use library_gateway::config::Config;
use library_gateway::http::auth::TokenStore;
use library_gateway::http::{router, AppState};
use library_gateway::retry_queue::RetryQueue;
use library_gateway::saga::SagaOrchestrator;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    let library = LibraryClient::new(&config.downstream, &config.circuit_breaker);
    let reservation = ReservationClient::new(&config.downstream, &config.circuit_breaker);
    let rating = RatingClient::new(&config.downstream, &config.circuit_breaker);
    let saga = SagaOrchestrator::new(library.clone(), reservation.clone(), rating.clone());
    let tokens = TokenStore::new(config.auth.clone());

    let (retry_handle, retry_queue) = RetryQueue::new();
    let shutdown = CancellationToken::new();
    let worker = retry_queue.spawn_worker(saga.clone(), retry_handle.clone(), shutdown.clone());

    let state = AppState {
        library,
        reservation,
        rating,
        saga,
        retry_queue: retry_handle,
        tokens,
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port))
        .await
        .expect("failed to bind server socket");

    tracing::info!(port = config.server.port, "library gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("server error");

    // Retry in-flight entries are dropped, not drained, on shutdown —
    // cancel the worker and just wait for it to exit.
    shutdown.cancel();
    let _ = worker.await;
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl_c handler");
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
