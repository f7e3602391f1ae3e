//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Environment;
use crate::schema::ValidatedCollectionSpec;
use crate::state::AppState;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid http.host or http.port: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Failed to bind server: {0}")]
    Bind(std::io::Error),

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Bind the listener, open the datastores in the background, and serve `app`.
///
/// Store connections start only after the listener is bound, so the service
/// answers HTTP while they are being opened. This function blocks until the
/// server shuts down.
pub async fn start_server(
    app: Router,
    state: &AppState,
    users: ValidatedCollectionSpec,
) -> Result<(), ServerError> {
    let config = &state.config;
    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port).parse()?;

    let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
    tracing::info!(%addr, environment = %config.environment, "Server is running on port {}", addr.port());

    if config.environment == Environment::Testing {
        tracing::info!("Testing environment, datastore connections skipped");
    } else {
        let state = state.clone();
        tokio::spawn(async move {
            let summary = state.stores.connect_all(&state.config, &users).await;
            tracing::debug!(?summary, "Datastore startup finished");
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
