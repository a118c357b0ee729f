//! HTTP server implementation using Axum.

use crate::handler::{handle_artifact, handle_not_found};
use axum::{routing::any, Router};
use blackdog_core::{HttpClient, PluginRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Plugin lookups and digest recording
    pub registry: Arc<PluginRegistry>,
    /// Client used to proxy archives from their download URLs
    pub http: HttpClient,
}

impl AppState {
    pub fn new(registry: Arc<PluginRegistry>, http: HttpClient) -> Self {
        Self { registry, http }
    }
}

/// Build the repository router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/*path", any(handle_artifact))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the repository server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    registry: Arc<PluginRegistry>,
    http: HttpClient,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(AppState::new(registry, http));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Repository listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
