use crate::config::ServerConfig;
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// HTTP surface: a health line on `/` and the signaling socket on `/ws`.
pub fn app(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

async fn health() -> &'static str {
    "Signaling server is running"
}

pub async fn serve(listener: TcpListener, service: SignalingService) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(
        "Signaling server listening on http://{} (topology: {})",
        addr,
        service.router().topology()
    );

    axum::serve(listener, app(service))
        .await
        .context("Signaling server stopped")?;
    Ok(())
}

/// Binds `config.bind_addr` and serves until the process is stopped.
pub async fn run(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    serve(listener, SignalingService::new(&config)).await
}
