// src/api.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};

/// Liveness surface for platforms that kill processes with no open port.
/// Shares no state with the posting pipeline; read-only by construction.
pub fn router(metrics_router: Router) -> Router {
    Router::new()
        .route("/", get(|| async { "running" }))
        .route("/health", get(|| async { "OK" }))
        .merge(metrics_router)
}

pub async fn serve(port: u16, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("bind liveness port {port}"))?;
    tracing::info!(port, "liveness endpoint listening");
    axum::serve(listener, router).await.context("liveness server")?;
    Ok(())
}
