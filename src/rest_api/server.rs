//! Axum HTTP server for the metrics endpoint

use std::net::SocketAddr;

use axum::{http::header, response::IntoResponse, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::Result;

const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

async fn healthz() -> &'static str {
    "ok"
}

/// Metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    use prometheus_client::encoding::text::encode;
    let mut buffer = String::new();
    if let Err(e) = encode(&mut buffer, &crate::controller::metrics::REGISTRY) {
        error!(error = %e, "Failed to encode metrics");
    }
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], buffer)
}

/// Routes served by the metrics server
pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
}

/// Serve metrics on all interfaces at `port`
pub async fn run_server(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Metrics server listening");

    axum::serve(listener, router()).await?;
    Ok(())
}
