//! Axum HTTP server.
//!
//! - `GET /health`
//! - everything else is handed to [`CodespacesProxy`]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ProxyConfig;
use crate::proxy::{CodespacesProxy, ProxyRequest};
use crate::response::ProxyResponse;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router(proxy: Arc<CodespacesProxy>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy_handler)
        .with_state(proxy)
}

pub async fn serve(config: ProxyConfig) -> Result<()> {
    let proxy =
        CodespacesProxy::from_config(&config).context("failed to build upstream client")?;
    let app = router(Arc::new(proxy));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        addr = %addr,
        upstream = %config.upstream_base_url,
        "codespaces-proxy listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn proxy_handler(
    State(proxy): State<Arc<CodespacesProxy>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ProxyResponse {
    // Dropped together with this future when the client goes away.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = ProxyRequest::new(method, uri.path())
        .with_headers(headers)
        .with_body(body);
    proxy.handle(request, &cancel).await
}
