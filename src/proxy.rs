//! HTTP proxy between the client and the diagram backend.
//!
//! ## Endpoints
//! - `GET /templates` - template catalog
//! - `POST /extract` - multipart upload, forwarded byte for byte
//! - `POST /generate` - JSON body, forwarded without validation
//! - `GET /health` - liveness, answered locally
//!
//! The shared secret is added here and never echoed back. Failures are always
//! `{ "error": message }` with the status the gateway produced.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::gateway::{GatewayClient, GatewayError};
use crate::models::ErrorBody;

struct ProxyState {
    gateway: GatewayClient,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.message())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

fn respond(result: Result<Value, GatewayError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(config: &ProxyConfig) -> Router {
    router_with_gateway(GatewayClient::new(config), config.body_limit)
}

pub fn router_with_gateway(gateway: GatewayClient, body_limit: usize) -> Router {
    let state = Arc::new(ProxyState { gateway });
    Router::new()
        .route("/templates", get(templates))
        .route("/extract", post(extract))
        .route("/generate", post(generate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.bind` and serves until Ctrl+C.
pub async fn serve(config: ProxyConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind proxy to {}", config.bind))?;
    serve_with_listener(listener, config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

pub async fn serve_with_listener<F>(listener: TcpListener, config: ProxyConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, backend = %config.backend_url, "diagram proxy listening");
    axum::serve(listener, router(&config))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("diagram proxy shutting down");
        })
        .await
        .context("Proxy server error")
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn templates(State(state): State<Arc<ProxyState>>) -> Response {
    respond(state.gateway.templates().await)
}

async fn extract(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");
    respond(state.gateway.extract(content_type, body).await)
}

async fn generate(
    State(state): State<Arc<ProxyState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    let template_id = body.get("template_id").and_then(Value::as_str).unwrap_or_default();
    let provider = body.get("provider").and_then(Value::as_str).unwrap_or_default();
    tracing::debug!(template_id, provider, "forwarding generate request");
    respond(state.gateway.generate(&body).await)
}
