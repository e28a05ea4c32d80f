//! Outbound calls from the proxy to the diagram backend.
//!
//! Every call attaches the shared secret and resolves to either the backend's
//! JSON body, untouched, or a [`GatewayError`] carrying a message and status.

use axum::body::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ProxyConfig, SECRET_HEADER};

pub const BACKEND_UNAVAILABLE: &str = "Backend unavailable";

// ── Operations ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Templates,
    Extract,
    Generate,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Templates => "/templates",
            Operation::Extract => "/extract",
            Operation::Generate => "/generate",
        }
    }

    /// Message used when the backend fails without saying why.
    pub fn default_error(&self) -> &'static str {
        match self {
            Operation::Templates => "Failed to fetch templates",
            Operation::Extract => "Extraction failed",
            Operation::Generate => "Generation failed",
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum GatewayError {
    /// No response was obtained (DNS, connect, timeout, dropped connection).
    #[error("Backend unavailable")]
    BackendUnavailable,

    /// The backend answered outside the success range.
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BackendUnavailable => StatusCode::BAD_GATEWAY,
            GatewayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Picks the error message out of a failed response body: a JSON `detail`
/// field first, then the raw text, then the operation's default.
pub fn error_message(op: Operation, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match json.get("detail") {
            Some(Value::String(detail)) if !detail.is_empty() => return detail.clone(),
            Some(Value::Null) | None => {}
            // FastAPI validation errors put a list here
            Some(other) if !other.is_string() => return other.to_string(),
            Some(_) => {}
        }
    }
    if body.is_empty() {
        op.default_error().to_string()
    } else {
        body.to_string()
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    secret: String,
}

impl GatewayClient {
    pub fn new(config: &ProxyConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &ProxyConfig) -> Self {
        Self {
            http,
            base_url: config.backend_url.clone(),
            secret: config.api_secret.clone(),
        }
    }

    fn url(&self, op: Operation) -> String {
        format!("{}{}", self.base_url, op.path())
    }

    pub async fn templates(&self) -> Result<Value, GatewayError> {
        let req = self.http.get(self.url(Operation::Templates));
        self.dispatch(Operation::Templates, req).await
    }

    /// Forwards a multipart body as received, boundary included.
    pub async fn extract(&self, content_type: &str, body: Bytes) -> Result<Value, GatewayError> {
        let req = self
            .http
            .post(self.url(Operation::Extract))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        self.dispatch(Operation::Extract, req).await
    }

    pub async fn generate(&self, body: &Value) -> Result<Value, GatewayError> {
        let req = self.http.post(self.url(Operation::Generate)).json(body);
        self.dispatch(Operation::Generate, req).await
    }

    async fn dispatch(&self, op: Operation, req: RequestBuilder) -> Result<Value, GatewayError> {
        let resp = match req.header(SECRET_HEADER, &self.secret).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(operation = ?op, error = %e, "backend request failed");
                return Err(GatewayError::BackendUnavailable);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(op, &body);
            tracing::info!(operation = ?op, status = status.as_u16(), %message, "backend rejected request");
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(operation = ?op, error = %e, "backend response interrupted");
                return Err(GatewayError::BackendUnavailable);
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(operation = ?op, error = %e, "backend returned a non-JSON success body");
            GatewayError::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: op.default_error().to_string(),
            }
        })
    }
}
