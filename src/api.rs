use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::gateway::Operation;
use crate::models::{ErrorBody, ExtractResponse, GenerationRequest, GenerationResult, Template};

pub const NETWORK_ERROR: &str = "Network error: could not reach the server.";

// ── Client-side errors ────────────────────────────────────────────────────────

/// A failure as seen by the client: only the message is shown to the user.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: could not reach the server.")]
    Network,
    #[error("{message}")]
    Failed { status: u16, message: String },
}

impl ApiError {
    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        ApiError::Failed {
            status,
            message: message.into(),
        }
    }
}

// ── Proxy API ─────────────────────────────────────────────────────────────────

/// The three proxy operations the client state machines depend on.
#[async_trait]
pub trait DiagramApi: Send + Sync {
    async fn templates(&self) -> Result<Vec<Template>, ApiError>;
    async fn extract(&self, filename: &str, bytes: Vec<u8>) -> Result<ExtractResponse, ApiError>;
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ApiError>;
}

/// Talks to the proxy endpoints over HTTP, the way the browser page does.
#[derive(Clone, Debug)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.proxy_url.clone(),
        }
    }

    fn url(&self, op: Operation) -> String {
        format!("{}{}", self.base_url, op.path())
    }
}

/// Decodes a proxy response: the typed body on success, the `error` field otherwise.
async fn read_response<T: DeserializeOwned>(op: Operation, resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(|_| ApiError::Network)?;
    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(operation = ?op, error = %e, "unexpected response body from proxy");
            ApiError::failed(status.as_u16(), op.default_error())
        });
    }
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{} ({})", op.default_error(), status.as_u16()));
    Err(ApiError::failed(status.as_u16(), message))
}

#[async_trait]
impl DiagramApi for ProxyClient {
    async fn templates(&self) -> Result<Vec<Template>, ApiError> {
        let resp = self
            .http
            .get(self.url(Operation::Templates))
            .send()
            .await
            .map_err(|_| ApiError::Network)?;
        read_response(Operation::Templates, resp).await
    }

    async fn extract(&self, filename: &str, bytes: Vec<u8>) -> Result<ExtractResponse, ApiError> {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(self.url(Operation::Extract))
            .multipart(form)
            .send()
            .await
            .map_err(|_| ApiError::Network)?;
        read_response(Operation::Extract, resp).await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ApiError> {
        let resp = self
            .http
            .post(self.url(Operation::Generate))
            .json(request)
            .send()
            .await
            .map_err(|_| ApiError::Network)?;
        read_response(Operation::Generate, resp).await
    }
}
