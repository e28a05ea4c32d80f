use std::fmt;
use std::net::SocketAddr;

use crate::models::redact;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
/// Header carrying the shared secret on every backend call.
pub const SECRET_HEADER: &str = "X-API-Secret";
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub const BACKEND_URL_ENV: &str = "RAILWAY_API_URL";
pub const API_SECRET_ENV: &str = "RAILWAY_API_SECRET";

// ── Proxy configuration ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ProxyConfig {
    pub backend_url: String,
    pub api_secret: String,
    pub bind: SocketAddr,
    pub body_limit: usize,
}

impl ProxyConfig {
    pub fn new(backend_url: Option<String>, api_secret: Option<String>, bind: SocketAddr) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url.as_deref(), DEFAULT_BACKEND_URL),
            api_secret: api_secret.unwrap_or_default(),
            bind,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("backend_url", &self.backend_url)
            .field("api_secret", &redact(&self.api_secret))
            .field("bind", &self.bind)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

// ── Client configuration ──────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub proxy_url: String,
}

impl ClientConfig {
    pub fn new(proxy_url: Option<String>) -> Self {
        Self {
            proxy_url: normalize_base_url(proxy_url.as_deref(), DEFAULT_PROXY_URL),
        }
    }
}

/// Blank values fall back to `default`; a trailing slash is dropped so paths can be appended.
pub fn normalize_base_url(url: Option<&str>, default: &str) -> String {
    let url = url.map(str::trim).filter(|u| !u.is_empty()).unwrap_or(default);
    url.trim_end_matches('/').to_string()
}
