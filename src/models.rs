use serde::{Deserialize, Serialize};
use std::fmt;

// ── Template catalog ──────────────────────────────────────────────────────────

/// A diagram style the backend can render against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub recommended_provider: Option<String>,
}

// ── Extraction ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_count: Option<usize>,
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Body of a generate call. `provider` is always a concrete provider, never `auto`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub template_id: String,
    pub content: String,
    pub provider: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("template_id", &self.template_id)
            .field("content_len", &self.content.len())
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub image_base64: String,
    pub provider: String,
    pub model: String,
    pub cost_usd: f64,
}

impl GenerationResult {
    /// One-line summary shown under a rendered diagram.
    pub fn summary(&self) -> String {
        format!(
            "Generated with {} ({}) - ${:.4}",
            self.provider, self.model, self.cost_usd
        )
    }
}

// ── Error body ────────────────────────────────────────────────────────────────

/// Flat error shape emitted by every proxy endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
