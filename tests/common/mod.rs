#![allow(dead_code)]

use async_trait::async_trait;
use diagram_forge::{ApiError, DiagramApi, ExtractResponse, GenerationRequest, GenerationResult, Template};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted stand-in for the proxy: replies are queued per operation and
/// every generate request is recorded.
#[derive(Default)]
pub struct MockApi {
    pub templates: Mutex<VecDeque<Result<Vec<Template>, ApiError>>>,
    pub extracts: Mutex<VecDeque<Result<ExtractResponse, ApiError>>>,
    pub generates: Mutex<VecDeque<Result<GenerationResult, ApiError>>>,
    pub generate_requests: Mutex<Vec<GenerationRequest>>,
    pub extract_calls: Mutex<Vec<(String, usize)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(self, templates: Vec<Template>) -> Self {
        self.templates.lock().unwrap().push_back(Ok(templates));
        self
    }

    pub fn push_generate(&self, outcome: Result<GenerationResult, ApiError>) {
        self.generates.lock().unwrap().push_back(outcome);
    }

    pub fn push_extract(&self, outcome: Result<ExtractResponse, ApiError>) {
        self.extracts.lock().unwrap().push_back(outcome);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.generate_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagramApi for MockApi {
    async fn templates(&self) -> Result<Vec<Template>, ApiError> {
        self.templates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network))
    }

    async fn extract(&self, filename: &str, bytes: Vec<u8>) -> Result<ExtractResponse, ApiError> {
        self.extract_calls.lock().unwrap().push((filename.to_string(), bytes.len()));
        self.extracts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network))
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ApiError> {
        self.generate_requests.lock().unwrap().push(request.clone());
        self.generates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network))
    }
}

pub fn template(id: &str, recommended: Option<&str>) -> Template {
    Template {
        id: id.to_string(),
        name: format!("{id} diagram"),
        description: format!("A {id} template"),
        recommended_provider: recommended.map(str::to_string),
    }
}

pub fn result(provider: &str, model: &str) -> GenerationResult {
    GenerationResult {
        // 1x1 transparent PNG
        image_base64: "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGNgYPgPAAEDAQAIicLsAAAABJRU5ErkJggg".to_string(),
        provider: provider.to_string(),
        model: model.to_string(),
        cost_usd: 0.039,
    }
}

pub fn extracted(text: &str) -> ExtractResponse {
    ExtractResponse {
        text: text.to_string(),
        filename: None,
        char_count: None,
    }
}
