//! Client-side flow: template catalog, content buffer, provider resolution and
//! the generation state machine, with the upload sub-machine alongside.
//!
//! Each network step is split into a synchronous `begin_*` half and a
//! `finish_*` half so a UI can issue the call elsewhere and feed the outcome
//! back; the `async` helpers run both halves in sequence.

use thiserror::Error;

use crate::api::{ApiError, DiagramApi};
use crate::models::{ExtractResponse, GenerationRequest, GenerationResult, Template};
use crate::settings::{Settings, SettingsStore, AUTO_PROVIDER};
use crate::upload::{UploadError, UploadState};

/// Used when `auto` is selected and the template recommends nothing.
pub const DEFAULT_PROVIDER: &str = "gemini";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputTab {
    #[default]
    Paste,
    Upload,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum GenerationState {
    #[default]
    Initial,
    Generating,
    Success,
    Error { message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("Please select a template first.")]
    MissingTemplate,
    #[error("Please enter some content to generate a diagram from.")]
    EmptyContent,
    #[error("A diagram is already being generated")]
    InFlight,
}

/// Outcome of a catalog fetch, returned to the caller rather than only logged.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogLoad {
    Loaded { count: usize },
    Failed { message: String },
}

/// `auto` expands to the template's recommendation, else [`DEFAULT_PROVIDER`];
/// anything else is used verbatim.
pub fn resolve_provider(selected: &str, template: Option<&Template>) -> String {
    if selected != AUTO_PROVIDER {
        return selected.to_string();
    }
    template
        .and_then(|t| t.recommended_provider.as_deref())
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROVIDER)
        .to_string()
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Orchestrator {
    templates: Vec<Template>,
    templates_loading: bool,
    selected_template: Option<String>,
    content: String,
    input_tab: InputTab,
    provider: String,
    model: Option<String>,
    settings: SettingsStore,
    generation: GenerationState,
    last_result: Option<GenerationResult>,
    upload: UploadState,
}

impl Orchestrator {
    pub fn new(settings: SettingsStore) -> Self {
        let provider = settings.current().provider.clone();
        Self {
            templates: Vec::new(),
            templates_loading: false,
            selected_template: None,
            content: String::new(),
            input_tab: InputTab::Paste,
            provider,
            model: None,
            settings,
            generation: GenerationState::Initial,
            last_result: None,
            upload: UploadState::Idle,
        }
    }

    // accessors

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn templates_loading(&self) -> bool {
        self.templates_loading
    }

    pub fn selected_template_id(&self) -> Option<&str> {
        self.selected_template.as_deref()
    }

    pub fn selected_template(&self) -> Option<&Template> {
        let id = self.selected_template.as_deref()?;
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn input_tab(&self) -> InputTab {
        self.input_tab
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        self.settings.current()
    }

    pub fn generation(&self) -> &GenerationState {
        &self.generation
    }

    pub fn is_generating(&self) -> bool {
        self.generation == GenerationState::Generating
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.generation {
            GenerationState::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn last_result(&self) -> Option<&GenerationResult> {
        self.last_result.as_ref()
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    /// The provider a submit right now would send.
    pub fn resolved_provider(&self) -> String {
        resolve_provider(&self.provider, self.selected_template())
    }

    // user edits

    /// Selects a template from the catalog. Unknown ids are ignored.
    pub fn select_template(&mut self, id: &str) -> bool {
        if self.templates.iter().any(|t| t.id == id) {
            self.selected_template = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_input_tab(&mut self, tab: InputTab) {
        self.input_tab = tab;
    }

    /// Per-session provider choice; does not touch the saved settings.
    pub fn set_provider(&mut self, provider: impl Into<String>) {
        self.provider = provider.into();
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model.filter(|m| !m.trim().is_empty());
    }

    /// Saves provider and key; the next submit sees both.
    pub fn save_settings(&mut self, provider: &str, api_key: &str) {
        self.settings.save(provider, api_key);
        self.provider = provider.to_string();
    }

    /// Drops everything scoped to the session. The catalog stays loaded.
    pub fn reset_session(&mut self) {
        self.settings.reset();
        self.provider = self.settings.current().provider.clone();
        self.content.clear();
        self.input_tab = InputTab::Paste;
        self.generation = GenerationState::Initial;
        self.last_result = None;
        self.upload = UploadState::Idle;
    }

    // ── Template catalog ─────────────────────────────────────────────────────

    pub fn begin_catalog_load(&mut self) {
        self.templates_loading = true;
    }

    pub fn apply_catalog(&mut self, outcome: Result<Vec<Template>, ApiError>) -> CatalogLoad {
        self.templates_loading = false;
        match outcome {
            Ok(templates) => {
                self.templates = templates;
                if self.selected_template.is_none() {
                    self.selected_template = self.templates.first().map(|t| t.id.clone());
                }
                tracing::info!(count = self.templates.len(), "template catalog loaded");
                CatalogLoad::Loaded {
                    count: self.templates.len(),
                }
            }
            Err(e) => {
                self.templates.clear();
                tracing::warn!(error = %e, "template catalog unavailable");
                CatalogLoad::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    pub async fn load_templates(&mut self, api: &dyn DiagramApi) -> CatalogLoad {
        self.begin_catalog_load();
        let outcome = api.templates().await;
        self.apply_catalog(outcome)
    }

    // ── Generation ───────────────────────────────────────────────────────────

    /// Validates inputs and moves to `Generating`, returning the request to send.
    /// Validation failures move to `Error` without producing a request.
    pub fn begin_generation(&mut self) -> Result<GenerationRequest, SubmitError> {
        if self.is_generating() {
            return Err(SubmitError::InFlight);
        }
        let Some(template_id) = self.selected_template.clone() else {
            return Err(self.reject(SubmitError::MissingTemplate));
        };
        if self.content.trim().is_empty() {
            return Err(self.reject(SubmitError::EmptyContent));
        }

        let provider = self.resolved_provider();
        self.generation = GenerationState::Generating;
        let request = GenerationRequest {
            template_id,
            content: self.content.clone(),
            provider,
            api_key: self.settings.current().api_key.clone(),
            model: self.model.clone(),
        };
        tracing::debug!(?request, "generation started");
        Ok(request)
    }

    fn reject(&mut self, err: SubmitError) -> SubmitError {
        self.generation = GenerationState::Error {
            message: err.to_string(),
        };
        err
    }

    /// Applies the generate call's outcome. Ignored unless a generation is in flight.
    pub fn finish_generation(&mut self, outcome: Result<GenerationResult, ApiError>) {
        if !self.is_generating() {
            tracing::warn!("generation outcome arrived with no generation in flight");
            return;
        }
        match outcome {
            Ok(result) => {
                tracing::info!(provider = %result.provider, model = %result.model, cost_usd = result.cost_usd, "diagram generated");
                self.last_result = Some(result);
                self.generation = GenerationState::Success;
            }
            Err(e) => {
                tracing::info!(error = %e, "generation failed");
                self.generation = GenerationState::Error {
                    message: e.to_string(),
                };
            }
        }
    }

    pub async fn submit(&mut self, api: &dyn DiagramApi) -> Result<(), SubmitError> {
        let request = self.begin_generation()?;
        let outcome = api.generate(&request).await;
        self.finish_generation(outcome);
        Ok(())
    }

    /// Same as [`submit`](Self::submit), run against whatever is staged now.
    pub async fn regenerate(&mut self, api: &dyn DiagramApi) -> Result<(), SubmitError> {
        self.submit(api).await
    }

    // ── Upload ───────────────────────────────────────────────────────────────

    pub fn begin_upload(&mut self, filename: impl Into<String>) -> Result<(), UploadError> {
        self.upload.begin(filename)
    }

    /// On success the extracted text replaces the content buffer and the paste tab is shown.
    pub fn finish_upload(&mut self, outcome: Result<ExtractResponse, ApiError>) -> Result<(), UploadError> {
        if !self.upload.is_uploading() {
            return Err(UploadError::NotUploading);
        }
        match outcome {
            Ok(extracted) => {
                tracing::info!(chars = extracted.text.chars().count(), "document extracted");
                self.content = extracted.text;
                self.input_tab = InputTab::Paste;
                self.upload.succeed()
            }
            Err(e) => {
                tracing::info!(error = %e, "extraction failed");
                self.upload.fail(e.to_string())
            }
        }
    }

    pub async fn upload_document(
        &mut self,
        api: &dyn DiagramApi,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), UploadError> {
        self.begin_upload(filename)?;
        let outcome = api.extract(filename, bytes).await;
        self.finish_upload(outcome)
    }

    pub fn clear_upload(&mut self) -> bool {
        self.upload.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(recommended: Option<&str>) -> Template {
        Template {
            id: "architecture".into(),
            name: "Architecture".into(),
            description: String::new(),
            recommended_provider: recommended.map(str::to_string),
        }
    }

    #[test]
    fn auto_uses_template_recommendation() {
        assert_eq!(resolve_provider("auto", Some(&template(Some("openai")))), "openai");
    }

    #[test]
    fn auto_without_recommendation_uses_default() {
        assert_eq!(resolve_provider("auto", Some(&template(None))), "gemini");
        assert_eq!(resolve_provider("auto", Some(&template(Some("")))), "gemini");
        assert_eq!(resolve_provider("auto", None), "gemini");
    }

    #[test]
    fn explicit_provider_is_verbatim() {
        assert_eq!(resolve_provider("openai", Some(&template(Some("gemini")))), "openai");
        assert_eq!(resolve_provider("replicate", None), "replicate");
    }
}
