mod common;

use common::{extracted, result, template, MockApi};
use diagram_forge::orchestrator::SubmitError;
use diagram_forge::settings::{API_KEY_KEY, PROVIDER_KEY};
use diagram_forge::{
    ApiError, CatalogLoad, GenerationState, InputTab, MemorySession, Orchestrator, SettingsStore,
    UploadState,
};

async fn loaded(api: &MockApi) -> Orchestrator {
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    orch.load_templates(api).await;
    orch
}

// ── Catalog ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_selects_first_template() {
    let api = MockApi::new().with_templates(vec![template("flow", None), template("seq", None)]);
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    assert_eq!(orch.load_templates(&api).await, CatalogLoad::Loaded { count: 2 });
    assert_eq!(orch.selected_template_id(), Some("flow"));
    assert!(!orch.templates_loading());
}

#[tokio::test]
async fn catalog_failure_leaves_empty_list() {
    let api = MockApi::new();
    api.templates
        .lock()
        .unwrap()
        .push_back(Err(ApiError::failed(502, "Backend unavailable")));
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    let outcome = orch.load_templates(&api).await;
    assert_eq!(
        outcome,
        CatalogLoad::Failed {
            message: "Backend unavailable".into()
        }
    );
    assert!(orch.templates().is_empty());
    assert_eq!(orch.selected_template_id(), None);
    assert!(!orch.templates_loading());
}

#[tokio::test]
async fn unknown_template_is_not_selected() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    let mut orch = loaded(&api).await;
    assert!(!orch.select_template("missing"));
    assert_eq!(orch.selected_template_id(), Some("flow"));
}

// ── Validation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_template_blocks_submit() {
    let api = MockApi::new().with_templates(vec![]);
    let mut orch = loaded(&api).await;
    orch.set_content("something");
    assert_eq!(orch.submit(&api).await, Err(SubmitError::MissingTemplate));
    assert_eq!(orch.error_message(), Some("Please select a template first."));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn blank_content_blocks_submit() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    let mut orch = loaded(&api).await;
    orch.set_content("   \n\t");
    assert_eq!(orch.submit(&api).await, Err(SubmitError::EmptyContent));
    assert_eq!(
        orch.error_message(),
        Some("Please enter some content to generate a diagram from.")
    );
    assert!(api.requests().is_empty());
}

#[test]
fn second_submit_while_generating_is_refused() {
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    orch.apply_catalog(Ok(vec![template("flow", None)]));
    orch.set_content("A calls B");
    assert!(orch.begin_generation().is_ok());
    assert_eq!(orch.begin_generation(), Err(SubmitError::InFlight));
    assert_eq!(orch.generation(), &GenerationState::Generating);
}

// ── Provider resolution ───────────────────────────────────────────────────────

#[tokio::test]
async fn auto_sends_recommended_provider() {
    let api = MockApi::new().with_templates(vec![template("flow", Some("openai"))]);
    api.push_generate(Ok(result("openai", "gpt-image-1")));
    let mut orch = loaded(&api).await;
    orch.set_content("A calls B");
    orch.submit(&api).await.unwrap();

    let sent = api.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].provider, "openai");
    assert_eq!(sent[0].template_id, "flow");
    assert_eq!(sent[0].content, "A calls B");
    assert_eq!(orch.generation(), &GenerationState::Success);
}

#[tokio::test]
async fn auto_without_recommendation_sends_gemini() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Ok(result("gemini", "imagen")));
    let mut orch = loaded(&api).await;
    orch.set_content("A calls B");
    orch.submit(&api).await.unwrap();
    assert_eq!(api.requests()[0].provider, "gemini");
}

#[tokio::test]
async fn explicit_provider_overrides_recommendation() {
    let api = MockApi::new().with_templates(vec![template("flow", Some("openai"))]);
    api.push_generate(Ok(result("replicate", "flux")));
    let mut orch = loaded(&api).await;
    orch.set_provider("replicate");
    orch.set_content("A calls B");
    orch.submit(&api).await.unwrap();
    assert_eq!(api.requests()[0].provider, "replicate");
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn saved_settings_apply_to_next_submit() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Ok(result("openai", "gpt-image-1")));
    let mut orch = loaded(&api).await;
    orch.save_settings("openai", "sk-test");
    orch.set_content("A calls B");
    orch.submit(&api).await.unwrap();

    let sent = &api.requests()[0];
    assert_eq!(sent.provider, "openai");
    assert_eq!(sent.api_key, "sk-test");
    assert_eq!(orch.settings().api_key, "sk-test");
}

#[tokio::test]
async fn session_values_seed_the_orchestrator() {
    let session = MemorySession::with_values([(PROVIDER_KEY, "replicate"), (API_KEY_KEY, "r8-key")]);
    let mut orch = Orchestrator::new(SettingsStore::load(Box::new(session)));
    assert_eq!(orch.provider(), "replicate");

    let api = MockApi::new().with_templates(vec![template("flow", Some("openai"))]);
    api.push_generate(Ok(result("replicate", "flux")));
    orch.load_templates(&api).await;
    orch.set_content("x");
    orch.submit(&api).await.unwrap();
    assert_eq!(api.requests()[0].api_key, "r8-key");
}

#[tokio::test]
async fn reset_session_forgets_key_and_result() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Ok(result("gemini", "imagen")));
    let mut orch = loaded(&api).await;
    orch.save_settings("openai", "sk-test");
    orch.set_content("x");
    orch.submit(&api).await.unwrap();

    orch.reset_session();
    assert_eq!(orch.settings().api_key, "");
    assert_eq!(orch.provider(), "auto");
    assert!(orch.last_result().is_none());
    assert_eq!(orch.generation(), &GenerationState::Initial);
    assert_eq!(orch.templates().len(), 1);
}

// ── Generation outcomes ───────────────────────────────────────────────────────

#[tokio::test]
async fn failure_message_is_shown() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Err(ApiError::failed(401, "Invalid API key")));
    let mut orch = loaded(&api).await;
    orch.set_content("x");
    orch.submit(&api).await.unwrap();
    assert_eq!(
        orch.generation(),
        &GenerationState::Error {
            message: "Invalid API key".into()
        }
    );
}

#[tokio::test]
async fn network_failure_uses_network_message() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Err(ApiError::Network));
    let mut orch = loaded(&api).await;
    orch.set_content("x");
    orch.submit(&api).await.unwrap();
    assert_eq!(
        orch.error_message(),
        Some("Network error: could not reach the server.")
    );
}

#[tokio::test]
async fn regenerate_issues_a_fresh_request() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Ok(result("gemini", "imagen")));
    api.push_generate(Ok(result("gemini", "imagen-2")));
    let mut orch = loaded(&api).await;
    orch.set_content("x");
    orch.submit(&api).await.unwrap();
    orch.regenerate(&api).await.unwrap();

    assert_eq!(api.requests().len(), 2);
    assert_eq!(orch.last_result().map(|r| r.model.as_str()), Some("imagen-2"));
}

#[tokio::test]
async fn model_override_is_forwarded() {
    let api = MockApi::new().with_templates(vec![template("flow", None)]);
    api.push_generate(Ok(result("gemini", "custom")));
    let mut orch = loaded(&api).await;
    orch.set_model(Some("custom".into()));
    orch.set_content("x");
    orch.submit(&api).await.unwrap();
    assert_eq!(api.requests()[0].model.as_deref(), Some("custom"));
}

#[test]
fn late_outcome_without_generation_is_ignored() {
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    orch.finish_generation(Ok(result("gemini", "imagen")));
    assert_eq!(orch.generation(), &GenerationState::Initial);
    assert!(orch.last_result().is_none());
}

// ── Upload ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_replaces_content_and_shows_paste_tab() {
    let api = MockApi::new();
    api.push_extract(Ok(extracted("Hello")));
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    orch.set_content("old text");
    orch.set_input_tab(InputTab::Upload);

    orch.upload_document(&api, "notes.md", b"# Hello".to_vec()).await.unwrap();
    assert_eq!(orch.content(), "Hello");
    assert_eq!(orch.input_tab(), InputTab::Paste);
    assert_eq!(
        orch.upload(),
        &UploadState::Done {
            filename: "notes.md".into()
        }
    );
    assert_eq!(api.extract_calls.lock().unwrap()[0], ("notes.md".to_string(), 7));
}

#[tokio::test]
async fn failed_upload_keeps_content() {
    let api = MockApi::new();
    api.push_extract(Err(ApiError::failed(400, "Unsupported file type")));
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    orch.set_content("keep me");
    orch.set_input_tab(InputTab::Upload);

    orch.upload_document(&api, "scan.pdf", vec![1, 2, 3]).await.unwrap();
    assert_eq!(orch.content(), "keep me");
    assert_eq!(orch.input_tab(), InputTab::Upload);
    assert_eq!(
        orch.upload(),
        &UploadState::Error {
            filename: "scan.pdf".into(),
            message: "Unsupported file type".into()
        }
    );
}

#[test]
fn upload_cannot_be_cleared_while_in_flight() {
    let mut orch = Orchestrator::new(SettingsStore::in_memory());
    orch.begin_upload("notes.md").unwrap();
    assert!(!orch.clear_upload());
    assert!(orch.begin_upload("other.md").is_err());

    orch.finish_upload(Ok(extracted("done"))).unwrap();
    assert!(orch.clear_upload());
    assert_eq!(orch.upload(), &UploadState::Idle);
    assert_eq!(orch.content(), "done");
}
