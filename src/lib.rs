pub mod api;
pub mod config;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod proxy;
pub mod settings;
pub mod tui;
pub mod upload;

pub use api::{ApiError, DiagramApi, ProxyClient};
pub use gateway::{GatewayClient, GatewayError, Operation};
pub use models::{ExtractResponse, GenerationRequest, GenerationResult, Template};
pub use orchestrator::{resolve_provider, CatalogLoad, GenerationState, InputTab, Orchestrator};
pub use settings::{MemorySession, SessionStorage, Settings, SettingsStore};
pub use upload::UploadState;

use anyhow::{bail, Context, Result};
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::settings::{API_KEY_KEY, PROVIDER_KEY};

/// Installs the stderr subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads a document offered by the file picker: `.pdf`, `.docx` or `.md`.
pub fn read_document(path: &Path) -> Result<(String, Vec<u8>)> {
    if !upload::is_accepted_file(path) {
        bail!(
            "Unsupported file type: {} (expected one of .pdf, .docx, .md)",
            path.display()
        );
    }
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((filename, bytes))
}

/// Decodes the generated image and writes it to `dest`.
pub fn save_image(result: &GenerationResult, dest: &Path) -> Result<()> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(result.image_base64.trim())
        .context("Generated image is not valid base64")?;
    fs::write(dest, bytes).with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(())
}

// ── One-shot commands ─────────────────────────────────────────────────────────

pub async fn templates(api: &dyn DiagramApi) -> Result<Vec<Template>> {
    let mut orchestrator = Orchestrator::new(SettingsStore::in_memory());
    match orchestrator.load_templates(api).await {
        CatalogLoad::Loaded { .. } => Ok(orchestrator.templates().to_vec()),
        CatalogLoad::Failed { message } => bail!("Could not load templates: {message}"),
    }
}

pub async fn extract(api: &dyn DiagramApi, path: &Path) -> Result<String> {
    let (filename, bytes) = read_document(path)?;
    let mut orchestrator = Orchestrator::new(SettingsStore::in_memory());
    orchestrator.upload_document(api, &filename, bytes).await?;
    match orchestrator.upload() {
        UploadState::Done { .. } => Ok(orchestrator.content().to_string()),
        UploadState::Error { message, .. } => bail!("{message}"),
        other => bail!("Upload ended in unexpected state {other:?}"),
    }
}

#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub template: Option<String>,
    pub content: Option<String>,
    pub file: Option<PathBuf>,
    pub provider: String,
    pub api_key: String,
    pub model: Option<String>,
}

/// Runs the full client flow once: catalog, content, provider resolution, generate.
pub async fn generate(api: &dyn DiagramApi, opts: GenerateOptions) -> Result<GenerationResult> {
    let session = MemorySession::with_values([
        (PROVIDER_KEY, opts.provider.as_str()),
        (API_KEY_KEY, opts.api_key.as_str()),
    ]);
    let mut orchestrator = Orchestrator::new(SettingsStore::load(Box::new(session)));

    if let CatalogLoad::Failed { message } = orchestrator.load_templates(api).await {
        bail!("Could not load templates: {message}");
    }
    if let Some(id) = &opts.template {
        if !orchestrator.select_template(id) {
            bail!("Unknown template '{id}'");
        }
    }

    match (opts.content, opts.file) {
        (Some(content), _) => orchestrator.set_content(content),
        (None, Some(path)) => {
            let (filename, bytes) = read_document(&path)?;
            orchestrator.upload_document(api, &filename, bytes).await?;
            if let UploadState::Error { message, .. } = orchestrator.upload() {
                bail!("Extraction failed for {filename}: {message}");
            }
        }
        (None, None) => bail!("Provide --content or --file"),
    }
    orchestrator.set_model(opts.model);

    orchestrator.submit(api).await?;
    match (orchestrator.generation(), orchestrator.last_result()) {
        (GenerationState::Success, Some(result)) => Ok(result.clone()),
        (GenerationState::Error { message }, _) => bail!("{message}"),
        (state, _) => bail!("Generation ended in unexpected state {state:?}"),
    }
}
