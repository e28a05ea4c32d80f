use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{ApiError, DiagramApi};
use crate::models::{ExtractResponse, GenerationRequest, GenerationResult, Template};

// ── Network completions ───────────────────────────────────────────────────────

/// A finished proxy call, delivered back to the event loop.
#[derive(Debug)]
pub enum NetEvent {
    Templates(Result<Vec<Template>, ApiError>),
    Extracted(Result<ExtractResponse, ApiError>),
    Generated(Result<GenerationResult, ApiError>),
}

pub type NetSender = mpsc::UnboundedSender<NetEvent>;

pub fn spawn_templates(api: Arc<dyn DiagramApi>, tx: NetSender) {
    tokio::spawn(async move {
        let _ = tx.send(NetEvent::Templates(api.templates().await));
    });
}

pub fn spawn_extract(api: Arc<dyn DiagramApi>, filename: String, bytes: Vec<u8>, tx: NetSender) {
    tokio::spawn(async move {
        let _ = tx.send(NetEvent::Extracted(api.extract(&filename, bytes).await));
    });
}

pub fn spawn_generate(api: Arc<dyn DiagramApi>, request: GenerationRequest, tx: NetSender) {
    tokio::spawn(async move {
        let _ = tx.send(NetEvent::Generated(api.generate(&request).await));
    });
}
