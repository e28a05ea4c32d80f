use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::api::DiagramApi;
use crate::orchestrator::{CatalogLoad, InputTab, Orchestrator, SubmitError};
use crate::settings::SettingsStore;
use crate::tui::api::{spawn_extract, spawn_generate, spawn_templates, NetEvent, NetSender};
use crate::tui::draw::draw;
use crate::tui::input::handle_text_input_key;
use crate::tui::providers::Provider;
use crate::tui::state::{App, Focus, Screen, SettingsFocus};
use crate::upload::UploadState;
use crate::{read_document, save_image};

#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub async fn run(api: Arc<dyn DiagramApi>, settings: SettingsStore, download_path: PathBuf) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Orchestrator::new(settings), download_path);
    let result = event_loop(&mut terminal, &mut app, api).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

// ── Event loop ────────────────────────────────────────────────────────────────

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    api: Arc<dyn DiagramApi>,
) -> Result<()> {
    let mut event_stream = EventStream::new();
    // Spinner only; nothing times out here
    let mut tick = tokio::time::interval(Duration::from_millis(120));
    let (net_tx, mut net_rx) = mpsc::unbounded_channel::<NetEvent>();

    app.orchestrator.begin_catalog_load();
    spawn_templates(api.clone(), net_tx.clone());

    loop {
        terminal.draw(|f| draw(f, app))?;

        tokio::select! {
            _ = tick.tick() => {
                app.tick = app.tick.wrapping_add(1);
            }

            Some(event) = net_rx.recv() => {
                apply_net_event(app, event);
            }

            Some(Ok(event)) = event_stream.next() => {
                if let Event::Key(key) = event {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key(app, key, &api, &net_tx) == Flow::Quit {
                        return Ok(());
                    }
                }
            }
        }
    }
}

// ── Network completions ───────────────────────────────────────────────────────

pub fn apply_net_event(app: &mut App, event: NetEvent) {
    match event {
        NetEvent::Templates(outcome) => {
            app.status = match app.orchestrator.apply_catalog(outcome) {
                CatalogLoad::Loaded { count: 0 } => "No templates available".to_string(),
                CatalogLoad::Loaded { .. } => String::new(),
                CatalogLoad::Failed { message } => format!("Templates unavailable: {message}"),
            };
        }
        NetEvent::Extracted(outcome) => {
            if let Err(e) = app.orchestrator.finish_upload(outcome) {
                tracing::warn!(error = %e, "stray extraction result");
                return;
            }
            app.status = match app.orchestrator.upload() {
                UploadState::Done { filename } => format!("✓ Extracted text from {filename}"),
                UploadState::Error { message, .. } => format!("Upload failed: {message}"),
                _ => String::new(),
            };
        }
        NetEvent::Generated(outcome) => {
            app.orchestrator.finish_generation(outcome);
            app.status.clear();
        }
    }
    app.sync_from_orchestrator();
}

// ── Actions ───────────────────────────────────────────────────────────────────

/// Generate and Regenerate both land here; a press while generating is dropped.
pub fn start_generation(app: &mut App, api: &Arc<dyn DiagramApi>, tx: &NetSender) {
    app.commit_content();
    match app.orchestrator.begin_generation() {
        Ok(request) => {
            app.status = format!("Generating with {}…", request.provider);
            spawn_generate(api.clone(), request, tx.clone());
        }
        Err(SubmitError::InFlight) => {}
        Err(e) => app.status = e.to_string(),
    }
}

pub fn start_upload(app: &mut App, api: &Arc<dyn DiagramApi>, tx: &NetSender) {
    let path = PathBuf::from(app.file_input.value.trim());
    let (filename, bytes) = match read_document(&path) {
        Ok(doc) => doc,
        Err(e) => {
            app.status = e.to_string();
            return;
        }
    };
    match app.orchestrator.begin_upload(filename.clone()) {
        Ok(()) => {
            app.status = format!("Uploading {filename}…");
            spawn_extract(api.clone(), filename, bytes, tx.clone());
        }
        Err(e) => app.status = e.to_string(),
    }
}

pub fn download(app: &mut App) {
    let Some(result) = app.orchestrator.last_result() else {
        app.status = "Nothing to download yet".to_string();
        return;
    };
    app.status = match save_image(result, &app.download_path) {
        Ok(()) => format!("✓ Saved {}", app.download_path.display()),
        Err(e) => format!("Download failed: {e:#}"),
    };
}

pub fn clear_upload(app: &mut App) {
    if app.orchestrator.clear_upload() {
        app.file_input.clear();
        app.status.clear();
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

pub fn handle_key(app: &mut App, key: KeyEvent, api: &Arc<dyn DiagramApi>, tx: &NetSender) -> Flow {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }
    match app.screen {
        Screen::Settings => handle_settings_key(app, key),
        Screen::Main => return handle_main_key(app, key, api, tx),
    }
    Flow::Continue
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_settings(),
        KeyCode::Enter => app.save_settings(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.settings_focus = match app.settings_focus {
                SettingsFocus::Provider => SettingsFocus::ApiKey,
                SettingsFocus::ApiKey => SettingsFocus::Provider,
            };
        }
        KeyCode::F(3) => app.show_key = !app.show_key,
        KeyCode::Up if app.settings_focus == SettingsFocus::Provider => {
            app.settings_provider_index = Provider::step(app.settings_provider_index, false);
        }
        KeyCode::Down if app.settings_focus == SettingsFocus::Provider => {
            app.settings_provider_index = Provider::step(app.settings_provider_index, true);
        }
        _ if app.settings_focus == SettingsFocus::ApiKey => {
            handle_text_input_key(&mut app.api_key_input, key, false);
        }
        _ => {}
    }
}

fn handle_main_key(app: &mut App, key: KeyEvent, api: &Arc<dyn DiagramApi>, tx: &NetSender) -> Flow {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Tab => app.cycle_focus(true),
        KeyCode::BackTab => app.cycle_focus(false),
        KeyCode::F(2) => app.toggle_input_tab(),
        KeyCode::F(4) => app.open_settings(),
        KeyCode::F(5) => start_generation(app, api, tx),
        KeyCode::Char('g') | KeyCode::Char('r') if ctrl => start_generation(app, api, tx),
        KeyCode::Char('d') if ctrl => download(app),
        KeyCode::Char('l') if ctrl => clear_upload(app),
        _ => match app.focus {
            Focus::Templates => match key.code {
                KeyCode::Up | KeyCode::Char('k') => app.select_template_offset(false),
                KeyCode::Down | KeyCode::Char('j') => app.select_template_offset(true),
                _ => {}
            },
            Focus::Provider => match key.code {
                KeyCode::Up | KeyCode::Char('k') => app.select_provider_offset(false),
                KeyCode::Down | KeyCode::Char('j') => app.select_provider_offset(true),
                _ => {}
            },
            Focus::Input => match app.orchestrator.input_tab() {
                InputTab::Paste => {
                    if handle_text_input_key(&mut app.content_input, key, true) {
                        app.commit_content();
                    }
                }
                InputTab::Upload => {
                    if key.code == KeyCode::Enter {
                        start_upload(app, api, tx);
                    } else {
                        handle_text_input_key(&mut app.file_input, key, false);
                    }
                }
            },
        },
    }
    Flow::Continue
}
