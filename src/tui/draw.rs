use ratatui::{
    backend::TestBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::orchestrator::{GenerationState, InputTab};
use crate::tui::providers::Provider;
use crate::tui::state::{App, Focus, Screen, SettingsFocus};
use crate::upload::UploadState;

const BG: Color = Color::Rgb(15, 15, 25);
const BORDER: Color = Color::Rgb(50, 50, 80);
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// ── Drawing ───────────────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    f.render_widget(Block::default().style(Style::default().bg(BG)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    draw_header(f, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    draw_left_panel(f, body[0], app);
    draw_result(f, body[1], app);

    draw_footer(f, chunks[2], app);

    if app.screen == Screen::Settings {
        draw_settings(f, area, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ◆ ", Style::default().fg(Color::Cyan)),
        Span::styled("Diagram Forge", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled("  v", Style::default().fg(Color::DarkGray)),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(BORDER)));
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let text = if !app.status.is_empty() {
        format!(" {} ", app.status)
    } else {
        match app.screen {
            Screen::Main => " Tab Focus   F2 Paste/Upload   F4 Settings   F5 Generate   ^R Regenerate   ^D Download   ^L Clear upload   Esc Quit ".to_string(),
            Screen::Settings => " ↑↓ Provider   Tab Field   F3 Show key   Enter Save   Esc Cancel ".to_string(),
        }
    };
    let footer = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray).bg(BG))
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn panel<'a>(title: &'a str, focused: bool) -> Block<'a> {
    let color = if focused { Color::Cyan } else { BORDER };
    Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

// ── Left panel: templates, input, provider ────────────────────────────────────

fn draw_left_panel(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    draw_templates(f, rows[0], app);
    match app.orchestrator.input_tab() {
        InputTab::Paste => draw_paste(f, rows[1], app),
        InputTab::Upload => draw_upload(f, rows[1], app),
    }

    let label = match app.selected_provider() {
        Some(provider) => provider.label().to_string(),
        None => app.orchestrator.provider().to_string(),
    };
    let mut spans = vec![Span::styled(format!("◀ {label} ▶"), Style::default().fg(Color::White))];
    if app.selected_provider() == Some(Provider::Auto) {
        let resolved = app.orchestrator.resolved_provider();
        spans.push(Span::styled(format!("  → {resolved}"), Style::default().fg(Color::DarkGray)));
    }
    let widget = Paragraph::new(Line::from(spans)).block(panel(" Provider ", app.focus == Focus::Provider));
    f.render_widget(widget, rows[2]);
}

fn draw_templates(f: &mut Frame, area: Rect, app: &mut App) {
    let block = panel(" Templates ", app.focus == Focus::Templates);
    if app.orchestrator.templates().is_empty() {
        let text = if app.orchestrator.templates_loading() {
            "Loading templates…"
        } else {
            "No templates available"
        };
        let widget = Paragraph::new(text).style(Style::default().fg(Color::DarkGray)).block(block);
        f.render_widget(widget, area);
        return;
    }

    let items: Vec<ListItem> = app
        .orchestrator
        .templates()
        .iter()
        .map(|t| {
            ListItem::new(vec![
                Line::from(Span::styled(t.name.clone(), Style::default().fg(Color::White))),
                Line::from(Span::styled(format!("  {}", t.description), Style::default().fg(Color::DarkGray))),
            ])
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Rgb(30, 40, 70)).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut app.template_list_state);
}

fn draw_paste(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let block = panel(" Input · [Paste] Upload ", focused);
    let lines: Vec<Line> = if app.content_input.value.is_empty() && !focused {
        vec![Line::from(Span::styled(
            "Paste or type the content to diagram…",
            Style::default().fg(Color::DarkGray),
        ))]
    } else if focused {
        let (before, at, after) = app.content_input.split_at_cursor();
        cursor_lines(before, at, after)
    } else {
        app.content_input.value.lines().map(|l| Line::from(l.to_string())).collect()
    };

    let inner_height = area.height.saturating_sub(2);
    let scroll = app.content_input.cursor_line().saturating_sub(inner_height.saturating_sub(1));
    let widget = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(widget, area);
}

/// Splits text around the cursor into lines with the cursor cell highlighted.
fn cursor_lines<'a>(before: &'a str, at: &'a str, after: &'a str) -> Vec<Line<'a>> {
    let cursor_style = Style::default().bg(Color::White).fg(Color::Black);
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    push_text(before, &mut lines, &mut current);
    if at == "\n" {
        current.push(Span::styled(" ", cursor_style));
        lines.push(Line::from(std::mem::take(&mut current)));
    } else {
        current.push(Span::styled(at, cursor_style));
    }
    push_text(after, &mut lines, &mut current);
    lines.push(Line::from(current));
    lines
}

fn push_text<'a>(text: &'a str, lines: &mut Vec<Line<'a>>, current: &mut Vec<Span<'a>>) {
    let mut parts = text.split('\n');
    if let Some(first) = parts.next() {
        current.push(Span::raw(first));
    }
    for part in parts {
        lines.push(Line::from(std::mem::take(current)));
        current.push(Span::raw(part));
    }
}

fn draw_upload(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let block = panel(" Input · Paste [Upload] ", focused);
    let (before, at, after) = app.file_input.split_at_cursor();
    let path_line = if focused {
        Line::from(vec![
            Span::styled("File: ", Style::default().fg(Color::DarkGray)),
            Span::raw(before),
            Span::styled(at, Style::default().bg(Color::White).fg(Color::Black)),
            Span::raw(after),
        ])
    } else {
        Line::from(vec![
            Span::styled("File: ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.file_input.value.as_str()),
        ])
    };

    let status = match app.orchestrator.upload() {
        UploadState::Idle => Line::from(Span::styled(
            "PDF, DOCX or Markdown · Enter to upload",
            Style::default().fg(Color::DarkGray),
        )),
        UploadState::Uploading { filename } => Line::from(Span::styled(
            format!("{} Extracting {filename}…", spinner(app)),
            Style::default().fg(Color::Yellow),
        )),
        UploadState::Done { filename } => Line::from(Span::styled(
            format!("✓ {filename} · ^L to clear"),
            Style::default().fg(Color::Green),
        )),
        UploadState::Error { filename, message } => Line::from(Span::styled(
            format!("✗ {filename}: {message} · ^L to clear"),
            Style::default().fg(Color::Red),
        )),
    };

    let widget = Paragraph::new(vec![path_line, Line::from(""), status])
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn spinner(app: &App) -> &'static str {
    SPINNER[(app.tick as usize) % SPINNER.len()]
}

// ── Right panel: generation state ─────────────────────────────────────────────

fn draw_result(f: &mut Frame, area: Rect, app: &App) {
    let block = panel(" Diagram ", false);
    let muted = Style::default().fg(Color::DarkGray);
    let lines: Vec<Line> = match app.orchestrator.generation() {
        GenerationState::Initial => vec![
            Line::from(Span::styled("Ready to Forge", Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(Span::styled(
                "Select a template, paste your content, and press F5 to create a diagram.",
                muted,
            )),
        ],
        GenerationState::Generating => vec![
            Line::from(Span::styled(
                format!("{} Generating diagram…", spinner(app)),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("Provider: {}", app.orchestrator.resolved_provider()),
                muted,
            )),
        ],
        GenerationState::Success => match app.orchestrator.last_result() {
            Some(result) => vec![
                Line::from(Span::styled("✓ Diagram ready", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from(result.summary()),
                Line::from(Span::styled(
                    format!("Image: {} bytes (base64)", result.image_base64.len()),
                    muted,
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("^D save to {}   ^R regenerate", app.download_path.display()),
                    muted,
                )),
            ],
            None => vec![Line::from("✓ Diagram ready")],
        },
        GenerationState::Error { message } => vec![
            Line::from(Span::styled("✗ Generation failed", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled("Fix the input and press F5 to try again.", muted)),
        ],
    };
    let widget = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);
    f.render_widget(widget, area);
}

// ── Settings overlay ──────────────────────────────────────────────────────────

fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    // an id outside the built-in list gets its own row
    let custom = match app.settings_provider_index {
        Some(_) => None,
        None => Some(app.orchestrator.settings().provider.clone()),
    };
    let rows_needed = Provider::all().len() as u16 + u16::from(custom.is_some());
    let width = area.width.min(60);
    let height = area.height.min(rows_needed + 10);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    f.render_widget(Clear, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(rows_needed + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(popup);

    let mut items: Vec<ListItem> = Provider::all()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let marker = if app.settings_provider_index == Some(i) { "● " } else { "○ " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::raw(p.label().to_string()),
            ]))
        })
        .collect();
    if let Some(id) = &custom {
        items.push(ListItem::new(Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("{id} (custom)")),
        ])));
    }
    let list = List::new(items)
        .block(panel(" AI Provider ", app.settings_focus == SettingsFocus::Provider))
        .style(Style::default().bg(BG));
    f.render_widget(list, rows[0]);

    let key_text = if app.show_key {
        app.api_key_input.value.clone()
    } else {
        app.api_key_input.masked()
    };
    let key_line = if key_text.is_empty() {
        Line::from(Span::styled("Enter your API key", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(key_text)
    };
    let key = Paragraph::new(key_line)
        .style(Style::default().bg(BG))
        .block(panel(" API Key ", app.settings_focus == SettingsFocus::ApiKey));
    f.render_widget(key, rows[1]);

    let hint = match app.settings_provider_index {
        Some(i) => Provider::all()[i].description().to_string(),
        None => "Sent to the backend as typed".to_string(),
    };
    let note = Paragraph::new(vec![
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
            "Kept for this session only; sent only with generate requests.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .style(Style::default().bg(BG))
    .wrap(Wrap { trim: true });
    f.render_widget(note, rows[2]);
}

/// Renders the current app state into an off-screen buffer of the given size.
pub fn render_to_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("TestBackend terminal");
    terminal.draw(|f| draw(f, app)).expect("draw");
    terminal.backend().buffer().clone()
}
