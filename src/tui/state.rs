use ratatui::widgets::ListState;
use std::path::PathBuf;

use crate::orchestrator::{InputTab, Orchestrator};
use crate::tui::input::TextInput;
use crate::tui::providers::Provider;

// ── Screens ───────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum Screen {
    Main,
    Settings,
}

// ── Focus ─────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum Focus {
    Templates,
    Input,
    Provider,
}

#[derive(Debug, PartialEq)]
pub enum SettingsFocus {
    Provider,
    ApiKey,
}

// ── App state ─────────────────────────────────────────────────────────────────

pub struct App {
    pub orchestrator: Orchestrator,
    pub screen: Screen,
    pub focus: Focus,
    pub template_list_state: ListState,
    /// Editor view of the orchestrator's content buffer.
    pub content_input: TextInput,
    /// Path typed on the upload tab.
    pub file_input: TextInput,
    /// `None` when the provider is an id outside [`Provider::all`].
    pub provider_index: Option<usize>,
    // settings screen
    pub settings_focus: SettingsFocus,
    pub settings_provider_index: Option<usize>,
    pub api_key_input: TextInput,
    pub show_key: bool,
    pub status: String,
    pub download_path: PathBuf,
    /// Advanced by the event loop; drives the spinner.
    pub tick: u64,
}

impl App {
    pub fn new(orchestrator: Orchestrator, download_path: PathBuf) -> Self {
        let mut app = App {
            orchestrator,
            screen: Screen::Main,
            focus: Focus::Templates,
            template_list_state: ListState::default(),
            content_input: TextInput::new(),
            file_input: TextInput::new(),
            provider_index: Some(0),
            settings_focus: SettingsFocus::Provider,
            settings_provider_index: Some(0),
            api_key_input: TextInput::new(),
            show_key: false,
            status: String::new(),
            download_path,
            tick: 0,
        };
        app.sync_from_orchestrator();
        app
    }

    /// Refreshes the widgets that mirror orchestrator state.
    pub fn sync_from_orchestrator(&mut self) {
        if self.content_input.value != self.orchestrator.content() {
            self.content_input.set(self.orchestrator.content());
        }
        let selected = self.orchestrator.selected_template_id().and_then(|id| {
            self.orchestrator.templates().iter().position(|t| t.id == id)
        });
        self.template_list_state.select(selected);
        self.provider_index = Provider::index_of(self.orchestrator.provider());
    }

    pub fn selected_provider(&self) -> Option<Provider> {
        self.provider_index.map(|i| Provider::all()[i])
    }

    pub fn select_template_offset(&mut self, forward: bool) {
        let count = self.orchestrator.templates().len();
        if count == 0 {
            return;
        }
        let current = self.template_list_state.selected().unwrap_or(0);
        let next = if forward {
            (current + 1).min(count - 1)
        } else {
            current.saturating_sub(1)
        };
        let id = self.orchestrator.templates()[next].id.clone();
        self.orchestrator.select_template(&id);
        self.template_list_state.select(Some(next));
    }

    pub fn select_provider_offset(&mut self, forward: bool) {
        let next = Provider::step(self.provider_index, forward);
        if next == self.provider_index {
            return;
        }
        self.provider_index = next;
        if let Some(provider) = self.selected_provider() {
            self.orchestrator.set_provider(provider.id());
        }
    }

    /// Pushes the editor text into the content buffer.
    pub fn commit_content(&mut self) {
        self.orchestrator.set_content(self.content_input.value.clone());
    }

    pub fn toggle_input_tab(&mut self) {
        let tab = match self.orchestrator.input_tab() {
            InputTab::Paste => InputTab::Upload,
            InputTab::Upload => InputTab::Paste,
        };
        self.orchestrator.set_input_tab(tab);
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        self.focus = match (&self.focus, forward) {
            (Focus::Templates, true) => Focus::Input,
            (Focus::Input, true) => Focus::Provider,
            (Focus::Provider, true) => Focus::Templates,
            (Focus::Templates, false) => Focus::Provider,
            (Focus::Input, false) => Focus::Templates,
            (Focus::Provider, false) => Focus::Input,
        };
    }

    // settings screen

    pub fn open_settings(&mut self) {
        let settings = self.orchestrator.settings();
        self.settings_provider_index = Provider::index_of(&settings.provider);
        self.api_key_input = TextInput::with_value(settings.api_key.clone());
        self.settings_focus = SettingsFocus::Provider;
        self.show_key = false;
        self.screen = Screen::Settings;
    }

    pub fn save_settings(&mut self) {
        let provider = match self.settings_provider_index {
            Some(i) => Provider::all()[i].id().to_string(),
            None => self.orchestrator.settings().provider.clone(),
        };
        let api_key = self.api_key_input.value.clone();
        self.orchestrator.save_settings(&provider, &api_key);
        self.sync_from_orchestrator();
        self.status = "✓ Settings saved for this session".to_string();
        self.screen = Screen::Main;
    }

    pub fn close_settings(&mut self) {
        self.api_key_input.clear();
        self.screen = Screen::Main;
    }
}
