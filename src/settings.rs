//! Session-scoped provider and credential settings.
//!
//! Nothing here touches disk or the network: the backing [`SessionStorage`]
//! lives as long as the session that owns it and takes the values with it.

use std::collections::HashMap;
use std::fmt;

use crate::models::redact;

pub const PROVIDER_KEY: &str = "df_provider";
pub const API_KEY_KEY: &str = "df_api_key";
pub const AUTO_PROVIDER: &str = "auto";

// ── Storage backend ───────────────────────────────────────────────────────────

/// Key-value storage with session lifetime.
pub trait SessionStorage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn clear(&mut self);
}

/// In-memory session storage, dropped with the session.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage, e.g. values handed over from CLI flags.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl SessionStorage for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq)]
pub struct Settings {
    pub provider: String,
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: AUTO_PROVIDER.to_string(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

pub struct SettingsStore {
    storage: Box<dyn SessionStorage>,
    current: Settings,
}

impl SettingsStore {
    /// Reads both keys from `storage`; missing or empty values take the defaults.
    pub fn load(storage: Box<dyn SessionStorage>) -> Self {
        let defaults = Settings::default();
        let provider = storage
            .get(PROVIDER_KEY)
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.provider);
        let api_key = storage.get(API_KEY_KEY).unwrap_or(defaults.api_key);
        Self {
            storage,
            current: Settings { provider, api_key },
        }
    }

    pub fn in_memory() -> Self {
        Self::load(Box::new(MemorySession::new()))
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }

    /// Writes both fields to storage and to the in-memory copy in one step.
    pub fn save(&mut self, provider: &str, api_key: &str) {
        self.storage.set(PROVIDER_KEY, provider);
        self.storage.set(API_KEY_KEY, api_key);
        self.current = Settings {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
        };
        tracing::debug!(settings = ?self.current, "settings saved");
    }

    /// Ends the session: storage is emptied and defaults come back.
    pub fn reset(&mut self) {
        self.storage.clear();
        self.current = Settings::default();
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore").field("current", &self.current).finish()
    }
}
