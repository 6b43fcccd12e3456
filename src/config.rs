use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::storage::{self, KeyValueStore, StorageError, SETTINGS_KEY, THEME_KEY};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub history_limit: usize,
    pub autosave_delay_ms: u64,
    pub status_duration_ms: u64,
    pub print_delay_ms: u64,
    pub preview_chars: usize,
    pub new_note_title: String,
    pub untitled_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_delay_ms: 1000,
            status_duration_ms: 2000,
            print_delay_ms: 300,
            preview_chars: 30,
            new_note_title: "Untitled Note".to_string(),
            untitled_title: "Untitled".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings, falling back to defaults when absent or unreadable.
    pub fn load(store: &impl KeyValueStore) -> Self {
        match storage::read_json::<Settings>(store, SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => Self::default(),
            Err(err) => {
                tracing::warn!(%err, "ignoring stored settings");
                Self::default()
            }
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn status_duration(&self) -> Duration {
        Duration::from_millis(self.status_duration_ms)
    }

    pub fn print_delay(&self) -> Duration {
        Duration::from_millis(self.print_delay_ms)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// The theme is stored as a bare string, not JSON.
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.read(THEME_KEY) {
            Ok(raw) => raw.as_deref().and_then(Self::parse).unwrap_or_default(),
            Err(err) => {
                tracing::warn!(%err, "theme unavailable");
                Self::default()
            }
        }
    }

    pub fn save(self, store: &mut impl KeyValueStore) -> Result<(), StorageError> {
        store.write(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
