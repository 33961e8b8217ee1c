use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::warn;

use crate::error::{DashboardError, Result};

pub const LANGUAGE_KEY: &str = "language";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Flat string key-value storage for user preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences persisted as a JSON object of strings. Every `set` rewrites
/// the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// A missing file is an empty store. An unreadable one is logged and
    /// treated as empty so defaults apply.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt preferences at '{}': {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read preferences at '{}': {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.values)
            .map_err(|e| DashboardError::Preferences(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    Pt,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Language::En),
            "pt" => Ok(Language::Pt),
            other => Err(DashboardError::Preferences(format!("unsupported language '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub language: Language,
    pub dark_mode: bool,
}

impl Preferences {
    /// Absent or unparsable keys fall back to defaults.
    pub fn load(store: &impl PreferenceStore) -> Self {
        let mut prefs = Self::default();
        if let Some(raw) = store.get(LANGUAGE_KEY) {
            match raw.parse() {
                Ok(lang) => prefs.language = lang,
                Err(e) => warn!("{}", e),
            }
        }
        if let Some(raw) = store.get(DARK_MODE_KEY) {
            match raw.trim().parse::<bool>() {
                Ok(dark) => prefs.dark_mode = dark,
                Err(_) => warn!("Ignoring invalid {} value '{}'", DARK_MODE_KEY, raw),
            }
        }
        prefs
    }

    pub fn set_language(&mut self, store: &mut impl PreferenceStore, language: Language) -> Result<()> {
        store.set(LANGUAGE_KEY, language.as_str())?;
        self.language = language;
        Ok(())
    }

    pub fn toggle_dark_mode(&mut self, store: &mut impl PreferenceStore) -> Result<bool> {
        let next = !self.dark_mode;
        store.set(DARK_MODE_KEY, if next { "true" } else { "false" })?;
        self.dark_mode = next;
        Ok(next)
    }
}
