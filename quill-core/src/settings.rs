//! Key-value settings store for the credential and drafting instructions.
//!
//! A small JSON file that survives across runs. The store is handed to the
//! controller explicitly; nothing reads it through globals. Writes persist
//! immediately, matching the save-on-edit behavior of the settings UI this
//! replaces.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::prompt::DEFAULT_INSTRUCTIONS;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct StoredSettings {
    api_key: String,
    instructions: Option<String>,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StoredSettings>,
}

impl SettingsStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            // Corrupt settings degrade to defaults rather than blocking the tool.
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            StoredSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// The stored credential, falling back to `OPENAI_API_KEY` when unset.
    pub fn api_key(&self) -> String {
        let stored = self.data.read().unwrap().api_key.clone();
        if !stored.trim().is_empty() {
            return stored;
        }
        std::env::var("OPENAI_API_KEY").unwrap_or_default()
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.api_key = key.trim().to_string();
        self.persist(&guard)
    }

    /// Saved instructions, or the bundled default when none were saved.
    pub fn instructions_or_default(&self) -> String {
        self.data
            .read()
            .unwrap()
            .instructions
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string())
    }

    /// True when the user has saved their own instructions.
    pub fn has_custom_instructions(&self) -> bool {
        self.data.read().unwrap().instructions.is_some()
    }

    pub fn set_instructions(&self, text: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.instructions = Some(text.to_string());
        self.persist(&guard)
    }

    /// Restore the bundled default instructions and persist them.
    pub fn reset_instructions(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.instructions = None;
        self.persist(&guard)
    }

    fn persist(&self, data: &StoredSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quill-settings-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn round_trips_key_and_instructions() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::load(&path).unwrap();
        store.set_api_key("sk-abc123").unwrap();
        store.set_instructions("keep it short").unwrap();

        let reloaded = SettingsStore::load(&path).unwrap();
        assert_eq!(reloaded.api_key(), "sk-abc123");
        assert_eq!(reloaded.instructions_or_default(), "keep it short");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = temp_path("missing");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::load(&path).unwrap();
        assert!(!store.has_custom_instructions());
        assert_eq!(store.instructions_or_default(), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn corrupt_file_degrades_to_defaults() {
        let path = temp_path("corrupt");
        fs::write(&path, "not json {{{").unwrap();

        let store = SettingsStore::load(&path).unwrap();
        assert!(store.data.read().unwrap().api_key.is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn reset_restores_the_bundled_default() {
        let path = temp_path("reset");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::load(&path).unwrap();
        store.set_instructions("custom").unwrap();
        assert!(store.has_custom_instructions());

        store.reset_instructions().unwrap();
        assert!(!store.has_custom_instructions());
        assert_eq!(store.instructions_or_default(), DEFAULT_INSTRUCTIONS);

        let _ = fs::remove_file(&path);
    }
}
