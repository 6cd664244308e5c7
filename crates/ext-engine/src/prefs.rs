//! Per-extension auto-update preferences.
//!
//! Stored as JSON in the updater's own directory and written atomically.
//! Keys are the case-folded extension name, matching the case-insensitive
//! identity every lookup operation uses. (The system this replaces keyed the
//! map by exact-case name while looking everything else up
//! case-insensitively, so a preference stored for "Alpha" was invisible to a
//! lookup for "alpha"; that asymmetry is deliberately not reproduced.)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ENGINE_DIR_NAME;

/// File name of the preference store inside the updater directory.
pub const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsFile {
    #[serde(default)]
    auto_update: BTreeMap<String, bool>,
}

/// Read/write store for the auto-update flag per extension.
pub struct PreferenceStore {
    path: PathBuf,
    settings: SettingsFile,
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

impl PreferenceStore {
    /// Canonical store location under an extensions root.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(ENGINE_DIR_NAME).join(SETTINGS_FILENAME)
    }

    /// Load the store at `path`. A missing file means all-off defaults; an
    /// unreadable or corrupt file is logged and also treated as defaults
    /// rather than aborting the caller.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("corrupt preference store at {:?}: {}", path, e);
                    SettingsFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
            Err(e) => {
                tracing::warn!("unreadable preference store at {:?}: {}", path, e);
                SettingsFile::default()
            }
        };
        Self { path, settings }
    }

    /// Whether auto-update is enabled for `name`. Defaults to off.
    pub fn auto_update(&self, name: &str) -> bool {
        self.settings
            .auto_update
            .get(&fold(name))
            .copied()
            .unwrap_or(false)
    }

    /// Every stored flag, keyed by folded extension name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.settings
            .auto_update
            .iter()
            .map(|(name, enabled)| (name.as_str(), *enabled))
    }

    /// Set the auto-update flag for `name` and persist the store.
    pub fn set_auto_update(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.settings.auto_update.insert(fold(name), enabled);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let content = serde_json::to_vec_pretty(&self.settings)?;
        ext_fs::io::write_atomic(&self.path, &content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_defaults_to_off() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::load(dir.path().join("settings.json"));
        assert!(!store.auto_update("alpha"));
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = PreferenceStore::load(&path);
        store.set_auto_update("alpha", true).unwrap();
        assert!(store.auto_update("alpha"));

        let reloaded = PreferenceStore::load(&path);
        assert!(reloaded.auto_update("alpha"));
        assert!(!reloaded.auto_update("beta"));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = PreferenceStore::load(&path);
        store.set_auto_update("Alpha", true).unwrap();

        assert!(store.auto_update("alpha"));
        assert!(store.auto_update("ALPHA"));

        let reloaded = PreferenceStore::load(&path);
        assert!(reloaded.auto_update("aLpHa"));
    }

    #[test]
    fn corrupt_file_is_treated_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{definitely not json").unwrap();

        let store = PreferenceStore::load(&path);
        assert!(!store.auto_update("alpha"));
    }

    #[test]
    fn disabling_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = PreferenceStore::load(&path);
        store.set_auto_update("alpha", true).unwrap();
        store.set_auto_update("alpha", false).unwrap();

        let reloaded = PreferenceStore::load(&path);
        assert!(!reloaded.auto_update("alpha"));
    }

    #[test]
    fn default_path_lives_in_updater_directory() {
        let path = PreferenceStore::default_path(Path::new("/opt/extensions"));
        assert_eq!(
            path,
            Path::new("/opt/extensions").join(ENGINE_DIR_NAME).join(SETTINGS_FILENAME)
        );
    }
}
