//! User settings persisted across runs: mode, phase and email address
//!
//! Run state is never written here, so a fresh process always starts idle.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{Mode, Phase};

/// Persisted user choices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub email: Option<String>,
}

/// Reads and writes [`Settings`] as JSON. A store without a path keeps
/// everything in memory.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load settings, falling back to defaults when the file does not exist yet
    pub fn load(&self) -> crate::Result<Settings> {
        let Some(path) = &self.path else {
            return Ok(Settings::default());
        };
        if !path.exists() {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::SlotWatchError::Settings(format!("Failed to read {:?}: {}", path, e))
        })?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> crate::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, content).map_err(|e| {
            crate::SlotWatchError::Settings(format!("Failed to write {:?}: {}", path, e))
        })?;
        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}
