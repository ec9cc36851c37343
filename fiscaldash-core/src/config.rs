//! Configuration management
//!
//! Settings live in `settings.json` inside the application directory:
//! ```json
//! {
//!   "dashboard": {
//!     "dataFolder": "/data/notas-fiscais/2025",
//!     "topCodes": 10,
//!     "extraColumns": { "taxValue": ["Total ICMS"] }
//!   }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{ColumnCandidates, SemanticField};

/// Number of codes shown in the top-codes view unless configured
pub const DEFAULT_TOP_CODES: usize = 10;

/// Environment variable overriding the configured data folder
pub const DATA_FOLDER_ENV: &str = "FISCALDASH_DATA_FOLDER";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    dashboard: DashboardSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_folder: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    top_codes: Option<usize>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    extra_columns: HashMap<SemanticField, Vec<String>>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Dashboard configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder scanned for spreadsheets; `None` means the caller's default
    pub data_folder: Option<PathBuf>,
    pub top_codes: usize,
    /// Additional candidate column names per field, after the built-ins
    pub extra_columns: HashMap<SemanticField, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_folder: None,
            top_codes: DEFAULT_TOP_CODES,
            extra_columns: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from the application directory
    ///
    /// The data folder can be overridden with `FISCALDASH_DATA_FOLDER`.
    /// A malformed settings file falls back to defaults.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let raw = read_settings(app_dir)?;

        let data_folder = env_data_folder().or_else(|| raw.dashboard.data_folder.clone());

        Ok(Self {
            data_folder,
            top_codes: raw
                .dashboard
                .top_codes
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_TOP_CODES),
            extra_columns: raw.dashboard.extra_columns,
        })
    }

    /// Save config to the application directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let settings_path = app_dir.join("settings.json");
        let mut settings = read_settings(app_dir)?;

        // An environment override is not persisted
        if self.data_folder != env_data_folder() {
            settings.dashboard.data_folder = self.data_folder.clone();
        }
        settings.dashboard.top_codes = Some(self.top_codes);
        settings.dashboard.extra_columns = self.extra_columns.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    pub fn set_data_folder(&mut self, folder: impl Into<PathBuf>) {
        self.data_folder = Some(folder.into());
    }

    pub fn set_top_codes(&mut self, top_codes: usize) {
        self.top_codes = top_codes.max(1);
    }

    /// Built-in candidate columns extended with the configured extras
    pub fn column_candidates(&self) -> ColumnCandidates {
        let mut candidates = ColumnCandidates::default();
        for field in SemanticField::ALL {
            if let Some(extra) = self.extra_columns.get(&field) {
                candidates.extend(field, extra.iter().cloned());
            }
        }
        candidates
    }
}

fn env_data_folder() -> Option<PathBuf> {
    std::env::var(DATA_FOLDER_ENV)
        .ok()
        .filter(|folder| !folder.trim().is_empty())
        .map(PathBuf::from)
}

fn read_settings(app_dir: &Path) -> Result<SettingsFile> {
    let settings_path = app_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
