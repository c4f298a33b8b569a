//! Persisted tool settings
//!
//! Settings live in one relaxed-JSON file. Loading parses the file, fills
//! every gap from built-in defaults via [`apply_defaults`], then
//! deserializes the result, so hand-edited partial files and files written
//! by older versions keep working.

use crate::defaults::apply_defaults;
use crate::error::AppError;
use crate::fsutil;
use crate::logging::LoggingConfig;
use crate::selection::{ChoiceValue, SelectionOverride};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sources: SourcesConfig,
    pub cache: CacheConfig,
    pub install: InstallConfig,
    pub output: OutputConfig,
    /// Per-item selection overrides, keyed by item name
    pub selections: IndexMap<String, SelectionOverride>,
    pub logging: LoggingConfig,
}

/// Manifest sources, loaded in order: default, extras, then local files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Primary remote manifest source
    pub default: Option<String>,

    /// Additional remote manifest sources
    pub extra: Vec<String>,

    /// Directory of local manifest files
    pub local_dir: Option<PathBuf>,
}

impl SourcesConfig {
    /// Remote URLs in load order.
    pub fn remote_urls(&self) -> Vec<String> {
        self.default
            .iter()
            .chain(self.extra.iter())
            .cloned()
            .collect()
    }
}

/// Content cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; `_cache` under the tool data dir when unset
    pub root: Option<PathBuf>,
}

impl CacheConfig {
    pub fn resolved_root(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => data_dir().join("_cache"),
        }
    }
}

/// Install discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Candidate install roots; `%s` expands to the home directory
    pub roots: Vec<String>,

    /// Versioned directories must carry this name prefix
    pub version_prefix: String,

    /// File that must exist inside a version directory for it to count
    pub marker: Option<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            roots: crate::install::default_roots(),
            version_prefix: "version-".to_string(),
            marker: None,
        }
    }
}

/// Output placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the merged document, relative to each install directory
    pub settings_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("ClientSettings/ClientAppSettings.json"),
        }
    }
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "flagforge")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".flagforge"))
}

/// Default settings file location
pub fn default_settings_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "flagforge")
        .map(|dirs| dirs.config_dir().join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("flagforge-settings.json"))
}

impl Settings {
    /// Load settings from `path`, filling gaps from the built-in defaults.
    /// A missing file yields the defaults unchanged.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            info!(path = %path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }

        let text = fs::read_to_string(path)?;
        let parsed: Value = json5::from_str(&text).map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to parse settings {}: {}",
                path.display(),
                e
            ))
        })?;

        let canonical = serde_json::to_value(Settings::default())?;
        let filled = apply_defaults(&parsed, &canonical);
        let settings = serde_json::from_value(filled).map_err(|e| {
            AppError::ConfigError(format!("Invalid settings {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Persist settings as pretty JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fsutil::write_atomic(path, text.as_bytes())?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Record an enable/disable override for `item`.
    pub fn set_item_enabled(&mut self, item: &str, enabled: bool) {
        self.selections.entry(item.to_string()).or_default().enabled = Some(enabled);
    }

    /// Record a feature choice override for `item`.
    pub fn set_feature_choice(&mut self, item: &str, feature: &str, value: ChoiceValue) {
        self.selections
            .entry(item.to_string())
            .or_default()
            .features
            .insert(feature.to_string(), value);
    }
}
