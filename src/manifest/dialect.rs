//! Manifest dialect detection and parsing
//!
//! Three dialects are accepted: strict JSON (`.json`), TOML (`.toml`),
//! and relaxed JSON for everything else, including all remote sources.
//! The relaxed dialect tolerates comments, trailing commas, and unquoted
//! keys.

use crate::error::ManifestError;
use crate::manifest::Manifest;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestDialect {
    Json,
    Toml,
    Json5,
}

impl ManifestDialect {
    /// Dialect for a local manifest file, chosen by extension.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestDialect::Json,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ManifestDialect::Toml,
            _ => ManifestDialect::Json5,
        }
    }

    /// Parse `text` as a manifest. `name` labels the source in errors.
    pub fn parse(&self, name: &str, text: &str) -> Result<Manifest, ManifestError> {
        let parsed: Result<Manifest, String> = match self {
            ManifestDialect::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            ManifestDialect::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            ManifestDialect::Json5 => json5::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ManifestError::Parse {
            name: name.to_string(),
            message,
        })
    }
}
