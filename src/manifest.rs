//! Flag-list manifest model
//!
//! A manifest maps item names to flag-list items: groups of downloadable
//! config fragments plus optional selectable features. Manifests arrive
//! from remote sources or local files in one of several dialects; see
//! [`dialect`] for parsing and [`loader`] for source handling.

pub mod dialect;
pub mod loader;

use crate::hashing::HashAlgorithm;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Parsed manifest: item name to item, in document order
pub type Manifest = IndexMap<String, ManifestItem>;

/// Where a manifest was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Remote(String),
    Local(PathBuf),
}

impl ManifestSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, ManifestSource::Remote(_))
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::Remote(url) => f.write_str(url),
            ManifestSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A manifest together with the source it came from
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub source: ManifestSource,
    pub manifest: Manifest,
}

/// One named item in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestItem {
    /// Human-readable title shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Prefix every file path in this item is appended to
    pub base_url: String,

    /// Whether the item starts enabled
    #[serde(default)]
    pub default: bool,

    /// Fragments included whenever the item is enabled
    #[serde(default)]
    pub files: Vec<FileRef>,

    /// Selectable feature groups
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// Reference to one downloadable config fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    /// Path appended to the item base URL, verbatim
    pub path: String,
    pub hash: FileHash,
}

/// Digest declaration attached to a file reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHash {
    pub algorithm: HashAlgorithm,
    #[serde(default)]
    pub digest: Option<String>,
}

/// A selectable feature group inside an item
///
/// Two shapes share one schema. A string `default` (or no distinguishing
/// field at all) marks a single-choice group; an array `default` or the
/// presence of `min`/`max` marks a multi-choice group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Feature {
    Single(SingleFeature),
    Multi(MultiFeature),
}

/// Single-choice feature: at most one option contributes files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleFeature {
    pub name: String,
    pub options: IndexMap<String, Vec<FileRef>>,
    #[serde(default)]
    pub default: Option<String>,
}

/// Multi-choice feature: any number of options contribute files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiFeature {
    pub name: String,
    pub options: IndexMap<String, Vec<FileRef>>,
    #[serde(default)]
    pub default: Vec<String>,
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

impl Feature {
    pub fn name(&self) -> &str {
        match self {
            Feature::Single(f) => &f.name,
            Feature::Multi(f) => &f.name,
        }
    }

    pub fn options(&self) -> &IndexMap<String, Vec<FileRef>> {
        match self {
            Feature::Single(f) => &f.options,
            Feature::Multi(f) => &f.options,
        }
    }
}
