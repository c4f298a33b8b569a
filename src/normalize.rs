//! Manifest normalization
//!
//! Turns a raw manifest into its resolved form: every file reference is
//! fetched through the content cache and replaced with a local path.
//! Resolution fans out concurrently across items, features, and options,
//! and fails fast on the first hard error.

use crate::cache::ContentCache;
use crate::error::ManifestError;
use crate::manifest::{Feature, FileRef, LoadedManifest, ManifestItem, ManifestSource};
use futures::future::try_join_all;
use indexmap::IndexMap;
use std::path::PathBuf;
use tracing::debug;

/// A manifest with every file reference resolved to a cache path
#[derive(Debug, Clone)]
pub struct NormalizedManifest {
    pub source: ManifestSource,
    pub items: IndexMap<String, NormalizedItem>,
}

#[derive(Debug, Clone)]
pub struct NormalizedItem {
    pub title: Option<String>,
    pub default_enabled: bool,
    /// Fragments included whenever the item is enabled
    pub files: Vec<PathBuf>,
    pub features: Vec<NormalizedFeature>,
}

#[derive(Debug, Clone)]
pub struct NormalizedFeature {
    pub name: String,
    /// Option name to resolved fragment paths, in declaration order
    pub options: IndexMap<String, Vec<PathBuf>>,
    pub kind: FeatureKind,
}

#[derive(Debug, Clone)]
pub enum FeatureKind {
    Single {
        default: Option<String>,
    },
    Multi {
        defaults: Vec<String>,
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl NormalizedFeature {
    pub fn is_multi(&self) -> bool {
        matches!(self.kind, FeatureKind::Multi { .. })
    }
}

/// Normalize one loaded manifest, resolving all file references through
/// `cache`.
pub async fn normalize(
    loaded: &LoadedManifest,
    cache: &ContentCache,
) -> Result<NormalizedManifest, ManifestError> {
    let source_name = loaded.source.to_string();
    let item_futures = loaded.manifest.iter().map(|(name, item)| {
        let source_name = source_name.as_str();
        async move {
            let normalized = normalize_item(name, item, cache, source_name).await?;
            Ok::<(String, NormalizedItem), ManifestError>((name.clone(), normalized))
        }
    });

    let items: IndexMap<String, NormalizedItem> =
        try_join_all(item_futures).await?.into_iter().collect();
    debug!(source = %loaded.source, items = items.len(), "manifest normalized");
    Ok(NormalizedManifest {
        source: loaded.source.clone(),
        items,
    })
}

async fn normalize_item(
    name: &str,
    item: &ManifestItem,
    cache: &ContentCache,
    source_name: &str,
) -> Result<NormalizedItem, ManifestError> {
    let files = resolve_refs(&item.files, &item.base_url, cache).await?;

    let feature_futures = item.features.iter().map(|feature| async move {
        if feature.name().is_empty() {
            return Err(ManifestError::Invalid {
                name: source_name.to_string(),
                reason: format!("feature with empty name in item '{name}'"),
            });
        }

        let option_futures = feature.options().iter().map(|(option, refs)| async move {
            let resolved = resolve_refs(refs, &item.base_url, cache).await?;
            Ok::<(String, Vec<PathBuf>), ManifestError>((option.clone(), resolved))
        });
        let options: IndexMap<String, Vec<PathBuf>> =
            try_join_all(option_futures).await?.into_iter().collect();

        let kind = match feature {
            Feature::Single(f) => FeatureKind::Single {
                default: f.default.clone(),
            },
            Feature::Multi(f) => FeatureKind::Multi {
                defaults: f.default.clone(),
                min: f.min,
                max: f.max,
            },
        };
        Ok(NormalizedFeature {
            name: feature.name().to_string(),
            options,
            kind,
        })
    });
    let features = try_join_all(feature_futures).await?;

    Ok(NormalizedItem {
        title: item.title.clone(),
        default_enabled: item.default,
        files,
        features,
    })
}

async fn resolve_refs(
    refs: &[FileRef],
    base_url: &str,
    cache: &ContentCache,
) -> Result<Vec<PathBuf>, ManifestError> {
    let futures = refs.iter().map(|file| cache.resolve(file, base_url));
    Ok(try_join_all(futures).await?)
}

/// For each item name across `manifests`, the index of the manifest whose
/// declaration wins: the last one that declares it.
pub fn item_winners(manifests: &[NormalizedManifest]) -> std::collections::HashMap<&str, usize> {
    let mut winners = std::collections::HashMap::new();
    for (idx, manifest) in manifests.iter().enumerate() {
        for name in manifest.items.keys() {
            winners.insert(name.as_str(), idx);
        }
    }
    winners
}
