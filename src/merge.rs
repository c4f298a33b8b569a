//! Selection merge engine
//!
//! Walks normalized manifests in load order, collects the fragment paths
//! every enabled item contributes, then folds the fragments into a single
//! document by shallow top-level merge with later fragments winning.

use crate::error::MergeError;
use crate::normalize::{item_winners, FeatureKind, NormalizedManifest};
use crate::selection::{FeatureSelection, SelectionState};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Collect fragment paths for every enabled item, in deterministic order:
/// manifests in load order, items in declaration order, base files before
/// feature files, features and options in declaration order.
///
/// When several manifests declare the same item name only the last
/// declaration contributes. Single-choice features with no usable value
/// contribute nothing; a multi-choice selection naming an option the
/// manifest does not declare is an error.
pub fn resolve_files(
    manifests: &[NormalizedManifest],
    selection: &SelectionState,
) -> Result<Vec<PathBuf>, MergeError> {
    let winners = item_winners(manifests);
    let mut files = Vec::new();

    for (idx, manifest) in manifests.iter().enumerate() {
        for (item_name, item) in &manifest.items {
            if winners.get(item_name.as_str()) != Some(&idx) {
                debug!(
                    item = %item_name,
                    source = %manifest.source,
                    "item shadowed by a later manifest"
                );
                continue;
            }

            let enabled = selection
                .is_enabled(idx, item_name)
                .unwrap_or(item.default_enabled);
            if !enabled {
                continue;
            }

            files.extend(item.files.iter().cloned());

            for feature in &item.features {
                let fallback;
                let effective = match selection.selection(idx, item_name, &feature.name) {
                    Some(sel) => sel,
                    None => {
                        fallback = default_selection(&feature.kind);
                        &fallback
                    }
                };

                match effective {
                    FeatureSelection::Single(Some(value)) if !value.is_empty() => {
                        match feature.options.get(value) {
                            Some(paths) => files.extend(paths.iter().cloned()),
                            None => debug!(
                                item = %item_name,
                                feature = %feature.name,
                                value = %value,
                                "selected option not declared, skipping"
                            ),
                        }
                    }
                    FeatureSelection::Single(_) => {}
                    FeatureSelection::Multi(values) => {
                        for value in values {
                            let paths = feature.options.get(value).ok_or_else(|| {
                                MergeError::UnknownSelection {
                                    item: item_name.clone(),
                                    feature: feature.name.clone(),
                                    value: value.clone(),
                                }
                            })?;
                            files.extend(paths.iter().cloned());
                        }
                    }
                }
            }
        }
    }
    Ok(files)
}

fn default_selection(kind: &FeatureKind) -> FeatureSelection {
    match kind {
        FeatureKind::Single { default } => FeatureSelection::Single(default.clone()),
        FeatureKind::Multi { defaults, .. } => FeatureSelection::Multi(defaults.clone()),
    }
}

/// Parse each fragment and fold them into one document.
///
/// The merge is shallow: top-level keys only, later fragments overriding
/// earlier ones wholesale. Key order in the result is first occurrence
/// across the fold.
pub fn merge_fragments(paths: &[PathBuf]) -> Result<Value, MergeError> {
    let mut merged = serde_json::Map::new();
    for path in paths {
        let value = read_fragment(path)?;
        let Value::Object(map) = value else {
            return Err(MergeError::FragmentNotObject(path.clone()));
        };
        for (key, value) in map {
            merged.insert(key, value);
        }
    }
    debug!(fragments = paths.len(), keys = merged.len(), "fragments merged");
    Ok(Value::Object(merged))
}

/// Parse each fragment and return it keyed by its path, unmerged.
/// Missing fragments fail the same way they do in [`merge_fragments`].
pub fn dump_fragments(paths: &[PathBuf]) -> Result<IndexMap<String, Value>, MergeError> {
    let mut out = IndexMap::new();
    for path in paths {
        let value = read_fragment(path)?;
        out.insert(path.display().to_string(), value);
    }
    Ok(out)
}

fn read_fragment(path: &Path) -> Result<Value, MergeError> {
    if !path.exists() {
        return Err(MergeError::MissingFragment(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    json5::from_str(&text).map_err(|e| MergeError::FragmentParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
