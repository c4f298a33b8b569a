//! Selection state over normalized manifests
//!
//! Normalized manifests stay immutable. Which items are enabled and which
//! feature options are chosen lives here, keyed by manifest position and
//! item name. Defaults come from the manifests themselves, overrides from
//! persisted settings.

use crate::normalize::{item_winners, FeatureKind, NormalizedManifest};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Chosen value(s) for one feature
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSelection {
    Single(Option<String>),
    Multi(Vec<String>),
}

/// Persisted override for one item, keyed by item name in settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub features: IndexMap<String, ChoiceValue>,
}

/// A persisted choice: one option name, or several for multi-choice
/// features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    One(String),
    Many(Vec<String>),
}

/// Mutable selection state, separate from the manifests it describes
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    enabled: HashMap<(usize, String), bool>,
    choices: HashMap<(usize, String, String), FeatureSelection>,
}

impl SelectionState {
    /// Seed state from manifest defaults: item enablement and feature
    /// default selections.
    pub fn defaults_for(manifests: &[NormalizedManifest]) -> Self {
        let mut state = Self::default();
        for (idx, manifest) in manifests.iter().enumerate() {
            for (item_name, item) in &manifest.items {
                state
                    .enabled
                    .insert((idx, item_name.clone()), item.default_enabled);
                for feature in &item.features {
                    let selection = match &feature.kind {
                        FeatureKind::Single { default } => {
                            FeatureSelection::Single(default.clone())
                        }
                        FeatureKind::Multi { defaults, .. } => {
                            FeatureSelection::Multi(defaults.clone())
                        }
                    };
                    state
                        .choices
                        .insert((idx, item_name.clone(), feature.name.clone()), selection);
                }
            }
        }
        state
    }

    pub fn is_enabled(&self, manifest_idx: usize, item: &str) -> Option<bool> {
        self.enabled
            .get(&(manifest_idx, item.to_string()))
            .copied()
    }

    pub fn set_enabled(&mut self, manifest_idx: usize, item: &str, enabled: bool) {
        self.enabled
            .insert((manifest_idx, item.to_string()), enabled);
    }

    pub fn selection(
        &self,
        manifest_idx: usize,
        item: &str,
        feature: &str,
    ) -> Option<&FeatureSelection> {
        self.choices
            .get(&(manifest_idx, item.to_string(), feature.to_string()))
    }

    pub fn set_selection(
        &mut self,
        manifest_idx: usize,
        item: &str,
        feature: &str,
        selection: FeatureSelection,
    ) {
        self.choices.insert(
            (manifest_idx, item.to_string(), feature.to_string()),
            selection,
        );
    }

    /// Apply persisted overrides on top of defaults.
    ///
    /// Overrides are keyed by item name and land on the manifest whose
    /// declaration of that item wins. Overrides naming unknown items or
    /// features are skipped with a warning; stale option values are left
    /// for the merge to report.
    pub fn apply_overrides(
        &mut self,
        manifests: &[NormalizedManifest],
        overrides: &IndexMap<String, SelectionOverride>,
    ) {
        let winners = item_winners(manifests);
        for (item_name, item_override) in overrides {
            let Some(&idx) = winners.get(item_name.as_str()) else {
                warn!(item = %item_name, "selection override names an unknown item");
                continue;
            };

            if let Some(enabled) = item_override.enabled {
                self.set_enabled(idx, item_name, enabled);
            }

            let item = &manifests[idx].items[item_name];
            for (feature_name, value) in &item_override.features {
                let Some(feature) = item.features.iter().find(|f| &f.name == feature_name)
                else {
                    warn!(
                        item = %item_name,
                        feature = %feature_name,
                        "selection override names an unknown feature"
                    );
                    continue;
                };

                let selection = match (&feature.kind, value) {
                    (FeatureKind::Single { .. }, ChoiceValue::One(v)) => {
                        FeatureSelection::Single(Some(v.clone()))
                    }
                    (FeatureKind::Multi { .. }, ChoiceValue::Many(vs)) => {
                        FeatureSelection::Multi(vs.clone())
                    }
                    // a lone string on a multi-choice feature reads as one
                    // selected value
                    (FeatureKind::Multi { .. }, ChoiceValue::One(v)) => {
                        FeatureSelection::Multi(vec![v.clone()])
                    }
                    (FeatureKind::Single { .. }, ChoiceValue::Many(_)) => {
                        warn!(
                            item = %item_name,
                            feature = %feature_name,
                            "list value on a single-choice feature, skipping override"
                        );
                        continue;
                    }
                };
                self.set_selection(idx, item_name, feature_name, selection);
            }
        }
    }
}
