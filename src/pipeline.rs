//! End-to-end preprocessing pipeline
//!
//! Ties the stages together: load manifests from every configured source,
//! normalize them through the content cache, apply persisted selections,
//! resolve and merge fragments, and place the result into each discovered
//! install directory.

use crate::cache::ContentCache;
use crate::error::AppError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::install;
use crate::manifest::loader::ManifestLoader;
use crate::merge;
use crate::normalize::{self, item_winners, NormalizedManifest};
use crate::selection::SelectionState;
use crate::settings::Settings;
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Pipeline over one settings document and one transport
pub struct Pipeline {
    settings: Settings,
    fetcher: Arc<dyn Fetcher>,
    cache: ContentCache,
    offline: bool,
}

/// What an apply run did, or would have done for a dry run
#[derive(Debug)]
pub struct ApplySummary {
    pub manifests: usize,
    pub enabled_items: Vec<String>,
    pub fragments: Vec<PathBuf>,
    pub document: Value,
    pub targets: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub dry_run: bool,
}

impl Pipeline {
    pub fn new(settings: Settings, fetcher: Arc<dyn Fetcher>) -> Self {
        let cache = ContentCache::new(settings.cache.resolved_root(), fetcher.clone());
        Self {
            settings,
            fetcher,
            cache,
            offline: false,
        }
    }

    /// Pipeline with the standard HTTP transport.
    pub fn with_http(settings: Settings) -> Result<Self, AppError> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        Ok(Self::new(settings, fetcher))
    }

    /// Skip remote manifest sources entirely. Local manifests still load,
    /// and verified content already in the cache still resolves.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Load and normalize every configured manifest source.
    pub async fn preprocess(&self) -> Result<Vec<NormalizedManifest>, AppError> {
        fs::create_dir_all(self.cache.root())?;

        let remote = if self.offline {
            Vec::new()
        } else {
            self.settings.sources.remote_urls()
        };
        let loader = ManifestLoader::new(self.fetcher.clone());
        let loaded = loader
            .load_all(&remote, self.settings.sources.local_dir.as_deref())
            .await?;

        let manifests =
            try_join_all(loaded.iter().map(|m| normalize::normalize(m, &self.cache))).await?;
        warn_shadowed(&manifests);
        info!(manifests = manifests.len(), "preprocessing complete");
        Ok(manifests)
    }

    /// Selection state for `manifests`: manifest defaults with the
    /// persisted overrides applied on top.
    pub fn selection_for(&self, manifests: &[NormalizedManifest]) -> SelectionState {
        let mut state = SelectionState::defaults_for(manifests);
        state.apply_overrides(manifests, &self.settings.selections);
        state
    }

    /// Resolve the fragment list for the current selections, without
    /// merging or writing anything.
    pub async fn resolve(&self) -> Result<Vec<PathBuf>, AppError> {
        let manifests = self.preprocess().await?;
        let state = self.selection_for(&manifests);
        Ok(merge::resolve_files(&manifests, &state)?)
    }

    /// Parse every selected fragment, keyed by its cache path.
    pub async fn dump(&self) -> Result<IndexMap<String, Value>, AppError> {
        let fragments = self.resolve().await?;
        Ok(merge::dump_fragments(&fragments)?)
    }

    /// Run the whole pipeline and write the merged document into every
    /// discovered install directory. A dry run stops short of writing.
    pub async fn apply(&self, dry_run: bool) -> Result<ApplySummary, AppError> {
        let manifests = self.preprocess().await?;
        let state = self.selection_for(&manifests);
        let fragments = merge::resolve_files(&manifests, &state)?;
        let document = merge::merge_fragments(&fragments)?;

        let targets = install::discover(&self.settings.install);
        if targets.is_empty() {
            warn!("no install directories found");
        }

        let written = if dry_run {
            Vec::new()
        } else {
            install::write_outputs(&document, &targets, &self.settings.output)?
        };

        let enabled_items = enabled_item_names(&manifests, &state);
        info!(
            items = enabled_items.len(),
            fragments = fragments.len(),
            targets = targets.len(),
            dry_run,
            "apply complete"
        );
        Ok(ApplySummary {
            manifests: manifests.len(),
            enabled_items,
            fragments,
            document,
            targets,
            written,
            dry_run,
        })
    }
}

fn enabled_item_names(manifests: &[NormalizedManifest], state: &SelectionState) -> Vec<String> {
    let winners = item_winners(manifests);
    let mut names = Vec::new();
    for (idx, manifest) in manifests.iter().enumerate() {
        for (name, item) in &manifest.items {
            if winners.get(name.as_str()) != Some(&idx) {
                continue;
            }
            if state.is_enabled(idx, name).unwrap_or(item.default_enabled) {
                names.push(name.clone());
            }
        }
    }
    names
}

fn warn_shadowed(manifests: &[NormalizedManifest]) {
    let winners = item_winners(manifests);
    for (idx, manifest) in manifests.iter().enumerate() {
        for name in manifest.items.keys() {
            if let Some(&winner_idx) = winners.get(name.as_str()) {
                if winner_idx != idx {
                    warn!(
                        item = %name,
                        shadowed = %manifest.source,
                        winner = %manifests[winner_idx].source,
                        "duplicate item name, last-loaded manifest wins"
                    );
                }
            }
        }
    }
}
