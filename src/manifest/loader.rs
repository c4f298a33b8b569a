//! Manifest source loading
//!
//! Remote sources are fetched concurrently and parsed in the relaxed
//! dialect; a source that fails to fetch or parse is skipped with a
//! warning so one dead endpoint cannot block the run. Local manifest
//! files are authoritative and any failure there is fatal.

use crate::error::ManifestError;
use crate::fetch::Fetcher;
use crate::manifest::dialect::ManifestDialect;
use crate::manifest::{LoadedManifest, ManifestSource};
use futures::future::join_all;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub struct ManifestLoader {
    fetcher: Arc<dyn Fetcher>,
}

impl ManifestLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Load every configured source: remote URLs first, in configured
    /// order, then local files in lexicographic name order. The returned
    /// order is the merge precedence order, later entries win.
    pub async fn load_all(
        &self,
        remote: &[String],
        local_dir: Option<&Path>,
    ) -> Result<Vec<LoadedManifest>, ManifestError> {
        let fetches = remote.iter().map(|url| self.load_remote_soft(url));
        let mut manifests: Vec<LoadedManifest> =
            join_all(fetches).await.into_iter().flatten().collect();

        if let Some(dir) = local_dir {
            manifests.extend(self.load_local_dir(dir)?);
        }

        Ok(manifests)
    }

    /// Fetch and parse one remote manifest, demoting failure to a warning.
    async fn load_remote_soft(&self, url: &str) -> Option<LoadedManifest> {
        match self.load_remote(url).await {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(source = %url, error = %e, "skipping unusable remote manifest");
                None
            }
        }
    }

    async fn load_remote(&self, url: &str) -> Result<LoadedManifest, ManifestError> {
        let bytes = self.fetcher.fetch(url).await?;
        let text = String::from_utf8(bytes).map_err(|e| ManifestError::Parse {
            name: url.to_string(),
            message: e.to_string(),
        })?;
        let manifest = ManifestDialect::Json5.parse(url, &text)?;
        debug!(source = %url, items = manifest.len(), "remote manifest loaded");
        Ok(LoadedManifest {
            source: ManifestSource::Remote(url.to_string()),
            manifest,
        })
    }

    /// Load manifest files directly under `dir`, non-recursively, skipping
    /// hidden files.
    fn load_local_dir(&self, dir: &Path) -> Result<Vec<LoadedManifest>, ManifestError> {
        if !dir.exists() {
            warn!(dir = %dir.display(), "local manifest directory does not exist");
            return Ok(Vec::new());
        }

        let mut manifests = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ManifestError::IoError(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            let text = fs::read_to_string(path)?;
            let name = path.display().to_string();
            let manifest = ManifestDialect::for_path(path).parse(&name, &text)?;
            debug!(source = %path.display(), items = manifest.len(), "local manifest loaded");
            manifests.push(LoadedManifest {
                source: ManifestSource::Local(path.to_path_buf()),
                manifest,
            });
        }
        Ok(manifests)
    }
}
