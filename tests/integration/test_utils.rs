//! Shared test utilities for integration tests
//!
//! Builds a fully in-memory environment: manifests and fragments are served
//! from a [`MemoryFetcher`], while the cache and install directories live
//! under one per-test TempDir. No network, no real install locations.

use flagforge::fetch::MemoryFetcher;
use flagforge::hashing::HashAlgorithm;
use flagforge::pipeline::Pipeline;
use flagforge::settings::Settings;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnv {
    pub temp: TempDir,
    pub fetcher: Arc<MemoryFetcher>,
    pub settings: Settings,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.cache.root = Some(temp.path().join("cache"));
        settings.install.roots = vec![temp.path().join("installs").display().to_string()];
        Self {
            temp,
            fetcher: Arc::new(MemoryFetcher::new()),
            settings,
        }
    }

    /// Serve `manifest` at `url` and register it as a remote source. The
    /// first manifest becomes the default source, later ones are extras,
    /// so load order follows registration order.
    pub fn add_remote_manifest(&mut self, url: &str, manifest: &Value) {
        self.fetcher
            .insert(url, serde_json::to_vec(manifest).unwrap());
        if self.settings.sources.default.is_none() {
            self.settings.sources.default = Some(url.to_string());
        } else {
            self.settings.sources.extra.push(url.to_string());
        }
    }

    /// Write a local manifest file and point the local source dir at it.
    pub fn add_local_manifest(&mut self, name: &str, text: &str) {
        let dir = self.temp.path().join("manifests");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), text).unwrap();
        self.settings.sources.local_dir = Some(dir);
    }

    /// Serve `body` at `base_url` + `path` and return a sha256-verified
    /// file reference for use inside a manifest.
    pub fn add_fragment(&self, base_url: &str, path: &str, body: &Value) -> Value {
        let bytes = serde_json::to_vec(body).unwrap();
        let digest = HashAlgorithm::Sha256.digest_hex(&bytes).unwrap();
        self.fetcher.insert(&format!("{}{}", base_url, path), bytes);
        json!({ "path": path, "hash": { "algorithm": "sha256", "digest": digest } })
    }

    /// Create a versioned install directory under the configured root.
    pub fn add_install(&self, version: &str) -> PathBuf {
        let dir = self
            .temp
            .path()
            .join("installs")
            .join(format!("version-{}", version));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.settings.clone(), self.fetcher.clone())
    }

    /// How many times `url` was requested from the fetcher.
    pub fn request_count_for(&self, url: &str) -> usize {
        self.fetcher
            .requests()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    /// Parse the merged document written into `install`.
    pub fn written_document(&self, install: &Path) -> Value {
        let path = install.join("ClientSettings/ClientAppSettings.json");
        let text = fs::read_to_string(path).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}
