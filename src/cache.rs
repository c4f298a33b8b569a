//! Content-addressed download cache
//!
//! Downloaded config fragments live flat under the cache root, one file
//! per digest, named by the lowercase hex digest of their contents. A
//! file that exists under its digest name is trusted by name alone; its
//! bytes are never re-read for verification. Declared digests are
//! validated as full-length hex before they may name a cache file.

use crate::error::CacheError;
use crate::fetch::Fetcher;
use crate::fsutil;
use crate::hashing::{self, HashAlgorithm};
use crate::manifest::FileRef;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Flat, digest-keyed cache of downloaded content
///
/// Concurrent resolves of the same digest are serialized on a per-digest
/// lock so a fragment is downloaded at most once per run. The lock entry
/// is dropped once the last resolve of its digest finishes.
pub struct ContentCache {
    root: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Entry count and total size of a cache directory
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

impl ContentCache {
    /// Create a cache over `root`. The directory itself is created by the
    /// caller before the first resolve.
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a manifest file reference to a local cache path.
    ///
    /// The download URL is the item base URL with the file path appended
    /// verbatim. Verified entries are looked up by digest first and a hit
    /// never touches the network. Entries declaring no algorithm are
    /// fetched every time and stored under the SHA-512 of their bytes.
    pub async fn resolve(&self, file: &FileRef, base_url: &str) -> Result<PathBuf, CacheError> {
        let algorithm = file.hash.algorithm;
        if algorithm.is_refused() {
            return Err(CacheError::InsecureAlgorithm { algorithm });
        }

        let url = format!("{}{}", base_url, file.path);
        if algorithm.is_verifying() {
            let digest = match &file.hash.digest {
                Some(digest) if !digest.is_empty() => digest.to_ascii_lowercase(),
                _ => {
                    return Err(CacheError::MissingDigest {
                        path: file.path.clone(),
                        algorithm,
                    })
                }
            };
            // the digest names a file directly under the cache root
            if algorithm.digest_hex_len() != Some(digest.len())
                || !digest.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(CacheError::MalformedDigest {
                    path: file.path.clone(),
                    algorithm,
                    digest,
                });
            }
            self.resolve_verified(&url, algorithm, &digest).await
        } else {
            self.resolve_unverified(&url).await
        }
    }

    async fn resolve_verified(
        &self,
        url: &str,
        algorithm: HashAlgorithm,
        digest: &str,
    ) -> Result<PathBuf, CacheError> {
        let slot = self.inflight_guard(digest);
        let outcome: Result<PathBuf, CacheError> = async {
            let _lock = slot.lock().await;

            let entry = self.root.join(digest);
            if entry.exists() {
                debug!(digest = %digest, "cache hit");
                return Ok(entry);
            }

            let bytes = self.fetcher.fetch(url).await?;
            let actual = algorithm
                .digest_hex(&bytes)
                .ok_or(CacheError::InsecureAlgorithm { algorithm })?;
            if actual != digest {
                return Err(CacheError::DigestMismatch {
                    url: url.to_string(),
                    expected: digest.to_string(),
                    actual,
                });
            }

            fsutil::write_atomic(&entry, &bytes)?;
            debug!(digest = %digest, bytes = bytes.len(), "cache fill");
            Ok(entry)
        }
        .await;
        self.release_inflight(digest, &slot);
        outcome
    }

    async fn resolve_unverified(&self, url: &str) -> Result<PathBuf, CacheError> {
        let bytes = self.fetcher.fetch(url).await?;
        let digest = hashing::sha512_hex(&bytes);
        let entry = self.root.join(&digest);
        fsutil::write_atomic(&entry, &bytes)?;
        debug!(url = %url, digest = %digest, "unverified content stored");
        Ok(entry)
    }

    fn inflight_guard(&self, digest: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inflight.lock();
        map.entry(digest.to_string()).or_default().clone()
    }

    fn release_inflight(&self, digest: &str, slot: &Arc<tokio::sync::Mutex<()>>) {
        let mut map = self.inflight.lock();
        // two strong references left: the map entry and the finished caller
        if Arc::strong_count(slot) <= 2 {
            map.remove(digest);
        }
    }

    /// Count entries and bytes under the cache root. A missing root reads
    /// as an empty cache.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                stats.entries += 1;
                stats.total_bytes += metadata.len();
            }
        }
        Ok(stats)
    }
}
