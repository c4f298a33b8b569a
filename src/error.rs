//! Error types for the flag-list preprocessing pipeline.

use crate::hashing::HashAlgorithm;
use std::path::PathBuf;
use thiserror::Error;

/// Transport-level errors raised while fetching remote content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP client construction failed: {0}")]
    Client(String),
}

impl FetchError {
    /// HTTP status code, where the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Content-cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Digest algorithm {algorithm} is refused for downloaded content")]
    InsecureAlgorithm { algorithm: HashAlgorithm },

    #[error("Digest mismatch for {url}: expected {expected}, got {actual}")]
    DigestMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("File {path} declares {algorithm} but carries no digest")]
    MissingDigest {
        path: String,
        algorithm: HashAlgorithm,
    },

    #[error("File {path} declares a malformed {algorithm} digest: {digest}")]
    MalformedDigest {
        path: String,
        algorithm: HashAlgorithm,
        digest: String,
    },

    #[error("Download failed: {0}")]
    Download(#[from] FetchError),

    #[error("Cache I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Manifest loading and normalization errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse manifest {name}: {message}")]
    Parse { name: String, message: String },

    #[error("Invalid manifest {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Manifest I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Selection resolution and fragment merge errors
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Unknown selection '{value}' for feature {feature} of item {item}")]
    UnknownSelection {
        item: String,
        feature: String,
        value: String,
    },

    #[error("Config fragment not found: {}", .0.display())]
    MissingFragment(PathBuf),

    #[error("Failed to parse config fragment {}: {message}", .path.display())]
    FragmentParse { path: PathBuf, message: String },

    #[error("Config fragment {} is not a JSON object", .0.display())]
    FragmentNotObject(PathBuf),

    #[error("Merge I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Top-level application errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown item: {0}. Run `flagforge list` to see available items.")]
    UnknownItem(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
