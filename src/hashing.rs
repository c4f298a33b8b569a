//! Digest algorithms for verifying downloaded content

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;

/// Digest algorithm named by a manifest file entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    None,
}

impl HashAlgorithm {
    /// Whether content naming this algorithm is refused outright.
    ///
    /// MD5 and SHA-1 entries are never fetched and never verified.
    pub fn is_refused(&self) -> bool {
        matches!(self, HashAlgorithm::Md5 | HashAlgorithm::Sha1)
    }

    /// Whether entries under this algorithm carry a digest that names
    /// the cache file and is checked against downloaded bytes.
    pub fn is_verifying(&self) -> bool {
        matches!(
            self,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha384 | HashAlgorithm::Sha512
        )
    }

    /// Lowercase hex digest of `data`.
    ///
    /// Defined only for the verifying algorithms; refused algorithms and
    /// `none` return `None`.
    pub fn digest_hex(&self, data: &[u8]) -> Option<String> {
        let digest = match self {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
            HashAlgorithm::Md5 | HashAlgorithm::Sha1 | HashAlgorithm::None => return None,
        };
        Some(digest)
    }

    /// Hex digest length produced by a verifying algorithm.
    pub fn digest_hex_len(&self) -> Option<usize> {
        match self {
            HashAlgorithm::Sha256 => Some(64),
            HashAlgorithm::Sha384 => Some(96),
            HashAlgorithm::Sha512 => Some(128),
            HashAlgorithm::Md5 | HashAlgorithm::Sha1 | HashAlgorithm::None => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::None => "none",
        };
        f.write_str(name)
    }
}

/// SHA-512 hex digest used to name cache entries for unverified content
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}
