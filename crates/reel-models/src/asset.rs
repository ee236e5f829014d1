//! Stock clip identity.
//!
//! A clip is identified by the SHA-256 of its leading bytes. The same window
//! is hashed whether the bytes come from the head of a remote stream or from
//! a file already on disk, so a pre-download check and a post-download check
//! of the same content always agree.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default number of leading bytes hashed to fingerprint a clip (64 KiB).
pub const DEFAULT_FINGERPRINT_WINDOW: usize = 64 * 1024;

/// Content-derived clip identifier (lowercase hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash at most the first `window` bytes of `data`.
    pub fn of_prefix(data: &[u8], window: usize) -> Self {
        let end = data.len().min(window);
        Self(format!("{:x}", Sha256::digest(&data[..end])))
    }

    /// Wrap an already computed hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A uniquely fingerprinted clip materialized on disk.
///
/// Records are shared read-only: segments copy the file, never modify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub hash: Fingerprint,
    pub path: PathBuf,
}

impl AssetRecord {
    pub fn new(hash: Fingerprint, path: impl Into<PathBuf>) -> Self {
        Self {
            hash,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
