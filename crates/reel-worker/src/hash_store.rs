//! Persistent set of fingerprints of clips already used.
//!
//! The store is loaded once when a run starts and passed explicitly to the
//! asset resolver. It is written back after every acquisition and at the
//! end of the run. Persistence problems never abort a run: a corrupt or
//! unreadable file loads as an empty set and a failed write is logged.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use reel_media::write_atomic;
use reel_models::Fingerprint;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, warn};

/// Fingerprint the first `window` bytes of a local file.
///
/// Agrees with [`Fingerprint::of_prefix`] over the head of the same content
/// fetched remotely.
pub async fn fingerprint_file(path: &Path, window: usize) -> std::io::Result<Fingerprint> {
    let file = fs::File::open(path).await?;
    let mut buf = Vec::with_capacity(window);
    file.take(window as u64).read_to_end(&mut buf).await?;
    Ok(Fingerprint::of_prefix(&buf, window))
}

/// Set of fingerprints backed by a JSON array of hex strings.
#[derive(Debug, Clone)]
pub struct HashStore {
    path: PathBuf,
    seen: BTreeSet<Fingerprint>,
}

impl HashStore {
    /// Empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: BTreeSet::new(),
        }
    }

    /// Load the store at `path`. Missing or corrupt files yield an empty set.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No hash store at {}, starting empty", path.display());
                return Self::new(path);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read hash store {}, starting empty", path.display());
                return Self::new(path);
            }
        };

        match serde_json::from_slice::<Vec<Fingerprint>>(&bytes) {
            Ok(hashes) => {
                debug!(hashes = hashes.len(), "Loaded hash store {}", path.display());
                Self {
                    path,
                    seen: hashes.into_iter().collect(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Hash store {} is corrupt, starting empty", path.display());
                Self::new(path)
            }
        }
    }

    /// Overwrite the persisted state. Failures are logged.
    pub async fn save(&self) {
        if let Err(e) = self.try_save().await {
            error!(error = %e, "Failed to save hash store {}", self.path.display());
        }
    }

    /// Overwrite the persisted state, reporting failures.
    pub async fn try_save(&self) -> reel_media::MediaResult<()> {
        let hashes: Vec<&Fingerprint> = self.seen.iter().collect();
        let json = serde_json::to_vec(&hashes)?;
        write_atomic(&self.path, json).await
    }

    pub fn contains(&self, hash: &Fingerprint) -> bool {
        self.seen.contains(hash)
    }

    /// Insert `hash`; returns `false` if it was already present.
    pub fn add(&mut self, hash: Fingerprint) -> bool {
        self.seen.insert(hash)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.seen.iter()
    }
}
