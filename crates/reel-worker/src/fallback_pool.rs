//! Rotating pool of previously acquired unique clips.
//!
//! When a segment cannot get a fresh clip (search miss, duplicate, failed
//! download) it receives a copy of the next pool entry instead. By default
//! every entry is handed out at most once per run, so with `k` entries and
//! `m` misses exactly `max(m - k, 0)` segments end up without video. With
//! wrapping enabled the rotation cycles instead.
//!
//! The synthetic solid-color clips complete the pool at composition time:
//! a segment left without video is rendered from the palette.

use std::collections::HashSet;

use reel_models::AssetRecord;
use tracing::{debug, warn};

use crate::artifact_cache::ArtifactCache;
use crate::hash_store::{fingerprint_file, HashStore};

#[derive(Debug, Clone, Default)]
pub struct FallbackPool {
    records: Vec<AssetRecord>,
    next: usize,
    wrap: bool,
}

impl FallbackPool {
    pub fn new(wrap: bool) -> Self {
        Self {
            records: Vec::new(),
            next: 0,
            wrap,
        }
    }

    /// Fill the pool from existing clips on disk.
    ///
    /// Every clip is fingerprinted; clips whose fingerprint was already seen
    /// in this directory are left out. All fingerprints are registered in
    /// `store` since the clips are materialized.
    pub async fn bootstrap(
        wrap: bool,
        clips: &ArtifactCache,
        store: &mut HashStore,
        window: usize,
    ) -> Self {
        let mut pool = Self::new(wrap);

        let paths = match clips.list().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "Failed to list existing clips in {}", clips.dir().display());
                return pool;
            }
        };

        let mut seen = HashSet::new();
        for path in paths {
            match fingerprint_file(&path, window).await {
                Ok(hash) => {
                    if seen.insert(hash.clone()) {
                        store.add(hash.clone());
                        pool.push(AssetRecord::new(hash, path));
                    } else {
                        debug!("Skipping duplicate clip {} in fallback pool", path.display());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fingerprint {}", path.display());
                }
            }
        }

        debug!(entries = pool.len(), "Fallback pool bootstrapped");
        pool
    }

    /// Append a newly acquired unique clip.
    pub fn push(&mut self, record: AssetRecord) {
        self.records.push(record);
    }

    /// Next entry in rotation.
    ///
    /// Returns `None` once every entry has been handed out, unless the pool
    /// wraps. Entries always live in filled slots, and a segment only falls
    /// back when its own slot is empty, so no entry is ever its caller's slot.
    pub fn next_entry(&mut self) -> Option<AssetRecord> {
        let len = self.records.len();
        if len == 0 || (!self.wrap && self.next >= len) {
            return None;
        }

        let record = self.records[self.next % len].clone();
        self.next += 1;
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::Fingerprint;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(name: &str) -> AssetRecord {
        AssetRecord::new(Fingerprint::from_hex(name), PathBuf::from(format!("/clips/{}.mp4", name)))
    }

    #[test]
    fn test_each_entry_used_once_without_wrap() {
        let mut pool = FallbackPool::new(false);
        pool.push(record("a"));
        pool.push(record("b"));

        assert_eq!(pool.next_entry().map(|r| r.hash), Some(Fingerprint::from_hex("a")));
        assert_eq!(pool.next_entry().map(|r| r.hash), Some(Fingerprint::from_hex("b")));
        assert_eq!(pool.next_entry(), None);
        assert_eq!(pool.next_entry(), None);

        // Entries acquired later become available
        pool.push(record("c"));
        assert_eq!(pool.next_entry().map(|r| r.hash), Some(Fingerprint::from_hex("c")));
    }

    #[test]
    fn test_wrap_cycles() {
        let mut pool = FallbackPool::new(true);
        pool.push(record("a"));
        pool.push(record("b"));

        let order: Vec<String> = (0..5)
            .filter_map(|_| pool.next_entry())
            .map(|r| r.hash.to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "a", "b", "a"]);
    }

    #[test]
    fn test_entries_pushed_mid_rotation_keep_their_turn() {
        let mut pool = FallbackPool::new(false);
        pool.push(record("a"));
        assert_eq!(pool.next_entry().map(|r| r.hash), Some(Fingerprint::from_hex("a")));

        pool.push(record("b"));
        pool.push(record("c"));
        assert_eq!(pool.next_entry().map(|r| r.hash), Some(Fingerprint::from_hex("b")));
        assert_eq!(pool.next_entry().map(|r| r.hash), Some(Fingerprint::from_hex("c")));
        assert_eq!(pool.next_entry(), None);
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = FallbackPool::new(true);
        assert_eq!(pool.next_entry(), None);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_dedups_and_registers_hashes() {
        let dir = TempDir::new().unwrap();
        let clips = ArtifactCache::new(dir.path(), "mp4");
        tokio::fs::write(dir.path().join("part0.mp4"), b"first clip").await.unwrap();
        tokio::fs::write(dir.path().join("part1.mp4"), b"first clip").await.unwrap();
        tokio::fs::write(dir.path().join("part2.mp4"), b"second clip").await.unwrap();

        let mut store = HashStore::new(dir.path().join("video_hashes.json"));
        let pool = FallbackPool::bootstrap(false, &clips, &mut store, 1024).await;

        assert_eq!(pool.len(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(pool.records()[0].path(), dir.path().join("part0.mp4"));
        assert_eq!(pool.records()[1].path(), dir.path().join("part2.mp4"));
        assert_eq!(pool.records()[1].hash, Fingerprint::of_prefix(b"second clip", 1024));
    }
}
