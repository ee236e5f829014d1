//! Per-segment stock clip resolution.
//!
//! Order of preference for segment `i`:
//! 1. the clip already stored for `i` (never re-fetched or re-hashed)
//! 2. a fresh search result whose fingerprint is not in the hash store
//! 3. a copy of the next fallback pool entry
//! 4. nothing: the composer renders a synthetic clip
//!
//! Every failure along the way (search miss, duplicate, network error,
//! empty download) falls through to the pool. Only step 2 mutates the hash
//! store or the pool, and it persists the store immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reel_media::is_nonempty_file;
use reel_models::{AssetRecord, Fingerprint};
use reel_providers::{ByteFetcher, ClipSearch, Translator};
use tracing::{debug, info, warn};

use crate::artifact_cache::ArtifactCache;
use crate::fallback_pool::FallbackPool;
use crate::hash_store::{fingerprint_file, HashStore};
use crate::logging::SegmentLogger;
use crate::metrics;

/// How a segment's clip was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Clip already on disk from an earlier run
    Cached(PathBuf),
    /// Newly downloaded unique clip
    Downloaded(AssetRecord),
    /// Copy of a pool entry
    Fallback { path: PathBuf, source: PathBuf },
    /// No clip available
    Videoless,
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Cached(path) => Some(path),
            Resolution::Downloaded(record) => Some(record.path()),
            Resolution::Fallback { path, .. } => Some(path),
            Resolution::Videoless => None,
        }
    }

    pub fn is_videoless(&self) -> bool {
        matches!(self, Resolution::Videoless)
    }
}

/// Why fresh acquisition was abandoned.
#[derive(Debug)]
enum Miss {
    NoResult,
    Duplicate(Fingerprint),
    Failed(String),
}

impl std::fmt::Display for Miss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Miss::NoResult => write!(f, "no search result"),
            Miss::Duplicate(hash) => write!(f, "duplicate clip {}", hash),
            Miss::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

pub struct AssetResolver {
    search: Arc<dyn ClipSearch>,
    translator: Arc<dyn Translator>,
    fetcher: Arc<dyn ByteFetcher>,
    clips: ArtifactCache,
    fingerprint_bytes: usize,
    acquire_pause: Duration,
}

impl AssetResolver {
    pub fn new(
        search: Arc<dyn ClipSearch>,
        translator: Arc<dyn Translator>,
        fetcher: Arc<dyn ByteFetcher>,
        clips: ArtifactCache,
        fingerprint_bytes: usize,
        acquire_pause: Duration,
    ) -> Self {
        Self {
            search,
            translator,
            fetcher,
            clips,
            fingerprint_bytes,
            acquire_pause,
        }
    }

    /// Obtain the clip for segment `index`.
    pub async fn resolve(
        &self,
        index: usize,
        prompt: &str,
        store: &mut HashStore,
        pool: &mut FallbackPool,
    ) -> Resolution {
        let logger = SegmentLogger::new(index, "resolve");

        if let Some(path) = self.clips.get(index).await {
            debug!(segment = index, "Clip already exists at {}", path.display());
            metrics::record_cached_clip();
            return Resolution::Cached(path);
        }

        match self.acquire(index, prompt, store).await {
            Ok(record) => {
                logger.log_completion(&format!("downloaded {}", record.path().display()));
                pool.push(record.clone());
                store.save().await;
                tokio::time::sleep(self.acquire_pause).await;
                Resolution::Downloaded(record)
            }
            Err(miss) => {
                match &miss {
                    Miss::Duplicate(_) => metrics::record_duplicate(),
                    Miss::NoResult | Miss::Failed(_) => {}
                }
                logger.log_warning(&format!("{}, using fallback", miss));
                self.fallback(index, pool).await
            }
        }
    }

    /// Search, pre-check and download a clip not in `store`.
    async fn acquire(&self, index: usize, prompt: &str, store: &mut HashStore) -> Result<AssetRecord, Miss> {
        let query = self.translator.translate(prompt).await;
        debug!(segment = index, query = %query, "Searching stock footage");

        let url = match self.search.search(&query).await {
            Ok(Some(url)) => url,
            Ok(None) => return Err(Miss::NoResult),
            Err(e) => return Err(Miss::Failed(format!("{} search failed: {}", self.search.name(), e))),
        };

        let prefix = self
            .fetcher
            .fetch_prefix(&url, self.fingerprint_bytes)
            .await
            .map_err(|e| Miss::Failed(format!("hash pre-check failed: {}", e)))?;
        if prefix.is_empty() {
            return Err(Miss::Failed("candidate clip is empty".to_string()));
        }

        let hash = Fingerprint::of_prefix(&prefix, self.fingerprint_bytes);
        if store.contains(&hash) {
            return Err(Miss::Duplicate(hash));
        }

        let dest = self.clips.path(index);
        self.fetcher
            .download(&url, &dest)
            .await
            .map_err(|e| Miss::Failed(format!("download failed: {}", e)))?;

        if !is_nonempty_file(&dest).await {
            discard(&dest).await;
            return Err(Miss::Failed(format!("download left no data at {}", dest.display())));
        }

        // The remote may serve different bytes between the two requests;
        // the stored file is what counts
        let local = match fingerprint_file(&dest, self.fingerprint_bytes).await {
            Ok(local) => local,
            Err(e) => {
                discard(&dest).await;
                return Err(Miss::Failed(format!("failed to fingerprint download: {}", e)));
            }
        };
        if local != hash {
            warn!(segment = index, "Downloaded clip differs from pre-check");
            if store.contains(&local) {
                discard(&dest).await;
                return Err(Miss::Duplicate(local));
            }
        }

        store.add(local.clone());
        metrics::record_download();
        info!(segment = index, hash = %local, "Acquired new clip");
        Ok(AssetRecord::new(local, dest))
    }

    /// Copy the next pool entry into the segment's slot.
    async fn fallback(&self, index: usize, pool: &mut FallbackPool) -> Resolution {
        let logger = SegmentLogger::new(index, "resolve");
        let Some(record) = pool.next_entry() else {
            logger.log_warning("fallback pool exhausted, segment left without video");
            metrics::record_videoless();
            return Resolution::Videoless;
        };

        match self.clips.put(index, record.path()).await {
            Ok(path) => {
                metrics::record_fallback();
                logger.log_progress(&format!("reused {}", record.path().display()));
                Resolution::Fallback {
                    path,
                    source: record.path.clone(),
                }
            }
            Err(e) => {
                logger.log_error(&format!("failed to copy fallback clip: {}", e));
                metrics::record_videoless();
                Resolution::Videoless
            }
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() == std::io::ErrorKind::NotFound {
            return;
        }
        warn!(error = %e, "Failed to remove {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, FakeSearch};
    use reel_providers::IdentityTranslator;
    use tempfile::TempDir;

    const WINDOW: usize = 16;

    struct Harness {
        _dir: TempDir,
        clips: ArtifactCache,
        store: HashStore,
        search: Arc<FakeSearch>,
        fetcher: Arc<FakeFetcher>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let clips = ArtifactCache::new(dir.path().join("video_clips"), "mp4");
            let store = HashStore::new(dir.path().join("video_hashes.json"));
            Self {
                _dir: dir,
                clips,
                store,
                search: Arc::new(FakeSearch::default()),
                fetcher: Arc::new(FakeFetcher::default()),
            }
        }

        fn resolver(&self) -> AssetResolver {
            AssetResolver::new(
                self.search.clone(),
                Arc::new(IdentityTranslator),
                self.fetcher.clone(),
                self.clips.clone(),
                WINDOW,
                Duration::ZERO,
            )
        }
    }

    fn body(tag: &str) -> Vec<u8> {
        // Distinct heads, shared tail past the fingerprint window
        format!("{:<16}common tail bytes", tag).into_bytes()
    }

    /// Pool of clips outside the clip directory; keep the dir alive.
    async fn fallback_pool_of(tags: &[&str]) -> (FallbackPool, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut pool = FallbackPool::new(false);
        for tag in tags {
            let path = dir.path().join(format!("{}.mp4", tag));
            tokio::fs::write(&path, body(tag)).await.unwrap();
            pool.push(AssetRecord::new(Fingerprint::of_prefix(&body(tag), WINDOW), path));
        }
        (pool, dir)
    }

    #[tokio::test]
    async fn test_new_clip_is_downloaded_and_registered() {
        let mut h = Harness::new();
        h.search.add("city", "https://cdn/a.mp4");
        h.fetcher.add("https://cdn/a.mp4", body("a"));
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        let expected = h.clips.path(0);
        assert_eq!(resolution.path(), Some(expected.as_path()));
        assert!(matches!(resolution, Resolution::Downloaded(_)));
        assert_eq!(tokio::fs::read(&expected).await.unwrap(), body("a"));
        assert!(h.store.contains(&Fingerprint::of_prefix(&body("a"), WINDOW)));
        assert_eq!(pool.len(), 1);

        // Persisted immediately
        let reloaded = HashStore::load(h.store.path()).await;
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_clip_is_returned_without_network() {
        let mut h = Harness::new();
        tokio::fs::create_dir_all(h.clips.dir()).await.unwrap();
        tokio::fs::write(h.clips.path(0), b"kept").await.unwrap();
        h.search.add("city", "https://cdn/a.mp4");
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        assert_eq!(resolution, Resolution::Cached(h.clips.path(0)));
        assert_eq!(h.search.calls(), 0);
        assert_eq!(h.fetcher.prefix_calls(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_uses_byte_identical_fallback() {
        let mut h = Harness::new();
        tokio::fs::create_dir_all(h.clips.dir()).await.unwrap();
        tokio::fs::write(h.clips.path(0), body("prior")).await.unwrap();
        let mut pool = FallbackPool::bootstrap(false, &h.clips, &mut h.store, WINDOW).await;
        assert_eq!(h.store.len(), 1);

        // Both segments find clips with the same fingerprint
        h.search.add("first", "https://cdn/x.mp4");
        h.search.add("second", "https://cdn/y.mp4");
        h.fetcher.add("https://cdn/x.mp4", body("same"));
        h.fetcher.add("https://cdn/y.mp4", body("same"));

        let resolver = h.resolver();
        let first = resolver.resolve(1, "first", &mut h.store, &mut pool).await;
        let second = resolver.resolve(2, "second", &mut h.store, &mut pool).await;

        assert!(matches!(first, Resolution::Downloaded(_)));
        assert_eq!(
            second,
            Resolution::Fallback {
                path: h.clips.path(2),
                source: h.clips.path(0),
            }
        );
        assert_eq!(
            tokio::fs::read(h.clips.path(2)).await.unwrap(),
            tokio::fs::read(h.clips.path(0)).await.unwrap()
        );
        // prior + first; the duplicate adds nothing
        assert_eq!(h.store.len(), 2);
        assert_eq!(h.fetcher.download_calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_bound() {
        // k = 2 pool entries, m = 3 misses: exactly one videoless segment
        let mut h = Harness::new();
        let mut pool = FallbackPool::new(false);
        let pool_dir = TempDir::new().unwrap();
        for tag in ["p0", "p1"] {
            let path = pool_dir.path().join(format!("{}.mp4", tag));
            tokio::fs::write(&path, body(tag)).await.unwrap();
            pool.push(AssetRecord::new(Fingerprint::of_prefix(&body(tag), WINDOW), path));
        }

        let resolver = h.resolver();
        let mut outcomes = Vec::new();
        for index in 0..3 {
            outcomes.push(resolver.resolve(index, "no match", &mut h.store, &mut pool).await);
        }

        let videoless = outcomes.iter().filter(|r| r.is_videoless()).count();
        assert_eq!(videoless, 1);
        assert!(outcomes[2].is_videoless());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_wrapping_pool_never_leaves_videoless() {
        let mut h = Harness::new();
        let mut pool = FallbackPool::new(true);
        let pool_dir = TempDir::new().unwrap();
        let path = pool_dir.path().join("only.mp4");
        tokio::fs::write(&path, body("only")).await.unwrap();
        pool.push(AssetRecord::new(Fingerprint::of_prefix(&body("only"), WINDOW), path));

        let resolver = h.resolver();
        for index in 0..3 {
            let r = resolver.resolve(index, "no match", &mut h.store, &mut pool).await;
            assert!(matches!(r, Resolution::Fallback { .. }));
        }
    }

    #[tokio::test]
    async fn test_download_failure_falls_back() {
        let mut h = Harness::new();
        h.search.add("city", "https://cdn/broken.mp4");
        h.fetcher.add("https://cdn/broken.mp4", body("broken"));
        h.fetcher.fail_downloads("https://cdn/broken.mp4");
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        assert!(resolution.is_videoless());
        assert!(h.store.is_empty());
        assert!(!h.clips.exists(0).await);
    }

    #[tokio::test]
    async fn test_search_error_falls_back() {
        let mut h = Harness::new();
        h.search.fail_with_error();
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;
        assert!(resolution.is_videoless());
        assert_eq!(h.fetcher.prefix_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_duplicates_among_new_acquisitions() {
        let mut h = Harness::new();
        let tags = ["a", "b", "a", "c", "b"];
        for (i, tag) in tags.iter().enumerate() {
            let url = format!("https://cdn/{}-{}.mp4", tag, i);
            h.search.add(&format!("prompt {}", i), &url);
            h.fetcher.add(&url, body(tag));
        }
        let mut pool = FallbackPool::new(false);

        let resolver = h.resolver();
        let mut downloaded = Vec::new();
        for i in 0..tags.len() {
            if let Resolution::Downloaded(record) = resolver
                .resolve(i, &format!("prompt {}", i), &mut h.store, &mut pool)
                .await
            {
                downloaded.push(record.hash);
            }
        }

        assert_eq!(downloaded.len(), 3);
        let mut unique = downloaded.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), downloaded.len());
    }

    #[tokio::test]
    async fn test_empty_prefix_skips_download() {
        let mut h = Harness::new();
        h.search.add("city", "https://cdn/empty.mp4");
        h.fetcher.add("https://cdn/empty.mp4", Vec::new());
        let (mut pool, _pool_dir) = fallback_pool_of(&["p0"]).await;

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        assert!(matches!(resolution, Resolution::Fallback { .. }));
        assert_eq!(h.fetcher.download_calls(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_download_is_removed_and_falls_back() {
        let mut h = Harness::new();
        h.search.add("city", "https://cdn/a.mp4");
        h.fetcher.add("https://cdn/a.mp4", body("a"));
        h.fetcher.serve_on_download("https://cdn/a.mp4", Vec::new());
        let (mut pool, _pool_dir) = fallback_pool_of(&["p0"]).await;

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        assert_eq!(
            resolution,
            Resolution::Fallback {
                path: h.clips.path(0),
                source: pool.records()[0].path.clone(),
            }
        );
        assert_eq!(tokio::fs::read(h.clips.path(0)).await.unwrap(), body("p0"));
        assert!(h.store.is_empty());
        assert!(HashStore::load(h.store.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_download_without_pool_leaves_no_file() {
        let mut h = Harness::new();
        h.search.add("city", "https://cdn/a.mp4");
        h.fetcher.add("https://cdn/a.mp4", body("a"));
        h.fetcher.serve_on_download("https://cdn/a.mp4", Vec::new());
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        assert!(resolution.is_videoless());
        assert!(!tokio::fs::try_exists(h.clips.path(0)).await.unwrap());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_changed_download_matching_store_is_discarded() {
        let mut h = Harness::new();
        let known = Fingerprint::of_prefix(&body("known"), WINDOW);
        h.store.add(known);
        h.search.add("city", "https://cdn/a.mp4");
        // Pre-check sees a new clip, the download turns out to be a known one
        h.fetcher.add("https://cdn/a.mp4", body("fresh"));
        h.fetcher.serve_on_download("https://cdn/a.mp4", body("known"));
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        assert!(resolution.is_videoless());
        assert!(!tokio::fs::try_exists(h.clips.path(0)).await.unwrap());
        assert_eq!(h.store.len(), 1);
        assert!(!h.store.contains(&Fingerprint::of_prefix(&body("fresh"), WINDOW)));
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_changed_download_is_registered_under_local_hash() {
        let mut h = Harness::new();
        h.search.add("city", "https://cdn/a.mp4");
        h.fetcher.add("https://cdn/a.mp4", body("remote"));
        h.fetcher.serve_on_download("https://cdn/a.mp4", body("served"));
        let mut pool = FallbackPool::new(false);

        let resolution = h.resolver().resolve(0, "city", &mut h.store, &mut pool).await;

        let local = Fingerprint::of_prefix(&body("served"), WINDOW);
        let Resolution::Downloaded(record) = resolution else {
            panic!("expected a download, got {:?}", resolution);
        };
        assert_eq!(record.hash, local);
        assert!(h.store.contains(&local));
        assert!(!h.store.contains(&Fingerprint::of_prefix(&body("remote"), WINDOW)));
        assert_eq!(h.store.len(), 1);
        assert_eq!(pool.records()[0].hash, local);
    }

    #[tokio::test]
    async fn test_cached_slot_leaves_its_pool_entry_for_others() {
        let mut h = Harness::new();
        tokio::fs::create_dir_all(h.clips.dir()).await.unwrap();
        tokio::fs::write(h.clips.path(0), body("prior")).await.unwrap();
        let mut pool = FallbackPool::bootstrap(false, &h.clips, &mut h.store, WINDOW).await;

        let resolver = h.resolver();
        let own = resolver.resolve(0, "no match", &mut h.store, &mut pool).await;
        let other = resolver.resolve(1, "no match", &mut h.store, &mut pool).await;

        assert_eq!(own, Resolution::Cached(h.clips.path(0)));
        assert_eq!(
            other,
            Resolution::Fallback {
                path: h.clips.path(1),
                source: h.clips.path(0),
            }
        );
    }
}
