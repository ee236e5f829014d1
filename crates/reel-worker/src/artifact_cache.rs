//! Index-addressed artifact directory.
//!
//! Each segment owns one slot (`part{index}.{ext}`). A slot holding a
//! non-empty file is final: nothing in the pipeline rewrites it, so a rerun
//! skips every segment whose artifact already exists.

use std::path::{Path, PathBuf};

use reel_media::{copy_file, is_nonempty_file, MediaResult};
use reel_models::Segment;

#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
    extension: &'static str,
}

impl ArtifactCache {
    pub fn new(dir: impl Into<PathBuf>, extension: &'static str) -> Self {
        Self {
            dir: dir.into(),
            extension,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Slot location for `index`, whether or not it is filled.
    pub fn path(&self, index: usize) -> PathBuf {
        self.dir.join(Segment::artifact_name(index, self.extension))
    }

    pub async fn exists(&self, index: usize) -> bool {
        is_nonempty_file(&self.path(index)).await
    }

    pub async fn get(&self, index: usize) -> Option<PathBuf> {
        let path = self.path(index);
        is_nonempty_file(&path).await.then_some(path)
    }

    /// Fill slot `index` with a copy of `src`.
    pub async fn put(&self, index: usize, src: &Path) -> MediaResult<PathBuf> {
        let dst = self.path(index);
        copy_file(src, &dst).await?;
        Ok(dst)
    }

    /// Existing artifacts in this directory with the cache extension, sorted
    /// by path.
    pub async fn list(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(self.extension)
                && is_nonempty_file(&path).await
            {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_exists_get_put() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(dir.path().join("video_clips"), "mp4");
        let source = dir.path().join("source.mp4");
        tokio::fs::write(&source, b"clip bytes").await.unwrap();

        assert!(!cache.exists(0).await);
        assert_eq!(cache.get(0).await, None);

        let stored = cache.put(0, &source).await.unwrap();
        assert_eq!(stored, dir.path().join("video_clips").join("part0.mp4"));
        assert!(cache.exists(0).await);
        assert_eq!(cache.get(0).await, Some(stored));
    }

    #[tokio::test]
    async fn test_empty_file_is_not_an_artifact() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(dir.path(), "mp3");
        tokio::fs::write(cache.path(1), b"").await.unwrap();

        assert!(!cache.exists(1).await);
    }

    #[tokio::test]
    async fn test_list_sorted_with_extension_filter() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(dir.path(), "mp4");
        for name in ["part2.mp4", "part0.mp4", "notes.txt", "part1.mp4.part"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let listed = cache.list().await.unwrap();
        assert_eq!(
            listed,
            vec![dir.path().join("part0.mp4"), dir.path().join("part2.mp4")]
        );
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(dir.path().join("absent"), "mp4");
        assert!(cache.list().await.unwrap().is_empty());
    }
}
