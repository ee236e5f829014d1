//! Filesystem helpers for artifacts that must never be observed half-written.
//!
//! Every artifact is first written next to its destination under a
//! temporary name and then renamed into place, so an interrupted run leaves
//! either the complete file or nothing at the destination path.

use std::path::Path;

pub use reel_models::partial_path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Whether `path` exists and holds at least one byte.
pub async fn is_nonempty_file(path: &Path) -> bool {
    matches!(fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() > 0)
}

async fn ensure_parent(dst: &Path) -> MediaResult<()> {
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Copy `src` to `dst` atomically and return the number of bytes written.
///
/// Fails if the copy produced an empty file.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }
    ensure_parent(dst).await?;

    let tmp_dst = partial_path(dst);
    let written = fs::copy(src, &tmp_dst).await.map_err(|e| {
        tracing::error!(
            "Failed to copy {} -> {}: {}",
            src.display(),
            tmp_dst.display(),
            e
        );
        MediaError::from(e)
    })?;

    if written == 0 {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::internal(format!(
            "copy of {} produced an empty file",
            src.display()
        )));
    }

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::from(e));
    }

    Ok(written)
}

/// Write `contents` to `dst` through a temporary sibling.
pub async fn write_atomic(dst: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> MediaResult<()> {
    let dst = dst.as_ref();
    ensure_parent(dst).await?;

    let tmp_dst = partial_path(dst);
    fs::write(&tmp_dst, contents).await?;
    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::from(e));
    }
    Ok(())
}
