//! Streaming response bodies to disk.

use std::path::Path;

use futures::StreamExt;
use reel_models::partial_path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{ProviderError, ProviderResult};

/// Stream `response` into `dest` through a `.part` sibling.
pub(crate) async fn stream_to_file(response: reqwest::Response, dest: &Path) -> ProviderResult<u64> {
    let source = response.url().to_string();

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = partial_path(dest);
    let written = match write_body(response, &tmp).await {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
    };

    if written == 0 {
        let _ = fs::remove_file(&tmp).await;
        return Err(ProviderError::EmptyBody(source));
    }

    if let Err(e) = fs::rename(&tmp, dest).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    Ok(written)
}

async fn write_body(response: reqwest::Response, tmp: &Path) -> ProviderResult<u64> {
    let mut file = fs::File::create(tmp).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}
