//! Plain HTTP byte fetcher for stock clip downloads.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;

use crate::error::{check_status, ProviderResult};
use crate::stream::stream_to_file;
use crate::traits::ByteFetcher;

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout, covering the whole download
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
        }
    }
}

impl FetchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_secs(
                std::env::var("REEL_DOWNLOAD_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

/// Streams remote files over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> ProviderResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(FetchConfig::from_env())
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch_prefix(&self, url: &str, limit: usize) -> ProviderResult<Bytes> {
        let response = check_status(self.http.get(url).send().await?).await?;
        let mut stream = response.bytes_stream();
        let mut buf = BytesMut::with_capacity(limit);

        // Dropping the stream early closes the connection without reading
        // the rest of the clip
        while buf.len() < limit {
            match stream.next().await {
                Some(chunk) => buf.extend_from_slice(&chunk?),
                None => break,
            }
        }
        buf.truncate(limit);

        debug!(bytes = buf.len(), "Fetched prefix of {}", url);
        Ok(buf.freeze())
    }

    async fn download(&self, url: &str, dest: &Path) -> ProviderResult<u64> {
        let response = check_status(self.http.get(url).send().await?).await?;
        let written = stream_to_file(response, dest).await?;
        debug!(bytes = written, "Downloaded {} to {}", url, dest.display());
        Ok(written)
    }
}
