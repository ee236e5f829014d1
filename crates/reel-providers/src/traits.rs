//! Collaborator interfaces used by the pipeline.
//!
//! Every remote service sits behind one of these traits so the asset
//! resolver and voice stage can be driven by in-memory fakes in tests.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProviderResult;

/// Stock footage search.
#[async_trait]
pub trait ClipSearch: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Return the download URL of the best matching clip, or `None` when
    /// nothing suitable was found.
    async fn search(&self, query: &str) -> ProviderResult<Option<String>>;
}

/// Best-effort translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`. Implementations return the input unchanged on any
    /// failure.
    async fn translate(&self, text: &str) -> String;
}

/// Access to remote bytes.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    /// The first `limit` bytes of the resource (fewer if it is shorter).
    async fn fetch_prefix(&self, url: &str, limit: usize) -> ProviderResult<Bytes>;

    /// Download the full resource to `dest` and return the byte count.
    ///
    /// `dest` is only ever observed complete: the body is streamed to a
    /// temporary sibling first. An empty body is an error.
    async fn download(&self, url: &str, dest: &Path) -> ProviderResult<u64>;
}

/// Text-to-speech.
#[async_trait]
pub trait VoiceSynth: Send + Sync {
    /// Synthesize `text` into an audio file at `dest`.
    async fn synthesize(&self, text: &str, dest: &Path) -> ProviderResult<u64>;
}

/// Translator that returns its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}
