//! Worker error types.

use std::path::PathBuf;

use reel_media::MediaError;
use reel_providers::ProviderError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Pipeline-level failures. Only these abort a run.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No segment produced a usable unit")]
    NoUsableSegments,

    #[error("Script not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("Script is empty: {0}")]
    EmptyScript(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// A segment that could not be turned into a unit. The run continues.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("segment {index}: audio probe failed: {source}")]
    AudioProbe {
        index: usize,
        #[source]
        source: MediaError,
    },

    #[error("segment {index}: no usable video: {source}")]
    Video {
        index: usize,
        #[source]
        source: MediaError,
    },

    #[error("segment {index}: composition failed: {source}")]
    Compose {
        index: usize,
        #[source]
        source: MediaError,
    },
}

impl SegmentError {
    pub fn index(&self) -> usize {
        match self {
            SegmentError::AudioProbe { index, .. }
            | SegmentError::Video { index, .. }
            | SegmentError::Compose { index, .. } => *index,
        }
    }

    /// Stage label used in logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            SegmentError::AudioProbe { .. } => "audio",
            SegmentError::Video { .. } => "video",
            SegmentError::Compose { .. } => "compose",
        }
    }
}
