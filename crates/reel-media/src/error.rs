//! Media errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for reel-media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Failures of FFmpeg/FFprobe invocations and the files around them.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg binary not found on PATH")]
    FfmpegNotFound,

    #[error("ffprobe binary not found on PATH")]
    FfprobeNotFound,

    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Missing media file: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ffmpeg killed after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Not a usable video: {0}")]
    InvalidVideo(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    #[error("Nothing to concatenate")]
    EmptyTimeline,

    #[error("{0}")]
    Internal(String),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_video(message: impl Into<String>) -> Self {
        Self::InvalidVideo(message.into())
    }

    pub fn invalid_duration(message: impl Into<String>) -> Self {
        Self::InvalidDuration(message.into())
    }

    pub fn font_unavailable(message: impl Into<String>) -> Self {
        Self::FontUnavailable(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Last stderr lines captured from the failing tool, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { stderr, .. } | MediaError::FfprobeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}
