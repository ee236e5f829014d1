//! Segment models.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::caption::OverlayClip;

/// Where a segment's voice track comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioSource {
    /// Synthesized voice artifact on disk
    File { path: PathBuf },
    /// Generated silence, used when no voice artifact exists
    Silent,
}

impl AudioSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            AudioSource::File { path } => Some(path),
            AudioSource::Silent => None,
        }
    }
}

/// One line of the script and the assets that back it.
///
/// `audio_duration` is the timing anchor: the fitted video and the caption
/// are always derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Zero-based position in the script
    pub index: usize,
    /// Caption text (also the stock search prompt)
    pub text: String,
    /// Voice track duration in seconds
    pub audio_duration: f64,
    /// Voice track
    pub audio: AudioSource,
    /// Resolved stock clip, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<PathBuf>,
    /// Rendered caption overlay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<OverlayClip>,
}

impl Segment {
    pub fn new(index: usize, text: impl Into<String>, audio: AudioSource, audio_duration: f64) -> Self {
        Self {
            index,
            text: text.into(),
            audio_duration,
            audio,
            video: None,
            caption: None,
        }
    }

    pub fn with_video(mut self, video: Option<PathBuf>) -> Self {
        self.video = video;
        self
    }

    /// Artifact file name for an index (`part{index}.{ext}`).
    pub fn artifact_name(index: usize, extension: &str) -> String {
        format!("part{}.{}", index, extension)
    }
}

/// Temporary sibling path used while an artifact is being written.
pub fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dst.with_file_name(name)
}
