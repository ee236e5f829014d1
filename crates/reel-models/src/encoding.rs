//! Output encoding settings.

use serde::{Deserialize, Serialize};

/// Sample rate used for generated silence and re-encoded audio
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Codec settings shared by every render step.
///
/// Missing fields deserialize to the H.264/AAC defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Video encoder
    pub codec: String,
    /// x264 speed preset
    pub preset: String,
    /// Constant rate factor, lower is better
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Every intermediate clip is normalized to this rate so units
    /// concatenate without re-timing
    pub fps: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".into(),
            preset: "fast".into(),
            crf: 20,
            audio_codec: "aac".into(),
            audio_bitrate: "128k".into(),
            fps: 30,
        }
    }
}

impl EncodingConfig {
    /// Set the output frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }
}
