//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_models::asset::DEFAULT_FINGERPRINT_WINDOW;
use reel_models::{CaptionStyle, EncodingConfig, FontCandidate, FrameSize, Segment};

use crate::error::{WorkerError, WorkerResult};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of every artifact the pipeline reads or writes
    pub output_dir: PathBuf,
    /// Output frame
    pub frame: FrameSize,
    /// Output frame rate
    pub fps: u32,
    /// Preferred caption font, first entry of the font cascade
    pub font_file: Option<PathBuf>,
    /// Caption styling
    pub caption: CaptionStyle,
    /// Pause after every successful remote acquisition
    pub acquire_pause: Duration,
    /// Duration given to segments without a voice track
    pub default_duration: f64,
    /// Cycle the fallback pool instead of using each entry once
    pub fallback_wrap: bool,
    /// Leading bytes hashed to fingerprint a clip
    pub fingerprint_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            frame: FrameSize::default(),
            fps: 30,
            font_file: Some(PathBuf::from("font.ttf")),
            caption: CaptionStyle::default(),
            acquire_pause: Duration::from_millis(1000),
            default_duration: 5.0,
            fallback_wrap: false,
            fingerprint_bytes: DEFAULT_FINGERPRINT_WINDOW,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let frame = FrameSize::new(
            env_parse("REEL_WIDTH").unwrap_or(defaults.frame.width),
            env_parse("REEL_HEIGHT").unwrap_or(defaults.frame.height),
        );

        let caption = CaptionStyle {
            font_size: env_parse("REEL_FONT_SIZE").unwrap_or(defaults.caption.font_size),
            max_width: env_parse("REEL_CAPTION_MAX_WIDTH").unwrap_or(defaults.caption.max_width),
            ..defaults.caption
        };

        let font_file = match std::env::var("REEL_FONT_FILE") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => defaults.font_file,
        };

        Self {
            output_dir: std::env::var("REEL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            frame,
            fps: env_parse("REEL_FPS").unwrap_or(defaults.fps),
            font_file,
            caption,
            acquire_pause: Duration::from_millis(
                env_parse("REEL_ACQUIRE_PAUSE_MS").unwrap_or(1000),
            ),
            default_duration: env_parse::<f64>("REEL_DEFAULT_DURATION")
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(defaults.default_duration),
            fallback_wrap: env_parse("REEL_FALLBACK_WRAP").unwrap_or(defaults.fallback_wrap),
            fingerprint_bytes: env_parse::<usize>("REEL_FINGERPRINT_BYTES")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.fingerprint_bytes),
        }
    }

    /// Config rooted at `output_dir` with all other values at their defaults.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn encoding(&self) -> EncodingConfig {
        EncodingConfig::default().with_fps(self.fps)
    }

    pub fn font_candidates(&self) -> Vec<FontCandidate> {
        FontCandidate::cascade(self.font_file.clone())
    }

    /// Script with one segment per non-empty line.
    pub fn script_path(&self) -> PathBuf {
        self.output_dir.join("line_by_line.txt")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.output_dir.join("audio")
    }

    pub fn clip_dir(&self) -> PathBuf {
        self.output_dir.join("video_clips")
    }

    /// Intermediate fitted clips, caption stills and units.
    pub fn work_dir(&self) -> PathBuf {
        self.output_dir.join("work")
    }

    pub fn hash_store_path(&self) -> PathBuf {
        self.output_dir.join("video_hashes.json")
    }

    pub fn final_output(&self) -> PathBuf {
        self.output_dir.join("youtube_short.mp4")
    }

    pub fn audio_path(&self, index: usize) -> PathBuf {
        self.audio_dir().join(Segment::artifact_name(index, "mp3"))
    }

    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.clip_dir().join(Segment::artifact_name(index, "mp4"))
    }

    /// Reject settings FFmpeg cannot render.
    pub fn validate(&self) -> WorkerResult<()> {
        let FrameSize { width, height } = self.frame;
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(WorkerError::config_error(format!(
                "frame {}x{} must have positive even dimensions",
                width, height
            )));
        }
        if self.fps == 0 {
            return Err(WorkerError::config_error("fps must be positive"));
        }
        if self.caption.font_size == 0 {
            return Err(WorkerError::config_error("caption font size must be positive"));
        }
        if !(self.default_duration.is_finite() && self.default_duration > 0.0) {
            return Err(WorkerError::config_error(format!(
                "default duration {} is not positive",
                self.default_duration
            )));
        }
        if self.fingerprint_bytes == 0 {
            return Err(WorkerError::config_error("fingerprint window must be positive"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.frame, FrameSize::new(1080, 1920));
        assert_eq!(config.acquire_pause, Duration::from_secs(1));
        assert_eq!(config.default_duration, 5.0);
        assert!(!config.fallback_wrap);
        assert_eq!(config.fingerprint_bytes, 65536);
    }

    #[test]
    fn test_artifact_paths() {
        let config = PipelineConfig::with_output_dir("/data/run");
        assert_eq!(config.script_path(), PathBuf::from("/data/run/line_by_line.txt"));
        assert_eq!(config.audio_path(2), PathBuf::from("/data/run/audio/part2.mp3"));
        assert_eq!(config.clip_path(0), PathBuf::from("/data/run/video_clips/part0.mp4"));
        assert_eq!(config.hash_store_path(), PathBuf::from("/data/run/video_hashes.json"));
        assert_eq!(config.final_output(), PathBuf::from("/data/run/youtube_short.mp4"));
    }

    #[test]
    fn test_font_candidates_start_with_font_file() {
        let config = PipelineConfig::default();
        let candidates = config.font_candidates();
        assert_eq!(candidates[0], FontCandidate::File(PathBuf::from("font.ttf")));
        assert_eq!(candidates.last(), Some(&FontCandidate::BackendDefault));
    }

    #[test]
    fn test_encoding_follows_fps() {
        let config = PipelineConfig {
            fps: 24,
            ..PipelineConfig::default()
        };
        assert_eq!(config.encoding().fps, 24);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unrenderable_settings() {
        let odd_frame = PipelineConfig {
            frame: FrameSize::new(1081, 1920),
            ..PipelineConfig::default()
        };
        assert!(matches!(odd_frame.validate(), Err(WorkerError::ConfigError(_))));

        let no_fps = PipelineConfig {
            fps: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(no_fps.validate(), Err(WorkerError::ConfigError(_))));

        let no_window = PipelineConfig {
            fingerprint_bytes: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(no_window.validate(), Err(WorkerError::ConfigError(_))));
    }
}
