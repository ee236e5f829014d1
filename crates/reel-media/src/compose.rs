//! Unit composition and final concatenation.
//!
//! A unit is one segment's fitted video with its caption layered on top and
//! its audio bound underneath, cut to exactly the audio duration. Units are
//! encoded with identical parameters so the final concatenation can usually
//! stream-copy; when it cannot, the timeline is re-encoded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reel_models::encoding::AUDIO_SAMPLE_RATE;
use reel_models::{AudioSource, EncodingConfig, FrameSize, OverlayClip, OverlayKind};
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{concat_list_entry, silent_audio_source, solid_color_source, unit_filter_graph};
use crate::fs_utils::{is_nonempty_file, write_atomic};
use crate::progress::ProgressLog;

/// Percent step between final render progress log lines.
const PROGRESS_LOG_STEP: u64 = 10;

/// A composed per-segment clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedUnit {
    pub index: usize,
    pub path: PathBuf,
    pub duration: f64,
}

/// Composes units and concatenates them into the final video.
#[derive(Debug, Clone)]
pub struct UnitComposer {
    encoding: EncodingConfig,
    runner: FfmpegRunner,
}

impl UnitComposer {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            runner: FfmpegRunner::new(),
        }
    }

    /// Build the command layering `caption` over `video` with `audio` bound.
    pub fn unit_command(
        &self,
        video: &Path,
        caption: &OverlayClip,
        audio: &AudioSource,
        duration: f64,
        output: &Path,
    ) -> FfmpegCommand {
        let caption_input = match &caption.kind {
            OverlayKind::Rendered { image } => FfmpegInput::looped_image(image, duration),
            OverlayKind::Degenerate { color } => FfmpegInput::lavfi(solid_color_source(
                *color,
                FrameSize::new(caption.width, caption.height),
                caption.duration,
                self.encoding.fps,
            )),
        };

        let audio_input = match audio {
            AudioSource::File { path } => FfmpegInput::file(path),
            AudioSource::Silent => {
                FfmpegInput::lavfi(silent_audio_source(AUDIO_SAMPLE_RATE)).duration(duration)
            }
        };

        FfmpegCommand::new(output)
            .input(FfmpegInput::file(video))
            .input(caption_input)
            .input(audio_input)
            .filter_complex(unit_filter_graph(duration, AUDIO_SAMPLE_RATE))
            .map("[v]")
            .map("[a]")
            .duration(duration)
            .video_codec(&self.encoding.codec)
            .preset(&self.encoding.preset)
            .crf(self.encoding.crf)
            .frame_rate(self.encoding.fps)
            .pixel_format("yuv420p")
            .audio_codec(&self.encoding.audio_codec)
            .audio_bitrate(&self.encoding.audio_bitrate)
            .output_arg("-ar")
            .output_arg(AUDIO_SAMPLE_RATE.to_string())
            .output_arg("-ac")
            .output_arg("2")
    }

    /// Compose one unit whose duration is locked to `duration`.
    pub async fn compose_unit(
        &self,
        index: usize,
        video: &Path,
        caption: &OverlayClip,
        audio: &AudioSource,
        duration: f64,
        output: &Path,
    ) -> MediaResult<ComposedUnit> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(MediaError::invalid_duration(format!(
                "unit {} duration {} is not positive",
                index, duration
            )));
        }
        if !video.exists() {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        if let Some(path) = audio.path() {
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }
        }

        let cmd = self.unit_command(video, caption, audio, duration, output);
        self.runner.run(&cmd).await?;

        if !is_nonempty_file(output).await {
            return Err(MediaError::internal(format!(
                "unit {} produced no output",
                index
            )));
        }

        Ok(ComposedUnit {
            index,
            path: output.to_path_buf(),
            duration,
        })
    }

    /// Concatenate `units` in the given order into `output`.
    pub async fn concat_units(&self, units: &[ComposedUnit], output: &Path) -> MediaResult<PathBuf> {
        if units.is_empty() {
            return Err(MediaError::EmptyTimeline);
        }

        let list_path = output.with_extension("concat.txt");
        let list: String = units
            .iter()
            .map(|u| concat_list_entry(&u.path) + "\n")
            .collect();
        write_atomic(&list_path, list.as_bytes()).await?;

        let total: f64 = units.iter().map(|u| u.duration).sum();
        info!(
            units = units.len(),
            duration = total,
            "Concatenating {} units into {}",
            units.len(),
            output.display()
        );

        let copy = FfmpegCommand::new(output)
            .input(FfmpegInput::concat_list(&list_path))
            .codec_copy()
            .faststart();

        let result = match self.runner.run(&copy).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    error = %e,
                    stderr = e.stderr().unwrap_or(""),
                    "Stream copy concat failed, re-encoding"
                );
                let progress = Arc::new(ProgressLog::new("final", total, PROGRESS_LOG_STEP));
                self.runner
                    .run_with_progress(&self.reencode_command(&list_path, output), move |p| {
                        progress.observe(&p);
                    })
                    .await
            }
        };

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            warn!(error = %e, "Failed to remove concat list {}", list_path.display());
        }
        result?;

        if !is_nonempty_file(output).await {
            return Err(MediaError::internal(format!(
                "final render {} is empty",
                output.display()
            )));
        }

        Ok(output.to_path_buf())
    }

    fn reencode_command(&self, list_path: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .input(FfmpegInput::concat_list(list_path))
            .video_codec(&self.encoding.codec)
            .preset(&self.encoding.preset)
            .crf(self.encoding.crf)
            .frame_rate(self.encoding.fps)
            .pixel_format("yuv420p")
            .audio_codec(&self.encoding.audio_codec)
            .audio_bitrate(&self.encoding.audio_bitrate)
            .faststart()
    }
}
