//! Segment fitting: force a stock clip to an exact duration and frame.
//!
//! Duration is reconciled first:
//! - longer than the target: keep `[0, target)` at natural speed
//! - shorter: slow down uniformly by `source / target`
//! - equal (within [`DURATION_EPSILON`]): pass through
//!
//! The clip is then scaled to the frame height and center-cropped when too
//! wide, or centered on black padding when too narrow. Whatever happens,
//! the caller gets a clip of exactly the target duration and frame size:
//! any failure is replaced by a synthetic solid-color clip.

use std::path::{Path, PathBuf};

use reel_models::{EncodingConfig, FrameSize, Rgb};
use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::fit_filter;
use crate::fs_utils::is_nonempty_file;
use crate::probe::{probe_video, VideoInfo};
use crate::synthetic::render_solid_clip;

/// Durations closer than this are treated as equal.
pub const DURATION_EPSILON: f64 = 1e-3;

/// How the source duration is reconciled with the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitMode {
    /// Source is longer: the tail is dropped
    Trim,
    /// Source is shorter: playback speed is multiplied by `factor` (< 1)
    Stretch { factor: f64 },
    /// Durations already match
    Passthrough,
}

/// How the scaled width is reconciled with the frame width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalFit {
    Exact,
    /// Center crop starting at `x`
    Crop { x: u32 },
    /// Center on padding starting at `x`
    Pad { x: u32 },
}

/// Pure description of a fit; computing it never touches the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct FitPlan {
    pub mode: FitMode,
    pub source_duration: f64,
    pub target_duration: f64,
    /// Width after scaling to the frame height
    pub scaled_width: u32,
    pub horizontal: HorizontalFit,
    pub frame: FrameSize,
}

impl FitPlan {
    pub fn new(source: &VideoInfo, target_duration: f64, frame: FrameSize) -> MediaResult<Self> {
        validate_duration(target_duration)?;
        if !(source.duration.is_finite() && source.duration > 0.0) {
            return Err(MediaError::invalid_video(format!(
                "source duration {} is not positive",
                source.duration
            )));
        }
        if source.width == 0 || source.height == 0 {
            return Err(MediaError::invalid_video("source has zero dimensions"));
        }

        let d = source.duration;
        let mode = if (d - target_duration).abs() < DURATION_EPSILON {
            FitMode::Passthrough
        } else if d > target_duration {
            FitMode::Trim
        } else {
            FitMode::Stretch {
                factor: d / target_duration,
            }
        };

        let scaled = source.width as f64 * frame.height as f64 / source.height as f64;
        let scaled_width = (((scaled / 2.0).round() * 2.0) as u32).max(2);

        let horizontal = if scaled_width > frame.width {
            HorizontalFit::Crop {
                x: (scaled_width - frame.width) / 2,
            }
        } else if scaled_width < frame.width {
            HorizontalFit::Pad {
                x: (frame.width - scaled_width) / 2,
            }
        } else {
            HorizontalFit::Exact
        };

        Ok(Self {
            mode,
            source_duration: d,
            target_duration,
            scaled_width,
            horizontal,
            frame,
        })
    }

    /// Duration of the fitted clip. Always the target.
    pub fn output_duration(&self) -> f64 {
        self.target_duration
    }

    /// Frame of the fitted clip. Always the target frame.
    pub fn output_size(&self) -> FrameSize {
        self.frame
    }
}

/// Where a fitted clip's pixels came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOrigin {
    Stock(FitMode),
    Synthetic { color: Rgb },
}

/// A clip of exactly the segment duration and frame size.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedClip {
    pub path: PathBuf,
    pub duration: f64,
    pub origin: ClipOrigin,
}

impl FittedClip {
    pub fn is_synthetic(&self) -> bool {
        matches!(self.origin, ClipOrigin::Synthetic { .. })
    }
}

fn validate_duration(duration: f64) -> MediaResult<()> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(MediaError::invalid_duration(format!(
            "target duration {} is not positive",
            duration
        )))
    }
}

/// Build the command applying `plan` to `raw`.
///
/// The filter chain pads the tail with frozen frames; the output-side `-t`
/// cuts the result to exactly the target duration.
pub fn fit_clip_command(plan: &FitPlan, raw: &Path, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(FfmpegInput::file(raw))
        .video_filter(fit_filter(plan, encoding.fps))
        .duration(plan.output_duration())
        .no_audio()
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .pixel_format("yuv420p")
}

/// Fits raw stock clips to segment durations.
#[derive(Debug, Clone)]
pub struct SegmentFitter {
    frame: FrameSize,
    encoding: EncodingConfig,
    runner: FfmpegRunner,
}

impl SegmentFitter {
    pub fn new(frame: FrameSize, encoding: EncodingConfig) -> Self {
        Self {
            frame,
            encoding,
            runner: FfmpegRunner::new(),
        }
    }

    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    /// Fit `raw` to `target_duration`, degrading to a synthetic clip.
    ///
    /// Returns an error only when the target duration is invalid or the
    /// synthetic substitute itself cannot be rendered.
    pub async fn fit(
        &self,
        index: usize,
        raw: &Path,
        target_duration: f64,
        output: &Path,
    ) -> MediaResult<FittedClip> {
        validate_duration(target_duration)?;

        match self.try_fit(raw, target_duration, output).await {
            Ok(plan) => {
                debug!(
                    segment = index,
                    mode = ?plan.mode,
                    source = plan.source_duration,
                    target = plan.target_duration,
                    "Fitted stock clip"
                );
                Ok(FittedClip {
                    path: output.to_path_buf(),
                    duration: plan.output_duration(),
                    origin: ClipOrigin::Stock(plan.mode),
                })
            }
            Err(e) => {
                warn!(
                    segment = index,
                    error = %e,
                    "Video clip fitting failed, substituting synthetic clip"
                );
                self.synthesize(index, target_duration, output).await
            }
        }
    }

    /// Solid-color clip in the index-rotated fallback color.
    pub async fn synthesize(&self, index: usize, duration: f64, output: &Path) -> MediaResult<FittedClip> {
        validate_duration(duration)?;
        let color = Rgb::fallback_for(index);
        render_solid_clip(color, duration, self.frame, &self.encoding, output).await?;

        Ok(FittedClip {
            path: output.to_path_buf(),
            duration,
            origin: ClipOrigin::Synthetic { color },
        })
    }

    async fn try_fit(&self, raw: &Path, target_duration: f64, output: &Path) -> MediaResult<FitPlan> {
        let info = probe_video(raw).await?;
        let plan = FitPlan::new(&info, target_duration, self.frame)?;

        let cmd = fit_clip_command(&plan, raw, output, &self.encoding);
        self.runner.run(&cmd).await?;

        if !is_nonempty_file(output).await {
            return Err(MediaError::invalid_video(format!(
                "fitted clip {} is empty",
                output.display()
            )));
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(duration: f64, width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            duration,
            width,
            height,
            fps: 30.0,
            codec: "h264".to_string(),
        }
    }

    #[test]
    fn test_trim_keeps_natural_speed() {
        let plan = FitPlan::new(&info(5.0, 1080, 1920), 3.0, FrameSize::default()).unwrap();
        assert_eq!(plan.mode, FitMode::Trim);
        assert_eq!(plan.output_duration(), 3.0);
    }

    #[test]
    fn test_stretch_factor() {
        let plan = FitPlan::new(&info(2.0, 1080, 1920), 6.0, FrameSize::default()).unwrap();
        match plan.mode {
            FitMode::Stretch { factor } => assert!((factor - 2.0 / 6.0).abs() < 1e-12),
            other => panic!("expected stretch, got {:?}", other),
        }
        assert_eq!(plan.output_duration(), 6.0);
    }

    #[test]
    fn test_equal_duration_passes_through() {
        let plan = FitPlan::new(&info(4.0, 1080, 1920), 4.0, FrameSize::default()).unwrap();
        assert_eq!(plan.mode, FitMode::Passthrough);

        let near = FitPlan::new(&info(4.0004, 1080, 1920), 4.0, FrameSize::default()).unwrap();
        assert_eq!(near.mode, FitMode::Passthrough);
        assert_eq!(near.output_duration(), 4.0);
    }

    /// Value following the last `-t` after the final input.
    fn output_cut(cmd: &FfmpegCommand) -> Option<String> {
        let args = cmd.build_args();
        let last_input = args.iter().rposition(|a| a == "-i")?;
        let cut = args[last_input..].iter().position(|a| a == "-t")? + last_input;
        args.get(cut + 1).cloned()
    }

    #[test]
    fn test_three_segment_scenario() {
        let audio = [3.0, 6.0, 4.0];
        let raw = [5.0, 2.0, 4.0];

        let plans: Vec<FitPlan> = audio
            .iter()
            .zip(raw.iter())
            .map(|(a, r)| FitPlan::new(&info(*r, 1920, 1080), *a, FrameSize::default()).unwrap())
            .collect();

        assert_eq!(plans[0].mode, FitMode::Trim);
        assert!(matches!(plans[1].mode, FitMode::Stretch { factor } if (factor - 0.333).abs() < 1e-3));
        assert_eq!(plans[2].mode, FitMode::Passthrough);

        let cuts: Vec<Option<String>> = plans
            .iter()
            .map(|plan| {
                output_cut(&fit_clip_command(
                    plan,
                    Path::new("raw.mp4"),
                    Path::new("fit.mp4"),
                    &EncodingConfig::default(),
                ))
            })
            .collect();
        assert_eq!(
            cuts,
            vec![
                Some("3.000000".to_string()),
                Some("6.000000".to_string()),
                Some("4.000000".to_string()),
            ]
        );
    }

    #[test]
    fn test_fit_command_pads_before_the_cut() {
        let plan = FitPlan::new(&info(2.0, 1080, 1920), 6.0, FrameSize::default()).unwrap();
        let cmd = fit_clip_command(&plan, Path::new("raw.mp4"), Path::new("fit.mp4"), &EncodingConfig::default());
        let args = cmd.build_args();

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(args[vf + 1].contains("setpts=(PTS-STARTPTS)/0.333333"));
        assert!(args[vf + 1].contains("tpad=stop_mode=clone"));
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("fit.mp4"));
    }

    #[test]
    fn test_landscape_source_is_center_cropped() {
        let plan = FitPlan::new(&info(5.0, 1280, 720), 3.0, FrameSize::default()).unwrap();
        // 1280 * 1920 / 720 = 3413.33, rounded to even
        assert_eq!(plan.scaled_width, 3414);
        assert_eq!(plan.horizontal, HorizontalFit::Crop { x: 1167 });
        assert_eq!(plan.output_size(), FrameSize::default());
    }

    #[test]
    fn test_narrow_source_is_padded() {
        let plan = FitPlan::new(&info(5.0, 480, 1080), 3.0, FrameSize::default()).unwrap();
        assert_eq!(plan.scaled_width, 854);
        assert_eq!(plan.horizontal, HorizontalFit::Pad { x: 113 });
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert!(FitPlan::new(&info(5.0, 1080, 1920), 0.0, FrameSize::default()).is_err());
        assert!(FitPlan::new(&info(5.0, 1080, 1920), f64::NAN, FrameSize::default()).is_err());
        assert!(FitPlan::new(&info(0.0, 1080, 1920), 3.0, FrameSize::default()).is_err());
        assert!(FitPlan::new(&info(5.0, 0, 1920), 3.0, FrameSize::default()).is_err());
    }

    #[tokio::test]
    async fn test_fit_rejects_invalid_target_before_any_work() {
        let fitter = SegmentFitter::new(FrameSize::default(), EncodingConfig::default());
        let result = fitter
            .fit(0, Path::new("/missing.mp4"), -1.0, Path::new("/tmp/never.mp4"))
            .await;
        assert!(matches!(result, Err(MediaError::InvalidDuration(_))));
    }

    async fn lavfi_clip(path: &Path, seconds: f64) {
        let cmd = FfmpegCommand::new(path)
            .input(FfmpegInput::lavfi(format!(
                "testsrc=size=1280x720:rate=30:duration={}",
                seconds
            )))
            .no_audio()
            .video_codec("libx264")
            .pixel_format("yuv420p");
        FfmpegRunner::new().run(&cmd).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_fitted_clips_match_audio_durations() {
        use crate::probe::probe_duration;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let fitter = SegmentFitter::new(FrameSize::default(), EncodingConfig::default());

        let cases = [
            (5.0, 3.0, FitMode::Trim),
            (2.0, 6.0, FitMode::Stretch { factor: 2.0 / 6.0 }),
            (4.0, 4.0, FitMode::Passthrough),
        ];
        for (index, (raw_secs, target, mode)) in cases.into_iter().enumerate() {
            let raw = dir.path().join(format!("raw_{}.mp4", index));
            let out = dir.path().join(format!("fit_{}.mp4", index));
            lavfi_clip(&raw, raw_secs).await;

            let fitted = fitter.fit(index, &raw, target, &out).await.unwrap();
            let ClipOrigin::Stock(fitted_mode) = fitted.origin else {
                panic!("segment {} fell back to a synthetic clip", index);
            };
            assert_eq!(std::mem::discriminant(&fitted_mode), std::mem::discriminant(&mode));
            assert_eq!(fitted.duration, target);

            let actual = probe_duration(&out).await.unwrap();
            assert!(
                (actual - target).abs() < 1.0 / 30.0 + 1e-3,
                "segment {}: {} vs {}",
                index,
                actual,
                target
            );
            let video = probe_video(&out).await.unwrap();
            assert_eq!((video.width, video.height), (1080, 1920));
        }
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_undecodable_clip_becomes_synthetic() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.mp4");
        tokio::fs::write(&raw, b"not a video").await.unwrap();

        let fitter = SegmentFitter::new(FrameSize::default(), EncodingConfig::default());
        let fitted = fitter.fit(2, &raw, 2.5, &dir.path().join("fit.mp4")).await.unwrap();

        assert!(fitted.is_synthetic());
        assert_eq!(fitted.duration, 2.5);
    }
}
