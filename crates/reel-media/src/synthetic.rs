//! Synthetic solid-color clips.
//!
//! Used wherever a segment has no usable stock footage: the segment keeps
//! its exact duration and frame size, only the picture is replaced.

use std::path::Path;

use reel_models::{EncodingConfig, FrameSize, Rgb};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::solid_color_source;

/// Build the command rendering a silent solid-color clip.
pub fn solid_clip_command(
    color: Rgb,
    duration: f64,
    frame: FrameSize,
    encoding: &EncodingConfig,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(FfmpegInput::lavfi(solid_color_source(
            color,
            frame,
            duration,
            encoding.fps,
        )))
        .duration(duration)
        .no_audio()
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .pixel_format("yuv420p")
}

/// Render a solid-color clip of `duration` seconds.
pub async fn render_solid_clip(
    color: Rgb,
    duration: f64,
    frame: FrameSize,
    encoding: &EncodingConfig,
    output: &Path,
) -> MediaResult<()> {
    info!(
        "Rendering synthetic clip {} ({}, {:.2}s)",
        output.display(),
        color.to_ffmpeg(),
        duration
    );

    let cmd = solid_clip_command(color, duration, frame, encoding, output);
    FfmpegRunner::new().run(&cmd).await
}
