//! FFmpeg filter and lavfi source builders.

use std::path::Path;

use reel_models::{CaptionStyle, FontCandidate, FrameSize, Rgb};

use crate::command::format_seconds;
use crate::fit::{FitMode, FitPlan, HorizontalFit};

/// Extra frozen tail appended before the final `-t` cut, so frame rounding
/// can never leave a fitted clip short of its target.
pub const TAIL_GUARD_SECS: f64 = 0.5;

/// Escape a value for use inside a filtergraph option.
///
/// FFmpeg unescapes twice: once when parsing the graph, once when parsing
/// the filter's options. Backslashes in paths become forward slashes first.
pub fn escape_filter_value(value: &str) -> String {
    let normalized = value.replace('\\', "/");
    let option = escape_chars(&normalized, &['\\', '\'', ':']);
    escape_chars(&option, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Filter chain that reconciles duration, then scales and crops or pads to
/// the target frame.
pub fn fit_filter(plan: &FitPlan, fps: u32) -> String {
    let timing = match plan.mode {
        FitMode::Trim => format!(
            "trim=duration={},setpts=PTS-STARTPTS",
            format_seconds(plan.target_duration)
        ),
        FitMode::Stretch { factor } => format!("setpts=(PTS-STARTPTS)/{:.6}", factor),
        FitMode::Passthrough => "setpts=PTS-STARTPTS".to_string(),
    };

    let frame = plan.frame;
    let mut chain = vec![timing, format!("scale={}:{}", plan.scaled_width, frame.height)];

    match plan.horizontal {
        HorizontalFit::Crop { x } => {
            chain.push(format!("crop={}:{}:{}:0", frame.width, frame.height, x));
        }
        HorizontalFit::Pad { x } => {
            chain.push(format!("pad={}:{}:{}:0:black", frame.width, frame.height, x));
        }
        HorizontalFit::Exact => {}
    }

    chain.push(format!(
        "tpad=stop_mode=clone:stop_duration={}",
        format_seconds(TAIL_GUARD_SECS)
    ));
    chain.push(format!("fps={}", fps));
    chain.push("setsar=1".to_string());
    chain.push("format=yuv420p".to_string());

    chain.join(",")
}

/// Solid color lavfi source.
pub fn solid_color_source(color: Rgb, frame: FrameSize, duration: f64, fps: u32) -> String {
    format!(
        "color=c={}:s={}:d={}:r={}",
        color.to_ffmpeg(),
        frame.ffmpeg_size(),
        format_seconds(duration),
        fps
    )
}

/// Fully transparent RGBA canvas used to render caption stills.
pub fn transparent_canvas(frame: FrameSize) -> String {
    format!("color=c=black@0.0:s={},format=rgba", frame.ffmpeg_size())
}

/// Stereo silence lavfi source.
pub fn silent_audio_source(sample_rate: u32) -> String {
    format!("anullsrc=r={}:cl=stereo", sample_rate)
}

/// `drawtext` filter for one font candidate.
///
/// The box drawn behind the text is the background plate: it is sized to
/// the text bounding box plus `pad_y`/`pad_x` and is positioned with the
/// text, bottom-center.
pub fn caption_drawtext(font: &FontCandidate, textfile: &Path, style: &CaptionStyle) -> String {
    let mut options = Vec::with_capacity(14);

    match font {
        FontCandidate::File(path) => {
            options.push(format!("fontfile={}", escape_filter_value(&path.to_string_lossy())));
        }
        FontCandidate::Family(name) => {
            options.push(format!("font={}", escape_filter_value(name)));
        }
        FontCandidate::BackendDefault => {}
    }

    options.push(format!(
        "textfile={}",
        escape_filter_value(&textfile.to_string_lossy())
    ));
    options.push(format!("fontsize={}", style.font_size));
    options.push(format!("fontcolor={}", style.text_color));
    options.push(format!("borderw={}", style.stroke_width));
    options.push(format!("bordercolor={}", style.stroke_color));
    options.push(format!("line_spacing={}", style.line_spacing));
    options.push("box=1".to_string());
    options.push(format!("boxcolor=black@{:.2}", style.plate_opacity.clamp(0.0, 1.0)));
    options.push(format!("boxborderw={}|{}", style.pad_y, style.pad_x));
    options.push("x=(w-text_w)/2".to_string());
    options.push(format!("y=h-text_h-{}", style.pad_y + style.bottom_margin));

    format!("drawtext={},format=rgba", options.join(":"))
}

/// Filter graph layering caption input `1` over video input `0` and
/// locking audio input `2` to exactly `duration` seconds.
///
/// The overlay is anchored bottom-center; full-frame caption stills resolve
/// to offset `0:0`.
pub fn unit_filter_graph(duration: f64, sample_rate: u32) -> String {
    format!(
        "[0:v][1:v]overlay=x=(W-w)/2:y=H-h:eof_action=pass,format=yuv420p[v];\
         [2:a]aresample={rate},apad,atrim=duration={dur},asetpts=PTS-STARTPTS[a]",
        rate = sample_rate,
        dur = format_seconds(duration),
    )
}

/// Line of a concat demuxer list file.
pub fn concat_list_entry(path: &Path) -> String {
    format!("file '{}'", path.to_string_lossy().replace('\'', "'\\''"))
}
