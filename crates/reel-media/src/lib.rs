//! FFmpeg CLI wrapper for reel assembly.
//!
//! This crate provides:
//! - A command builder and runner with progress tracking
//! - FFprobe media information
//! - Segment fitting (trim, stretch, scale and crop or pad)
//! - Caption rendering with a font fallback cascade
//! - Synthetic solid-color clips
//! - Unit composition and final concatenation

pub mod caption;
pub mod command;
pub mod compose;
pub mod error;
pub mod filters;
pub mod fit;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod synthetic;

pub use caption::{wrap_text, CaptionRenderer};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use compose::{ComposedUnit, UnitComposer};
pub use error::{MediaError, MediaResult};
pub use fit::{ClipOrigin, FitMode, FitPlan, FittedClip, HorizontalFit, SegmentFitter, DURATION_EPSILON};
pub use fs_utils::{copy_file, is_nonempty_file, partial_path, write_atomic};
pub use probe::{probe_duration, probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressLine, ProgressLog};
pub use synthetic::render_solid_clip;
