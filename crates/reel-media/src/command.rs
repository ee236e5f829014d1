//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{FfmpegProgress, ProgressLine};

/// Number of non-progress stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// A single FFmpeg input with its input-side options.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegInput {
    /// Arguments placed before this input's `-i`
    args: Vec<String>,
    /// File path or lavfi expression
    source: String,
}

impl FfmpegInput {
    /// Plain file input.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            args: Vec::new(),
            source: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Synthetic input from a lavfi source expression (e.g. `color=...`).
    pub fn lavfi(expr: impl Into<String>) -> Self {
        Self {
            args: vec!["-f".to_string(), "lavfi".to_string()],
            source: expr.into(),
        }
    }

    /// Still image repeated for `seconds`.
    pub fn looped_image(path: impl AsRef<Path>, seconds: f64) -> Self {
        Self::file(path)
            .arg("-loop")
            .arg("1")
            .arg("-t")
            .arg(format_seconds(seconds))
    }

    /// Concat demuxer list file.
    pub fn concat_list(path: impl AsRef<Path>) -> Self {
        Self::file(path)
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
    }

    /// Add an input-side argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Limit how much of this input is read.
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format_seconds(seconds))
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Arguments between the last input and the output path
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Append an input.
    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Append one output-side argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Limit output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format_seconds(seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set output frame rate.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Set output pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Drop audio streams.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Move the moov atom to the front for progressive playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Full argument list: global flags, inputs, output options, output.
    pub fn build_args(&self) -> Vec<String> {
        // Overwrite, quiet, and machine-readable progress on stderr
        let mut args: Vec<String> = ["-y", "-v", "error", "-progress", "pipe:2"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.display().to_string());
        args
    }
}

/// Runs [`FfmpegCommand`]s, optionally bounded by a timeout.
#[derive(Debug, Default, Clone)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the process if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run `cmd`, handing every completed progress block to `on_progress`.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, on_progress: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!(output = %cmd.output().display(), "ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr was not captured"))?;
        let collector = tokio::spawn(collect_stderr(stderr, on_progress));

        let status = self.wait(&mut child).await;
        let tail = collector.await.unwrap_or_default();

        match status? {
            Some(code) if code != 0 => Err(MediaError::ffmpeg_failed(
                format!("FFmpeg exited with status {}", code),
                (!tail.is_empty()).then_some(tail),
                Some(code),
            )),
            None => Err(MediaError::ffmpeg_failed(
                "FFmpeg was terminated by a signal",
                (!tail.is_empty()).then_some(tail),
                None,
            )),
            Some(_) => Ok(()),
        }
    }

    /// Exit code of the child, `None` when it was killed by a signal.
    async fn wait(&self, child: &mut Child) -> MediaResult<Option<i32>> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait().await?.code());
        };

        match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => Ok(status?.code()),
            Err(_) => {
                warn!(seconds = limit.as_secs(), "FFmpeg exceeded its time limit, killing it");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill FFmpeg");
                }
                Err(MediaError::Timeout(limit.as_secs()))
            }
        }
    }
}

/// Drain FFmpeg's stderr. Progress blocks go to `on_progress`; the last
/// other lines are returned for error reports.
async fn collect_stderr<F>(stderr: ChildStderr, on_progress: F) -> String
where
    F: Fn(FfmpegProgress),
{
    let mut lines = BufReader::new(stderr).lines();
    let mut snapshot = FfmpegProgress::default();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        match snapshot.apply(&line) {
            ProgressLine::BlockEnd => on_progress(snapshot.clone()),
            ProgressLine::Field => {}
            ProgressLine::Other => {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    }

    Vec::from(tail).join("\n")
}

/// Format seconds the way every command in this crate passes them to FFmpeg.
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.6}", seconds)
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
