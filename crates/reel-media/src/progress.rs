//! FFmpeg progress tracking for long renders.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Snapshot parsed from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

/// Classification of one stderr line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLine {
    /// `progress=...`, closing a block of fields
    BlockEnd,
    /// Any other `key=value` field of the progress protocol
    Field,
    /// Diagnostic output
    Other,
}

const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
];

impl FfmpegProgress {
    /// Fold one stderr line into this snapshot.
    pub fn apply(&mut self, line: &str) -> ProgressLine {
        let Some((key, value)) = line.trim().split_once('=') else {
            return ProgressLine::Other;
        };

        match key {
            "progress" => {
                self.is_complete = value == "end";
                return ProgressLine::BlockEnd;
            }
            // Despite the name, out_time_ms is in microseconds as well
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "out_time" => self.out_time = value.to_string(),
            "frame" => self.frame = value.parse().unwrap_or(self.frame),
            "fps" => self.fps = value.parse().unwrap_or(self.fps),
            "speed" => {
                self.speed = value
                    .trim_end_matches('x')
                    .trim()
                    .parse()
                    .unwrap_or(self.speed)
            }
            k if PROGRESS_KEYS.contains(&k) || k.starts_with("stream_") => {}
            _ => return ProgressLine::Other,
        }
        ProgressLine::Field
    }

    /// Progress percentage for an output of `total_duration_ms`.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if self.is_complete {
            return 100.0;
        }
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).clamp(0.0, 100.0)
    }
}

/// Logs render progress once per `step` percent.
#[derive(Debug)]
pub struct ProgressLog {
    label: String,
    total_duration_ms: i64,
    step: u64,
    last_bucket: AtomicU64,
}

impl ProgressLog {
    pub fn new(label: impl Into<String>, total_seconds: f64, step: u64) -> Self {
        Self {
            label: label.into(),
            total_duration_ms: (total_seconds * 1000.0).round() as i64,
            step: step.max(1),
            last_bucket: AtomicU64::new(0),
        }
    }

    /// Record a snapshot; returns the percentage when a new bucket was reached.
    pub fn observe(&self, progress: &FfmpegProgress) -> Option<u64> {
        let percent = progress.percentage(self.total_duration_ms) as u64;
        let bucket = percent / self.step;
        let previous = self.last_bucket.fetch_max(bucket, Ordering::Relaxed);
        if bucket <= previous {
            return None;
        }

        let reached = bucket * self.step;
        info!(
            render = %self.label,
            percent = reached,
            speed = progress.speed,
            "Render progress"
        );
        Some(reached)
    }
}
