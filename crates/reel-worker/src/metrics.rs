//! Pipeline counters, emitted through the `metrics` facade.
//!
//! No recorder is installed by default; counters are no-ops unless the
//! embedding process installs one.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const CLIPS_DOWNLOADED_TOTAL: &str = "reel_clips_downloaded_total";
    pub const CLIPS_DUPLICATE_TOTAL: &str = "reel_clips_duplicate_total";
    pub const CLIPS_CACHED_TOTAL: &str = "reel_clips_cached_total";
    pub const FALLBACKS_USED_TOTAL: &str = "reel_fallbacks_used_total";
    pub const SEGMENTS_VIDEOLESS_TOTAL: &str = "reel_segments_videoless_total";
    pub const SYNTHETIC_CLIPS_TOTAL: &str = "reel_synthetic_clips_total";
    pub const SEGMENTS_FAILED_TOTAL: &str = "reel_segments_failed_total";
    pub const UNITS_COMPOSED_TOTAL: &str = "reel_units_composed_total";
    pub const VOICE_TRACKS_TOTAL: &str = "reel_voice_tracks_total";
}

pub fn record_download() {
    counter!(names::CLIPS_DOWNLOADED_TOTAL).increment(1);
}

pub fn record_duplicate() {
    counter!(names::CLIPS_DUPLICATE_TOTAL).increment(1);
}

pub fn record_cached_clip() {
    counter!(names::CLIPS_CACHED_TOTAL).increment(1);
}

pub fn record_fallback() {
    counter!(names::FALLBACKS_USED_TOTAL).increment(1);
}

pub fn record_videoless() {
    counter!(names::SEGMENTS_VIDEOLESS_TOTAL).increment(1);
}

pub fn record_synthetic() {
    counter!(names::SYNTHETIC_CLIPS_TOTAL).increment(1);
}

/// Record a segment dropped at `stage`.
pub fn record_segment_failed(stage: &'static str) {
    let labels = [("stage", stage)];
    counter!(names::SEGMENTS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_unit_composed() {
    counter!(names::UNITS_COMPOSED_TOTAL).increment(1);
}

/// Record a voice track outcome (`created`, `cached` or `failed`).
pub fn record_voice_track(outcome: &'static str) {
    let labels = [("outcome", outcome)];
    counter!(names::VOICE_TRACKS_TOTAL, &labels).increment(1);
}
