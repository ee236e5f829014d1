//! Structured segment logging.

use tracing::{error, info, warn, Span};

/// Logger tagging every event with a segment index and pipeline stage.
#[derive(Debug, Clone)]
pub struct SegmentLogger {
    index: usize,
    stage: &'static str,
}

impl SegmentLogger {
    /// Create a logger for `stage` (e.g. "resolve", "compose", "voice").
    pub fn new(index: usize, stage: &'static str) -> Self {
        Self { index, stage }
    }

    pub fn log_start(&self, message: &str) {
        info!(segment = self.index, stage = self.stage, "Segment started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(segment = self.index, stage = self.stage, "Segment progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(segment = self.index, stage = self.stage, "Segment warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(segment = self.index, stage = self.stage, "Segment error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(segment = self.index, stage = self.stage, "Segment completed: {}", message);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Span covering all work on this segment in this stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("segment", segment = self.index, stage = self.stage)
    }
}
