//! Caption rendering with a font fallback cascade.
//!
//! Each caption is rendered once as a transparent full-frame still (text,
//! outline and background plate anchored bottom-center) which the unit
//! composer loops for the segment duration. Font candidates are tried in
//! order and the first one FFmpeg renders wins. If none does, a degenerate
//! overlay is returned so composition can always proceed.

use std::path::Path;

use reel_models::{CaptionStyle, FontCandidate, FrameSize, OverlayClip};
use tracing::{debug, error, warn};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{caption_drawtext, transparent_canvas};
use crate::fs_utils::{is_nonempty_file, write_atomic};

/// Average glyph advance relative to the font size, used to estimate how
/// many characters fit on a line.
const AVG_GLYPH_WIDTH_RATIO: f64 = 0.55;

/// Upper bound for a single caption render attempt.
const CAPTION_RENDER_TIMEOUT_SECS: u64 = 60;

/// Greedy word wrap on character count. Words longer than a line stand alone.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// Renders caption overlays.
#[derive(Debug, Clone)]
pub struct CaptionRenderer {
    style: CaptionStyle,
    frame: FrameSize,
    runner: FfmpegRunner,
}

impl CaptionRenderer {
    pub fn new(style: CaptionStyle, frame: FrameSize) -> Self {
        Self {
            style,
            frame,
            runner: FfmpegRunner::new().with_timeout(CAPTION_RENDER_TIMEOUT_SECS),
        }
    }

    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    /// Characters per line that fit in the configured maximum width.
    pub fn max_chars_per_line(&self) -> usize {
        let glyph = (self.style.font_size.max(1) as f64) * AVG_GLYPH_WIDTH_RATIO;
        ((self.style.max_width as f64 / glyph).floor() as usize).max(1)
    }

    /// Render `text` for `duration` seconds into `target` (a PNG path).
    ///
    /// Never fails: returns [`OverlayClip::degenerate`] when no candidate
    /// renders, including when `candidates` is empty.
    pub async fn render(
        &self,
        text: &str,
        duration: f64,
        candidates: &[FontCandidate],
        target: &Path,
    ) -> OverlayClip {
        let wrapped = wrap_text(text, self.max_chars_per_line());
        if wrapped.is_empty() || !(duration.is_finite() && duration > 0.0) {
            warn!(
                duration,
                "Caption has no text or no duration, using degenerate overlay"
            );
            return OverlayClip::degenerate();
        }

        if candidates.is_empty() {
            error!("No font candidates configured for caption");
            return OverlayClip::degenerate();
        }

        // drawtext reads the text from a file so no caption content ever
        // needs filtergraph escaping
        let textfile = target.with_extension("txt");
        if let Err(e) = write_atomic(&textfile, wrapped.as_bytes()).await {
            error!(error = %e, "Failed to write caption text file");
            return OverlayClip::degenerate();
        }

        for candidate in candidates {
            match self.try_render(candidate, &textfile, target).await {
                Ok(()) => {
                    debug!(font = %candidate, "Caption rendered");
                    return OverlayClip::rendered(target, self.frame.width, self.frame.height, duration);
                }
                Err(e) => {
                    warn!(
                        font = %candidate,
                        error = %e,
                        stderr = e.stderr().unwrap_or(""),
                        "Caption font failed, trying next"
                    );
                }
            }
        }

        error!("All font options failed for caption");
        OverlayClip::degenerate()
    }

    async fn try_render(&self, candidate: &FontCandidate, textfile: &Path, target: &Path) -> MediaResult<()> {
        if let FontCandidate::File(path) = candidate {
            if !path.is_file() {
                return Err(MediaError::font_unavailable(format!(
                    "font file {} does not exist",
                    path.display()
                )));
            }
        }

        let cmd = FfmpegCommand::new(target)
            .input(FfmpegInput::lavfi(transparent_canvas(self.frame)))
            .video_filter(caption_drawtext(candidate, textfile, &self.style))
            .single_frame();

        self.runner.run(&cmd).await?;

        if !is_nonempty_file(target).await {
            return Err(MediaError::font_unavailable(format!(
                "{} produced no caption image",
                candidate
            )));
        }
        Ok(())
    }
}
