//! Media operations the timeline composer drives.
//!
//! The composer only talks to [`UnitRenderer`]; the FFmpeg-backed
//! implementation keeps every intermediate file under the work directory,
//! named by segment index.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reel_media::{
    probe_duration, CaptionRenderer, ComposedUnit, FittedClip, MediaResult, SegmentFitter, UnitComposer,
};
use reel_models::{AudioSource, FontCandidate, OverlayClip};

use crate::config::PipelineConfig;

#[async_trait]
pub trait UnitRenderer: Send + Sync {
    /// Duration of a voice track in seconds.
    async fn audio_duration(&self, audio: &Path) -> MediaResult<f64>;

    /// Fit a raw clip to `duration`, degrading to a synthetic clip.
    async fn fit(&self, index: usize, raw: &Path, duration: f64) -> MediaResult<FittedClip>;

    /// Synthetic clip for a segment without video.
    async fn synthesize(&self, index: usize, duration: f64) -> MediaResult<FittedClip>;

    /// Caption overlay. Always returns an overlay, possibly degenerate.
    async fn caption(&self, index: usize, text: &str, duration: f64) -> OverlayClip;

    /// Layer video and caption, bind audio, lock to `duration`.
    async fn compose(
        &self,
        index: usize,
        video: &FittedClip,
        caption: &OverlayClip,
        audio: &AudioSource,
        duration: f64,
    ) -> MediaResult<ComposedUnit>;

    /// Concatenate units in slice order into `output`.
    async fn concat(&self, units: &[ComposedUnit], output: &Path) -> MediaResult<PathBuf>;
}

/// [`UnitRenderer`] backed by the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegUnitRenderer {
    fitter: SegmentFitter,
    captions: CaptionRenderer,
    composer: UnitComposer,
    fonts: Vec<FontCandidate>,
    work_dir: PathBuf,
}

impl FfmpegUnitRenderer {
    pub fn new(config: &PipelineConfig) -> Self {
        let encoding = config.encoding();
        Self {
            fitter: SegmentFitter::new(config.frame, encoding.clone()),
            captions: CaptionRenderer::new(config.caption.clone(), config.frame),
            composer: UnitComposer::new(encoding),
            fonts: config.font_candidates(),
            work_dir: config.work_dir(),
        }
    }

    fn work_path(&self, kind: &str, index: usize, extension: &str) -> PathBuf {
        self.work_dir.join(format!("{}_{}.{}", kind, index, extension))
    }
}

#[async_trait]
impl UnitRenderer for FfmpegUnitRenderer {
    async fn audio_duration(&self, audio: &Path) -> MediaResult<f64> {
        probe_duration(audio).await
    }

    async fn fit(&self, index: usize, raw: &Path, duration: f64) -> MediaResult<FittedClip> {
        self.fitter
            .fit(index, raw, duration, &self.work_path("fit", index, "mp4"))
            .await
    }

    async fn synthesize(&self, index: usize, duration: f64) -> MediaResult<FittedClip> {
        self.fitter
            .synthesize(index, duration, &self.work_path("fit", index, "mp4"))
            .await
    }

    async fn caption(&self, index: usize, text: &str, duration: f64) -> OverlayClip {
        self.captions
            .render(text, duration, &self.fonts, &self.work_path("caption", index, "png"))
            .await
    }

    async fn compose(
        &self,
        index: usize,
        video: &FittedClip,
        caption: &OverlayClip,
        audio: &AudioSource,
        duration: f64,
    ) -> MediaResult<ComposedUnit> {
        self.composer
            .compose_unit(
                index,
                &video.path,
                caption,
                audio,
                duration,
                &self.work_path("unit", index, "mp4"),
            )
            .await
    }

    async fn concat(&self, units: &[ComposedUnit], output: &Path) -> MediaResult<PathBuf> {
        self.composer.concat_units(units, output).await
    }
}
