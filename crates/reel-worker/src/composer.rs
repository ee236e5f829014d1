//! Timeline composition.
//!
//! Segments are processed strictly one at a time in index order. Each one
//! either yields a unit or a [`SegmentError`]; failures are logged and
//! skipped, and the run only fails when no unit was produced at all.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reel_media::ComposedUnit;
use reel_models::{AudioSource, Segment};
use tracing::{info, warn, Instrument};

use crate::artifact_cache::ArtifactCache;
use crate::error::{SegmentError, WorkerError, WorkerResult};
use crate::fallback_pool::FallbackPool;
use crate::hash_store::HashStore;
use crate::logging::SegmentLogger;
use crate::metrics;
use crate::renderer::UnitRenderer;
use crate::resolver::AssetResolver;
use crate::script::ScriptLine;

/// Outcome of a composed timeline.
#[derive(Debug)]
pub struct Composition {
    pub output: PathBuf,
    /// Indices of the segments in the output, in order
    pub composed: Vec<usize>,
    /// Segments that were skipped
    pub failed: Vec<SegmentError>,
    /// Segments rendered from a synthetic clip
    pub synthetic: usize,
}

/// Shared mutable state of one run.
pub struct RunState<'a> {
    pub store: &'a mut HashStore,
    pub pool: &'a mut FallbackPool,
}

pub struct TimelineComposer {
    renderer: Arc<dyn UnitRenderer>,
    audio: ArtifactCache,
    default_duration: f64,
}

impl TimelineComposer {
    pub fn new(renderer: Arc<dyn UnitRenderer>, audio: ArtifactCache, default_duration: f64) -> Self {
        Self {
            renderer,
            audio,
            default_duration,
        }
    }

    /// Compose every line into `output`.
    pub async fn compose(
        &self,
        lines: &[ScriptLine],
        resolver: &AssetResolver,
        state: RunState<'_>,
        output: &Path,
    ) -> WorkerResult<Composition> {
        let RunState { store, pool } = state;
        let mut units: Vec<ComposedUnit> = Vec::with_capacity(lines.len());
        let mut failed = Vec::new();
        let mut synthetic = 0;

        for line in lines {
            let logger = SegmentLogger::new(line.index, "compose");
            let result = self
                .compose_segment(line, resolver, store, pool)
                .instrument(logger.create_span())
                .await;

            match result {
                Ok((unit, was_synthetic)) => {
                    if was_synthetic {
                        synthetic += 1;
                    }
                    metrics::record_unit_composed();
                    logger.log_completion(&format!("{:.2}s unit", unit.duration));
                    units.push(unit);
                }
                Err(e) => {
                    metrics::record_segment_failed(e.stage());
                    logger.log_error(&format!("skipping segment: {}", e));
                    failed.push(e);
                }
            }
        }

        if units.is_empty() {
            return Err(WorkerError::NoUsableSegments);
        }

        info!(
            units = units.len(),
            skipped = failed.len(),
            synthetic,
            "Concatenating timeline"
        );
        let output = self.renderer.concat(&units, output).await?;

        Ok(Composition {
            output,
            composed: units.iter().map(|u| u.index).collect(),
            failed,
            synthetic,
        })
    }

    async fn compose_segment(
        &self,
        line: &ScriptLine,
        resolver: &AssetResolver,
        store: &mut HashStore,
        pool: &mut FallbackPool,
    ) -> Result<(ComposedUnit, bool), SegmentError> {
        let index = line.index;
        let resolution = resolver.resolve(index, &line.text, store, pool).await;

        let (audio, duration) = match self.audio.get(index).await {
            Some(path) => {
                let duration = self
                    .renderer
                    .audio_duration(&path)
                    .await
                    .map_err(|source| SegmentError::AudioProbe { index, source })?;
                (AudioSource::file(path), duration)
            }
            None => {
                warn!(
                    segment = index,
                    duration = self.default_duration,
                    "No voice track, using silence"
                );
                (AudioSource::Silent, self.default_duration)
            }
        };

        let mut segment = Segment::new(index, line.text.clone(), audio, duration)
            .with_video(resolution.path().map(Path::to_path_buf));

        let fitted = match &segment.video {
            Some(raw) => self.renderer.fit(index, raw, duration).await,
            None => self.renderer.synthesize(index, duration).await,
        }
        .map_err(|source| SegmentError::Video { index, source })?;

        if fitted.is_synthetic() {
            metrics::record_synthetic();
        }

        let overlay = self.renderer.caption(index, &segment.text, duration).await;
        if overlay.is_degenerate() {
            warn!(segment = index, "Caption could not be rendered, using placeholder");
        }
        let caption = segment.caption.insert(overlay);

        let unit = self
            .renderer
            .compose(index, &fitted, caption, &segment.audio, segment.audio_duration)
            .await
            .map_err(|source| SegmentError::Compose { index, source })?;

        Ok((unit, fitted.is_synthetic()))
    }
}
