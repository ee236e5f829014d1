//! End-to-end run: voice tracks, clip resolution, composition.

use std::sync::Arc;

use reel_providers::{ByteFetcher, ClipSearch, Translator, VoiceSynth};
use tokio::fs;
use tracing::info;

use crate::artifact_cache::ArtifactCache;
use crate::composer::{Composition, RunState, TimelineComposer};
use crate::config::PipelineConfig;
use crate::error::WorkerResult;
use crate::fallback_pool::FallbackPool;
use crate::hash_store::HashStore;
use crate::renderer::UnitRenderer;
use crate::resolver::AssetResolver;
use crate::script::read_script;
use crate::voices::VoiceStage;

/// Remote collaborators of a run.
pub struct Providers {
    pub search: Arc<dyn ClipSearch>,
    pub translator: Arc<dyn Translator>,
    pub fetcher: Arc<dyn ByteFetcher>,
    /// Voice stage is skipped when absent
    pub voice: Option<Arc<dyn VoiceSynth>>,
}

pub struct Pipeline {
    config: PipelineConfig,
    providers: Providers,
    renderer: Arc<dyn UnitRenderer>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, providers: Providers, renderer: Arc<dyn UnitRenderer>) -> Self {
        Self {
            config,
            providers,
            renderer,
        }
    }

    /// Run the whole pipeline and return the composed timeline.
    pub async fn run(&self) -> WorkerResult<Composition> {
        let config = &self.config;
        config.validate()?;
        let lines = read_script(&config.script_path()).await?;
        info!(segments = lines.len(), "Loaded script {}", config.script_path().display());

        for dir in [config.audio_dir(), config.clip_dir(), config.work_dir()] {
            fs::create_dir_all(&dir).await?;
        }

        let audio = ArtifactCache::new(config.audio_dir(), "mp3");
        let clips = ArtifactCache::new(config.clip_dir(), "mp4");

        if let Some(voice) = &self.providers.voice {
            let report = VoiceStage::new(voice.clone(), audio.clone(), config.acquire_pause)
                .run(&lines)
                .await;
            info!(
                created = report.created,
                cached = report.cached,
                failed = report.failed.len(),
                "Voice stage finished"
            );
        } else {
            info!("No voice provider configured, using existing audio only");
        }

        let mut store = HashStore::load(config.hash_store_path()).await;
        let mut pool =
            FallbackPool::bootstrap(config.fallback_wrap, &clips, &mut store, config.fingerprint_bytes).await;
        info!(
            hashes = store.len(),
            pool = pool.len(),
            "Asset state loaded"
        );

        let resolver = AssetResolver::new(
            self.providers.search.clone(),
            self.providers.translator.clone(),
            self.providers.fetcher.clone(),
            clips,
            config.fingerprint_bytes,
            config.acquire_pause,
        );
        let composer = TimelineComposer::new(self.renderer.clone(), audio, config.default_duration);

        let result = composer
            .compose(
                &lines,
                &resolver,
                RunState {
                    store: &mut store,
                    pool: &mut pool,
                },
                &config.final_output(),
            )
            .await;

        store.save().await;

        let composition = result?;
        info!(
            output = %composition.output.display(),
            units = composition.composed.len(),
            skipped = composition.failed.len(),
            synthetic = composition.synthetic,
            "Timeline composed"
        );
        Ok(composition)
    }
}
