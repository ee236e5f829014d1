//! Reel assembly binary.

use std::sync::Arc;

use reel_media::{check_ffmpeg, check_ffprobe};
use reel_providers::{ElevenLabsClient, GoogleTranslate, HttpFetcher, PexelsClient, VoiceConfig, VoiceSynth};
use reel_worker::{FfmpegUnitRenderer, Pipeline, PipelineConfig, Providers};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting reel-worker");

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    match (check_ffmpeg(), check_ffprobe()) {
        (Ok(ffmpeg), Ok(ffprobe)) => {
            info!("Using {} and {}", ffmpeg.display(), ffprobe.display());
        }
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    let providers = match build_providers() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to create provider clients: {}", e);
            std::process::exit(1);
        }
    };

    let renderer = Arc::new(FfmpegUnitRenderer::new(&config));
    let pipeline = Pipeline::new(config, providers, renderer);

    match pipeline.run().await {
        Ok(composition) => {
            for failure in &composition.failed {
                warn!(segment = failure.index(), stage = failure.stage(), "Skipped: {}", failure);
            }
            info!("Short written to {}", composition.output.display());
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// JSON output when `LOG_FORMAT=json`, colored text otherwise.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel_worker=info".parse()?)
        .add_directive("reel_media=info".parse()?)
        .add_directive("reel_providers=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()?;
    }
    Ok(())
}

fn build_providers() -> anyhow::Result<Providers> {
    let voice_config = VoiceConfig::from_env();
    let voice: Option<Arc<dyn VoiceSynth>> = if voice_config.has_api_key() {
        Some(Arc::new(ElevenLabsClient::new(voice_config)?))
    } else {
        warn!("ELEVENLABS_API_KEY not set, voice synthesis disabled");
        None
    };

    Ok(Providers {
        search: Arc::new(PexelsClient::from_env()?),
        translator: Arc::new(GoogleTranslate::from_env()?),
        fetcher: Arc::new(HttpFetcher::from_env()?),
        voice,
    })
}
