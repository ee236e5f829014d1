//! ElevenLabs text-to-speech client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{check_status, ProviderError, ProviderResult};
use crate::stream::stream_to_file;
use crate::traits::VoiceSynth;

const API_KEY_VAR: &str = "ELEVENLABS_API_KEY";

/// Voice tuning sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.0,
            similarity_boost: 1.0,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// Configuration for [`ElevenLabsClient`].
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub settings: VoiceSettings,
    pub timeout: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "pNInz6obpgDQGcFmaJgB".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_22050_32".to_string(),
            settings: VoiceSettings::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl VoiceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("ELEVENLABS_API_URL").unwrap_or(defaults.base_url),
            voice_id: std::env::var("ELEVENLABS_VOICE_ID").unwrap_or(defaults.voice_id),
            model_id: std::env::var("ELEVENLABS_MODEL_ID").unwrap_or(defaults.model_id),
            output_format: defaults.output_format,
            settings: defaults.settings,
            timeout: Duration::from_secs(
                std::env::var("ELEVENLABS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// Client for the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    http: Client,
    config: VoiceConfig,
}

impl ElevenLabsClient {
    pub fn new(config: VoiceConfig) -> ProviderResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(VoiceConfig::from_env())
    }
}

#[async_trait]
impl VoiceSynth for ElevenLabsClient {
    async fn synthesize(&self, text: &str, dest: &Path) -> ProviderResult<u64> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey(API_KEY_VAR))?;

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        );

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", api_key)
            .query(&[
                ("output_format", self.config.output_format.as_str()),
                ("optimize_streaming_latency", "0"),
            ])
            .json(&SpeechRequest {
                text,
                model_id: &self.config.model_id,
                voice_settings: &self.config.settings,
            })
            .send()
            .await?;

        let written = stream_to_file(check_status(response).await?, dest).await?;
        debug!(bytes = written, "Voice track written to {}", dest.display());
        Ok(written)
    }
}
