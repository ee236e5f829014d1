//! Google translate (`client=gtx`) endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{check_status, ProviderError, ProviderResult};
use crate::traits::Translator;

/// Configuration for [`GoogleTranslate`].
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub base_url: String,
    /// Source language code, `auto` to detect
    pub source_lang: String,
    pub target_lang: String,
    pub timeout: Duration,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.googleapis.com".to_string(),
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl TranslateConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("TRANSLATE_API_URL").unwrap_or(defaults.base_url),
            source_lang: std::env::var("TRANSLATE_SOURCE_LANG").unwrap_or(defaults.source_lang),
            target_lang: defaults.target_lang,
            timeout: Duration::from_secs(
                std::env::var("TRANSLATE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Concatenate the translated sentence fragments of a gtx response.
///
/// The response is a nested array whose first element lists
/// `[translated, original, ...]` per sentence.
fn extract_translation(body: &Value) -> Option<String> {
    let sentences = body.get(0)?.as_array()?;
    let text: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Client for the free Google translate endpoint.
pub struct GoogleTranslate {
    http: Client,
    config: TranslateConfig,
}

impl GoogleTranslate {
    pub fn new(config: TranslateConfig) -> ProviderResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(TranslateConfig::from_env())
    }

    /// Translate, reporting failures.
    pub async fn try_translate(&self, text: &str) -> ProviderResult<String> {
        let url = format!(
            "{}/translate_a/single",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.config.source_lang.as_str()),
                ("tl", self.config.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;

        extract_translation(&body)
            .ok_or_else(|| ProviderError::invalid_response("no translated text in response"))
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        match self.try_translate(text).await {
            Ok(translated) => {
                debug!(original = text, translated = %translated, "Translated prompt");
                translated
            }
            Err(e) => {
                error!(error = %e, "Translation failed, using original text");
                text.to_string()
            }
        }
    }
}
