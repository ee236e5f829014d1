//! Pexels video search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{check_status, ProviderError, ProviderResult};
use crate::traits::ClipSearch;

const API_KEY_VAR: &str = "PEXELS_API_KEY";

/// Configuration for [`PexelsClient`].
#[derive(Debug, Clone)]
pub struct PexelsConfig {
    pub api_key: Option<String>,
    /// Base URL of the API
    pub base_url: String,
    pub per_page: u32,
    /// Clip duration bounds in seconds
    pub min_duration: u32,
    pub max_duration: u32,
    pub orientation: String,
    pub size: String,
    /// Appended to every query
    pub query_suffix: Option<String>,
    /// Dominant color filter
    pub color: Option<String>,
    /// Narrowest acceptable rendition
    pub min_width: u32,
    pub timeout: Duration,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.pexels.com".to_string(),
            per_page: 5,
            min_duration: 4,
            max_duration: 10,
            orientation: "portrait".to_string(),
            size: "medium".to_string(),
            query_suffix: None,
            color: None,
            min_width: 720,
            timeout: Duration::from_secs(30),
        }
    }
}

impl PexelsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty(API_KEY_VAR),
            base_url: non_empty("PEXELS_API_URL").unwrap_or(defaults.base_url),
            per_page: std::env::var("PEXELS_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.per_page),
            min_duration: std::env::var("PEXELS_MIN_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_duration),
            max_duration: std::env::var("PEXELS_MAX_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_duration),
            orientation: defaults.orientation,
            size: defaults.size,
            query_suffix: non_empty("PEXELS_QUERY_SUFFIX"),
            color: non_empty("PEXELS_COLOR"),
            min_width: defaults.min_width,
            timeout: Duration::from_secs(
                std::env::var("PEXELS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    quality: Option<String>,
    width: Option<u32>,
    link: String,
}

/// First `hd` or `sd` rendition at least `min_width` wide, in result order.
fn pick_candidate(response: &SearchResponse, min_width: u32) -> Option<(u64, &str)> {
    response.videos.iter().find_map(|video| {
        video
            .video_files
            .iter()
            .find(|file| {
                matches!(file.quality.as_deref(), Some("hd") | Some("sd"))
                    && file.width.unwrap_or(0) >= min_width
            })
            .map(|file| (video.id, file.link.as_str()))
    })
}

/// Client for the Pexels video search API.
pub struct PexelsClient {
    http: Client,
    config: PexelsConfig,
}

impl PexelsClient {
    pub fn new(config: PexelsConfig) -> ProviderResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(PexelsConfig::from_env())
    }

    fn query_params(&self, query: &str) -> Vec<(&'static str, String)> {
        let full_query = match &self.config.query_suffix {
            Some(suffix) => format!("{} {}", query.trim(), suffix.trim()),
            None => query.trim().to_string(),
        };

        let mut params = vec![
            ("query", full_query),
            ("per_page", self.config.per_page.to_string()),
            ("min_duration", self.config.min_duration.to_string()),
            ("max_duration", self.config.max_duration.to_string()),
            ("orientation", self.config.orientation.clone()),
            ("size", self.config.size.clone()),
        ];
        if let Some(color) = &self.config.color {
            params.push(("color", color.clone()));
        }
        params
    }
}

#[async_trait]
impl ClipSearch for PexelsClient {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn search(&self, query: &str) -> ProviderResult<Option<String>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey(API_KEY_VAR))?;

        let url = format!("{}/videos/search", self.config.base_url.trim_end_matches('/'));
        debug!(query, "Searching Pexels");

        let response = self
            .http
            .get(&url)
            .header("Authorization", api_key)
            .query(&self.query_params(query))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: SearchResponse = response.json().await?;

        if body.videos.is_empty() {
            debug!(query, "Pexels returned no videos");
            return Ok(None);
        }

        match pick_candidate(&body, self.config.min_width) {
            Some((id, link)) => {
                debug!(video_id = id, "Pexels candidate selected");
                Ok(Some(link.to_string()))
            }
            None => {
                warn!(
                    query,
                    videos = body.videos.len(),
                    "No suitable rendition in Pexels results"
                );
                Ok(None)
            }
        }
    }
}
