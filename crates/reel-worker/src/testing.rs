//! In-memory fakes of the provider and renderer seams.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reel_media::{ClipOrigin, ComposedUnit, FitMode, FittedClip, MediaError, MediaResult};
use reel_models::{AudioSource, OverlayClip, Rgb};
use reel_providers::{ByteFetcher, ClipSearch, ProviderError, ProviderResult, VoiceSynth};

use crate::renderer::UnitRenderer;

#[derive(Default)]
pub struct FakeSearch {
    results: Mutex<HashMap<String, String>>,
    fail: Mutex<bool>,
    calls: AtomicUsize,
}

impl FakeSearch {
    pub fn add(&self, query: &str, url: &str) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), url.to_string());
    }

    pub fn fail_with_error(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClipSearch for FakeSearch {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, query: &str) -> ProviderResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            return Err(ProviderError::invalid_response("search backend down"));
        }
        Ok(self.results.lock().unwrap().get(query).cloned())
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    /// Bodies served by `download` instead of `bodies`
    download_bodies: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    prefix_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn add(&self, url: &str, body: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    /// Serve `body` on download while the prefix request still sees the
    /// body registered with [`FakeFetcher::add`].
    pub fn serve_on_download(&self, url: &str, body: Vec<u8>) {
        self.download_bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body);
    }

    pub fn fail_downloads(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn prefix_calls(&self) -> usize {
        self.prefix_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    fn body(&self, url: &str) -> ProviderResult<Vec<u8>> {
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                body: url.to_string(),
            })
    }
}

#[async_trait]
impl ByteFetcher for FakeFetcher {
    async fn fetch_prefix(&self, url: &str, limit: usize) -> ProviderResult<Bytes> {
        self.prefix_calls.fetch_add(1, Ordering::SeqCst);
        let body = self.body(url)?;
        Ok(Bytes::from(body[..body.len().min(limit)].to_vec()))
    }

    async fn download(&self, url: &str, dest: &Path) -> ProviderResult<u64> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(url) {
            return Err(ProviderError::EmptyBody(url.to_string()));
        }
        let served = self.download_bodies.lock().unwrap().get(url).cloned();
        let body = match served {
            Some(body) => body,
            None => self.body(url)?,
        };
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}

#[derive(Default)]
pub struct FakeVoice {
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeVoice {
    pub fn fail_on(&self, text: &str) {
        self.failing.lock().unwrap().insert(text.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceSynth for FakeVoice {
    async fn synthesize(&self, text: &str, dest: &Path) -> ProviderResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(text) {
            return Err(ProviderError::Status {
                status: 500,
                body: "tts failed".to_string(),
            });
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, text.as_bytes()).await?;
        Ok(text.len() as u64)
    }
}

/// One recorded call on [`FakeRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Fit { index: usize, raw: PathBuf, duration: f64 },
    Synthesize { index: usize, duration: f64 },
    Caption { index: usize, duration: f64 },
    Compose { index: usize, audio: AudioSource, duration: f64 },
    Concat { order: Vec<usize> },
}

/// Renderer that records calls and never touches FFmpeg.
#[derive(Default)]
pub struct FakeRenderer {
    durations: Mutex<HashMap<PathBuf, f64>>,
    fail_compose: Mutex<HashSet<usize>>,
    fail_fit: Mutex<HashSet<usize>>,
    calls: Mutex<Vec<RenderCall>>,
}

impl FakeRenderer {
    pub fn set_duration(&self, audio: PathBuf, seconds: f64) {
        self.durations.lock().unwrap().insert(audio, seconds);
    }

    pub fn fail_compose(&self, index: usize) {
        self.fail_compose.lock().unwrap().insert(index);
    }

    /// Make fitting `index` fail and degrade to a synthetic clip.
    pub fn fail_fit(&self, index: usize) {
        self.fail_fit.lock().unwrap().insert(index);
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl UnitRenderer for FakeRenderer {
    async fn audio_duration(&self, audio: &Path) -> MediaResult<f64> {
        self.durations
            .lock()
            .unwrap()
            .get(audio)
            .copied()
            .ok_or_else(|| MediaError::invalid_duration(format!("no duration for {}", audio.display())))
    }

    async fn fit(&self, index: usize, raw: &Path, duration: f64) -> MediaResult<FittedClip> {
        self.record(RenderCall::Fit {
            index,
            raw: raw.to_path_buf(),
            duration,
        });
        if self.fail_fit.lock().unwrap().contains(&index) {
            return self.synthesize(index, duration).await;
        }
        Ok(FittedClip {
            path: PathBuf::from(format!("/work/fit_{}.mp4", index)),
            duration,
            origin: ClipOrigin::Stock(FitMode::Passthrough),
        })
    }

    async fn synthesize(&self, index: usize, duration: f64) -> MediaResult<FittedClip> {
        self.record(RenderCall::Synthesize { index, duration });
        Ok(FittedClip {
            path: PathBuf::from(format!("/work/fit_{}.mp4", index)),
            duration,
            origin: ClipOrigin::Synthetic {
                color: Rgb::fallback_for(index),
            },
        })
    }

    async fn caption(&self, index: usize, _text: &str, duration: f64) -> OverlayClip {
        self.record(RenderCall::Caption { index, duration });
        OverlayClip::rendered(format!("/work/caption_{}.png", index), 1080, 1920, duration)
    }

    async fn compose(
        &self,
        index: usize,
        _video: &FittedClip,
        _caption: &OverlayClip,
        audio: &AudioSource,
        duration: f64,
    ) -> MediaResult<ComposedUnit> {
        self.record(RenderCall::Compose {
            index,
            audio: audio.clone(),
            duration,
        });
        if self.fail_compose.lock().unwrap().contains(&index) {
            return Err(MediaError::ffmpeg_failed("compose failed", None, Some(1)));
        }
        Ok(ComposedUnit {
            index,
            path: PathBuf::from(format!("/work/unit_{}.mp4", index)),
            duration,
        })
    }

    async fn concat(&self, units: &[ComposedUnit], output: &Path) -> MediaResult<PathBuf> {
        self.record(RenderCall::Concat {
            order: units.iter().map(|u| u.index).collect(),
        });
        Ok(output.to_path_buf())
    }
}
