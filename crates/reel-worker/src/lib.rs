//! Vertical short assembly worker.
//!
//! This crate provides:
//! - Voice track synthesis per script line
//! - Stock clip resolution with cross-run deduplication
//! - Fallback reuse and synthetic clips for segments without footage
//! - Per-segment composition and final concatenation

pub mod artifact_cache;
pub mod composer;
pub mod config;
pub mod error;
pub mod fallback_pool;
pub mod hash_store;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod renderer;
pub mod resolver;
pub mod script;
pub mod voices;

#[cfg(test)]
mod testing;

pub use artifact_cache::ArtifactCache;
pub use composer::{Composition, RunState, TimelineComposer};
pub use config::PipelineConfig;
pub use error::{SegmentError, WorkerError, WorkerResult};
pub use fallback_pool::FallbackPool;
pub use hash_store::HashStore;
pub use logging::SegmentLogger;
pub use pipeline::{Pipeline, Providers};
pub use renderer::{FfmpegUnitRenderer, UnitRenderer};
pub use resolver::{AssetResolver, Resolution};
pub use script::{parse_script, read_script, ScriptLine};
pub use voices::{VoiceReport, VoiceStage};
