//! Shared data models for the reel assembly pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Segments and their audio sources
//! - Asset records and content fingerprints
//! - Frame geometry and the synthetic fallback palette
//! - Caption styling and overlay descriptions
//! - Encoding configuration

pub mod asset;
pub mod caption;
pub mod encoding;
pub mod frame;
pub mod segment;

// Re-export common types
pub use asset::{AssetRecord, Fingerprint};
pub use caption::{CaptionStyle, FontCandidate, OverlayClip, OverlayKind};
pub use encoding::EncodingConfig;
pub use frame::{FrameSize, Rgb, FALLBACK_COLORS};
pub use segment::{partial_path, AudioSource, Segment};
