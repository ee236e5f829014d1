//! Remote collaborators for the reel pipeline.
//!
//! Each service is reached through a trait ([`ClipSearch`], [`Translator`],
//! [`ByteFetcher`], [`VoiceSynth`]) with a reqwest-backed implementation:
//! - Pexels video search
//! - Google translate (gtx)
//! - Plain HTTP downloads
//! - ElevenLabs text-to-speech

pub mod elevenlabs;
pub mod error;
pub mod fetch;
pub mod pexels;
mod stream;
pub mod traits;
pub mod translate;

pub use elevenlabs::{ElevenLabsClient, VoiceConfig, VoiceSettings};
pub use error::{ProviderError, ProviderResult};
pub use fetch::{FetchConfig, HttpFetcher};
pub use pexels::{PexelsClient, PexelsConfig};
pub use traits::{ByteFetcher, ClipSearch, IdentityTranslator, Translator, VoiceSynth};
pub use translate::{GoogleTranslate, TranslateConfig};
