//! Voice track stage: one synthesized audio file per script line.

use std::sync::Arc;
use std::time::Duration;

use reel_providers::VoiceSynth;

use crate::artifact_cache::ArtifactCache;
use crate::logging::SegmentLogger;
use crate::metrics;
use crate::script::ScriptLine;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VoiceReport {
    pub created: usize,
    pub cached: usize,
    pub failed: Vec<usize>,
}

pub struct VoiceStage {
    synth: Arc<dyn VoiceSynth>,
    audio: ArtifactCache,
    pause: Duration,
}

impl VoiceStage {
    pub fn new(synth: Arc<dyn VoiceSynth>, audio: ArtifactCache, pause: Duration) -> Self {
        Self { synth, audio, pause }
    }

    /// Synthesize every line lacking a voice track. Failures are logged and
    /// left for the composer, which substitutes silence.
    pub async fn run(&self, lines: &[ScriptLine]) -> VoiceReport {
        let mut report = VoiceReport::default();

        for line in lines {
            let logger = SegmentLogger::new(line.index, "voice");

            if self.audio.exists(line.index).await {
                metrics::record_voice_track("cached");
                report.cached += 1;
                continue;
            }

            logger.log_start(&format!("synthesizing {}/{}", line.index + 1, lines.len()));
            match self.synth.synthesize(&line.text, &self.audio.path(line.index)).await {
                Ok(bytes) => {
                    metrics::record_voice_track("created");
                    logger.log_completion(&format!("{} bytes", bytes));
                    report.created += 1;
                    tokio::time::sleep(self.pause).await;
                }
                Err(e) => {
                    metrics::record_voice_track("failed");
                    logger.log_error(&format!("voice synthesis failed: {}", e));
                    report.failed.push(line.index);
                }
            }
        }

        report
    }
}
