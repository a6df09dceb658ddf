//! Pause-aware speech announcements

use std::sync::Arc;

use repcoach_types::VoiceSettings;

use crate::platform::{SpeechEngine, SpeechRequest};
use crate::transport::Transport;

pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 1.0;

/// Clamp a speech rate into the supported range (NaN speaks at full rate)
pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        MAX_RATE
    } else {
        rate.clamp(MIN_RATE, MAX_RATE)
    }
}

/// What happened to an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    Spoken,
    /// Dropped because the transport was idle or reset
    Skipped,
    /// The engine rejected the utterance (already logged)
    Failed,
}

/// Speaks text through the platform engine, obeying the transport
#[derive(Clone)]
pub struct Announcer {
    transport: Transport,
    engine: Arc<dyn SpeechEngine>,
    voice: VoiceSettings,
}

impl Announcer {
    pub fn new(transport: Transport, engine: Arc<dyn SpeechEngine>, voice: VoiceSettings) -> Self {
        Self {
            transport,
            engine,
            voice,
        }
    }

    /// Speak `text` at the configured voice rate
    pub async fn say(&self, text: &str) -> SpeechOutcome {
        self.speak(text, self.voice.rate).await
    }

    /// Speak `text` at `rate`.
    ///
    /// Dropped while idle or reset, held while paused. Engine failures are
    /// logged and reported as [`SpeechOutcome::Failed`], never propagated.
    pub async fn speak(&self, text: &str, rate: f32) -> SpeechOutcome {
        if self.transport.is_stopped() {
            tracing::debug!(text, state = %self.transport.get(), "announcement dropped");
            return SpeechOutcome::Skipped;
        }

        self.transport.wait_while_paused().await;
        if self.transport.is_stopped() {
            tracing::debug!(text, "announcement dropped after pause");
            return SpeechOutcome::Skipped;
        }

        let request = SpeechRequest {
            text: text.to_string(),
            lang: self.voice.lang.clone(),
            rate: clamp_rate(rate),
            pitch: self.voice.pitch,
            volume: self.voice.volume,
        };

        match self.engine.speak(request).await {
            Ok(()) => SpeechOutcome::Spoken,
            Err(e) => {
                tracing::warn!(error = %e, text, "text to speech failed");
                SpeechOutcome::Failed
            }
        }
    }
}
