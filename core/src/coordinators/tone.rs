//! Pause-aware beeps

use std::sync::Arc;

use crate::platform::{Tone, ToneSynth};
use crate::transport::Transport;

/// Plays short tones through the platform synthesizer, obeying the transport
#[derive(Clone)]
pub struct ToneEmitter {
    transport: Transport,
    synth: Arc<dyn ToneSynth>,
}

impl ToneEmitter {
    pub fn new(transport: Transport, synth: Arc<dyn ToneSynth>) -> Self {
        Self { transport, synth }
    }

    /// Start `tone` now; it stops on its own after its duration.
    ///
    /// Dropped while idle or reset, held while paused.
    pub async fn beep(&self, tone: Tone) {
        if self.transport.is_stopped() {
            return;
        }

        self.transport.wait_while_paused().await;
        if self.transport.is_stopped() {
            return;
        }

        self.synth.play_tone(tone);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::RecordingTone;
    use repcoach_types::TransportState;
    use std::time::Duration;

    #[tokio::test]
    async fn beeps_while_running() {
        let synth = Arc::new(RecordingTone::default());
        let emitter = ToneEmitter::new(Transport::new(TransportState::Running), synth.clone());

        let tone = Tone::new(Duration::from_millis(150), 880.0, 0.5);
        emitter.beep(tone).await;

        assert_eq!(synth.tones(), vec![tone]);
    }

    #[tokio::test]
    async fn idle_and_reset_skip_the_synth() {
        for state in [TransportState::Idle, TransportState::Reset] {
            let synth = Arc::new(RecordingTone::default());
            let emitter = ToneEmitter::new(Transport::new(state), synth.clone());

            emitter.beep(Tone::default()).await;
            assert!(synth.tones().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn paused_beep_plays_after_resume() {
        let synth = Arc::new(RecordingTone::default());
        let transport = Transport::new(TransportState::Paused);
        let emitter = ToneEmitter::new(transport.clone(), synth.clone());

        let pending = tokio::spawn(async move { emitter.beep(Tone::default()).await });
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(synth.tones().is_empty());

        transport.set(TransportState::Running);
        pending.await.unwrap();
        assert_eq!(synth.tones().len(), 1);
        assert_eq!(synth.tones()[0].frequency_hz, 440.0);
    }
}
