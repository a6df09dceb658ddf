//! Console and silent stand-ins for machines without audio output

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{
    AudioBackend, AudioElement, LoadOptions, MediaAction, MediaControls, PlatformError, SpeechEngine,
    SpeechRequest, Tone, ToneSynth, TrackMetadata,
};

/// Prints announcements to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSpeech;

#[async_trait]
impl SpeechEngine for ConsoleSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<(), PlatformError> {
        tracing::debug!(lang = %request.lang, rate = request.rate, "speak");
        let mut stdout = std::io::stdout();
        writeln!(stdout, "  » {}", request.text)
            .and_then(|_| stdout.flush())
            .map_err(|e| PlatformError::Speech {
                reason: e.to_string(),
            })
    }
}

/// Prints beeps to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTone;

impl ToneSynth for ConsoleTone {
    fn play_tone(&self, tone: Tone) {
        println!("  * beep ({} Hz, {} ms)", tone.frequency_hz, tone.duration_ms);
    }
}

/// Audio backend that keeps playback state but produces no sound.
///
/// With a `length`, one-shot elements report their natural end once they
/// have been playing that long.
#[derive(Debug, Default, Clone)]
pub struct SilentAudio {
    length: Option<Duration>,
}

impl SilentAudio {
    pub fn with_length(length: Duration) -> Self {
        Self {
            length: Some(length),
        }
    }
}

impl AudioBackend for SilentAudio {
    fn load(&self, src: &str, options: LoadOptions) -> Result<Arc<dyn AudioElement>, PlatformError> {
        tracing::debug!(src, looping = options.looping, "silent audio loaded");
        Ok(Arc::new(SilentElement {
            looping: options.looping,
            length: self.length,
            state: Mutex::new(SilentState {
                volume: options.volume,
                position: Duration::ZERO,
                resumed_at: None,
            }),
        }))
    }
}

struct SilentState {
    volume: f32,
    position: Duration,
    /// Some while playing
    resumed_at: Option<Instant>,
}

impl SilentState {
    fn position(&self) -> Duration {
        self.position + self.resumed_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}

struct SilentElement {
    looping: bool,
    length: Option<Duration>,
    state: Mutex<SilentState>,
}

impl SilentElement {
    fn with_state<T>(&self, f: impl FnOnce(&mut SilentState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }
}

#[async_trait]
impl AudioElement for SilentElement {
    async fn play(&self) -> Result<(), PlatformError> {
        self.with_state(|s| {
            if s.resumed_at.is_none() {
                s.resumed_at = Some(Instant::now());
            }
        });
        Ok(())
    }

    fn pause(&self) {
        self.with_state(|s| {
            s.position = s.position();
            s.resumed_at = None;
        });
    }

    fn rewind(&self) {
        self.with_state(|s| {
            s.position = Duration::ZERO;
            if s.resumed_at.is_some() {
                s.resumed_at = Some(Instant::now());
            }
        });
    }

    fn set_volume(&self, volume: f32) {
        self.with_state(|s| s.volume = volume);
    }

    fn is_paused(&self) -> bool {
        self.with_state(|s| s.resumed_at.is_none())
    }

    async fn ended(&self) {
        let Some(length) = self.length.filter(|_| !self.looping) else {
            return std::future::pending().await;
        };

        loop {
            let done = self.with_state(|s| s.resumed_at.is_some() && s.position() >= length);
            if done {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// A lock-screen surface nobody looks at.
///
/// Registrations succeed and yield an action stream that stays silent until
/// the registration is destroyed or replaced.
#[derive(Debug, Default)]
pub struct NoopMediaControls {
    actions: Mutex<Option<mpsc::Sender<MediaAction>>>,
}

impl NoopMediaControls {
    fn set_sender(&self, sender: Option<mpsc::Sender<MediaAction>>) {
        *self.actions.lock().unwrap_or_else(|e| e.into_inner()) = sender;
    }
}

#[async_trait]
impl MediaControls for NoopMediaControls {
    async fn create(
        &self,
        metadata: TrackMetadata,
    ) -> Result<mpsc::Receiver<MediaAction>, PlatformError> {
        tracing::debug!(title = %metadata.title, "media controls registered");
        let (tx, rx) = mpsc::channel(1);
        self.set_sender(Some(tx));
        Ok(rx)
    }

    async fn update_is_playing(&self, playing: bool) -> Result<(), PlatformError> {
        tracing::trace!(playing, "media controls state");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), PlatformError> {
        self.set_sender(None);
        Ok(())
    }
}
