//! Recording fakes for coordinator tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    AudioBackend, AudioElement, LoadOptions, MediaAction, MediaControls, PlatformError, SpeechEngine,
    SpeechRequest, Tone, ToneSynth, TrackMetadata,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ─── Speech ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSpeech {
    requests: Mutex<Vec<SpeechRequest>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingSpeech {
    pub fn failing() -> Self {
        let speech = Self::default();
        speech.fail.store(true, Ordering::SeqCst);
        speech
    }

    pub fn with_delay(delay: Duration) -> Self {
        let speech = Self::default();
        *lock(&speech.delay) = Some(delay);
        speech
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        lock(&self.requests).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.text.clone()).collect()
    }
}

#[async_trait]
impl SpeechEngine for RecordingSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<(), PlatformError> {
        lock(&self.requests).push(request);
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::Speech {
                reason: "engine rejected".to_string(),
            });
        }
        Ok(())
    }
}

// ─── Tones ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTone {
    tones: Mutex<Vec<Tone>>,
}

impl RecordingTone {
    pub fn tones(&self) -> Vec<Tone> {
        lock(&self.tones).clone()
    }
}

impl ToneSynth for RecordingTone {
    fn play_tone(&self, tone: Tone) {
        lock(&self.tones).push(tone);
    }
}

// ─── Audio ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementEvent {
    Play,
    Pause,
    Rewind,
    Volume(f32),
}

pub struct FakeElement {
    pub src: String,
    pub options: LoadOptions,
    events: Mutex<Vec<ElementEvent>>,
    paused: AtomicBool,
    fail_play: bool,
    play_delay: Option<Duration>,
    ended: CancellationToken,
}

impl FakeElement {
    pub fn events(&self) -> Vec<ElementEvent> {
        lock(&self.events).clone()
    }

    pub fn count(&self, event: ElementEvent) -> usize {
        lock(&self.events).iter().filter(|e| **e == event).count()
    }

    /// Simulate the natural end of playback
    pub fn finish(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.ended.cancel();
    }
}

#[async_trait]
impl AudioElement for FakeElement {
    async fn play(&self) -> Result<(), PlatformError> {
        lock(&self.events).push(ElementEvent::Play);
        if let Some(delay) = self.play_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_play {
            return Err(PlatformError::Playback {
                reason: "autoplay prevented".to_string(),
            });
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        lock(&self.events).push(ElementEvent::Pause);
        self.paused.store(true, Ordering::SeqCst);
    }

    fn rewind(&self) {
        lock(&self.events).push(ElementEvent::Rewind);
    }

    fn set_volume(&self, volume: f32) {
        lock(&self.events).push(ElementEvent::Volume(volume));
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    async fn ended(&self) {
        self.ended.cancelled().await;
    }
}

#[derive(Default)]
pub struct FakeAudio {
    elements: Mutex<Vec<Arc<FakeElement>>>,
    fail_load: AtomicBool,
    fail_play: AtomicBool,
    play_delay: Option<Duration>,
}

impl FakeAudio {
    /// Elements whose `play` takes `delay` to resolve
    pub fn slow_play(delay: Duration) -> Self {
        Self {
            play_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn failing_load() -> Self {
        let audio = Self::default();
        audio.fail_load.store(true, Ordering::SeqCst);
        audio
    }

    pub fn failing_play() -> Self {
        let audio = Self::default();
        audio.fail_play.store(true, Ordering::SeqCst);
        audio
    }

    pub fn elements(&self) -> Vec<Arc<FakeElement>> {
        lock(&self.elements).clone()
    }

    pub fn last(&self) -> Arc<FakeElement> {
        lock(&self.elements)
            .last()
            .cloned()
            .expect("no element loaded")
    }
}

impl AudioBackend for FakeAudio {
    fn load(&self, src: &str, options: LoadOptions) -> Result<Arc<dyn AudioElement>, PlatformError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(PlatformError::OpenSource {
                src: src.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            });
        }
        let element = Arc::new(FakeElement {
            src: src.to_string(),
            options,
            events: Mutex::new(Vec::new()),
            paused: AtomicBool::new(true),
            fail_play: self.fail_play.load(Ordering::SeqCst),
            play_delay: self.play_delay,
            ended: CancellationToken::new(),
        });
        lock(&self.elements).push(element.clone());
        Ok(element)
    }
}

// ─── Media controls ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Create(String),
    Playing(bool),
    Destroy,
}

#[derive(Default)]
pub struct FakeMediaControls {
    events: Mutex<Vec<MediaEvent>>,
    actions: Mutex<Option<mpsc::Sender<MediaAction>>>,
    unavailable: bool,
    create_delay: Option<Duration>,
}

impl FakeMediaControls {
    /// Controls whose registration takes `delay`
    pub fn slow_create(delay: Duration) -> Self {
        Self {
            create_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<MediaEvent> {
        lock(&self.events).clone()
    }

    /// Simulate the user pressing a lock-screen button
    pub async fn press(&self, action: MediaAction) {
        let sender = lock(&self.actions).clone();
        if let Some(sender) = sender {
            let _ = sender.send(action).await;
        }
    }
}

#[async_trait]
impl MediaControls for FakeMediaControls {
    async fn create(
        &self,
        metadata: TrackMetadata,
    ) -> Result<mpsc::Receiver<MediaAction>, PlatformError> {
        if self.unavailable {
            return Err(PlatformError::MediaControls {
                reason: "no lock screen".to_string(),
            });
        }
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.events).push(MediaEvent::Create(metadata.title));
        let (tx, rx) = mpsc::channel(8);
        *lock(&self.actions) = Some(tx);
        Ok(rx)
    }

    async fn update_is_playing(&self, playing: bool) -> Result<(), PlatformError> {
        lock(&self.events).push(MediaEvent::Playing(playing));
        Ok(())
    }

    async fn destroy(&self) -> Result<(), PlatformError> {
        lock(&self.events).push(MediaEvent::Destroy);
        *lock(&self.actions) = None;
        Ok(())
    }
}
