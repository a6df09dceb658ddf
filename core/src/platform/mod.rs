//! Platform primitives consumed by the coordinators
//!
//! The coordinators never talk to audio hardware, speech engines or lock-screen
//! surfaces directly. Each of those is a trait here, with implementations in:
//! - **headless**: console/silent stand-ins that work everywhere
//! - **espeak**: speech through the `espeak` command
//! - **native** (feature `native-audio`): rodio output and the `tts` crate

mod error;
pub mod espeak;
pub mod headless;
#[cfg(feature = "native-audio")]
pub mod native;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use error::PlatformError;
pub use repcoach_types::Tone;

// ─────────────────────────────────────────────────────────────────────────────
// Speech
// ─────────────────────────────────────────────────────────────────────────────

/// A single utterance with fully resolved voice parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub lang: String,
    /// Already clamped to 0.1 - 1.0
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Text-to-speech engine. Resolves when the utterance is done or rejected.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, request: SpeechRequest) -> Result<(), PlatformError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tone synthesis
// ─────────────────────────────────────────────────────────────────────────────

/// Oscillator output. Starts immediately and stops on its own after
/// `tone.duration()`.
pub trait ToneSynth: Send + Sync {
    fn play_tone(&self, tone: Tone);
}

// ─────────────────────────────────────────────────────────────────────────────
// Audio playback
// ─────────────────────────────────────────────────────────────────────────────

/// How a source should be prepared
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub volume: f32,
    pub looping: bool,
}

/// A loaded, controllable audio source
#[async_trait]
pub trait AudioElement: Send + Sync {
    /// Start or resume playback. Rejected when the platform refuses to play.
    async fn play(&self) -> Result<(), PlatformError>;

    fn pause(&self);

    /// Seek back to the start
    fn rewind(&self);

    fn set_volume(&self, volume: f32);

    fn is_paused(&self) -> bool;

    /// Resolves when playback reaches its natural end (never for looping sources)
    async fn ended(&self);
}

/// Opens audio sources
pub trait AudioBackend: Send + Sync {
    fn load(&self, src: &str, options: LoadOptions) -> Result<Arc<dyn AudioElement>, PlatformError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Lock-screen media controls
// ─────────────────────────────────────────────────────────────────────────────

/// What to show on the lock screen for a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub album: String,
}

impl TrackMetadata {
    pub fn for_source(src: &str) -> Self {
        let title = std::path::Path::new(src)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(src)
            .to_string();
        Self {
            title,
            album: "repcoach".to_string(),
        }
    }
}

/// User actions coming back from the lock screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    Pause,
    Play,
    Destroy,
}

/// Lock-screen media-controls surface
#[async_trait]
pub trait MediaControls: Send + Sync {
    /// Register a track. Returns the stream of user actions for it.
    async fn create(
        &self,
        metadata: TrackMetadata,
    ) -> Result<mpsc::Receiver<MediaAction>, PlatformError>;

    async fn update_is_playing(&self, playing: bool) -> Result<(), PlatformError>;

    async fn destroy(&self) -> Result<(), PlatformError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundle
// ─────────────────────────────────────────────────────────────────────────────

/// The set of platform primitives a session runs against
#[derive(Clone)]
pub struct Platform {
    pub speech: Arc<dyn SpeechEngine>,
    pub tones: Arc<dyn ToneSynth>,
    pub audio: Arc<dyn AudioBackend>,
    /// None when the platform has no lock-screen surface
    pub media_controls: Option<Arc<dyn MediaControls>>,
}

impl Platform {
    /// Console speech and tones, silent audio, no lock-screen surface
    pub fn headless() -> Self {
        Self {
            speech: Arc::new(headless::ConsoleSpeech),
            tones: Arc::new(headless::ConsoleTone),
            audio: Arc::new(headless::SilentAudio::default()),
            media_controls: None,
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechEngine>) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_media_controls(mut self, controls: Arc<dyn MediaControls>) -> Self {
        self.media_controls = Some(controls);
        self
    }

    /// rodio output with the best available speech engine for the target
    #[cfg(feature = "native-audio")]
    pub fn native() -> Self {
        #[cfg(not(target_os = "linux"))]
        let speech: Arc<dyn SpeechEngine> = match native::TtsSpeech::new() {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::warn!(error = %e, "tts unavailable, falling back to espeak");
                Arc::new(espeak::EspeakSpeech::default())
            }
        };
        #[cfg(target_os = "linux")]
        let speech: Arc<dyn SpeechEngine> = Arc::new(espeak::EspeakSpeech::default());

        Self {
            speech,
            tones: Arc::new(native::RodioTone),
            audio: Arc::new(native::RodioAudio),
            media_controls: None,
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("media_controls", &self.media_controls.is_some())
            .finish_non_exhaustive()
    }
}
