//! Real audio output: rodio for tones and tracks, the `tts` crate for speech
//! outside Linux.

use std::fs::File;
use std::io::BufReader;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use async_trait::async_trait;
use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, Sink, Source};

use super::{AudioBackend, AudioElement, LoadOptions, PlatformError, Tone, ToneSynth};

/// Sine beeps on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioTone;

impl ToneSynth for RodioTone {
    fn play_tone(&self, tone: Tone) {
        std::thread::spawn(move || {
            let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
                return;
            };
            let Ok(sink) = Sink::try_new(&stream_handle) else {
                return;
            };

            let source = SineWave::new(tone.frequency_hz)
                .take_duration(tone.duration())
                .amplify(tone.volume);
            sink.append(source);
            sink.sleep_until_end();
        });
    }
}

/// Plays files from disk on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioAudio;

impl AudioBackend for RodioAudio {
    fn load(&self, src: &str, options: LoadOptions) -> Result<Arc<dyn AudioElement>, PlatformError> {
        let file = File::open(src).map_err(|source| PlatformError::OpenSource {
            src: src.to_string(),
            source,
        })?;
        let reader = BufReader::new(file);

        // OutputStream is !Send, so a dedicated thread owns it for as long as
        // the element lives. Dropping the element drops `shutdown_tx`, which
        // lets the thread exit.
        let (sink_tx, sink_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        std::thread::spawn(move || {
            let (_stream, stream_handle) = match OutputStream::try_default() {
                Ok(output) => output,
                Err(e) => {
                    let _ = sink_tx.send(Err(e.to_string()));
                    return;
                }
            };
            match Sink::try_new(&stream_handle) {
                Ok(sink) => {
                    let _ = sink_tx.send(Ok(Arc::new(sink)));
                }
                Err(e) => {
                    let _ = sink_tx.send(Err(e.to_string()));
                    return;
                }
            }
            let _ = shutdown_rx.recv();
        });

        let sink = sink_rx
            .recv()
            .map_err(|_| PlatformError::Output {
                reason: "audio thread exited".to_string(),
            })?
            .map_err(|reason| PlatformError::Output { reason })?;

        sink.pause();
        sink.set_volume(options.volume);

        let decode_err = |e: rodio::decoder::DecoderError| PlatformError::Decode {
            src: src.to_string(),
            reason: e.to_string(),
        };
        if options.looping {
            sink.append(Decoder::new_looped(reader).map_err(decode_err)?);
        } else {
            sink.append(Decoder::new(reader).map_err(decode_err)?);
        }

        Ok(Arc::new(RodioElement {
            sink,
            _shutdown: shutdown_tx,
        }))
    }
}

struct RodioElement {
    sink: Arc<Sink>,
    _shutdown: mpsc::Sender<()>,
}

#[async_trait]
impl AudioElement for RodioElement {
    async fn play(&self) -> Result<(), PlatformError> {
        self.sink.play();
        Ok(())
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn rewind(&self) {
        if let Err(e) = self.sink.try_seek(Duration::ZERO) {
            tracing::debug!(error = %e, "rewind not supported by source");
        }
    }

    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    async fn ended(&self) {
        while !self.sink.empty() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Speech (Windows / macOS)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(target_os = "linux"))]
pub use tts_speech::TtsSpeech;

#[cfg(not(target_os = "linux"))]
mod tts_speech {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::platform::{PlatformError, SpeechEngine, SpeechRequest};

    /// System speech through the `tts` crate
    pub struct TtsSpeech {
        engine: Mutex<tts::Tts>,
    }

    impl TtsSpeech {
        pub fn new() -> Result<Self, PlatformError> {
            let engine = tts::Tts::default().map_err(|e| PlatformError::SpeechUnavailable {
                reason: e.to_string(),
            })?;
            Ok(Self {
                engine: Mutex::new(engine),
            })
        }
    }

    #[async_trait]
    impl SpeechEngine for TtsSpeech {
        async fn speak(&self, request: SpeechRequest) -> Result<(), PlatformError> {
            let mut engine = self.engine.lock().unwrap_or_else(|e| e.into_inner());

            // Rate 1.0 maps to the engine's normal rate, lower values toward its minimum
            let rate = engine.min_rate() + (engine.normal_rate() - engine.min_rate()) * request.rate;
            let pitch = engine.normal_pitch() * request.pitch;
            let volume = engine.max_volume() * request.volume;
            let _ = engine.set_rate(rate);
            let _ = engine.set_pitch(pitch);
            let _ = engine.set_volume(volume);

            engine
                .speak(request.text.as_str(), false)
                .map(|_| ())
                .map_err(|e| PlatformError::Speech {
                    reason: e.to_string(),
                })
        }
    }
}
