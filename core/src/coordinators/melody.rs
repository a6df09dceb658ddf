//! The looping ambient melody
//!
//! At most one melody is loaded at a time. Unlike foreground tracks it has no
//! lock-screen presence, always loops, and may write the transport back to
//! `Idle` when it ends or is reset.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use repcoach_types::TransportState;

use crate::platform::{AudioBackend, AudioElement, LoadOptions};
use crate::transport::Transport;

struct LoadedMelody {
    element: Arc<dyn AudioElement>,
    src: String,
    cancel: CancellationToken,
}

impl LoadedMelody {
    fn discard(self) {
        self.cancel.cancel();
        self.element.pause();
    }
}

/// Single-instance background melody player
pub struct MelodyPlayer {
    transport: Transport,
    backend: Arc<dyn AudioBackend>,
    volume: f32,
    current: Mutex<Option<LoadedMelody>>,
}

impl MelodyPlayer {
    pub fn new(transport: Transport, backend: Arc<dyn AudioBackend>, volume: f32) -> Self {
        Self {
            transport,
            backend,
            volume,
            current: Mutex::new(None),
        }
    }

    fn with_current<T>(&self, f: impl FnOnce(&mut Option<LoadedMelody>) -> T) -> T {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut current)
    }

    /// Replace the current melody with `src` and start it looping.
    ///
    /// Returns false when nothing was loaded (transport reset, or the source
    /// could not be opened). A rejected `play` is logged and still counts as
    /// loaded; the next `Running` retries it.
    pub async fn load(&self, src: &str) -> bool {
        if self.transport.get() == TransportState::Reset {
            tracing::debug!(src, "melody skipped on reset");
            return false;
        }

        self.transport.wait_while_paused().await;
        if self.transport.get() == TransportState::Reset {
            return false;
        }
        // taken before `play` awaits so a change during startup is not lost
        let state_rx = self.transport.subscribe();

        let element = match self.backend.load(
            src,
            LoadOptions {
                volume: self.volume,
                looping: true,
            },
        ) {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!(error = %e, src, "failed to load melody");
                return false;
            }
        };
        element.set_volume(self.volume);

        let cancel = CancellationToken::new();
        let previous = self.with_current(|current| {
            current.replace(LoadedMelody {
                element: element.clone(),
                src: src.to_string(),
                cancel: cancel.clone(),
            })
        });
        if let Some(previous) = previous {
            tracing::debug!(src = %previous.src, "melody replaced");
            previous.discard();
        }

        if let Err(e) = element.play().await {
            tracing::warn!(error = %e, src, "melody autoplay prevented");
        }

        tokio::spawn(watch_melody(element, self.transport.clone(), state_rx, cancel));
        tracing::debug!(src, volume = self.volume, "melody loaded");
        true
    }

    pub fn pause(&self) {
        self.with_current(|current| {
            if let Some(melody) = current {
                melody.element.pause();
            }
        });
    }

    /// Pause and rewind; the melody stays loaded
    pub fn stop(&self) {
        self.with_current(|current| {
            if let Some(melody) = current {
                melody.element.pause();
                melody.element.rewind();
            }
        });
    }

    /// Stop mirroring the transport and forget the melody
    pub fn unload(&self) {
        if let Some(melody) = self.with_current(Option::take) {
            melody.discard();
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.with_current(|current| current.is_some())
    }

    pub fn is_playing(&self) -> bool {
        self.transport.get() == TransportState::Running && self.is_loaded()
    }

    pub fn source(&self) -> Option<String> {
        self.with_current(|current| current.as_ref().map(|m| m.src.clone()))
    }
}

impl Drop for MelodyPlayer {
    fn drop(&mut self) {
        self.unload();
    }
}

async fn watch_melody(
    element: Arc<dyn AudioElement>,
    transport: Transport,
    mut state_rx: watch::Receiver<TransportState>,
    cancel: CancellationToken,
) {
    let mut ended = false;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                match state {
                    TransportState::Running => {
                        if let Err(e) = element.play().await {
                            tracing::warn!(error = %e, "melody failed to resume");
                        }
                    }
                    TransportState::Paused | TransportState::Idle => element.pause(),
                    TransportState::Reset => {
                        element.pause();
                        element.rewind();
                        transport.set(TransportState::Idle);
                    }
                }
            }
            _ = element.ended(), if !ended => {
                ended = true;
                tracing::debug!("melody ended");
                transport.set(TransportState::Idle);
            }
        }
    }
}
