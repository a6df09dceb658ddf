//! Foreground tracks with lock-screen controls
//!
//! Every playing track gets a [`TrackHandle`] with a session-unique id and a
//! watcher task that mirrors the transport onto the audio element and the
//! lock-screen surface. Lock-screen buttons feed back into the transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use repcoach_types::TransportState;

use crate::ids::IdAllocator;
use crate::platform::{
    AudioBackend, AudioElement, LoadOptions, MediaAction, MediaControls, TrackMetadata,
};
use crate::transport::Transport;

/// Id of a handle that never played anything
pub const INERT_TRACK_ID: i64 = -1;

type Registry = Mutex<HashMap<i64, TrackHandle>>;

fn lock_registry(registry: &Registry) -> std::sync::MutexGuard<'_, HashMap<i64, TrackHandle>> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

struct TrackInner {
    id: i64,
    element: Option<Arc<dyn AudioElement>>,
    /// Set only when the lock-screen registration succeeded
    controls: Option<Arc<dyn MediaControls>>,
    registry: Weak<Registry>,
    cancel: CancellationToken,
    stopped: AtomicBool,
}

/// A playing (or inert) track
#[derive(Clone)]
pub struct TrackHandle {
    inner: Arc<TrackInner>,
}

impl std::fmt::Debug for TrackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackHandle")
            .field("id", &self.inner.id)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl TrackHandle {
    fn inert() -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: INERT_TRACK_ID,
                element: None,
                controls: None,
                registry: Weak::new(),
                cancel: CancellationToken::new(),
                stopped: AtomicBool::new(true),
            }),
        }
    }

    pub fn id(&self) -> i64 {
        self.inner.id
    }

    pub fn is_inert(&self) -> bool {
        self.inner.id == INERT_TRACK_ID
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Pause, rewind, drop the lock-screen registration, leave the registry
    /// and end the watcher. Only the first call does anything.
    pub async fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        self.inner.cancel.cancel();
        if let Some(element) = &self.inner.element {
            element.pause();
            element.rewind();
        }
        if let Some(controls) = &self.inner.controls
            && let Err(e) = controls.destroy().await
        {
            tracing::warn!(error = %e, id = self.inner.id, "failed to destroy media controls");
        }
        if let Some(registry) = self.inner.registry.upgrade() {
            lock_registry(&registry).remove(&self.inner.id);
        }

        tracing::debug!(id = self.inner.id, "track stopped");
    }

    async fn report_playing(&self, playing: bool) {
        if let Some(controls) = &self.inner.controls
            && let Err(e) = controls.update_is_playing(playing).await
        {
            tracing::warn!(error = %e, id = self.inner.id, "failed to update media controls");
        }
    }
}

/// Starts foreground tracks and keeps the registry of those still playing
pub struct TrackPlayer {
    transport: Transport,
    backend: Arc<dyn AudioBackend>,
    controls: Option<Arc<dyn MediaControls>>,
    ids: IdAllocator,
    registry: Arc<Registry>,
}

impl TrackPlayer {
    pub fn new(
        transport: Transport,
        backend: Arc<dyn AudioBackend>,
        controls: Option<Arc<dyn MediaControls>>,
        ids: IdAllocator,
    ) -> Self {
        Self {
            transport,
            backend,
            controls,
            ids,
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Play `src` once at `volume`.
    ///
    /// Returns an inert handle (id [`INERT_TRACK_ID`]) when the transport is
    /// reset or the source cannot be opened. Waits out a pause before
    /// loading. Playback and lock-screen failures are logged only.
    pub async fn play(&self, src: &str, volume: f32) -> TrackHandle {
        if self.transport.get() == TransportState::Reset {
            tracing::debug!(src, "track skipped on reset");
            return TrackHandle::inert();
        }

        self.transport.wait_while_paused().await;
        if self.transport.get() == TransportState::Reset {
            tracing::debug!(src, "track skipped on reset after pause");
            return TrackHandle::inert();
        }
        // subscribe before the first await so changes during startup reach the watcher
        let state_rx = self.transport.subscribe();

        let element = match self.backend.load(
            src,
            LoadOptions {
                volume,
                looping: false,
            },
        ) {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!(error = %e, src, "failed to load track");
                return TrackHandle::inert();
            }
        };

        let id = self.ids.next_id();
        if let Err(e) = element.play().await {
            tracing::warn!(error = %e, src, id, "track playback failed to start");
        }

        let (controls, actions) = match &self.controls {
            Some(controls) => match controls.create(TrackMetadata::for_source(src)).await {
                Ok(actions) => (Some(controls.clone()), Some(actions)),
                Err(e) => {
                    tracing::warn!(error = %e, src, id, "lock-screen controls unavailable");
                    (None, None)
                }
            },
            None => (None, None),
        };

        let handle = TrackHandle {
            inner: Arc::new(TrackInner {
                id,
                element: Some(element.clone()),
                controls,
                registry: Arc::downgrade(&self.registry),
                cancel: CancellationToken::new(),
                stopped: AtomicBool::new(false),
            }),
        };
        handle.report_playing(!element.is_paused()).await;

        lock_registry(&self.registry).insert(id, handle.clone());
        tokio::spawn(watch_track(
            handle.clone(),
            self.transport.clone(),
            state_rx,
            element,
            actions,
        ));

        tracing::debug!(src, id, "track started");
        handle
    }

    /// Ids of the tracks still playing, ascending
    pub fn active_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = lock_registry(&self.registry).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn active_count(&self) -> usize {
        lock_registry(&self.registry).len()
    }

    pub async fn stop_all(&self) {
        let handles: Vec<TrackHandle> = lock_registry(&self.registry).values().cloned().collect();
        for handle in handles {
            handle.stop().await;
        }
    }
}

async fn next_action(actions: &mut Option<mpsc::Receiver<MediaAction>>) -> Option<MediaAction> {
    match actions {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn watch_track(
    handle: TrackHandle,
    transport: Transport,
    mut state_rx: watch::Receiver<TransportState>,
    element: Arc<dyn AudioElement>,
    mut actions: Option<mpsc::Receiver<MediaAction>>,
) {
    let cancel = handle.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    handle.stop().await;
                    break;
                }
                let state = *state_rx.borrow_and_update();
                match state {
                    TransportState::Paused | TransportState::Idle => {
                        element.pause();
                        handle.report_playing(false).await;
                    }
                    TransportState::Running => {
                        if let Err(e) = element.play().await {
                            tracing::warn!(error = %e, id = handle.id(), "track failed to resume");
                        }
                        handle.report_playing(true).await;
                    }
                    TransportState::Reset => {
                        handle.stop().await;
                        break;
                    }
                }
            }
            action = next_action(&mut actions) => match action {
                Some(MediaAction::Pause) => transport.set(TransportState::Paused),
                Some(MediaAction::Play) => transport.set(TransportState::Running),
                Some(MediaAction::Destroy) => {
                    handle.stop().await;
                    break;
                }
                None => actions = None,
            },
            _ = element.ended() => {
                tracing::debug!(id = handle.id(), "track ended");
                handle.stop().await;
                break;
            }
        }
    }
}
