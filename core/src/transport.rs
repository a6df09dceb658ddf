//! Shared transport state and the pause gate
//!
//! One `Transport` exists per workout session. The host writes it; every
//! coordinator holds a clone and watches it to suspend, resume or cancel.

use std::sync::Arc;

use tokio::sync::watch;

pub use repcoach_types::TransportState;

/// Cloneable handle to the session's transport state
#[derive(Debug, Clone)]
pub struct Transport {
    tx: Arc<watch::Sender<TransportState>>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(TransportState::Idle)
    }
}

impl Transport {
    pub fn new(initial: TransportState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> TransportState {
        *self.tx.borrow()
    }

    /// Write a new state. Observers are only notified on an actual change.
    pub fn set(&self, state: TransportState) {
        let mut previous = state;
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                previous = std::mem::replace(current, state);
                true
            }
        });

        if changed {
            tracing::debug!(from = %previous, to = %state, "transport changed");
        }
    }

    /// Register a new observer. Dropping the receiver deregisters it.
    pub fn subscribe(&self) -> watch::Receiver<TransportState> {
        self.tx.subscribe()
    }

    /// True when the state cancels coordinators (`Idle` or `Reset`)
    pub fn is_stopped(&self) -> bool {
        self.get().is_stopped()
    }

    /// Number of live observers (watch receivers)
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Pause gate: resolves immediately unless paused, otherwise once the
    /// state leaves `Paused`. Never fails.
    pub async fn wait_while_paused(&self) {
        if self.get() != TransportState::Paused {
            return;
        }

        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|state| *state != TransportState::Paused).await;
    }

    /// Resolves once the state is `Idle` or `Reset`
    pub async fn stopped(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|state| state.is_stopped()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn gate_passes_when_not_paused() {
        for state in [
            TransportState::Idle,
            TransportState::Running,
            TransportState::Reset,
        ] {
            let transport = Transport::new(state);
            transport.wait_while_paused().await;
            assert_eq!(transport.observer_count(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gate_waits_until_running() {
        let transport = Transport::new(TransportState::Paused);

        let gate = tokio::spawn({
            let transport = transport.clone();
            async move { transport.wait_while_paused().await }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!gate.is_finished(), "gate must hold while paused");
        assert_eq!(transport.observer_count(), 1);

        transport.set(TransportState::Running);
        gate.await.unwrap();
        assert_eq!(transport.observer_count(), 0, "observer must be released");
    }

    #[tokio::test(start_paused = true)]
    async fn gate_releases_on_reset() {
        let transport = Transport::new(TransportState::Paused);

        let gate = tokio::spawn({
            let transport = transport.clone();
            async move { transport.wait_while_paused().await }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        transport.set(TransportState::Reset);
        gate.await.unwrap();
    }

    #[tokio::test]
    async fn set_only_notifies_on_change() {
        let transport = Transport::new(TransportState::Running);
        let mut rx = transport.subscribe();

        transport.set(TransportState::Running);
        assert!(!rx.has_changed().unwrap());

        transport.set(TransportState::Paused);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), TransportState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_resolves_on_idle() {
        let transport = Transport::new(TransportState::Running);
        let waiter = tokio::spawn({
            let transport = transport.clone();
            async move { transport.stopped().await }
        });

        transport.set(TransportState::Paused);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        transport.set(TransportState::Idle);
        waiter.await.unwrap();
    }
}
