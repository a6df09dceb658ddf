//! Fixed-interval repetition counting

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use repcoach_types::TransportState;

use super::RunGuard;
use super::countdown::DEFAULT_TICK;
use crate::transport::Transport;

/// How a counting run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOutcome {
    /// Every repetition was counted and its interval elapsed
    Completed,
    /// Stopped by a handle or by the transport going idle or reset
    Stopped,
    /// This instance was already counting; nothing was started
    AlreadyRunning,
}

/// Cloneable stop capability for a [`RepetitionCounter`]
#[derive(Debug, Clone)]
pub struct CounterStopHandle(CancellationToken);

impl CounterStopHandle {
    pub fn stop(&self) {
        self.0.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Counts `repetitions` ticks, one every `interval` of running time.
///
/// Each tick waits on the pause gate first. The interval is waited out in
/// short slices so that a stop request or a transport change is noticed
/// within one slice, and time spent paused does not consume the interval.
#[derive(Debug)]
pub struct RepetitionCounter {
    transport: Transport,
    interval: Duration,
    repetitions: u32,
    slice: Duration,
    count: AtomicU32,
    stop: CancellationToken,
    running: AtomicBool,
}

impl RepetitionCounter {
    pub fn new(transport: Transport, interval: Duration, repetitions: u32) -> Self {
        Self {
            transport,
            interval,
            repetitions,
            slice: DEFAULT_TICK,
            count: AtomicU32::new(0),
            stop: CancellationToken::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_slice(mut self, slice: Duration) -> Self {
        self.slice = slice.max(Duration::from_millis(1));
        self
    }

    /// Repetitions counted so far
    pub fn current(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Request termination. Takes effect at the next slice boundary; an
    /// in-flight `on_tick` is never interrupted.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn stop_handle(&self) -> CounterStopHandle {
        CounterStopHandle(self.stop.clone())
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    fn should_stop(&self) -> bool {
        self.stop.is_cancelled() || self.transport.is_stopped()
    }

    /// Pause gate that also gives up on a stop request.
    /// Returns true when counting must end.
    async fn gate(&self) -> bool {
        tokio::select! {
            _ = self.transport.wait_while_paused() => {}
            _ = self.stop.cancelled() => return true,
        }
        self.should_stop()
    }

    /// Run the counter, calling `on_tick(n)` for n = 1..=repetitions
    pub async fn run<F>(&self, mut on_tick: F) -> CounterOutcome
    where
        F: FnMut(u32),
    {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::debug!("repetition counter already running");
            return CounterOutcome::AlreadyRunning;
        };
        self.count.store(0, Ordering::Release);

        while self.current() < self.repetitions {
            if self.should_stop() || self.gate().await {
                return self.stopped();
            }

            let count = (self.current() + 1).min(self.repetitions);
            self.count.store(count, Ordering::Release);
            on_tick(count);

            let mut waited = Duration::ZERO;
            while waited < self.interval {
                let step = self.slice.min(self.interval - waited);
                tokio::select! {
                    _ = tokio::time::sleep(step) => {}
                    _ = self.stop.cancelled() => return self.stopped(),
                }
                if self.should_stop() {
                    return self.stopped();
                }

                // A slice that ended inside a pause does not count
                if self.transport.get() == TransportState::Paused {
                    if self.gate().await {
                        return self.stopped();
                    }
                    continue;
                }
                waited += step;
            }
        }

        tracing::debug!(repetitions = self.repetitions, "repetitions completed");
        CounterOutcome::Completed
    }

    fn stopped(&self) -> CounterOutcome {
        tracing::debug!(
            count = self.current(),
            requested = self.stop.is_cancelled(),
            state = %self.transport.get(),
            "repetition counter stopped"
        );
        CounterOutcome::Stopped
    }
}
