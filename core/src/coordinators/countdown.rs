//! Whole-second countdowns
//!
//! A countdown publishes the seconds left (rounded up) into a target every
//! tick. Time spent paused is excluded, so a pause truly freezes the clock.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use repcoach_types::TransportState;

use super::RunGuard;
use crate::transport::Transport;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Seconds left, rounded up (1 ms left shows as 1)
pub fn whole_seconds(remaining: Duration) -> u64 {
    remaining.as_millis().div_ceil(1000) as u64
}

/// Receives the whole seconds left on a countdown
pub trait CountdownTarget {
    fn set_seconds(&self, seconds: u64);
}

impl CountdownTarget for watch::Sender<u64> {
    fn set_seconds(&self, seconds: u64) {
        self.send_if_modified(|current| {
            if *current == seconds {
                false
            } else {
                *current = seconds;
                true
            }
        });
    }
}

/// How a countdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// Reached zero
    Completed,
    /// Transport went idle or reset; the target was forced to 0
    Cancelled,
    /// This instance was already counting; nothing was started
    AlreadyRunning,
}

/// Wall-clock that only advances while running
#[derive(Debug)]
struct PausableClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl PausableClock {
    fn new(running: bool) -> Self {
        Self {
            accumulated: Duration::ZERO,
            running_since: running.then(Instant::now),
        }
    }

    fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map(|t| t.elapsed()).unwrap_or_default()
    }
}

/// A pausable, cancellable countdown timer
#[derive(Debug)]
pub struct Countdown {
    transport: Transport,
    tick: Duration,
    running: AtomicBool,
}

impl Countdown {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            tick: DEFAULT_TICK,
            running: AtomicBool::new(false),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(std::sync::atomic::Ordering::Acquire)
    }

    /// Count `duration` down into `target`.
    ///
    /// Resolves exactly once: `Completed` at zero, or `Cancelled` (target
    /// forced to 0) as soon as the transport becomes idle or reset.
    pub async fn run<T>(&self, duration: Duration, target: &T) -> CountdownOutcome
    where
        T: CountdownTarget + ?Sized,
    {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::debug!("countdown already running");
            return CountdownOutcome::AlreadyRunning;
        };

        let mut state_rx = self.transport.subscribe();
        let initial = *state_rx.borrow_and_update();
        if initial.is_stopped() {
            return cancel(target);
        }
        target.set_seconds(whole_seconds(duration));

        let mut clock = PausableClock::new(initial == TransportState::Running);
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let state = *state_rx.borrow_and_update();
                    match state {
                        TransportState::Idle | TransportState::Reset => return cancel(target),
                        TransportState::Paused => clock.pause(),
                        TransportState::Running => {
                            clock.resume();
                            let remaining = duration.saturating_sub(clock.elapsed());
                            target.set_seconds(whole_seconds(remaining));
                            if remaining.is_zero() {
                                tracing::debug!(?duration, "countdown completed");
                                return CountdownOutcome::Completed;
                            }
                        }
                    }
                }
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        return cancel(target);
                    }
                    let state = *state_rx.borrow_and_update();
                    match state {
                        TransportState::Idle | TransportState::Reset => return cancel(target),
                        TransportState::Paused => clock.pause(),
                        TransportState::Running => clock.resume(),
                    }
                }
            }
        }
    }
}

fn cancel<T: CountdownTarget + ?Sized>(target: &T) -> CountdownOutcome {
    target.set_seconds(0);
    tracing::debug!("countdown cancelled");
    CountdownOutcome::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Collects every value published into a watch target
    fn record(tx: &watch::Sender<u64>) -> tokio::task::JoinHandle<Vec<u64>> {
        let mut rx = tx.subscribe();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                seen.push(*rx.borrow_and_update());
            }
            seen
        })
    }

    #[test]
    fn whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::ZERO), 0);
        assert_eq!(whole_seconds(Duration::from_millis(1)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1000)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(4001)), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_five_seconds_down_to_zero() {
        let transport = Transport::new(TransportState::Running);
        let countdown = Countdown::new(transport);
        let (tx, _rx) = watch::channel(0u64);
        let recorder = record(&tx);

        let started = Instant::now();
        let outcome = countdown.run(Duration::from_millis(5000), &tx).await;
        assert_eq!(outcome, CountdownOutcome::Completed);
        assert_eq!(started.elapsed(), Duration::from_secs(5));

        drop(tx);
        assert_eq!(recorder.await.unwrap(), vec![5, 4, 3, 2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_mid_run_forces_zero_within_a_tick() {
        let transport = Transport::new(TransportState::Running);
        let countdown = Countdown::new(transport.clone());
        let (tx, rx) = watch::channel(0u64);

        let host = tokio::spawn({
            let transport = transport.clone();
            async move {
                time::sleep(Duration::from_millis(2500)).await;
                transport.set(TransportState::Reset);
            }
        });

        let started = Instant::now();
        let outcome = countdown.run(Duration::from_secs(10), &tx).await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, CountdownOutcome::Cancelled);
        assert_eq!(*rx.borrow(), 0);
        assert!(elapsed >= Duration::from_millis(2500));
        assert!(elapsed <= Duration::from_millis(2600), "took {elapsed:?}");
        host.await.unwrap();
        assert_eq!(transport.observer_count(), 0, "observer must be released");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_cancels_like_reset() {
        let transport = Transport::new(TransportState::Running);
        let countdown = Countdown::new(transport.clone());
        let (tx, rx) = watch::channel(0u64);

        let host = tokio::spawn({
            let transport = transport.clone();
            async move {
                time::sleep(Duration::from_secs(1)).await;
                transport.set(TransportState::Idle);
            }
        });

        assert_eq!(
            countdown.run(Duration::from_secs(3), &tx).await,
            CountdownOutcome::Cancelled
        );
        assert_eq!(*rx.borrow(), 0);
        host.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_the_clock() {
        let transport = Transport::new(TransportState::Running);
        let countdown = Countdown::new(transport.clone());
        let (tx, rx) = watch::channel(0u64);

        let host = tokio::spawn({
            let transport = transport.clone();
            let rx = rx.clone();
            async move {
                time::sleep(Duration::from_millis(2050)).await;
                transport.set(TransportState::Paused);
                time::sleep(Duration::from_secs(10)).await;
                let frozen = *rx.borrow();
                transport.set(TransportState::Running);
                frozen
            }
        });

        let started = Instant::now();
        let outcome = countdown.run(Duration::from_secs(5), &tx).await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, CountdownOutcome::Completed);
        assert_eq!(host.await.unwrap(), 3, "display holds while paused");
        // 5 s of running plus the 10 s pause
        assert!(elapsed >= Duration::from_secs(15), "finished early: {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(15_100), "paused time counted: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn paused_start_shows_the_full_duration() {
        let transport = Transport::new(TransportState::Paused);
        let countdown = Countdown::new(transport.clone());
        // left over from a previous phase
        let (tx, rx) = watch::channel(1u64);

        let host = tokio::spawn({
            let transport = transport.clone();
            let rx = rx.clone();
            async move {
                time::sleep(Duration::from_secs(3)).await;
                let shown = *rx.borrow();
                transport.set(TransportState::Running);
                shown
            }
        });

        let started = Instant::now();
        let outcome = countdown.run(Duration::from_secs(2), &tx).await;

        assert_eq!(outcome, CountdownOutcome::Completed);
        assert_eq!(host.await.unwrap(), 2);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_completes_immediately() {
        let countdown = Countdown::new(Transport::new(TransportState::Running));
        let (tx, rx) = watch::channel(7u64);

        assert_eq!(
            countdown.run(Duration::ZERO, &tx).await,
            CountdownOutcome::Completed
        );
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_on_same_instance_is_a_no_op() {
        let countdown = Arc::new(Countdown::new(Transport::new(TransportState::Running)));
        let (tx, _rx) = watch::channel(0u64);
        let tx = Arc::new(tx);

        let first = tokio::spawn({
            let countdown = countdown.clone();
            let tx = tx.clone();
            async move { countdown.run(Duration::from_secs(2), tx.as_ref()).await }
        });
        time::sleep(Duration::from_millis(300)).await;
        assert!(countdown.is_running());

        let (other_tx, _other_rx) = watch::channel(0u64);
        assert_eq!(
            countdown.run(Duration::from_secs(2), &other_tx).await,
            CountdownOutcome::AlreadyRunning
        );

        assert_eq!(first.await.unwrap(), CountdownOutcome::Completed);
        assert!(!countdown.is_running());
    }
}
