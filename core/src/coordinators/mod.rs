//! Transport-driven coordinators
//!
//! Each coordinator is an independent cooperative routine that watches the
//! shared [`Transport`](crate::transport::Transport):
//! - **announcer**: pause-aware speech
//! - **tone**: pause-aware beeps
//! - **track**: foreground tracks with lock-screen controls
//! - **melody**: the looping ambient melody
//! - **countdown**: whole-second countdowns
//! - **repetition**: fixed-interval repetition counting
//!
//! `Paused` suspends them, `Idle` and `Reset` cancel them.

mod announcer;
mod countdown;
mod melody;
mod repetition;
mod tone;
mod track;

use std::sync::atomic::{AtomicBool, Ordering};

pub use announcer::{Announcer, MAX_RATE, MIN_RATE, SpeechOutcome, clamp_rate};
pub use countdown::{Countdown, CountdownOutcome, CountdownTarget, DEFAULT_TICK, whole_seconds};
pub use melody::MelodyPlayer;
pub use repetition::{CounterOutcome, CounterStopHandle, RepetitionCounter};
pub use tone::ToneEmitter;
pub use track::{INERT_TRACK_ID, TrackHandle, TrackPlayer};

/// Marks a timer instance as running for as long as the guard lives
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    /// Returns None when the instance is already running
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
