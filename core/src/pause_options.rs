//! Rest-length choices and their labels

use std::time::Duration;

/// Longest selectable rest, in seconds
pub const MAX_PAUSE_SECS: u64 = 300;
pub const PAUSE_STEP_SECS: u64 = 5;

/// One selectable rest length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseDurationOption {
    pub value_ms: u64,
    /// `m:ss`
    pub label: String,
}

/// Rest lengths from 0:00 to 5:00 in 5 second steps
pub fn pause_duration_options() -> Vec<PauseDurationOption> {
    (0..=MAX_PAUSE_SECS)
        .step_by(PAUSE_STEP_SECS as usize)
        .map(|secs| {
            let value_ms = secs * 1000;
            PauseDurationOption {
                value_ms,
                label: format_pause_label(value_ms),
            }
        })
        .collect()
}

/// `m:ss` for a millisecond duration (partial seconds are dropped)
pub fn format_pause_label(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Rest length as spoken words, e.g. "1 minute 30 seconds"
pub fn spoken_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (minutes, seconds) = (secs / 60, secs % 60);

    let unit = |n: u64, word: &str| {
        if n == 1 {
            format!("1 {word}")
        } else {
            format!("{n} {word}s")
        }
    };

    match (minutes, seconds) {
        (0, s) => unit(s, "second"),
        (m, 0) => unit(m, "minute"),
        (m, s) => format!("{} {}", unit(m, "minute"), unit(s, "second")),
    }
}
