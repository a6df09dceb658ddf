//! Error types for platform primitives

use thiserror::Error;

/// Failures reported by speech, audio and media-control backends.
///
/// Coordinators log these and carry on; they never abort a workout.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("speech engine unavailable: {reason}")]
    SpeechUnavailable { reason: String },

    #[error("speech failed: {reason}")]
    Speech { reason: String },

    #[error("failed to open audio source {src}")]
    OpenSource {
        src: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode audio source {src}: {reason}")]
    Decode { src: String, reason: String },

    #[error("audio output unavailable: {reason}")]
    Output { reason: String },

    #[error("playback rejected: {reason}")]
    Playback { reason: String },

    #[error("media controls unavailable: {reason}")]
    MediaControls { reason: String },

    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
