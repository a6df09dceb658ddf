//! Platform selection from the command line

use std::sync::Arc;

use clap::ValueEnum;
use repcoach_core::Platform;
use repcoach_core::platform::espeak::EspeakSpeech;
use repcoach_core::platform::headless::NoopMediaControls;

/// Where announcements are spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SpeechBackend {
    /// Print announcements and beeps to the terminal
    #[default]
    Console,
    /// Speak through the `espeak` command, beeps on the terminal
    Espeak,
    /// System speech and rodio audio output
    Native,
}

/// Build the platform for `backend`. With `lock_screen`, tracks register
/// with a silent lock-screen surface so they play as controlled tracks.
pub fn platform(backend: SpeechBackend, lock_screen: bool) -> Platform {
    let platform = match backend {
        SpeechBackend::Console => Platform::headless(),
        SpeechBackend::Espeak => Platform::headless().with_speech(Arc::new(EspeakSpeech::default())),
        SpeechBackend::Native => native_platform(),
    };

    if lock_screen {
        platform.with_media_controls(Arc::new(NoopMediaControls::default()))
    } else {
        platform
    }
}

#[cfg(feature = "native-audio")]
fn native_platform() -> Platform {
    Platform::native()
}

#[cfg(not(feature = "native-audio"))]
fn native_platform() -> Platform {
    tracing::warn!("built without the native-audio feature, using espeak speech");
    Platform::headless().with_speech(Arc::new(EspeakSpeech::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_backends_have_no_lock_screen() {
        assert!(platform(SpeechBackend::Console, false).media_controls.is_none());
        assert!(platform(SpeechBackend::Espeak, false).media_controls.is_none());
    }

    #[test]
    fn lock_screen_attaches_controls() {
        assert!(platform(SpeechBackend::Console, true).media_controls.is_some());
        assert!(platform(SpeechBackend::Espeak, true).media_controls.is_some());
    }
}
