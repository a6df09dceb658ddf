//! Speech through the `espeak` command line synthesizer
//!
//! Used on Linux, where the `tts` crate would need speech-dispatcher.

use async_trait::async_trait;
use tokio::process::Command;

use super::{PlatformError, SpeechEngine, SpeechRequest};

/// espeak's default speaking rate in words per minute
const NORMAL_WPM: f32 = 175.0;
/// espeak rejects rates below this
const MIN_WPM: f32 = 80.0;

#[derive(Debug, Clone)]
pub struct EspeakSpeech {
    program: String,
}

impl Default for EspeakSpeech {
    fn default() -> Self {
        Self {
            program: "espeak".to_string(),
        }
    }
}

impl EspeakSpeech {
    /// Use a different binary (e.g. `espeak-ng`)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(request: &SpeechRequest) -> Vec<String> {
        let wpm = (NORMAL_WPM * request.rate).max(MIN_WPM).round() as u32;
        // espeak: pitch 0-99 (50 normal), amplitude 0-200 (100 normal)
        let pitch = (50.0 * request.pitch).clamp(0.0, 99.0).round() as u32;
        let amplitude = (100.0 * request.volume).clamp(0.0, 200.0).round() as u32;

        vec![
            "-v".to_string(),
            request.lang.to_lowercase(),
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            request.text.clone(),
        ]
    }
}

#[async_trait]
impl SpeechEngine for EspeakSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<(), PlatformError> {
        let output = Command::new(&self.program)
            .args(Self::args(&request))
            .output()
            .await
            .map_err(|source| PlatformError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PlatformError::Speech {
                reason: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}
