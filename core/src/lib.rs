pub mod context;
pub mod coordinators;
pub mod flow;
pub mod ids;
pub mod pause_options;
pub mod platform;
pub mod transport;

// Re-exports for convenience
pub use context::{CoachConfigExt, ConfigError, ExerciseLibrary, LibraryError};
pub use coordinators::{
    Announcer, Countdown, CountdownOutcome, CountdownTarget, CounterOutcome, CounterStopHandle,
    MelodyPlayer, RepetitionCounter, SpeechOutcome, ToneEmitter, TrackHandle, TrackPlayer,
    INERT_TRACK_ID, clamp_rate,
};
pub use flow::{ExerciseFlow, FlowOutcome, FlowPhase, FlowProgress};
pub use ids::IdAllocator;
pub use pause_options::{PauseDurationOption, format_pause_label, pause_duration_options};
pub use platform::{Platform, PlatformError};
pub use transport::Transport;

pub use repcoach_types::{
    AnnouncementToggles, AudioSettings, CoachConfig, Exercise, Group, Phrases, RepetitionsPerSet,
    Tone, TransportState, VoiceSettings,
};
