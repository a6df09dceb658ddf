//! Shared exercise and configuration types for repcoach
//!
//! This crate contains the serializable data model shared between the
//! coordinator engine (repcoach-core) and any host that drives it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Transport State
// ─────────────────────────────────────────────────────────────────────────────

/// Run/pause/stop flag shared by every coordinator of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// Nothing is running; announcements are dropped
    #[default]
    Idle,
    Running,
    Paused,
    /// The host asked every coordinator to cancel
    Reset,
}

impl TransportState {
    /// Returns true for the states that cancel coordinators (`Idle`, `Reset`)
    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Idle | TransportState::Reset)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransportState::Idle => "idle",
            TransportState::Running => "running",
            TransportState::Paused => "paused",
            TransportState::Reset => "reset",
        }
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exercise Model
// ─────────────────────────────────────────────────────────────────────────────

/// Repetition count for an exercise.
///
/// Older libraries store a single count for every set; newer ones store one
/// count per set. Both shapes deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepetitionsPerSet {
    Uniform(u32),
    PerSet(Vec<u32>),
}

impl Default for RepetitionsPerSet {
    fn default() -> Self {
        RepetitionsPerSet::Uniform(0)
    }
}

impl RepetitionsPerSet {
    /// Repetitions for the zero-based `set` index.
    ///
    /// When a per-set list is shorter than the set count, the last entry
    /// applies to the remaining sets.
    pub fn for_set(&self, set: u32) -> u32 {
        match self {
            RepetitionsPerSet::Uniform(count) => *count,
            RepetitionsPerSet::PerSet(counts) => counts
                .get(set as usize)
                .or_else(|| counts.last())
                .copied()
                .unwrap_or(0),
        }
    }

    /// Sum of repetitions across `sets` sets
    pub fn total(&self, sets: u32) -> u32 {
        (0..sets).map(|s| self.for_set(s)).sum()
    }
}

/// Which spoken cues an exercise wants at each milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnouncementToggles {
    /// Speak the repetition count before a set and each count while counting
    #[serde(default)]
    pub audio_quantity_exercise: bool,
    #[serde(default)]
    pub audio_start: bool,
    #[serde(default)]
    pub audio_middle: bool,
    #[serde(default)]
    pub audio_before_end: bool,
    #[serde(default)]
    pub audio_end: bool,
    #[serde(default)]
    pub announce_pause_duration: bool,
    #[serde(default)]
    pub announce_countdown: bool,
    #[serde(default)]
    pub announce_pause_end: bool,
}

impl AnnouncementToggles {
    pub fn all() -> Self {
        Self {
            audio_quantity_exercise: true,
            audio_start: true,
            audio_middle: true,
            audio_before_end: true,
            audio_end: true,
            announce_pause_duration: true,
            announce_countdown: true,
            announce_pause_end: true,
        }
    }
}

/// Back-reference from an exercise to the group it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: u32,
    pub name: String,
}

/// One exercise as configured by the user.
///
/// All durations are stored in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: u32,
    pub exercise_name: String,

    // ─── Volume ─────────────────────────────────────────────────────────────
    #[serde(default)]
    pub repetitions_per_set: RepetitionsPerSet,
    /// Time allotted to one repetition
    pub repetition_duration_ms: u64,
    pub sets: u32,
    /// Progress field, the only value mutated during a run
    #[serde(default)]
    pub completed_sets: u32,

    // ─── Timing ─────────────────────────────────────────────────────────────
    /// Rest between sets
    #[serde(default)]
    pub pause_ms: u64,
    /// Lead-in countdown before each set (0 = none)
    #[serde(default)]
    pub countdown_before_start_ms: u64,

    // ─── Media ──────────────────────────────────────────────────────────────
    #[serde(default)]
    pub gif_url: String,
    #[serde(default)]
    pub background_melody_link: String,

    #[serde(flatten)]
    pub announcements: AnnouncementToggles,

    #[serde(default)]
    pub selected_for_player: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
}

impl Exercise {
    /// Create an exercise with no announcements, media or pauses
    pub fn new(id: u32, name: impl Into<String>, repetitions: u32, sets: u32) -> Self {
        Self {
            id,
            exercise_name: name.into(),
            repetitions_per_set: RepetitionsPerSet::Uniform(repetitions),
            repetition_duration_ms: 1000,
            sets,
            completed_sets: 0,
            pause_ms: 0,
            countdown_before_start_ms: 0,
            gif_url: String::new(),
            background_melody_link: String::new(),
            announcements: AnnouncementToggles::default(),
            selected_for_player: false,
            group: None,
        }
    }

    pub fn repetition_duration(&self) -> Duration {
        Duration::from_millis(self.repetition_duration_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn countdown_before_start(&self) -> Duration {
        Duration::from_millis(self.countdown_before_start_ms)
    }

    /// Repetitions for the zero-based set index
    pub fn repetitions_for_set(&self, set: u32) -> u32 {
        self.repetitions_per_set.for_set(set)
    }

    pub fn remaining_sets(&self) -> u32 {
        self.sets.saturating_sub(self.completed_sets)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_sets >= self.sets
    }

    pub fn reset_progress(&mut self) {
        self.completed_sets = 0;
    }

    pub fn melody_link(&self) -> Option<&str> {
        let link = self.background_melody_link.trim();
        (!link.is_empty()).then_some(link)
    }
}

/// A named collection of exercises
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Group {
    /// Indices of the exercises a group workout should run.
    ///
    /// Exercises flagged `selected_for_player` win; when none are flagged the
    /// whole group runs.
    pub fn playlist(&self) -> Vec<usize> {
        let selected: Vec<usize> = self
            .exercises
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selected_for_player)
            .map(|(i, _)| i)
            .collect();

        if selected.is_empty() {
            (0..self.exercises.len()).collect()
        } else {
            selected
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// A synthesized beep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    #[serde(default = "default_tone_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_tone_frequency")]
    pub frequency_hz: f32,
    /// Gain (0.0 - 1.0)
    #[serde(default = "default_unit")]
    pub volume: f32,
}

fn default_tone_duration_ms() -> u64 {
    200
}

fn default_tone_frequency() -> f32 {
    440.0
}

fn default_unit() -> f32 {
    1.0
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            frequency_hz: 440.0,
            volume: 1.0,
        }
    }
}

impl Tone {
    pub fn new(duration: Duration, frequency_hz: f32, volume: f32) -> Self {
        Self {
            duration_ms: duration.as_millis() as u64,
            frequency_hz,
            volume,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Fixed voice parameters passed to the speech engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// BCP-47 language tag
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_unit")]
    pub pitch: f32,
    #[serde(default = "default_unit")]
    pub volume: f32,
    /// Rate used by the exercise flow (clamped to 0.1 - 1.0 when spoken)
    #[serde(default = "default_unit")]
    pub rate: f32,
}

fn default_lang() -> String {
    "en-US".to_string()
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            pitch: 1.0,
            volume: 1.0,
            rate: 1.0,
        }
    }
}

/// Audio output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Master enable for spoken cues and beeps
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Volume of the looping background melody (0.0 - 1.0)
    #[serde(default = "default_melody_volume")]
    pub melody_volume: f32,

    /// Volume of a foreground track played with lock-screen controls
    #[serde(default = "default_unit")]
    pub track_volume: f32,

    /// Play the melody as a one-shot track registered with lock-screen controls
    /// instead of the looping ambient player
    #[serde(default)]
    pub lock_screen_controls: bool,

    /// Beep used at countdown ends and set boundaries
    #[serde(default)]
    pub beep: Tone,
}

fn default_melody_volume() -> f32 {
    0.3
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            melody_volume: 0.3,
            track_volume: 1.0,
            lock_screen_controls: false,
            beep: Tone::default(),
        }
    }
}

/// Announcement text templates.
///
/// `{count}` and `{duration}` are substituted where noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phrases {
    pub get_ready: String,
    /// `{count}` = repetitions in the upcoming set
    pub repetitions: String,
    pub start: String,
    pub halfway: String,
    pub last_repetition: String,
    pub set_complete: String,
    /// `{duration}` = spoken rest length
    pub rest: String,
    pub rest_over: String,
    pub workout_complete: String,
}

impl Default for Phrases {
    fn default() -> Self {
        Self {
            get_ready: "Get ready".to_string(),
            repetitions: "{count} repetitions".to_string(),
            start: "Start".to_string(),
            halfway: "Halfway there".to_string(),
            last_repetition: "Last one".to_string(),
            set_complete: "Set complete".to_string(),
            rest: "Rest for {duration}".to_string(),
            rest_over: "Rest is over".to_string(),
            workout_complete: "Workout complete".to_string(),
        }
    }
}

/// Top-level coach configuration.
///
/// Persistence lives in repcoach-core (`CoachConfigExt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub voice: VoiceSettings,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub phrases: Phrases,
    /// Coordinator polling granularity
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Exercise library loaded at startup
    #[serde(default)]
    pub library_path: String,
}

fn default_tick_ms() -> u64 {
    100
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            voice: VoiceSettings::default(),
            audio: AudioSettings::default(),
            phrases: Phrases::default(),
            tick_ms: default_tick_ms(),
            library_path: String::new(),
        }
    }
}

impl CoachConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_repetitions_apply_to_every_set() {
        let reps = RepetitionsPerSet::Uniform(12);
        assert_eq!(reps.for_set(0), 12);
        assert_eq!(reps.for_set(7), 12);
        assert_eq!(reps.total(3), 36);
    }

    #[test]
    fn per_set_repetitions_repeat_last_entry() {
        let reps = RepetitionsPerSet::PerSet(vec![10, 8, 6]);
        assert_eq!(reps.for_set(0), 10);
        assert_eq!(reps.for_set(2), 6);
        assert_eq!(reps.for_set(5), 6);
        assert_eq!(RepetitionsPerSet::PerSet(vec![]).for_set(0), 0);
    }

    #[test]
    fn both_exercise_shapes_deserialize() {
        let legacy = r#"
            id = 1
            exercise_name = "Squats"
            repetitions_per_set = 15
            repetition_duration_ms = 2000
            sets = 3
            audio_start = true
        "#;
        let exercise: Exercise = toml::from_str(legacy).unwrap();
        assert_eq!(exercise.repetitions_per_set, RepetitionsPerSet::Uniform(15));
        assert!(exercise.announcements.audio_start);
        assert!(!exercise.announcements.audio_end);

        let per_set = r#"
            id = 2
            exercise_name = "Push-ups"
            repetitions_per_set = [12, 10, 8]
            repetition_duration_ms = 1500
            sets = 3
            pause_ms = 30000
        "#;
        let exercise: Exercise = toml::from_str(per_set).unwrap();
        assert_eq!(exercise.repetitions_for_set(1), 10);
        assert_eq!(exercise.pause(), Duration::from_secs(30));
    }

    #[test]
    fn progress_helpers() {
        let mut exercise = Exercise::new(1, "Lunges", 10, 4);
        exercise.completed_sets = 3;
        assert_eq!(exercise.remaining_sets(), 1);
        assert!(!exercise.is_complete());

        exercise.completed_sets = 4;
        assert!(exercise.is_complete());

        exercise.reset_progress();
        assert_eq!(exercise.remaining_sets(), 4);
    }

    #[test]
    fn blank_melody_link_is_none() {
        let mut exercise = Exercise::new(1, "Plank", 1, 1);
        assert_eq!(exercise.melody_link(), None);
        exercise.background_melody_link = "  ".to_string();
        assert_eq!(exercise.melody_link(), None);
        exercise.background_melody_link = "music/loop.mp3".to_string();
        assert_eq!(exercise.melody_link(), Some("music/loop.mp3"));
    }

    #[test]
    fn group_playlist_prefers_selected() {
        let mut group = Group {
            id: 1,
            name: "Legs".to_string(),
            exercises: vec![
                Exercise::new(1, "Squats", 10, 3),
                Exercise::new(2, "Lunges", 10, 3),
                Exercise::new(3, "Calf raises", 20, 2),
            ],
        };
        assert_eq!(group.playlist(), vec![0, 1, 2]);

        group.exercises[2].selected_for_player = true;
        assert_eq!(group.playlist(), vec![2]);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: CoachConfig = toml::from_str("[audio]\nlock_screen_controls = true\n").unwrap();
        assert!(config.audio.lock_screen_controls);
        assert_eq!(config.audio.melody_volume, 0.3);
        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.phrases.start, "Start");
        assert!(!TransportState::Running.is_stopped());
        assert!(TransportState::Reset.is_stopped());
    }
}
