use repcoach_types::{AnnouncementToggles, Phrases};

/// Something to say in response to a repetition tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cue {
    Count(u32),
    Halfway,
    LastRepetition,
}

impl Cue {
    pub(crate) fn text(&self, phrases: &Phrases) -> String {
        match self {
            Self::Count(n) => n.to_string(),
            Self::Halfway => phrases.halfway.clone(),
            Self::LastRepetition => phrases.last_repetition.clone(),
        }
    }
}

/// Cues for tick `n` of a `repetitions`-long set.
///
/// The halfway cue needs at least 4 repetitions and lands on `ceil(reps/2)`;
/// "last one" needs at least 2 and lands on the tick before the final one.
pub(crate) fn cues_for_tick(n: u32, repetitions: u32, toggles: &AnnouncementToggles) -> Vec<Cue> {
    let mut cues = Vec::new();

    if toggles.audio_quantity_exercise {
        cues.push(Cue::Count(n));
    }
    if toggles.audio_middle && repetitions >= 4 && n == repetitions.div_ceil(2) {
        cues.push(Cue::Halfway);
    }
    if toggles.audio_before_end && repetitions >= 2 && n == repetitions - 1 {
        cues.push(Cue::LastRepetition);
    }

    cues
}
