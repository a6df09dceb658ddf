use std::fmt;

use tokio::sync::watch;

use repcoach_types::Exercise;

use crate::coordinators::CountdownTarget;

/// Where the flow currently is within an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    #[default]
    Idle,
    /// Countdown before a set
    LeadIn,
    /// Counting repetitions
    Exercise,
    /// Countdown between sets
    Rest,
    Finished,
    Cancelled,
}

impl FlowPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LeadIn => "get ready",
            Self::Exercise => "exercise",
            Self::Rest => "rest",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Snapshot of a running exercise, published through a watch channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowProgress {
    pub exercise_id: Option<u32>,
    pub exercise_name: String,
    pub phase: FlowPhase,
    /// One-based set currently in progress (0 before the first)
    pub set: u32,
    pub sets: u32,
    pub completed_sets: u32,
    pub repetition: u32,
    pub repetitions: u32,
    /// Whole seconds left on the active countdown
    pub countdown: u64,
}

impl FlowProgress {
    pub(crate) fn starting(exercise: &Exercise) -> Self {
        Self {
            exercise_id: Some(exercise.id),
            exercise_name: exercise.exercise_name.clone(),
            phase: FlowPhase::Idle,
            set: 0,
            sets: exercise.sets,
            completed_sets: exercise.completed_sets,
            repetition: 0,
            repetitions: 0,
            countdown: 0,
        }
    }
}

impl fmt::Display for FlowProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(id) = self.exercise_id else {
            return write!(f, "no exercise");
        };

        write!(
            f,
            "[{id}] {} | {} | set {}/{} | rep {}/{}",
            self.exercise_name,
            self.phase.label(),
            self.set,
            self.sets,
            self.repetition,
            self.repetitions
        )?;
        if matches!(self.phase, FlowPhase::LeadIn | FlowPhase::Rest) {
            write!(f, " | {}s", self.countdown)?;
        }
        Ok(())
    }
}

/// Routes countdown seconds into [`FlowProgress::countdown`]
pub(crate) struct ProgressCountdown<'a>(pub &'a watch::Sender<FlowProgress>);

impl CountdownTarget for ProgressCountdown<'_> {
    fn set_seconds(&self, seconds: u64) {
        self.0.send_if_modified(|progress| {
            if progress.countdown == seconds {
                false
            } else {
                progress.countdown = seconds;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_countdown_only_while_counting_down() {
        let mut progress = FlowProgress::starting(&Exercise::new(4, "Squats", 10, 3));
        assert_eq!(progress.to_string(), "[4] Squats | idle | set 0/3 | rep 0/0");

        progress.phase = FlowPhase::Rest;
        progress.countdown = 12;
        assert_eq!(progress.to_string(), "[4] Squats | rest | set 0/3 | rep 0/0 | 12s");

        assert_eq!(FlowProgress::default().to_string(), "no exercise");
    }

    #[test]
    fn countdown_target_only_notifies_on_change() {
        let (tx, mut rx) = watch::channel(FlowProgress::default());
        let target = ProgressCountdown(&tx);

        target.set_seconds(3);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().countdown, 3);

        target.set_seconds(3);
        assert!(!rx.has_changed().unwrap());
    }
}
