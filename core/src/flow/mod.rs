//! Exercise flow
//!
//! Walks an [`Exercise`] through its sets: lead-in countdown, repetition
//! counting with spoken cues, rest countdowns, and the background melody.
//! The flow never writes the transport; it only reacts to it, so a host
//! pause or reset reaches every step through the coordinators.

mod cues;
mod progress;


use tokio::sync::{mpsc, watch};

use repcoach_types::{CoachConfig, Exercise, Group};

use crate::coordinators::{
    Announcer, Countdown, CountdownOutcome, CounterOutcome, MelodyPlayer, RepetitionCounter,
    ToneEmitter, TrackHandle, TrackPlayer,
};
use crate::ids::IdAllocator;
use crate::pause_options::spoken_duration;
use crate::platform::Platform;
use crate::transport::Transport;

use cues::{Cue, cues_for_tick};
use progress::ProgressCountdown;
pub use progress::{FlowPhase, FlowProgress};

/// How a flow run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    /// The transport went idle or reset
    Cancelled,
}

/// Background media started for one exercise
enum Media {
    None,
    Melody,
    Track(TrackHandle),
}

/// Orchestrates the coordinators for one session
pub struct ExerciseFlow {
    transport: Transport,
    config: CoachConfig,
    has_media_controls: bool,
    announcer: Announcer,
    tones: ToneEmitter,
    melody: MelodyPlayer,
    tracks: TrackPlayer,
}

impl ExerciseFlow {
    pub fn new(transport: Transport, platform: Platform, config: CoachConfig, ids: IdAllocator) -> Self {
        let announcer = Announcer::new(transport.clone(), platform.speech.clone(), config.voice.clone());
        let tones = ToneEmitter::new(transport.clone(), platform.tones.clone());
        let melody = MelodyPlayer::new(
            transport.clone(),
            platform.audio.clone(),
            config.audio.melody_volume,
        );
        let tracks = TrackPlayer::new(
            transport.clone(),
            platform.audio.clone(),
            platform.media_controls.clone(),
            ids,
        );

        Self {
            transport,
            config,
            has_media_controls: platform.media_controls.is_some(),
            announcer,
            tones,
            melody,
            tracks,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Run every remaining set of `exercise`, publishing progress as it goes.
    ///
    /// A finished exercise starts over from its first set. Only
    /// `completed_sets` is written.
    pub async fn run(
        &self,
        exercise: &mut Exercise,
        progress: &watch::Sender<FlowProgress>,
    ) -> FlowOutcome {
        if exercise.is_complete() {
            exercise.reset_progress();
        }
        progress.send_replace(FlowProgress::starting(exercise));

        if self.transport.is_stopped() {
            set_phase(progress, FlowPhase::Cancelled);
            return FlowOutcome::Cancelled;
        }

        tracing::info!(
            id = exercise.id,
            name = %exercise.exercise_name,
            sets = exercise.sets,
            completed = exercise.completed_sets,
            "exercise started"
        );

        let media = self.start_media(exercise).await;
        let outcome = self.run_sets(exercise, progress).await;
        self.stop_media(media).await;

        match outcome {
            FlowOutcome::Completed => {
                set_phase(progress, FlowPhase::Finished);
                tracing::info!(id = exercise.id, "exercise completed");
            }
            FlowOutcome::Cancelled => {
                progress.send_modify(|p| {
                    p.phase = FlowPhase::Cancelled;
                    p.countdown = 0;
                });
                tracing::info!(
                    id = exercise.id,
                    completed = exercise.completed_sets,
                    state = %self.transport.get(),
                    "exercise cancelled"
                );
            }
        }
        outcome
    }

    /// Run the group's playlist in order, stopping at the first cancellation
    pub async fn run_group(
        &self,
        group: &mut Group,
        progress: &watch::Sender<FlowProgress>,
    ) -> FlowOutcome {
        let playlist = group.playlist();
        tracing::info!(group = %group.name, exercises = playlist.len(), "group workout started");

        let mut announce_end = false;
        for index in playlist {
            let exercise = &mut group.exercises[index];
            announce_end |= exercise.announcements.audio_end;
            if self.run(exercise, progress).await == FlowOutcome::Cancelled {
                return FlowOutcome::Cancelled;
            }
        }

        if announce_end {
            self.say(&self.config.phrases.workout_complete).await;
        }
        tracing::info!(group = %group.name, "group workout completed");
        FlowOutcome::Completed
    }

    async fn run_sets(
        &self,
        exercise: &mut Exercise,
        progress: &watch::Sender<FlowProgress>,
    ) -> FlowOutcome {
        let toggles = exercise.announcements;
        let phrases = &self.config.phrases;

        while !exercise.is_complete() {
            if self.transport.is_stopped() {
                return FlowOutcome::Cancelled;
            }

            let set = exercise.completed_sets;
            let repetitions = exercise.repetitions_for_set(set);
            progress.send_modify(|p| {
                p.set = set + 1;
                p.repetition = 0;
                p.repetitions = repetitions;
            });

            // Lead-in
            if exercise.countdown_before_start_ms > 0 {
                set_phase(progress, FlowPhase::LeadIn);
                if toggles.announce_countdown {
                    self.say(&phrases.get_ready).await;
                }
                if self.countdown(exercise.countdown_before_start(), progress).await
                    == CountdownOutcome::Cancelled
                {
                    return FlowOutcome::Cancelled;
                }
                self.beep().await;
            }

            // Set
            set_phase(progress, FlowPhase::Exercise);
            if toggles.audio_quantity_exercise {
                let text = phrases.repetitions.replace("{count}", &repetitions.to_string());
                self.say(&text).await;
            }
            if toggles.audio_start {
                self.say(&phrases.start).await;
                self.beep().await;
            }
            if self.transport.is_stopped() {
                return FlowOutcome::Cancelled;
            }

            if self.count(exercise, repetitions, progress).await != CounterOutcome::Completed {
                return FlowOutcome::Cancelled;
            }

            if toggles.audio_end {
                self.say(&phrases.set_complete).await;
                self.beep().await;
            }
            exercise.completed_sets += 1;
            let completed = exercise.completed_sets;
            progress.send_modify(|p| p.completed_sets = completed);
            tracing::info!(id = exercise.id, set = completed, of = exercise.sets, "set completed");

            // Rest
            if !exercise.is_complete() && exercise.pause_ms > 0 {
                set_phase(progress, FlowPhase::Rest);
                if toggles.announce_pause_duration {
                    let text = phrases
                        .rest
                        .replace("{duration}", &spoken_duration(exercise.pause()));
                    self.say(&text).await;
                }
                if self.countdown(exercise.pause(), progress).await == CountdownOutcome::Cancelled {
                    return FlowOutcome::Cancelled;
                }
                if toggles.announce_pause_end {
                    self.say(&phrases.rest_over).await;
                }
            }
        }

        FlowOutcome::Completed
    }

    /// Count one set. Cues are spoken by a concurrent task so the tick
    /// callback never waits on speech.
    async fn count(
        &self,
        exercise: &Exercise,
        repetitions: u32,
        progress: &watch::Sender<FlowProgress>,
    ) -> CounterOutcome {
        let counter = RepetitionCounter::new(
            self.transport.clone(),
            exercise.repetition_duration(),
            repetitions,
        )
        .with_slice(self.config.tick());
        let toggles = exercise.announcements;
        let (cue_tx, mut cue_rx) = mpsc::unbounded_channel::<Cue>();

        let counting = async move {
            let outcome = counter
                .run(|n| {
                    progress.send_modify(|p| p.repetition = n);
                    for cue in cues_for_tick(n, repetitions, &toggles) {
                        let _ = cue_tx.send(cue);
                    }
                })
                .await;
            drop(cue_tx);
            outcome
        };

        let speaking = async {
            while let Some(cue) = cue_rx.recv().await {
                self.say(&cue.text(&self.config.phrases)).await;
            }
        };

        let (outcome, ()) = tokio::join!(counting, speaking);
        outcome
    }

    async fn countdown(
        &self,
        duration: std::time::Duration,
        progress: &watch::Sender<FlowProgress>,
    ) -> CountdownOutcome {
        Countdown::new(self.transport.clone())
            .with_tick(self.config.tick())
            .run(duration, &ProgressCountdown(progress))
            .await
    }

    async fn say(&self, text: &str) {
        if self.config.audio.enabled {
            self.announcer.say(text).await;
        }
    }

    async fn beep(&self) {
        if self.config.audio.enabled {
            self.tones.beep(self.config.audio.beep).await;
        }
    }

    async fn start_media(&self, exercise: &Exercise) -> Media {
        let Some(link) = exercise.melody_link() else {
            return Media::None;
        };

        if self.config.audio.lock_screen_controls && self.has_media_controls {
            let handle = self.tracks.play(link, self.config.audio.track_volume).await;
            if handle.is_inert() {
                Media::None
            } else {
                Media::Track(handle)
            }
        } else if self.melody.load(link).await {
            Media::Melody
        } else {
            Media::None
        }
    }

    async fn stop_media(&self, media: Media) {
        match media {
            Media::None => {}
            Media::Melody => {
                self.melody.stop();
                self.melody.unload();
            }
            Media::Track(handle) => handle.stop().await,
        }
    }
}

fn set_phase(progress: &watch::Sender<FlowProgress>, phase: FlowPhase) {
    progress.send_if_modified(|p| {
        if p.phase == phase {
            false
        } else {
            p.phase = phase;
            true
        }
    });
}
