use crate::errors::WeekendError;
use crate::post::race_result::{Frame, RaceOutcome};
use tracing::{debug, info};

/// (ms) Tick period at real-time-like speed (1x)
pub const SPEED_NORMAL_MS: u64 = 2000;
/// (ms) Tick period at 4x speed
pub const SPEED_FAST_MS: u64 = 500;
/// (ms) Tick period at maximum speed
pub const SPEED_MAX_MS: u64 = 50;
pub const DEFAULT_SPEED_MS: u64 = SPEED_FAST_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    Finished,
    Faulted,
}

/// PlaybackState is a snapshot of the transport state of a playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub cursor_index: usize,
    pub is_playing: bool,
    pub speed_ms: u64,
    pub is_finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// cursor moved to the contained index
    Advanced(usize),
    /// last frame was reached, reported exactly once per loaded race
    Finished,
    /// tick arrived while paused or finished
    Ignored,
}

/// Playback replays an already fetched race log. It contains the transition rules only, ticks
/// are delivered from outside (see `PlaybackSession`).
#[derive(Debug)]
pub struct Playback {
    outcome: Option<RaceOutcome>,
    phase: Phase,
    cursor: usize,
    speed_ms: u64,
}

impl Default for Playback {
    fn default() -> Self {
        Playback::new()
    }
}

impl Playback {
    pub fn new() -> Playback {
        Playback {
            outcome: None,
            phase: Phase::Idle,
            cursor: 0,
            speed_ms: DEFAULT_SPEED_MS,
        }
    }

    fn check_not_faulted(&self) -> Result<(), WeekendError> {
        if self.phase == Phase::Faulted {
            return Err(WeekendError::TimerInvariantViolation);
        }
        Ok(())
    }

    /// load starts the replay of a race. An empty race log jumps straight to the final
    /// classification.
    pub fn load(&mut self, outcome: RaceOutcome) -> Result<Phase, WeekendError> {
        self.check_not_faulted()?;

        self.cursor = 0;
        self.phase = if outcome.race_log.is_empty() {
            info!(
                "No race log received for {}, showing final classification",
                outcome.track
            );
            Phase::Finished
        } else {
            info!(
                "Loaded race log for {} with {} frames",
                outcome.track,
                outcome.race_log.len()
            );
            Phase::Playing
        };
        self.outcome = Some(outcome);

        Ok(self.phase)
    }

    /// tick is the only time driven transition. It advances the cursor by one frame and finishes
    /// the playback once the last frame was shown.
    pub fn tick(&mut self) -> Result<TickOutcome, WeekendError> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Faulted;
                Err(WeekendError::TimerInvariantViolation)
            }
            Phase::Faulted => Err(WeekendError::TimerInvariantViolation),
            Phase::Paused | Phase::Finished => Ok(TickOutcome::Ignored),
            Phase::Playing => {
                if self.cursor + 1 < self.log_len() {
                    self.cursor += 1;
                    Ok(TickOutcome::Advanced(self.cursor))
                } else {
                    self.phase = Phase::Finished;
                    debug!("Playback finished at frame {}", self.cursor);
                    Ok(TickOutcome::Finished)
                }
            }
        }
    }

    /// toggle_play switches between playing and paused. Nothing happens before a race is loaded or
    /// after it finished.
    pub fn toggle_play(&mut self) -> Result<Phase, WeekendError> {
        self.check_not_faulted()?;

        self.phase = match self.phase {
            Phase::Playing => Phase::Paused,
            Phase::Paused => Phase::Playing,
            other => other,
        };
        Ok(self.phase)
    }

    /// set_speed sets the tick period for all following ticks.
    pub fn set_speed(&mut self, speed_ms: u64) -> Result<(), WeekendError> {
        self.check_not_faulted()?;

        if speed_ms == 0 {
            return Err(WeekendError::Validation(String::from(
                "playback speed must be a positive number of milliseconds",
            )));
        }
        self.speed_ms = speed_ms;
        Ok(())
    }

    /// skip_to_end moves the cursor to the last frame and finishes the playback. Returns true if
    /// this call finished the playback.
    pub fn skip_to_end(&mut self) -> Result<bool, WeekendError> {
        self.check_not_faulted()?;

        match self.phase {
            Phase::Playing | Phase::Paused => {
                self.cursor = self.log_len().saturating_sub(1);
                self.phase = Phase::Finished;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// rewind moves the cursor back to the first frame and pauses the playback. Finished is
    /// terminal for a loaded race, a finished replay is only restarted by `load`.
    pub fn rewind(&mut self) -> Result<(), WeekendError> {
        self.check_not_faulted()?;

        if matches!(self.phase, Phase::Playing | Phase::Paused) {
            self.cursor = 0;
            self.phase = Phase::Paused;
        }
        Ok(())
    }

    /// current_frame returns the displayed standings: the lap frame at the cursor while the replay
    /// runs and the final classification once it finished.
    pub fn current_frame(&self) -> Option<Frame<'_>> {
        let outcome = self.outcome.as_ref()?;
        match self.phase {
            Phase::Idle | Phase::Faulted => None,
            Phase::Finished => Some(outcome.classification_frame()),
            Phase::Playing | Phase::Paused => outcome.lap_frame(self.cursor),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            cursor_index: self.cursor,
            is_playing: self.phase == Phase::Playing,
            speed_ms: self.speed_ms,
            is_finished: self.phase == Phase::Finished,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn outcome(&self) -> Option<&RaceOutcome> {
        self.outcome.as_ref()
    }

    pub fn log_len(&self) -> usize {
        self.outcome.as_ref().map_or(0, |o| o.race_log.len())
    }
}
