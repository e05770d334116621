use thiserror::Error;

/// WeekendError covers everything that can go wrong between building a strategy and replaying the
/// race.
///
/// * `Validation` - Input or strategy is not acceptable (blocking condition, e.g. a strategy that is
/// not race-legal)
/// * `Precondition` - An operation was called in a state that does not allow it
/// * `RemoteRejection` - The race simulator answered with a non-success status
/// * `Transport` - The request could not be carried out or the answer could not be decoded
/// * `TimerInvariantViolation` - A playback tick arrived while no race log was loaded
/// * `SeasonComplete` - The calendar has no race left
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeekendError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Race simulator rejected the request: {detail}")]
    RemoteRejection { detail: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Playback tick received without a loaded race log")]
    TimerInvariantViolation,

    #[error("Season complete, no race left in the calendar")]
    SeasonComplete,
}

impl WeekendError {
    /// is_retryable is true for errors that are resolved by submitting the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WeekendError::RemoteRejection { .. } | WeekendError::Transport(_)
        )
    }
}
