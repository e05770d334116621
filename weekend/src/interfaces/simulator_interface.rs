use crate::core::strategy::RaceSubmission;
use crate::core::track::Track;
use crate::errors::WeekendError;
use crate::post::race_result::RaceOutcome;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// RaceSimulator is the remote service that runs a race for a submitted strategy. Only its
/// request/answer contract matters here.
pub trait RaceSimulator {
    fn simulate(&self, track: &Track, submission: &RaceSubmission)
        -> Result<RaceOutcome, WeekendError>;
}

/// request_body returns the JSON payload for a strategy submission.
pub fn request_body(submission: &RaceSubmission) -> Result<String, WeekendError> {
    serde_json::to_string(submission)
        .map_err(|e| WeekendError::Transport(format!("could not encode submission: {}", e)))
}

/// ReplaySimulator answers every submission with a simulator response recorded on disk.
#[derive(Debug, Clone)]
pub struct ReplaySimulator {
    response_path: PathBuf,
}

impl ReplaySimulator {
    pub fn new(response_path: &Path) -> ReplaySimulator {
        ReplaySimulator {
            response_path: response_path.to_path_buf(),
        }
    }
}

impl RaceSimulator for ReplaySimulator {
    fn simulate(
        &self,
        track: &Track,
        submission: &RaceSubmission,
    ) -> Result<RaceOutcome, WeekendError> {
        debug!("Race simulator request: {}", request_body(submission)?);

        let body = std::fs::read_to_string(&self.response_path).map_err(|e| {
            WeekendError::Transport(format!(
                "failed to read simulator response {}: {}",
                self.response_path.display(),
                e
            ))
        })?;
        let outcome = RaceOutcome::from_response_json(&body)?;

        if !outcome.track.is_empty() && outcome.track != track.name {
            warn!(
                "Recorded response belongs to {}, current track is {}",
                outcome.track, track.name
            );
        }
        Ok(outcome)
    }
}
