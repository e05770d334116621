use crate::core::playback::DEFAULT_SPEED_MS;
use crate::core::session::PlaybackSession;
use crate::core::strategy::StrategyBuilder;
use crate::core::track::Track;
use crate::errors::WeekendError;
use crate::interfaces::playback_interface::SessionUpdate;
use crate::interfaces::season_interface::{SeasonStore, WeekendContext};
use crate::interfaces::simulator_interface::RaceSimulator;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Time a rejection message of the race simulator stays visible.
pub const NOTICE_DISPLAY_WINDOW: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub raised_at: Instant,
}

/// RaceWeekend holds the pre-race state of one race weekend and hands over to a playback session
/// once the race simulator answered.
#[derive(Debug)]
pub struct RaceWeekend<S: RaceSimulator> {
    context: WeekendContext,
    builder: StrategyBuilder,
    simulator: S,
    speed_ms: u64,
    notice: Option<Notice>,
}

impl<S: RaceSimulator> RaceWeekend<S> {
    pub fn new(context: WeekendContext, simulator: S) -> RaceWeekend<S> {
        RaceWeekend {
            context,
            builder: StrategyBuilder::new(),
            simulator,
            speed_ms: DEFAULT_SPEED_MS,
            notice: None,
        }
    }

    pub fn from_store(store: &dyn SeasonStore, simulator: S) -> Result<RaceWeekend<S>, WeekendError> {
        Ok(RaceWeekend::new(store.weekend_context()?, simulator))
    }

    pub fn context(&self) -> &WeekendContext {
        &self.context
    }

    pub fn track(&self) -> &Track {
        &self.context.track
    }

    pub fn builder(&self) -> &StrategyBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut StrategyBuilder {
        &mut self.builder
    }

    pub fn set_builder(&mut self, builder: StrategyBuilder) {
        self.builder = builder;
    }

    /// set_playback_speed sets the tick period the replay starts with.
    pub fn set_playback_speed(&mut self, speed_ms: u64) -> Result<(), WeekendError> {
        if speed_ms == 0 {
            return Err(WeekendError::Validation(String::from(
                "playback speed must be a positive number of milliseconds",
            )));
        }
        self.speed_ms = speed_ms;
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.builder.is_submittable(&self.context.track)
    }

    /// active_notice returns the current message for the user, expired messages are cleared.
    pub fn active_notice(&mut self, now: Instant) -> Option<&str> {
        let expired = match &self.notice {
            Some(notice) => now.saturating_duration_since(notice.raised_at) >= NOTICE_DISPLAY_WINDOW,
            None => false,
        };
        if expired {
            self.notice = None;
        }
        self.notice.as_ref().map(|n| n.message.as_str())
    }

    /// submit sends the strategies to the race simulator and returns a playback session that
    /// already replays the race. The strategies are kept if the simulator could not run the race,
    /// so the same submission can simply be retried.
    pub fn submit(&mut self, store: &mut dyn SeasonStore) -> Result<PlaybackSession, WeekendError> {
        let submission = self.builder.to_submission(&self.context.track)?;
        info!(
            "Submitting strategy for {} ({} laps)",
            self.context.track.name, self.context.track.laps
        );

        match self.simulator.simulate(&self.context.track, &submission) {
            Ok(outcome) => {
                self.notice = None;
                self.builder = StrategyBuilder::new();

                if let Err(e) = store.refresh() {
                    warn!("Could not refresh season state after the race: {}", e);
                }

                let mut session = PlaybackSession::new();
                session.set_speed(self.speed_ms)?;
                session.load(outcome)?;
                Ok(session)
            }
            Err(WeekendError::RemoteRejection { detail }) => {
                warn!("Race simulator rejected the strategy: {}", detail);
                self.notice = Some(Notice {
                    message: detail.to_owned(),
                    raised_at: Instant::now(),
                });
                Err(WeekendError::RemoteRejection { detail })
            }
            Err(e) => {
                error!("Race submission failed: {}", e);
                Err(e)
            }
        }
    }
}

/// run_playback processes the session's events until the race is finished or the user quits.
/// on_update is called for the initial frame and after every event that changed something.
pub fn run_playback<F>(session: &mut PlaybackSession, mut on_update: F) -> Result<SessionUpdate, WeekendError>
where
    F: FnMut(&PlaybackSession, SessionUpdate),
{
    let initial = if session.playback().state().is_finished {
        SessionUpdate::Finished
    } else {
        SessionUpdate::Transport(session.playback().phase())
    };
    on_update(session, initial);
    if initial == SessionUpdate::Finished {
        return Ok(initial);
    }

    let events = session.events();
    while let Ok(event) = events.recv() {
        let update = session.handle_event(event)?;
        if update == SessionUpdate::Ignored {
            continue;
        }
        on_update(session, update);
        if matches!(update, SessionUpdate::Finished | SessionUpdate::Closed) {
            return Ok(update);
        }
    }

    Ok(SessionUpdate::Closed)
}
