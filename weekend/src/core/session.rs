use crate::core::playback::{Phase, Playback, TickOutcome};
use crate::core::timer::TickTimer;
use crate::errors::WeekendError;
use crate::interfaces::playback_interface::{PlaybackCommand, PlaybackEvent, SessionUpdate};
use crate::post::race_result::{Frame, RaceOutcome};
use flume::{Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// PlaybackSession drives a `Playback` in real time. It owns at most one tick timer, which runs
/// exactly while the playback is playing, and delivers its ticks through the session's event
/// channel together with the user's commands.
#[derive(Debug)]
pub struct PlaybackSession {
    playback: Playback,
    timer: Option<TickTimer>,
    period_ms: Arc<AtomicU64>,
    generation: u64,
    closed: bool,
    tx: Sender<PlaybackEvent>,
    rx: Receiver<PlaybackEvent>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        PlaybackSession::new()
    }
}

impl PlaybackSession {
    pub fn new() -> PlaybackSession {
        let playback = Playback::new();
        let (tx, rx) = flume::unbounded();

        PlaybackSession {
            period_ms: Arc::new(AtomicU64::new(playback.speed_ms())),
            playback,
            timer: None,
            generation: 0,
            closed: false,
            tx,
            rx,
        }
    }

    /// events returns the receiving end of the session's event channel.
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.rx.clone()
    }

    /// event_sender returns a sender for user commands (e.g. from a terminal reader thread).
    pub fn event_sender(&self) -> Sender<PlaybackEvent> {
        self.tx.clone()
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn current_frame(&self) -> Option<Frame<'_>> {
        self.playback.current_frame()
    }

    /// timer_period returns the tick period if a timer is currently running.
    pub fn timer_period(&self) -> Option<Duration> {
        self.timer
            .as_ref()
            .map(|_| Duration::from_millis(self.period_ms.load(Ordering::Relaxed)))
    }

    /// timers_started returns how many timers this session started so far.
    pub fn timers_started(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> Result<(), WeekendError> {
        if self.closed {
            return Err(WeekendError::Precondition(String::from(
                "playback session was already closed",
            )));
        }
        Ok(())
    }

    fn start_timer(&mut self) {
        // never run two timers for one session
        self.cancel_timer();
        self.generation += 1;
        self.timer = Some(TickTimer::start(
            self.generation,
            Arc::clone(&self.period_ms),
            self.tx.clone(),
        ));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// sync_timer makes the timer state follow the playback state.
    fn sync_timer(&mut self) {
        match (self.playback.is_playing(), self.timer.is_some()) {
            (true, false) => self.start_timer(),
            (false, true) => self.cancel_timer(),
            _ => {}
        }
    }

    pub fn load(&mut self, outcome: RaceOutcome) -> Result<Phase, WeekendError> {
        self.check_open()?;

        self.cancel_timer();
        let phase = self.playback.load(outcome)?;
        self.sync_timer();
        Ok(phase)
    }

    pub fn toggle_play(&mut self) -> Result<Phase, WeekendError> {
        self.check_open()?;

        let phase = self.playback.toggle_play()?;
        self.sync_timer();
        Ok(phase)
    }

    /// set_speed changes the tick period. A running timer picks it up after its pending tick, a
    /// paused session does not start a timer.
    pub fn set_speed(&mut self, speed_ms: u64) -> Result<(), WeekendError> {
        self.check_open()?;

        self.playback.set_speed(speed_ms)?;
        self.period_ms.store(speed_ms, Ordering::Relaxed);
        Ok(())
    }

    pub fn skip_to_end(&mut self) -> Result<bool, WeekendError> {
        self.check_open()?;

        let finished = self.playback.skip_to_end()?;
        self.sync_timer();
        Ok(finished)
    }

    pub fn rewind(&mut self) -> Result<(), WeekendError> {
        self.check_open()?;

        self.playback.rewind()?;
        self.sync_timer();
        Ok(())
    }

    /// handle_tick applies a tick of the timer with the given generation. Ticks of cancelled
    /// timers are dropped.
    pub fn handle_tick(&mut self, generation: u64) -> Result<TickOutcome, WeekendError> {
        let current = self.timer.as_ref().map(|t| t.generation());
        if self.closed || current != Some(generation) {
            return Ok(TickOutcome::Ignored);
        }

        match self.playback.tick() {
            Ok(outcome) => {
                self.sync_timer();
                Ok(outcome)
            }
            Err(e) => {
                error!("Playback tick failed, stopping timer: {}", e);
                self.cancel_timer();
                Err(e)
            }
        }
    }

    /// handle_event processes one event received from `events()`.
    pub fn handle_event(&mut self, event: PlaybackEvent) -> Result<SessionUpdate, WeekendError> {
        if self.closed {
            return Ok(SessionUpdate::Closed);
        }

        let update = match event {
            PlaybackEvent::Tick { generation } => match self.handle_tick(generation)? {
                TickOutcome::Advanced(idx) => SessionUpdate::Advanced(idx),
                TickOutcome::Finished => SessionUpdate::Finished,
                TickOutcome::Ignored => SessionUpdate::Ignored,
            },
            PlaybackEvent::Command(PlaybackCommand::TogglePlay) => {
                SessionUpdate::Transport(self.toggle_play()?)
            }
            PlaybackEvent::Command(PlaybackCommand::SetSpeed(speed_ms)) => {
                self.set_speed(speed_ms)?;
                SessionUpdate::Transport(self.playback.phase())
            }
            PlaybackEvent::Command(PlaybackCommand::SkipToEnd) => {
                if self.skip_to_end()? {
                    SessionUpdate::Finished
                } else {
                    SessionUpdate::Ignored
                }
            }
            PlaybackEvent::Command(PlaybackCommand::Rewind) => {
                self.rewind()?;
                SessionUpdate::Transport(self.playback.phase())
            }
            PlaybackEvent::Command(PlaybackCommand::Quit) => {
                self.close();
                SessionUpdate::Closed
            }
        };
        Ok(update)
    }

    /// close cancels a running timer. It is called when the user leaves the replay and again on
    /// drop.
    pub fn close(&mut self) {
        if !self.closed {
            info!(
                "Closing playback session at frame {}",
                self.playback.state().cursor_index
            );
        }
        self.cancel_timer();
        self.closed = true;
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playback::{SPEED_FAST_MS, SPEED_NORMAL_MS};
    use crate::post::race_result::{ClassificationRow, DriverStanding, Gap, LapSnapshot};

    fn outcome(no_laps: u32) -> RaceOutcome {
        let race_log = (1..=no_laps)
            .map(|lap| LapSnapshot {
                lap,
                standings: vec![DriverStanding {
                    driver: String::from("Antonelli"),
                    team: String::from("Player Racing"),
                    compound: None,
                    wear: None,
                    stops: 0,
                    lap_time: Some(81.0),
                    total_time: Some(81.0 * lap as f64),
                    gap: Gap::Leader,
                }],
            })
            .collect();
        let classification = vec![ClassificationRow {
            driver: String::from("Antonelli"),
            team: String::from("Player Racing"),
            total_time: 81.0 * no_laps as f64,
            stops: 1,
            dnf: false,
        }];
        RaceOutcome::new("Autodromo Nazionale Monza", classification, race_log)
    }

    #[test]
    fn empty_log_never_starts_a_timer() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.load(outcome(0)).unwrap(), Phase::Finished);
        assert!(session.playback().state().is_finished);
        assert_eq!(session.timers_started(), 0);
        assert!(session.timer_period().is_none());
    }

    #[test]
    fn speed_change_while_paused_applies_on_resume() {
        let mut session = PlaybackSession::new();
        session.set_speed(SPEED_NORMAL_MS).unwrap();
        session.load(outcome(10)).unwrap();
        assert_eq!(
            session.timer_period(),
            Some(Duration::from_millis(SPEED_NORMAL_MS))
        );
        assert_eq!(session.timers_started(), 1);

        assert_eq!(session.toggle_play().unwrap(), Phase::Paused);
        assert!(session.timer_period().is_none());

        session.set_speed(SPEED_FAST_MS).unwrap();
        assert!(session.timer_period().is_none());
        assert_eq!(session.timers_started(), 1);

        assert_eq!(session.toggle_play().unwrap(), Phase::Playing);
        assert_eq!(
            session.timer_period(),
            Some(Duration::from_millis(SPEED_FAST_MS))
        );
        assert_eq!(session.timers_started(), 2);
    }

    #[test]
    fn ticks_of_cancelled_timers_are_dropped() {
        let mut session = PlaybackSession::new();
        session.set_speed(60_000).unwrap();
        session.load(outcome(5)).unwrap();
        let stale = session.timers_started();

        // pause and resume -> new timer generation
        session.toggle_play().unwrap();
        session.toggle_play().unwrap();
        assert_eq!(session.timers_started(), stale + 1);

        assert_eq!(
            session.handle_event(PlaybackEvent::Tick { generation: stale }).unwrap(),
            SessionUpdate::Ignored
        );
        assert_eq!(session.playback().state().cursor_index, 0);

        let current = session.timers_started();
        assert_eq!(
            session.handle_event(PlaybackEvent::Tick { generation: current }).unwrap(),
            SessionUpdate::Advanced(1)
        );
    }

    #[test]
    fn timer_drives_playback_to_the_end() {
        let mut session = PlaybackSession::new();
        session.set_speed(1).unwrap();
        session.load(outcome(3)).unwrap();
        let events = session.events();

        let mut finished = 0;
        while finished == 0 {
            let ev = events.recv_timeout(Duration::from_secs(5)).unwrap();
            if session.handle_event(ev).unwrap() == SessionUpdate::Finished {
                finished += 1;
            }
        }

        assert!(session.current_frame().unwrap().is_final());
        assert!(session.timer_period().is_none());
        assert_eq!(session.playback().state().cursor_index, 2);
    }

    #[test]
    fn commands_and_close() {
        let mut session = PlaybackSession::new();
        session.set_speed(60_000).unwrap();
        session.load(outcome(4)).unwrap();

        let tx = session.event_sender();
        tx.send(PlaybackEvent::Command(PlaybackCommand::SkipToEnd))
            .unwrap();
        let ev = session.events().recv().unwrap();
        assert_eq!(session.handle_event(ev).unwrap(), SessionUpdate::Finished);
        assert!(session.timer_period().is_none());

        assert_eq!(
            session
                .handle_event(PlaybackEvent::Command(PlaybackCommand::Rewind))
                .unwrap(),
            SessionUpdate::Transport(Phase::Finished)
        );
        assert_eq!(session.timers_started(), 1);
        assert_eq!(
            session
                .handle_event(PlaybackEvent::Command(PlaybackCommand::Quit))
                .unwrap(),
            SessionUpdate::Closed
        );
        assert!(session.is_closed());
        assert!(session.toggle_play().is_err());
        assert_eq!(
            session
                .handle_event(PlaybackEvent::Command(PlaybackCommand::TogglePlay))
                .unwrap(),
            SessionUpdate::Closed
        );
    }

    #[test]
    fn close_while_playing_stops_the_timer() {
        let mut session = PlaybackSession::new();
        session.set_speed(5).unwrap();
        session.load(outcome(1000)).unwrap();
        let events = session.events();

        // at least one tick proves the timer was running
        events.recv_timeout(Duration::from_secs(5)).unwrap();
        session.close();
        assert!(session.timer_period().is_none());

        // drain ticks sent before the timer was joined
        let _ = events.try_iter().count();
        std::thread::sleep(Duration::from_millis(50));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn drop_while_playing_releases_the_timer() {
        let mut session = PlaybackSession::new();
        session.set_speed(5).unwrap();
        session.load(outcome(1000)).unwrap();
        let events = session.events();
        events.recv_timeout(Duration::from_secs(5)).unwrap();

        drop(session);

        // every sender is gone once the timer thread was joined
        loop {
            match events.recv_timeout(Duration::from_secs(5)) {
                Ok(PlaybackEvent::Tick { .. }) => continue,
                Ok(ev) => panic!("unexpected event {:?}", ev),
                Err(e) => {
                    assert_eq!(e, flume::RecvTimeoutError::Disconnected);
                    break;
                }
            }
        }
    }
}
