use crate::interfaces::playback_interface::PlaybackEvent;
use flume::{RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// TickTimer sends a tick event every period until it is cancelled or dropped. The period is read
/// before every wait, so a changed speed applies from the next tick on while the pending one keeps
/// its period.
#[derive(Debug)]
pub struct TickTimer {
    generation: u64,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub fn start(generation: u64, period_ms: Arc<AtomicU64>, tx: Sender<PlaybackEvent>) -> TickTimer {
        let (stop_tx, stop_rx) = flume::bounded::<()>(1);

        let handle = thread::spawn(move || loop {
            let period = Duration::from_millis(period_ms.load(Ordering::Relaxed).max(1));

            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    // receiver gone -> session was dropped
                    if tx.send(PlaybackEvent::Tick { generation }).is_err() {
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        debug!("Started playback timer {}", generation);

        TickTimer {
            generation,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// cancel stops the timer and waits for its thread to exit.
    pub fn cancel(self) {}
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        // disconnecting the stop channel wakes the timer thread immediately
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        debug!("Cancelled playback timer {}", self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn timer_ticks_with_its_generation() {
        let (tx, rx) = flume::unbounded();
        let timer = TickTimer::start(7, Arc::new(AtomicU64::new(5)), tx);

        let ev = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(ev, PlaybackEvent::Tick { generation: 7 });
        assert_eq!(timer.generation(), 7);
    }

    #[test]
    fn cancel_stops_ticks_without_waiting_for_the_period() {
        let (tx, rx) = flume::unbounded();
        let timer = TickTimer::start(1, Arc::new(AtomicU64::new(60_000)), tx);

        let t_start = Instant::now();
        timer.cancel();
        assert!(t_start.elapsed() < Duration::from_secs(5));

        // the only sender lived in the timer thread
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(50)),
            Err(RecvTimeoutError::Disconnected)
        );
    }
}
