use crate::core::playback::{Phase, SPEED_FAST_MS, SPEED_MAX_MS, SPEED_NORMAL_MS};
use flume::Sender;
use std::io::BufRead;
use tracing::{debug, info};

/// PlaybackCommand is a transport control request from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    TogglePlay,
    SetSpeed(u64),
    SkipToEnd,
    Rewind,
    Quit,
}

impl PlaybackCommand {
    /// parse maps a line typed into the terminal to a command, e.g. "p" or "speed 250".
    pub fn parse(input: &str) -> Option<PlaybackCommand> {
        let mut parts = input.split_whitespace();
        let cmd = parts.next()?.to_lowercase();

        match cmd.as_str() {
            "p" | "play" | "pause" => Some(PlaybackCommand::TogglePlay),
            "1" | "1x" => Some(PlaybackCommand::SetSpeed(SPEED_NORMAL_MS)),
            "4" | "4x" => Some(PlaybackCommand::SetSpeed(SPEED_FAST_MS)),
            "m" | "max" => Some(PlaybackCommand::SetSpeed(SPEED_MAX_MS)),
            "speed" => parts
                .next()
                .and_then(|ms| ms.parse::<u64>().ok())
                .filter(|&ms| ms > 0)
                .map(PlaybackCommand::SetSpeed),
            "e" | "end" | "skip" => Some(PlaybackCommand::SkipToEnd),
            "r" | "rewind" => Some(PlaybackCommand::Rewind),
            "q" | "quit" | "exit" => Some(PlaybackCommand::Quit),
            _ => None,
        }
    }
}

/// PlaybackEvent is everything a playback session reacts to. Ticks carry the generation of the
/// timer that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Tick { generation: u64 },
    Command(PlaybackCommand),
}

/// SessionUpdate tells the consumer of a session what changed after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    /// cursor moved to the contained index
    Advanced(usize),
    /// final classification is now displayed
    Finished,
    /// transport state changed (play/pause/speed/rewind)
    Transport(Phase),
    /// event did not change anything (e.g. tick of a cancelled timer)
    Ignored,
    /// session was closed, no further events are processed
    Closed,
}

/// forward_commands sends every recognised line of the reader to the session as a command. Once the
/// reader is exhausted or fails, a final `Quit` closes the session so a paused replay cannot wait
/// forever.
pub fn forward_commands<R: BufRead>(reader: R, tx: &Sender<PlaybackEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!("Stopped reading playback commands: {}", e);
                break;
            }
        };
        match PlaybackCommand::parse(&line) {
            Some(cmd) => {
                if tx.send(PlaybackEvent::Command(cmd)).is_err() {
                    return;
                }
            }
            None if line.trim().is_empty() => {}
            None => info!(
                "Unknown command {:?} (p, 1x, 4x, max, speed <ms>, end, rewind, quit)",
                line
            ),
        }
    }

    // session may already be gone
    let _ = tx.send(PlaybackEvent::Command(PlaybackCommand::Quit));
}
