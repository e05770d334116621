use crate::core::tireset::Compound;
use crate::errors::WeekendError;
use helpers::general::{clamp_pct, format_gap, format_racetime};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::Path;
use tracing::warn;

// RAW WIRE FORMAT ---------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawResponse {
    status: Option<String>,
    detail: Option<String>,
    #[serde(default)]
    track: String,
    race_results: Option<Vec<ClassificationRow>>,
    race_log: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInterval {
    Seconds(f64),
    Label(String),
}

#[derive(Debug, Deserialize)]
struct RawStanding {
    driver: String,
    team: String,
    compound: Option<String>,
    wear: Option<f64>,
    #[serde(default)]
    stops: u32,
    lap_time: Option<f64>,
    total_time: Option<f64>,
    interval: Option<RawInterval>,
}

#[derive(Debug, Deserialize)]
struct RawLapSnapshot {
    lap: u32,
    standings: Vec<RawStanding>,
}

// ADAPTED TYPES -----------------------------------------------------------------------------------

/// Gap of a driver to the race leader, resolved once when the simulator answer is adapted.
///
/// * `Leader` - First row of a frame
/// * `Interval` - (s) Gap to the leader as emitted by the simulator
/// * `Absolute` - (s) Only the elapsed race time is known, the gap follows from the leader's time
/// * `Retired` - Driver is out of the race
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gap {
    Leader,
    Interval(f64),
    Absolute(f64),
    Retired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverStanding {
    pub driver: String,
    pub team: String,
    pub compound: Option<Compound>,
    pub wear: Option<f64>,
    pub stops: u32,
    pub lap_time: Option<f64>,
    pub total_time: Option<f64>,
    pub gap: Gap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapSnapshot {
    pub lap: u32,
    pub standings: Vec<DriverStanding>,
}

/// ClassificationRow is one line of the final race classification as sent by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRow {
    pub driver: String,
    pub team: String,
    pub total_time: f64,
    #[serde(default)]
    pub stops: u32,
    #[serde(default)]
    pub dnf: bool,
}

/// RaceOutcome contains everything the simulator returned for one race, adapted for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceOutcome {
    pub track: String,
    pub classification: Vec<ClassificationRow>,
    pub race_log: Vec<LapSnapshot>,
    final_standings: Vec<DriverStanding>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameKind {
    Lap(u32),
    Classification,
}

/// Frame is the view on the standings that is currently displayed during playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    pub kind: FrameKind,
    pub rows: &'a [DriverStanding],
}

impl Frame<'_> {
    /// gap_seconds returns the displayed gap of row idx to the leader. None is returned for the
    /// leader itself, retired drivers and rows that do not exist.
    pub fn gap_seconds(&self, idx: usize) -> Option<f64> {
        match self.rows.get(idx)?.gap {
            Gap::Leader | Gap::Retired => None,
            Gap::Interval(t) => Some(t),
            Gap::Absolute(t) => self.rows.first()?.total_time.map(|t_leader| t - t_leader),
        }
    }

    pub fn gap_label(&self, idx: usize) -> String {
        match self.rows.get(idx).map(|row| row.gap) {
            Some(Gap::Leader) => String::from("LEADER"),
            Some(Gap::Retired) => String::from("DNF"),
            Some(_) => self
                .gap_seconds(idx)
                .map(format_gap)
                .unwrap_or_else(|| String::from("-")),
            None => String::from("-"),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self.kind, FrameKind::Classification)
    }
}

fn resolve_gap(idx: usize, interval: Option<&RawInterval>, total_time: Option<f64>) -> Option<Gap> {
    if idx == 0 {
        return Some(Gap::Leader);
    }
    match interval {
        Some(RawInterval::Seconds(t)) => Some(Gap::Interval(*t)),
        Some(RawInterval::Label(label)) if label.eq_ignore_ascii_case("DNF") => Some(Gap::Retired),
        _ => total_time.map(Gap::Absolute),
    }
}

fn adapt_snapshot(raw: RawLapSnapshot) -> Result<LapSnapshot, String> {
    let lap = raw.lap;
    let mut standings = Vec::with_capacity(raw.standings.len());

    for (i, row) in raw.standings.into_iter().enumerate() {
        let gap = resolve_gap(i, row.interval.as_ref(), row.total_time).ok_or_else(|| {
            format!(
                "lap {}: {} carries neither an interval nor a total time",
                lap, row.driver
            )
        })?;
        if i == 0 && row.total_time.is_none() {
            // a leader without elapsed time cannot anchor absolute gaps, intervals still work
            warn!("lap {}: leader {} carries no total time", lap, row.driver);
        }

        standings.push(DriverStanding {
            compound: row.compound.as_deref().and_then(|c| c.parse().ok()),
            wear: row.wear.map(clamp_pct),
            driver: row.driver,
            team: row.team,
            stops: row.stops,
            lap_time: row.lap_time,
            total_time: row.total_time,
            gap,
        });
    }

    Ok(LapSnapshot { lap, standings })
}

fn adapt_race_log(raw: serde_json::Value) -> Result<Vec<LapSnapshot>, String> {
    let snapshots: Vec<RawLapSnapshot> =
        serde_json::from_value(raw).map_err(|e| e.to_string())?;
    snapshots.into_iter().map(adapt_snapshot).collect()
}

impl RaceOutcome {
    pub fn new(track: &str, classification: Vec<ClassificationRow>, race_log: Vec<LapSnapshot>) -> RaceOutcome {
        let final_standings = classification
            .iter()
            .enumerate()
            .map(|(i, row)| DriverStanding {
                driver: row.driver.to_owned(),
                team: row.team.to_owned(),
                compound: None,
                wear: None,
                stops: row.stops,
                lap_time: None,
                total_time: Some(row.total_time),
                gap: if i == 0 {
                    Gap::Leader
                } else if row.dnf {
                    Gap::Retired
                } else {
                    Gap::Absolute(row.total_time)
                },
            })
            .collect();

        RaceOutcome {
            track: track.to_owned(),
            classification,
            race_log,
            final_standings,
        }
    }

    /// from_response_json adapts the body of a race simulator answer. A missing or malformed race
    /// log leaves a classification-only outcome.
    pub fn from_response_json(body: &str) -> Result<RaceOutcome, WeekendError> {
        let raw: RawResponse = serde_json::from_str(body).map_err(|e| {
            WeekendError::Transport(format!("could not decode race simulator answer: {}", e))
        })?;

        match raw.status.as_deref() {
            None | Some("success") => {}
            Some("season_complete") => return Err(WeekendError::SeasonComplete),
            Some(status) => {
                return Err(WeekendError::RemoteRejection {
                    detail: raw.detail.unwrap_or_else(|| status.to_owned()),
                })
            }
        }

        let classification = match raw.race_results {
            Some(rows) => rows,
            None => {
                return Err(match raw.detail {
                    Some(detail) => WeekendError::RemoteRejection { detail },
                    None => WeekendError::Transport(String::from(
                        "race simulator answer carries no race results",
                    )),
                })
            }
        };

        let race_log = match raw.race_log {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(value) => adapt_race_log(value).unwrap_or_else(|e| {
                warn!("Ignoring malformed race log, showing classification only: {}", e);
                Vec::new()
            }),
        };

        Ok(RaceOutcome::new(&raw.track, classification, race_log))
    }

    pub fn classification_frame(&self) -> Frame<'_> {
        Frame {
            kind: FrameKind::Classification,
            rows: &self.final_standings,
        }
    }

    pub fn lap_frame(&self, idx: usize) -> Option<Frame<'_>> {
        self.race_log.get(idx).map(|snapshot| Frame {
            kind: FrameKind::Lap(snapshot.lap),
            rows: &snapshot.standings,
        })
    }

    /// print_classification prints the final classification to the console output.
    pub fn print_classification(&self) {
        print!("{}", self.classification_table());
    }

    /// write_classification_to_file writes the final classification to a text file in output/.
    /// Returns the path to the written file.
    pub fn write_classification_to_file(&self, path: Option<&Path>) -> anyhow::Result<String> {
        let content = self.classification_table();
        let out_dir = Path::new("output");
        std::fs::create_dir_all(out_dir)?;
        let out_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            out_dir.join("last_race.txt")
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }

    fn classification_table(&self) -> String {
        let frame = self.classification_frame();
        let mut tmp_string = String::new();

        // writing into a String cannot fail
        let _ = writeln!(&mut tmp_string, "RESULT: Race classification {}", self.track);
        for (i, row) in self.classification.iter().enumerate() {
            let time = if i == 0 {
                format_racetime(row.total_time)
            } else {
                frame.gap_label(i)
            };
            let _ = writeln!(
                &mut tmp_string,
                "{:3}. {:<22} {:<22} {:>12} {} stop(s)",
                i + 1,
                row.driver,
                row.team,
                time,
                row.stops
            );
        }
        tmp_string
    }
}

/// write_race_log_csv exports every lap snapshot of the race log with one line per driver.
pub fn write_race_log_csv(outcome: &RaceOutcome, path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&[
        "lap", "position", "driver", "team", "compound", "wear", "stops", "gap",
    ])?;

    for idx in 0..outcome.race_log.len() {
        if let Some(frame) = outcome.lap_frame(idx) {
            let lap = match frame.kind {
                FrameKind::Lap(lap) => lap,
                FrameKind::Classification => continue,
            };
            for (i, row) in frame.rows.iter().enumerate() {
                wtr.write_record(&[
                    lap.to_string(),
                    (i + 1).to_string(),
                    row.driver.to_owned(),
                    row.team.to_owned(),
                    row.compound.map(|c| c.to_string()).unwrap_or_default(),
                    row.wear.map(|w| format!("{:.1}", w)).unwrap_or_default(),
                    row.stops.to_string(),
                    frame.gap_label(i),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RESPONSE: &str = r#"{
        "status": "success",
        "track": "Bahrain International Circuit",
        "race_results": [
            {"driver": "Max Verstappen", "team": "Red Bull", "total_time": 5421.5, "stops": 1, "dnf": false},
            {"driver": "Liam Lawson", "team": "Player Racing", "total_time": 5430.0, "stops": 2, "dnf": false},
            {"driver": "Jack Doohan", "team": "Alpine", "total_time": 5700.0, "stops": 1, "dnf": true}
        ],
        "race_log": [
            {"lap": 1, "standings": [
                {"driver": "Max Verstappen", "team": "Red Bull", "compound": "Soft", "wear": 3.7, "stops": 0, "total_time": 90.0},
                {"driver": "Liam Lawson", "team": "Player Racing", "compound": "Medium", "wear": 2.4, "stops": 0, "total_time": 91.5, "interval": 1.5},
                {"driver": "Jack Doohan", "team": "Alpine", "compound": "Hard", "wear": 1.6, "stops": 0, "total_time": 95.0}
            ]},
            {"lap": 2, "standings": [
                {"driver": "Max Verstappen", "team": "Red Bull", "compound": "Soft", "wear": 7.4, "stops": 0, "total_time": 181.0, "interval": 0.0},
                {"driver": "Liam Lawson", "team": "Player Racing", "compound": "Medium", "wear": 4.8, "stops": 0, "total_time": 183.0, "interval": 2.0},
                {"driver": "Jack Doohan", "team": "Alpine", "compound": "Hard", "wear": 112.0, "stops": 0, "total_time": 190.0, "interval": "DNF"}
            ]}
        ]
    }"#;

    #[test]
    fn gap_falls_back_to_total_time_difference() {
        let outcome = RaceOutcome::from_response_json(RESPONSE).unwrap();
        let frame = outcome.lap_frame(0).unwrap();

        assert_eq!(frame.kind, FrameKind::Lap(1));
        assert_eq!(frame.rows[0].gap, Gap::Leader);
        assert_eq!(frame.rows[1].gap, Gap::Interval(1.5));
        assert_eq!(frame.rows[2].gap, Gap::Absolute(95.0));

        assert!(frame.gap_seconds(0).is_none());
        assert_relative_eq!(frame.gap_seconds(1).unwrap(), 1.5);
        assert_relative_eq!(frame.gap_seconds(2).unwrap(), 5.0);
        assert_eq!(frame.gap_label(0), "LEADER");
        assert_eq!(frame.gap_label(2), "+5.000s");
    }

    #[test]
    fn dnf_interval_and_wear_clamping() {
        let outcome = RaceOutcome::from_response_json(RESPONSE).unwrap();
        let frame = outcome.lap_frame(1).unwrap();

        assert_eq!(frame.rows[2].gap, Gap::Retired);
        assert_eq!(frame.gap_label(2), "DNF");
        assert_eq!(frame.rows[2].wear, Some(100.0));
        assert_eq!(frame.rows[0].compound, Some(Compound::Soft));
    }

    #[test]
    fn classification_frame_uses_final_results() {
        let outcome = RaceOutcome::from_response_json(RESPONSE).unwrap();
        let frame = outcome.classification_frame();

        assert!(frame.is_final());
        assert_eq!(frame.rows.len(), 3);
        assert_eq!(frame.rows[0].total_time, Some(5421.5));
        assert_relative_eq!(frame.gap_seconds(1).unwrap(), 8.5);
        assert_eq!(frame.rows[2].gap, Gap::Retired);
    }

    #[test]
    fn missing_or_malformed_log_yields_classification_only() {
        let missing = r#"{"track": "Monza", "race_results": [
            {"driver": "A", "team": "T", "total_time": 10.0}
        ]}"#;
        let outcome = RaceOutcome::from_response_json(missing).unwrap();
        assert!(outcome.race_log.is_empty());
        assert_eq!(outcome.classification.len(), 1);

        let malformed = r#"{"status": "success", "track": "Monza",
            "race_results": [{"driver": "A", "team": "T", "total_time": 10.0}],
            "race_log": [{"lap": 1, "standings": [
                {"driver": "A", "team": "T", "total_time": 10.0},
                {"driver": "B", "team": "T"}
            ]}]}"#;
        let outcome = RaceOutcome::from_response_json(malformed).unwrap();
        assert!(outcome.race_log.is_empty());

        let wrong_shape = r#"{"track": "Monza", "race_log": "n/a",
            "race_results": [{"driver": "A", "team": "T", "total_time": 10.0}]}"#;
        assert!(RaceOutcome::from_response_json(wrong_shape)
            .unwrap()
            .race_log
            .is_empty());
    }

    #[test]
    fn rejections_and_transport_failures() {
        let rejected = r#"{"status": "error", "detail": "Strategy does not cover race distance"}"#;
        assert_eq!(
            RaceOutcome::from_response_json(rejected),
            Err(WeekendError::RemoteRejection {
                detail: String::from("Strategy does not cover race distance")
            })
        );

        let http_detail = r#"{"detail": "Save not found"}"#;
        assert!(matches!(
            RaceOutcome::from_response_json(http_detail),
            Err(WeekendError::RemoteRejection { .. })
        ));

        assert_eq!(
            RaceOutcome::from_response_json(r#"{"status": "season_complete"}"#),
            Err(WeekendError::SeasonComplete)
        );

        assert!(matches!(
            RaceOutcome::from_response_json("<html>502</html>"),
            Err(WeekendError::Transport(_))
        ));
    }
}
