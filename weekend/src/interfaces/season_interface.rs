use crate::core::track::{Calendar, Track};
use crate::errors::WeekendError;
use crate::pre::read_weekend_pars::{read_calendar, read_season_file};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// * `team_name` - Name of the user's team
/// * `drivers` - Names of the team's two race drivers
/// * `current_race_index` - Index of the next race in the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonFile {
    pub team_name: String,
    pub drivers: [String; 2],
    #[serde(default)]
    pub current_race_index: usize,
}

/// WeekendContext is what a race weekend needs to know about the season.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekendContext {
    pub race_index: usize,
    pub track: Track,
    pub team_name: String,
    pub drivers: [String; 2],
}

/// SeasonStore supplies the season state. It is only refreshed from here, never modified.
pub trait SeasonStore {
    fn weekend_context(&self) -> Result<WeekendContext, WeekendError>;
    fn refresh(&mut self) -> Result<(), WeekendError>;
}

/// weekend_context_for picks the current race of the season from the calendar.
pub fn weekend_context_for(season: &SeasonFile, calendar: &Calendar) -> Result<WeekendContext, WeekendError> {
    let track = calendar
        .get(season.current_race_index)
        .ok_or(WeekendError::SeasonComplete)?;

    Ok(WeekendContext {
        race_index: season.current_race_index,
        track: track.to_owned(),
        team_name: season.team_name.to_owned(),
        drivers: season.drivers.clone(),
    })
}

/// FileSeasonStore reads the season state from a JSON file that is maintained by the game backend.
#[derive(Debug, Clone)]
pub struct FileSeasonStore {
    season_path: PathBuf,
    season: SeasonFile,
    calendar: Calendar,
}

impl FileSeasonStore {
    pub fn open(season_path: &Path, calendar_path: &Path) -> anyhow::Result<FileSeasonStore> {
        Ok(FileSeasonStore {
            season_path: season_path.to_path_buf(),
            season: read_season_file(season_path)?,
            calendar: read_calendar(calendar_path)?,
        })
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }
}

impl SeasonStore for FileSeasonStore {
    fn weekend_context(&self) -> Result<WeekendContext, WeekendError> {
        weekend_context_for(&self.season, &self.calendar)
    }

    fn refresh(&mut self) -> Result<(), WeekendError> {
        self.season = read_season_file(&self.season_path)
            .map_err(|e| WeekendError::Transport(format!("{:#}", e)))?;
        info!(
            "Season state refreshed, next race index is {}",
            self.season.current_race_index
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> Calendar {
        Calendar {
            tracks: vec![
                Track::new("Bahrain International Circuit", 57),
                Track::new("Jeddah Corniche Circuit", 50),
            ],
        }
    }

    #[test]
    fn context_follows_race_index() {
        let mut season = SeasonFile {
            team_name: String::from("Player Racing"),
            drivers: [String::from("Liam Lawson"), String::from("Oliver Bearman")],
            current_race_index: 1,
        };
        let ctx = weekend_context_for(&season, &calendar()).unwrap();
        assert_eq!(ctx.track.laps, 50);
        assert_eq!(ctx.drivers[1], "Oliver Bearman");

        season.current_race_index = 2;
        assert_eq!(
            weekend_context_for(&season, &calendar()),
            Err(WeekendError::SeasonComplete)
        );
    }
}
