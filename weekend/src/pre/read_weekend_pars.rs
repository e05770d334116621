use crate::core::strategy::RaceSubmission;
use crate::core::track::Calendar;
use crate::interfaces::season_interface::SeasonFile;
use crate::interfaces::tire_interface::TireEstimates;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::path::Path;

/// read_json_file reads the JSON file and decodes it into the requested parameter struct.
fn read_json_file<T: DeserializeOwned>(filepath: &Path, what: &str) -> anyhow::Result<T> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open {} file {}!",
            what,
            filepath.display()
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse {} file {}!",
        what,
        filepath.display()
    ))?;
    Ok(pars)
}

/// read_calendar reads the season calendar, i.e. the ordered list of tracks.
pub fn read_calendar(filepath: &Path) -> anyhow::Result<Calendar> {
    let calendar: Calendar = read_json_file(filepath, "calendar")?;
    if calendar.is_empty() {
        anyhow::bail!("Calendar file {} contains no tracks!", filepath.display());
    }
    Ok(calendar)
}

/// read_strategy_file reads a saved two-driver strategy in the simulator's request format.
pub fn read_strategy_file(filepath: &Path) -> anyhow::Result<RaceSubmission> {
    read_json_file(filepath, "strategy")
}

pub fn read_season_file(filepath: &Path) -> anyhow::Result<SeasonFile> {
    read_json_file(filepath, "season")
}

/// read_tire_estimates reads a tire model answer stored on disk.
pub fn read_tire_estimates(filepath: &Path) -> anyhow::Result<TireEstimates> {
    let body = std::fs::read_to_string(filepath).context(format!(
        "Failed to open tire estimate file {}!",
        filepath.display()
    ))?;
    let estimates = TireEstimates::from_json(&body).context(format!(
        "Failed to parse tire estimate file {}!",
        filepath.display()
    ))?;
    Ok(estimates)
}
