use crate::core::playback::DEFAULT_SPEED_MS;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "RW-CLI",
    about = "Race weekend strategy builder and telemetry replay"
)]
pub struct WeekendOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Skip the lap-by-lap replay and show the final classification right away
    #[clap(long)]
    pub skip_replay: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the calendar file
    #[clap(short, long, default_value = "input/calendar.json")]
    pub calendar_path: PathBuf,

    /// Set path to the season state file (team, drivers, current race)
    #[clap(short, long, default_value = "input/season.json")]
    pub season_path: PathBuf,

    /// Set path to the strategy file containing d1_strategy and d2_strategy
    #[clap(short = 'p', long, default_value = "input/strategy.json")]
    pub strategy_path: PathBuf,

    /// Set path to the recorded race simulator response used to answer the submission
    #[clap(short, long)]
    pub response_path: PathBuf,

    /// Set path to a tire model answer (OPTIONAL: if not set, estimates are derived locally)
    #[clap(short, long)]
    pub tire_estimates_path: Option<PathBuf>,

    /// Set playback tick period in ms (2000 = 1x, 500 = 4x, 50 = max)
    #[clap(long, default_value_t = DEFAULT_SPEED_MS)]
    pub speed_ms: u64,

    /// Export the replayed race log to a CSV file
    #[clap(short, long)]
    pub export_csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let opts = WeekendOpts::try_parse_from(&["rw", "-r", "input/response.json"]).unwrap();
        assert_eq!(opts.speed_ms, DEFAULT_SPEED_MS);
        assert_eq!(opts.strategy_path, PathBuf::from("input/strategy.json"));
        assert!(opts.export_csv.is_none());

        let opts = WeekendOpts::try_parse_from(&[
            "rw", "-r", "resp.json", "--speed-ms", "50", "-d", "--skip-replay",
        ])
        .unwrap();
        assert_eq!(opts.speed_ms, 50);
        assert!(opts.debug);
        assert!(opts.skip_replay);

        assert!(WeekendOpts::try_parse_from(&["rw"]).is_err());
    }
}
