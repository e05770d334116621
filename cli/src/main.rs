use clap::Parser;
use flume::Sender;
use helpers::general::format_racetime;
use std::thread;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use weekend::core::handle_race::{run_playback, RaceWeekend};
use weekend::core::session::PlaybackSession;
use weekend::core::strategy::{DriverSlot, StrategyBuilder};
use weekend::core::tireset::Compound;
use weekend::errors::WeekendError;
use weekend::interfaces::playback_interface::{forward_commands, PlaybackEvent, SessionUpdate};
use weekend::interfaces::season_interface::FileSeasonStore;
use weekend::interfaces::simulator_interface::ReplaySimulator;
use weekend::interfaces::tire_interface::{LocalTireModel, TireModel};
use weekend::post::race_result::{write_race_log_csv, FrameKind};
use weekend::pre::read_weekend_pars::{read_strategy_file, read_tire_estimates};
use weekend::pre::weekend_opts::WeekendOpts;

/// spawn_command_reader forwards the lines typed into the terminal to the playback session.
fn spawn_command_reader(tx: Sender<PlaybackEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        forward_commands(stdin.lock(), &tx);
    });
}

fn print_frame(session: &PlaybackSession) {
    let frame = match session.current_frame() {
        Some(frame) => frame,
        None => return,
    };

    match frame.kind {
        FrameKind::Lap(lap) => println!("INFO: Lap {}", lap),
        FrameKind::Classification => println!("INFO: Chequered flag"),
    }
    for (i, row) in frame.rows.iter().enumerate() {
        let compound = row.compound.map(Compound::name).unwrap_or("-");
        let wear = row
            .wear
            .map(|w| format!("{:5.1}%", w))
            .unwrap_or_else(|| String::from("     -"));
        println!(
            "{:3}. {:<22} {:<22} {:>10} {:<6} {} {} stop(s)",
            i + 1,
            row.driver,
            row.team,
            frame.gap_label(i),
            compound,
            wear,
            row.stops
        );
    }
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get weekend options from the command line arguments
    let opts: WeekendOpts = WeekendOpts::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if opts.debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // get season state and the upcoming race
    let mut store = FileSeasonStore::open(&opts.season_path, &opts.calendar_path)?;
    let simulator = ReplaySimulator::new(&opts.response_path);
    let mut weekend = match RaceWeekend::from_store(&store, simulator) {
        Ok(weekend) => weekend,
        Err(WeekendError::SeasonComplete) => {
            println!("RESULT: The season is complete, there is no race left to run.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    weekend.set_playback_speed(opts.speed_ms)?;

    let track = weekend.track().clone();
    println!(
        "INFO: Race {} of {}: {} ({}), {} laps",
        weekend.context().race_index + 1,
        store.calendar().len(),
        track.name,
        track.country,
        track.laps
    );

    // print tire estimates for the track
    let estimates = match &opts.tire_estimates_path {
        Some(path) => read_tire_estimates(path)?,
        None => LocalTireModel.estimates(&track)?,
    };
    println!(
        "INFO: Tire wear multiplier {:.2}",
        estimates.multiplier
    );
    for &compound in Compound::ALL.iter() {
        if let Some(est) = estimates.get(compound) {
            println!(
                "INFO: {:<6} ~{} laps, {:+.1}s/lap vs. Hard",
                compound.name(),
                est.laps,
                -est.pace
            );
        }
    }

    // build strategies from the strategy file
    println!("INFO: Reading strategies from {:?}", opts.strategy_path);
    weekend.set_builder(StrategyBuilder::from_submission(read_strategy_file(&opts.strategy_path)?));
    for &driver in DriverSlot::BOTH.iter() {
        let name = &weekend.context().drivers[driver.index()];
        let strategy = weekend.builder().strategy(driver);
        println!(
            "INFO: {} ({}): {} stint(s), {}/{} laps, {} compound(s)",
            driver,
            name,
            strategy.stints().len(),
            strategy.committed_laps(),
            track.laps,
            strategy.compounds_used()
        );
        if let Some(extra) = weekend.builder().overcommitted_laps(driver, &track) {
            warn!("{} plans {} laps beyond the race distance", name, extra);
        }
    }
    if let Err(e) = weekend.builder().validate(&track) {
        println!("RESULT: Strategy cannot be submitted: {}", e);
        return Ok(());
    }

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();
    let mut session = match weekend.submit(&mut store) {
        Ok(session) => session,
        Err(e) => {
            if let Some(notice) = weekend.active_notice(Instant::now()) {
                println!("RESULT: {}", notice);
            }
            return Err(e.into());
        }
    };
    println!("INFO: Race answer received after {}ms", t_start.elapsed().as_millis());

    if opts.skip_replay {
        session.skip_to_end()?;
    } else {
        println!("INFO: Replay controls: p (play/pause), 1x, 4x, max, speed <ms>, end, rewind, quit");
        spawn_command_reader(session.event_sender());
    }

    let last = run_playback(&mut session, |s, update| match update {
        SessionUpdate::Advanced(_) | SessionUpdate::Finished => print_frame(s),
        SessionUpdate::Transport(phase) => {
            println!("INFO: Playback {:?} at {}ms per lap", phase, s.playback().speed_ms());
            if s.playback().state().cursor_index == 0 {
                print_frame(s);
            }
        }
        SessionUpdate::Ignored | SessionUpdate::Closed => {}
    })?;

    // POST-PROCESSING -----------------------------------------------------------------------------
    let outcome = match session.playback().outcome() {
        Some(outcome) => outcome,
        None => return Ok(()),
    };
    if last == SessionUpdate::Closed {
        println!("INFO: Replay left early");
    }

    outcome.print_classification();
    if let Some(row) = outcome.classification.first() {
        println!(
            "RESULT: Winner {} ({}) in {}",
            row.driver,
            row.team,
            format_racetime(row.total_time)
        );
    }

    match outcome.write_classification_to_file(None) {
        Ok(path) => println!("INFO: Classification written to {}", path),
        Err(e) => warn!("Could not write classification: {:#}", e),
    }

    if let Some(path) = &opts.export_csv {
        write_race_log_csv(outcome, path)?;
        println!("INFO: Race log exported to {:?}", path);
    }

    Ok(())
}
