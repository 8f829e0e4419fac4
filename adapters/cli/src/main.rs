#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a racetrack race in the terminal.

mod config;
mod input;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use racetrack_core::CarId;
use racetrack_rendering::{ConsoleRenderer, RaceRenderer};
use racetrack_system_race::{Entrant, RaceRunner, RaceSummary};
use racetrack_system_steering::{PolicyKind, SteeringPolicy};
use racetrack_world::{query, Track};
use tracing::{info, warn};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{config::RaceConfig, input::InteractivePolicy};

const DEFAULT_TRACK: &str = "track1.txt";

#[derive(Parser)]
#[command(about = "Turn-based racetrack simulation")]
struct Args {
    /// Track file to race on; falls back to the built-in track when unreadable
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// JSON file describing the cars and their limits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Let the maneuver policy drive the interactive car
    #[arg(long, default_value_t = false)]
    autopilot: bool,

    /// Give up after this many rounds without a winner
    #[arg(long)]
    max_rounds: Option<u32>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "warn")]
    log_level: LevelFilter,
}

/// Entry point for the racetrack command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(args.log_level);

    let config = match &args.config {
        Some(path) => RaceConfig::load(path)?,
        None => RaceConfig::default(),
    };
    info!(cars = config.cars.len(), "configuration ready");

    let track_path = args
        .track
        .clone()
        .or_else(|| config.track.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACK));
    let (track, rejection) = Track::load_or_default(&track_path);
    if let Some(err) = rejection {
        warn!(path = %track_path.display(), %err, "using the default track");
        println!("Could not load track file. Using default track.");
    }

    let entrants = enter_cars(&config, args.autopilot)?;
    let mut runner =
        RaceRunner::setup(track, entrants).context("could not place the cars on the track")?;

    let mut renderer = ConsoleRenderer::new(io::stdout());
    {
        let race = runner.race();
        renderer.announce(query::welcome_banner(race))?;
        renderer.present_frame(query::track(race), &query::car_view(race))?;
    }

    let max_rounds = args.max_rounds.or(config.max_rounds);
    let summary = runner.run(max_rounds, |race, events| {
        renderer.present_events(events)?;
        renderer.present_frame(query::track(race), &query::car_view(race))
    })?;

    let race = runner.race();
    match summary {
        RaceSummary::Won { winner, rounds } => {
            info!(car = %winner, rounds, "race decided");
            let path = query::winner_path(race).unwrap_or_default();
            renderer.present_winner(query::track(race), &query::car_view(race), winner, path)?;
        }
        RaceSummary::Unfinished { rounds } => {
            let mut out = io::stdout();
            writeln!(out, "No car reached the finish after {rounds} rounds.")
                .context("failed to write summary")?;
        }
    }

    Ok(())
}

fn enter_cars(config: &RaceConfig, autopilot: bool) -> Result<Vec<Entrant>> {
    let mut keyboard = Some(io::stdin().lock());
    let mut entrants = Vec::with_capacity(config.cars.len());

    for car in &config.cars {
        let kind = match car.policy {
            PolicyKind::Interactive if autopilot => PolicyKind::Maneuver,
            kind => kind,
        };

        let policy: Box<dyn SteeringPolicy> = match kind.automated() {
            Some(policy) => policy,
            None => {
                let input = keyboard
                    .take()
                    .context("only one car can be driven interactively")?;
                Box::new(InteractivePolicy::new(input, io::stdout()))
            }
        };

        info!(car = %car.id, ?kind, "car entered");
        entrants.push(Entrant::new(
            CarId::new(car.id),
            policy,
            config.limits_for(car),
        ));
    }

    Ok(entrants)
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}
