#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Rune Hall halls.
//!
//! Loads a world document and optional tuning, plays the active hall at a
//! fixed frame rate and logs every simulation event through `tracing`.

mod autopilot;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use rune_hall_core::HallName;
use rune_hall_session::{Session, SessionStatus, SessionTuning};
use rune_hall_world::{query, CollisionMap};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::autopilot::Autopilot;

const DEFAULT_COLUMNS: u32 = 24;
const DEFAULT_ROWS: u32 = 16;

/// Runs a Rune Hall hall without a window.
#[derive(Debug, Parser)]
#[command(name = "rune-hall")]
#[command(about = "Headless Rune Hall simulation runner", long_about = None)]
#[command(version)]
struct Cli {
    /// World JSON document listing the build objects of every hall.
    #[arg(short, long)]
    world: Option<PathBuf>,

    /// TOML tuning overriding the default spawn rates, cooldowns and budgets.
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Hall layout drawn with `#` walls and `.` floor, one row per line.
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Overrides the seed from the tuning document.
    #[arg(long)]
    seed: Option<u64>,

    /// In-game seconds to simulate per hall.
    #[arg(short, long, default_value_t = 60)]
    seconds: u64,

    /// Frames rendered per real second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// Search the hall by clicking one build object per second.
    #[arg(long)]
    autopilot: bool,

    /// Move on to the next hall after completing one.
    #[arg(long)]
    all_halls: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut tuning = match &cli.tuning {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read tuning at {}", path.display()))?;
            SessionTuning::from_toml_str(&contents)
                .with_context(|| format!("invalid tuning in {}", path.display()))?
        }
        None => SessionTuning::default(),
    };
    if let Some(seed) = cli.seed {
        tuning.seed = seed;
    }

    let map = load_map(cli.layout.as_ref(), tuning.tile_length)?;
    let document = cli
        .world
        .as_ref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read world document at {}", path.display()))
        })
        .transpose()?;

    let mut session = Session::new(map.clone(), tuning);
    let mut events = Vec::new();
    match session.load_world(document.as_deref(), &mut events) {
        Ok(report) => info!(
            objects = report.objects,
            skipped = report.skipped_halls.len(),
            budget = session.clock().initial_secs,
            "world loaded"
        ),
        Err(error) => warn!(
            %error,
            budget = session.clock().initial_secs,
            "malformed world document, playing an empty hall"
        ),
    }
    log_events(&events);

    let frame = Duration::from_nanos(1_000_000_000 / u64::from(cli.fps));
    let mut autopilot = Autopilot::new();
    loop {
        let hall = query::hall(session.world());
        let status = play_hall(&mut session, &mut autopilot, &cli, frame);
        println!("{}", summary(&session, hall, status));

        let next = match (status, hall.next()) {
            (SessionStatus::Completed, Some(next)) if cli.all_halls => next,
            _ => break,
        };
        let mut events = Vec::new();
        session.enter_hall(next, map.clone(), &mut events);
        log_events(&events);
        autopilot.restart();
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_map(layout: Option<&PathBuf>, tile_length: f32) -> Result<CollisionMap> {
    let Some(path) = layout else {
        return Ok(CollisionMap::walled(
            DEFAULT_COLUMNS,
            DEFAULT_ROWS,
            tile_length,
        ));
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout at {}", path.display()))?;
    let rows: Vec<&str> = contents.lines().collect();
    CollisionMap::from_rows(&rows, tile_length)
        .with_context(|| format!("invalid layout in {}", path.display()))
}

// Runs frames until the hall ends or the requested seconds have ticked.
fn play_hall(
    session: &mut Session,
    autopilot: &mut Autopilot,
    cli: &Cli,
    frame: Duration,
) -> SessionStatus {
    let frames_per_second = u64::from(cli.fps);
    let max_frames = cli.seconds.saturating_add(1).saturating_mul(frames_per_second);
    for _ in 0..max_frames {
        if session.status() != SessionStatus::Playing
            || session.clock().now.secs() >= cli.seconds
        {
            break;
        }
        let input = if cli.autopilot {
            autopilot.input(session)
        } else {
            Default::default()
        };
        let events = session.frame(frame, &input);
        autopilot.observe(&events);
        log_events(&events);
    }
    session.status()
}

fn log_events(events: &[rune_hall_core::Event]) {
    for event in events {
        debug!(?event, "simulation event");
    }
}

fn summary(session: &Session, hall: HallName, status: SessionStatus) -> String {
    let outcome = match status {
        SessionStatus::Playing => "still playing".to_owned(),
        SessionStatus::Completed => "completed".to_owned(),
        SessionStatus::Failed(reason) => format!("failed ({reason:?})"),
    };
    let clock = session.clock();
    let player = query::player(session.world());
    format!(
        "{hall} {outcome} at {}s with {} lives and {}s left, {} monsters roaming",
        clock.now.secs(),
        player.lives(),
        clock.remaining_secs,
        session.monsters().len()
    )
}
