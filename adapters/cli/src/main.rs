#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Tower Defence session.

mod placement;

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tower_defence_catalog::Catalog;
use tower_defence_core::{Event, Outcome, SpeedMultiplier};
use tower_defence_simulation::{Input, SessionConfig, Simulation};
use tower_defence_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use placement::TowerPlacement;

const FRAME: Duration = Duration::from_millis(16);

/// Runs waves of a level without rendering and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "tower-defence", author, version, about, long_about = None)]
struct CliArgs {
    /// TOML catalog to load instead of the built-in one.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Level identifier to play.
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Towers placed before the first wave, as KIND@COLUMN,ROW.
    #[arg(long, value_name = "KIND@COLUMN,ROW", num_args = 1..)]
    towers: Vec<TowerPlacement>,

    /// Speed multiplier (1, 2 or 4).
    #[arg(long, default_value_t = 1, value_parser = parse_speed)]
    speed: u32,

    /// Number of waves to run; defaults to every wave of the level.
    #[arg(long)]
    waves: Option<u32>,

    /// Upper bound on simulated ticks across all waves.
    #[arg(long, default_value_t = 200_000)]
    max_ticks: u64,

    /// Seed of the cosmetic particle RNG.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Increases log verbosity; repeat for more detail. `RUST_LOG` overrides it.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_speed(value: &str) -> Result<u32, String> {
    let factor: u32 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    SpeedMultiplier::from_factor(factor)
        .map(SpeedMultiplier::factor)
        .ok_or_else(|| format!("speed must be 1, 2 or 4, not {factor}"))
}

/// Entry point for the Tower Defence command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    let report = run(&args)?;
    println!("{report}");
    Ok(())
}

fn init_logging(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("failed to load catalog from {}", path.display())),
        None => Catalog::builtin().context("built-in catalog is invalid"),
    }
}

fn run(args: &CliArgs) -> Result<Report> {
    let catalog = Arc::new(load_catalog(args.catalog.as_ref())?);
    let level_name = catalog
        .level(args.level)
        .map(|level| level.name.clone())
        .unwrap_or_default();
    let mut simulation = Simulation::new(catalog, args.level, SessionConfig::new(args.seed, FRAME))
        .with_context(|| format!("cannot start level {}", args.level))?;

    let mut events = Vec::new();
    while query::speed(simulation.world()).factor() != args.speed {
        simulation.submit(Input::CycleSpeed, &mut events)?;
    }

    for placement in &args.towers {
        events.clear();
        simulation.submit(
            Input::PlaceTower {
                kind: placement.kind.clone(),
                cell: placement.cell,
            },
            &mut events,
        )?;
        if let Some(Event::TowerPlacementRejected { reason, .. }) = events.last() {
            bail!(
                "cannot place {} at ({}, {}): {reason:?}",
                placement.kind,
                placement.cell.column(),
                placement.cell.row()
            );
        }
    }

    let max_waves = query::session(simulation.world()).max_waves;
    let waves = args.waves.unwrap_or(max_waves).min(max_waves);
    let mut report = Report::new(args.level, level_name);

    for _ in 0..waves {
        events.clear();
        simulation.submit(Input::StartNextWave, &mut events)?;
        if let Some(Event::WaveRejected { reason }) = events.last() {
            bail!("wave could not start: {reason:?}");
        }

        let wave = query::session(simulation.world()).wave;
        let cleared = drive_wave(&mut simulation, &mut report, args.max_ticks);
        if !cleared {
            break;
        }
        info!("wave {wave} cleared after {} ticks", report.ticks);
        report.waves_cleared += 1;
        if report.outcome.is_some() {
            break;
        }
    }

    let session = query::session(simulation.world());
    report.coins = session.coins;
    report.lives = session.lives;
    Ok(report)
}

/// Ticks until the running wave completes, the level ends or the tick budget
/// runs out. Returns whether the wave completed.
fn drive_wave(simulation: &mut Simulation, report: &mut Report, max_ticks: u64) -> bool {
    let mut events = Vec::new();
    while report.ticks < max_ticks {
        events.clear();
        simulation.tick(&mut events);
        report.ticks += 1;

        let mut completed = false;
        for event in &events {
            match event {
                Event::EnemyDefeated { reward, .. } => {
                    report.kills += 1;
                    report.rewards += reward;
                }
                Event::EnemyReachedBase { .. } => report.leaks += 1,
                Event::ProjectileFired { .. } => report.shots += 1,
                Event::WaveCompleted { .. } => completed = true,
                Event::LevelFinished { outcome } => report.outcome = Some(*outcome),
                _ => {}
            }
        }
        if completed {
            return true;
        }
        if report.outcome.is_some() {
            return false;
        }
    }
    false
}

/// Summary printed after the run.
#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    level: u32,
    level_name: String,
    waves_cleared: u32,
    ticks: u64,
    kills: u32,
    leaks: u32,
    shots: u32,
    rewards: u32,
    coins: u32,
    lives: u32,
    outcome: Option<Outcome>,
}

impl Report {
    fn new(level: u32, level_name: String) -> Self {
        Self {
            level,
            level_name,
            ..Self::default()
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "level {} ({})", self.level, self.level_name)?;
        writeln!(f, "  waves cleared: {}", self.waves_cleared)?;
        writeln!(f, "  ticks:         {}", self.ticks)?;
        writeln!(f, "  kills:         {} (+{} coins)", self.kills, self.rewards)?;
        writeln!(f, "  leaks:         {}", self.leaks)?;
        writeln!(f, "  shots fired:   {}", self.shots)?;
        writeln!(f, "  coins:         {}", self.coins)?;
        writeln!(f, "  lives:         {}", self.lives)?;
        match self.outcome {
            Some(Outcome::Victory { stars }) => write!(f, "  outcome:       victory ({stars} stars)"),
            Some(Outcome::Defeat) => write!(f, "  outcome:       defeat"),
            None => write!(f, "  outcome:       undecided"),
        }
    }
}
