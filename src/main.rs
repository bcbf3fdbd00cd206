//! Wrapfield headless runner
//!
//! Plays a match with the autopilot at a simulated display rate, logs what
//! happens and records the result on the leaderboard.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use wrapfield::consts::TICK_DT;
use wrapfield::highscores::{MatchMode, format_age};
use wrapfield::sim::{FrameClock, GameEvent, GamePhase, GameState, ShipHud, tick};
use wrapfield::{HighScores, Tuning, autopilot};

#[derive(Parser, Debug)]
#[command(name = "wrapfield")]
#[command(about = "Run a headless Wrapfield match driven by the autopilot")]
struct Args {
    /// Match seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Number of ships (1 = solo, 2 = co-op)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    ships: u8,
    /// Stop after this many ticks even if the match is still running
    #[arg(long, default_value_t = 36_000)]
    max_ticks: u64,
    /// Simulated display refresh rate fed to the frame clock
    #[arg(long, default_value_t = 60.0)]
    refresh_hz: f32,
    /// Tuning file (JSON); defaults are used when omitted
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Leaderboard file (JSON)
    #[arg(long, default_value = "highscores.json")]
    scores: PathBuf,
    /// Name recorded on the leaderboard
    #[arg(long, default_value = "AUTO")]
    name: String,
}

#[derive(Serialize)]
struct Summary {
    seed: u64,
    ticks: u64,
    level: u32,
    phase: GamePhase,
    ships: Vec<ShipHud>,
    asteroids: usize,
    saucers: usize,
    tokens: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !(args.refresh_hz > 0.0) {
        bail!("--refresh-hz must be positive, got {}", args.refresh_hz);
    }

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)
            .with_context(|| format!("loading tuning from {}", path.display()))?,
        None => Tuning::default(),
    };

    let ship_count = usize::from(args.ships);
    let mut state = GameState::with_tuning(args.seed, ship_count, tuning)
        .context("tuning rejected")?;
    let mut clock = FrameClock::default();
    let frame_secs = 1.0 / args.refresh_hz;

    'frames: while state.time_ticks < args.max_ticks {
        for _ in 0..clock.advance(frame_secs) {
            let input = autopilot::intents(&state);
            tick(&mut state, &input, TICK_DT);

            for event in &state.events {
                log_event(event);
            }
            #[cfg(debug_assertions)]
            if let Err(err) = state.validate() {
                log::error!("{err}");
            }

            if state.phase == GamePhase::AwaitingNameEntry {
                record_score(&args, &state)?;
                break 'frames;
            }
            if state.time_ticks >= args.max_ticks {
                break 'frames;
            }
        }
    }

    let summary = Summary {
        seed: args.seed,
        ticks: state.time_ticks,
        level: state.level,
        phase: state.phase,
        ships: state.hud(),
        asteroids: state.asteroids.len(),
        saucers: state.saucers.len(),
        tokens: state.tokens.len(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::LevelAdvanced { level } => log::info!("Level {level}"),
        GameEvent::MatchEnded { final_scores } => log::info!("Match ended: {final_scores:?}"),
        other => log::debug!("{other:?}"),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Record the best ship's score and print the table
fn record_score(args: &Args, state: &GameState) -> Result<()> {
    let mode = MatchMode::from_ship_count(state.ships.len());
    let best = state
        .final_scores()
        .into_iter()
        .map(|s| s.score)
        .max()
        .unwrap_or(0);

    let mut scores = HighScores::load(&args.scores)
        .with_context(|| format!("loading high scores from {}", args.scores.display()))?;
    let now = unix_now();

    match scores.add_score(&args.name, best, state.level, now, mode) {
        Some(rank) => {
            println!("New high score #{rank}: {best}");
            scores
                .save(&args.scores)
                .with_context(|| format!("saving high scores to {}", args.scores.display()))?;
        }
        None => println!("Score {best} did not make the {mode:?} table"),
    }

    for (i, entry) in scores.top(mode, 10).iter().enumerate() {
        println!(
            "{:>2}. {:<10} {:>8}  level {:<3} {}",
            i + 1,
            entry.name,
            entry.score,
            entry.level,
            format_age(entry.timestamp, now)
        );
    }
    Ok(())
}
