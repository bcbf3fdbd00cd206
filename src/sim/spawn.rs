//! Spawn director
//!
//! Timers and placement rules for saucers, power-up tokens and per-level
//! asteroid waves. Anything placed near the ships goes through
//! [`safe_position`], which keeps it clear of every living ship.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entities::{Asteroid, AsteroidTier, PowerUpToken, Saucer, Ship, random_edge_position, uniform};
use super::geometry::distance;
use super::state::{GameEvent, GameState};
use crate::tuning::Tuning;

/// Spawn timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnDirector {
    pub last_saucer_spawn: u64,
    /// Re-rolled after every saucer spawn
    pub saucer_delay: u64,
    pub last_powerup_spawn: u64,
}

impl SpawnDirector {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> Self {
        Self {
            last_saucer_spawn: 0,
            saucer_delay: roll_saucer_delay(rng, tuning),
            last_powerup_spawn: 0,
        }
    }
}

fn roll_saucer_delay<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> u64 {
    rng.random_range(tuning.saucer_spawn_min_ticks..=tuning.saucer_spawn_max_ticks)
}

/// End-of-tick spawn pass: level transition, then saucer, then power-up
pub fn run(state: &mut GameState) {
    // Entities killed this tick are still listed until the prune
    if state.asteroids.iter().all(|a| a.dead) {
        advance_level(state);
    }
    spawn_saucer_if_due(state);
    spawn_powerup_if_due(state);
}

/// Next level: bring downed partners back (co-op only) and spawn a new wave
pub fn advance_level(state: &mut GameState) {
    state.level += 1;
    let now = state.time_ticks;

    if state.ships.len() > 1 {
        for ship in state.ships.iter_mut().filter(|s| !s.is_alive()) {
            ship.lives = 1;
            ship.respawn(now, &state.tuning);
            log::info!("Ship {} rejoins for level {}", ship.id, state.level);
        }
    }

    let count = state.tuning.level_base_asteroids + state.level;
    populate_asteroids(state, count);
    state.events.push(GameEvent::LevelAdvanced { level: state.level });
    log::info!("Level {} with {} asteroids", state.level, count);
}

/// Place `count` large asteroids on the arena edges, away from living ships
pub fn populate_asteroids(state: &mut GameState, count: u32) {
    let bounds = state.tuning.bounds();
    for _ in 0..count {
        let pos = safe_position(&mut state.rng, &state.ships, &state.tuning, |rng| {
            random_edge_position(rng, bounds)
        });
        let id = state.ids.next_id();
        let asteroid = Asteroid::spawn(id, Some(pos), AsteroidTier::Large, &mut state.rng, &state.tuning);
        state.asteroids.push(asteroid);
    }
}

fn spawn_saucer_if_due(state: &mut GameState) {
    let director = &mut state.director;
    let elapsed = state.time_ticks.saturating_sub(director.last_saucer_spawn);
    if state.saucers.iter().any(|s| !s.dead) || elapsed <= director.saucer_delay {
        return;
    }

    director.last_saucer_spawn = state.time_ticks;
    director.saucer_delay = roll_saucer_delay(&mut state.rng, &state.tuning);

    let id = state.ids.next_id();
    let saucer = Saucer::spawn(id, &mut state.rng, &state.tuning);
    log::info!("Saucer {} enters at {}", saucer.id, saucer.pos);
    state.saucers.push(saucer);
}

fn spawn_powerup_if_due(state: &mut GameState) {
    let tuning = &state.tuning;
    let elapsed = state.time_ticks.saturating_sub(state.director.last_powerup_spawn);
    let alive = state.tokens.iter().filter(|t| !t.dead).count();
    if alive >= tuning.max_powerups || elapsed <= tuning.powerup_spawn_ticks {
        return;
    }

    let inset = tuning.powerup_spawn_inset;
    let (w, h) = (tuning.arena_width, tuning.arena_height);
    let pos = safe_position(&mut state.rng, &state.ships, tuning, |rng| {
        Vec2::new(uniform(rng, inset, w - inset), uniform(rng, inset, h - inset))
    });

    let id = state.ids.next_id();
    let token = PowerUpToken::spawn(id, pos, &mut state.rng, tuning);
    log::debug!("Power-up {:?} spawned at {}", token.kind, token.pos);
    state.tokens.push(token);
    state.director.last_powerup_spawn = state.time_ticks;
}

/// True when `pos` is farther than `min_distance` from every living ship
pub fn is_clear_of_ships(pos: Vec2, ships: &[Ship], min_distance: f32) -> bool {
    ships
        .iter()
        .filter(|s| s.is_alive())
        .all(|s| distance(pos, s.pos) > min_distance)
}

/// Rejection-sample a position clear of every living ship.
///
/// Gives up after `safe_spawn_attempts` tries and falls back to one more
/// unconstrained sample.
pub fn safe_position(
    rng: &mut Pcg32,
    ships: &[Ship],
    tuning: &Tuning,
    mut sample: impl FnMut(&mut Pcg32) -> Vec2,
) -> Vec2 {
    for _ in 0..tuning.safe_spawn_attempts {
        let candidate = sample(rng);
        if is_clear_of_ships(candidate, ships, tuning.safe_spawn_distance) {
            return candidate;
        }
    }
    let fallback = sample(rng);
    log::warn!(
        "No position clear of ships after {} attempts, using {fallback}",
        tuning.safe_spawn_attempts
    );
    fallback
}
