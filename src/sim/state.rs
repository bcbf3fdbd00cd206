//! Game state and query surface
//!
//! All state that must be persisted for determinism lives here, including
//! the RNG. Live collections are kept in insertion order.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entities::{
    Asteroid, AsteroidTier, Beam, DebrisParticle, EntityId, EntityIds, PowerUpToken, Projectile,
    Saucer, Ship,
};
use super::geometry::in_wrap_band;
use super::spawn::SpawnDirector;
use super::weapons::{PowerUpKind, WeaponSlot};
use crate::consts::{CYAN, TICKS_PER_SECOND, YELLOW};
use crate::error::{SimError, TuningError};
use crate::tuning::Tuning;

/// Per-ship tints in spawn order
const SHIP_TINTS: [u32; 2] = [YELLOW, CYAN];

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Every ship is out of lives; waiting for the player's name
    AwaitingNameEntry,
}

/// Final score of one ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipScore {
    pub ship: EntityId,
    pub score: u64,
}

/// Discrete things that happened during the last tick (for audio, scoring
/// and persistence collaborators)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A ship lost a life
    ShipHit { ship: EntityId, lives_left: u32 },
    /// A ship lost its last life
    ShipDestroyedFinalLife { ship: EntityId },
    AsteroidDestroyed { tier: AsteroidTier },
    SaucerDestroyed,
    PowerUpCollected { ship: EntityId, kind: PowerUpKind },
    /// A heavy projectile cleared the arena
    NukeDetonated { ship: EntityId },
    LevelAdvanced { level: u32 },
    MatchEnded { final_scores: Vec<ShipScore> },
}

/// Per-ship HUD readout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipHud {
    pub id: EntityId,
    pub lives: u32,
    pub score: u64,
    pub weapon: WeaponSlot,
    pub shield_active: bool,
    pub shield_remaining_ticks: u64,
    pub shield_remaining_secs: f32,
}

/// Read-only copy of every live entity, for renderers
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub level: u32,
    pub phase: GamePhase,
    pub arena: Vec2,
    pub ships: Vec<Ship>,
    pub asteroids: Vec<Asteroid>,
    pub projectiles: Vec<Projectile>,
    pub beams: Vec<BeamSegment>,
    pub saucers: Vec<Saucer>,
    pub tokens: Vec<PowerUpToken>,
    pub debris: Vec<DebrisParticle>,
}

/// A beam as a drawable segment
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BeamSegment {
    pub owner: EntityId,
    pub start: Vec2,
    pub end: Vec2,
    pub width: f32,
    pub tint: u32,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    /// The only randomness source of the match
    pub rng: Pcg32,
    pub ids: EntityIds,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Current level (1-based)
    pub level: u32,
    pub phase: GamePhase,
    pub ships: Vec<Ship>,
    pub asteroids: Vec<Asteroid>,
    pub projectiles: Vec<Projectile>,
    pub beams: Vec<Beam>,
    pub saucers: Vec<Saucer>,
    pub tokens: Vec<PowerUpToken>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub debris: Vec<DebrisParticle>,
    pub director: SpawnDirector,
    /// Events from the most recent tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New match with default tuning
    pub fn new(seed: u64, ship_count: usize) -> Self {
        Self::build(seed, ship_count, Tuning::default())
    }

    /// New match with custom tuning. Values the simulation cannot run with
    /// (inverted ranges, probabilities above 1) are rejected up front.
    pub fn with_tuning(seed: u64, ship_count: usize, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::build(seed, ship_count, tuning))
    }

    /// Ships at their spawn points, level 1 asteroids placed
    fn build(seed: u64, ship_count: usize, tuning: Tuning) -> Self {
        let ship_count = ship_count.max(1);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut ids = EntityIds::default();
        let director = SpawnDirector::new(&mut rng, &tuning);

        let ships = (0..ship_count)
            .map(|i| {
                let tint = SHIP_TINTS[i % SHIP_TINTS.len()];
                Ship::new(ids.next_id(), spawn_point(i, ship_count, &tuning), tint, &tuning)
            })
            .collect();

        let mut state = Self {
            seed,
            tuning,
            rng,
            ids,
            time_ticks: 0,
            level: 1,
            phase: GamePhase::Playing,
            ships,
            asteroids: Vec::new(),
            projectiles: Vec::new(),
            beams: Vec::new(),
            saucers: Vec::new(),
            tokens: Vec::new(),
            debris: Vec::new(),
            director,
            events: Vec::new(),
        };

        let count = state.tuning.level_base_asteroids;
        super::spawn::populate_asteroids(&mut state, count);
        log::info!(
            "Match started: seed {seed}, {ship_count} ship(s), {} asteroids",
            state.asteroids.len()
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Ships that still have lives
    pub fn living_ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.iter().filter(|s| s.is_alive())
    }

    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::AwaitingNameEntry
    }

    pub fn final_scores(&self) -> Vec<ShipScore> {
        self.ships
            .iter()
            .map(|s| ShipScore {
                ship: s.id,
                score: s.score,
            })
            .collect()
    }

    /// HUD readout for every ship, in spawn order
    pub fn hud(&self) -> Vec<ShipHud> {
        let now = self.time_ticks;
        self.ships
            .iter()
            .map(|ship| {
                let remaining = ship.powerup.shield_remaining(now);
                ShipHud {
                    id: ship.id,
                    lives: ship.lives,
                    score: ship.score,
                    weapon: ship.powerup.slot,
                    shield_active: ship.powerup.shield_active(now),
                    shield_remaining_ticks: remaining,
                    shield_remaining_secs: remaining as f32 / TICKS_PER_SECOND as f32,
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.time_ticks,
            level: self.level,
            phase: self.phase,
            arena: self.tuning.bounds(),
            ships: self.ships.clone(),
            asteroids: self.asteroids.clone(),
            projectiles: self.projectiles.clone(),
            beams: self
                .beams
                .iter()
                .map(|b| BeamSegment {
                    owner: b.owner,
                    start: b.origin,
                    end: b.end(),
                    width: b.width,
                    tint: b.tint,
                })
                .collect(),
            saucers: self.saucers.clone(),
            tokens: self.tokens.clone(),
            debris: self.debris.clone(),
        }
    }

    /// Remove everything marked dead or expired this tick
    pub fn prune(&mut self) {
        self.asteroids.retain(|a| !a.dead);
        self.projectiles.retain(|p| !p.dead);
        self.saucers.retain(|s| !s.dead);
        self.tokens.retain(|t| !t.dead && !t.is_expired());

        let ships = &self.ships;
        self.beams.retain(|b| {
            !b.dead && ships.iter().any(|s| s.id == b.owner && s.is_alive())
        });

        self.debris.retain(|d| d.life > 0);
        let max = self.tuning.max_debris;
        if self.debris.len() > max {
            let excess = self.debris.len() - max;
            self.debris.drain(..excess);
        }
    }

    /// Check the engine's structural invariants
    pub fn validate(&self) -> Result<(), SimError> {
        let bounds = self.tuning.bounds();
        let fail = |msg: String| Err(SimError::InvariantViolation(msg));

        for ship in &self.ships {
            if !in_wrap_band(ship.pos, bounds, 0.0) {
                return fail(format!("ship {} outside arena at {}", ship.id, ship.pos));
            }
            if !(0.0..360.0).contains(&ship.heading) {
                return fail(format!("ship {} heading {} not normalized", ship.id, ship.heading));
            }
            ship.powerup.check()?;
            let beams = self.beams.iter().filter(|b| b.owner == ship.id).count();
            if beams > 1 {
                return fail(format!("ship {} owns {beams} beams", ship.id));
            }
        }
        for a in &self.asteroids {
            if !in_wrap_band(a.pos, bounds, a.radius) {
                return fail(format!("asteroid {} outside wrap band at {}", a.id, a.pos));
            }
        }
        for p in &self.projectiles {
            if !in_wrap_band(p.pos, bounds, 0.0) {
                return fail(format!("projectile {} outside arena at {}", p.id, p.pos));
            }
        }
        for t in &self.tokens {
            if !in_wrap_band(t.pos, bounds, t.radius) {
                return fail(format!("token {} outside wrap band at {}", t.id, t.pos));
            }
        }
        if self.saucers.len() > 1 {
            return fail(format!("{} saucers alive", self.saucers.len()));
        }
        let all_down = self.ships.iter().all(|s| !s.is_alive());
        if all_down != self.is_over() {
            return fail(format!(
                "phase {:?} inconsistent with ships out of lives = {all_down}",
                self.phase
            ));
        }
        Ok(())
    }
}

/// Spawn point of ship `index` out of `count`, spread evenly across the middle row
pub fn spawn_point(index: usize, count: usize, tuning: &Tuning) -> Vec2 {
    let slots = (count + 1) as f32;
    Vec2::new(
        tuning.arena_width * (index + 1) as f32 / slots,
        tuning.arena_height / 2.0,
    )
}
