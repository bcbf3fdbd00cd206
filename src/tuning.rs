//! Data-driven game balance
//!
//! Every gameplay constant lives here so a match can be re-balanced without
//! recompiling. Defaults reproduce the classic 60 Hz feel; all durations are
//! in ticks and all speeds in arena units per tick. Missing keys in a tuning
//! file fall back to the defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, TICKS_PER_SECOND};
use crate::error::TuningError;

/// Gameplay balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Measure overlaps across the wrap seam. Covers body-to-body tests and
    /// the swept shot test against small asteroids; beams always check the
    /// seam for small asteroids.
    pub wrap_aware_collisions: bool,

    // === Ship ===
    pub starting_lives: u32,
    pub ship_radius: f32,
    pub ship_thrust: f32,
    /// Velocity multiplier applied once per tick
    pub ship_friction: f32,
    pub ship_max_speed: f32,
    pub ship_turn_degrees: f32,
    pub respawn_invulnerable_ticks: u32,

    // === Weapons ===
    pub shield_ticks: u32,
    pub fire_cooldown_ticks: u32,
    pub rapid_fire_cooldown_ticks: u32,
    pub rapid_fire_ammo: u32,
    pub bullet_speed: f32,
    pub rapid_bullet_speed: f32,
    pub bomb_speed: f32,
    /// Fraction of the ship's velocity added to its shots
    pub shot_velocity_inherit: f32,
    pub projectile_radius: f32,
    pub projectile_lifetime: u32,
    /// A heavy projectile may detonate on contact once its lifetime drops below this
    pub bomb_arm_lifetime: u32,
    /// A heavy projectile detonates unconditionally below this lifetime
    pub bomb_fuse_lifetime: u32,
    pub beam_ticks: u32,
    pub beam_length: f32,
    pub beam_width: f32,
    /// Distance from an edge within which small asteroids get wrapped beam checks
    pub beam_phantom_margin: f32,

    // === Asteroids ===
    pub asteroid_min_speed: f32,
    pub asteroid_max_speed: f32,
    pub fragment_jitter: f32,
    pub level_base_asteroids: u32,

    // === Saucer ===
    pub saucer_radius: f32,
    pub saucer_min_speed: f32,
    pub saucer_max_speed: f32,
    /// Per-tick chance of re-rolling vertical velocity
    pub saucer_jitter_chance: f64,
    pub saucer_shot_speed: f32,
    /// Maximum aim error in radians (either side)
    pub saucer_aim_error: f32,
    pub saucer_shot_delay_min: u32,
    pub saucer_shot_delay_max: u32,
    pub saucer_spawn_min_ticks: u64,
    pub saucer_spawn_max_ticks: u64,
    pub saucer_entry_offset: f32,
    pub saucer_cull_margin: f32,
    /// Saucer shots can cost a ship a life (off in the classic rules, where
    /// they only hit asteroids)
    pub saucer_shots_hit_ships: bool,

    // === Power-ups ===
    pub powerup_radius: f32,
    pub powerup_lifetime: u32,
    pub powerup_spawn_ticks: u64,
    pub max_powerups: usize,
    /// Tokens spawn at least this far inside the arena edges
    pub powerup_spawn_inset: f32,

    // === Spawning ===
    pub safe_spawn_distance: f32,
    pub safe_spawn_attempts: u32,

    // === Cosmetic ===
    pub max_debris: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        let secs = |s: u32| s * TICKS_PER_SECOND;
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            wrap_aware_collisions: false,

            starting_lives: 3,
            ship_radius: 15.0,
            ship_thrust: 0.2,
            ship_friction: 0.98,
            ship_max_speed: 8.0,
            ship_turn_degrees: 5.0,
            respawn_invulnerable_ticks: secs(2),

            shield_ticks: secs(10),
            fire_cooldown_ticks: 15, // 250 ms
            rapid_fire_cooldown_ticks: 6, // 100 ms
            rapid_fire_ammo: 200,
            bullet_speed: 10.0,
            rapid_bullet_speed: 12.0,
            bomb_speed: 5.0,
            shot_velocity_inherit: 0.5,
            projectile_radius: 2.0,
            projectile_lifetime: 60,
            bomb_arm_lifetime: 56,
            bomb_fuse_lifetime: 4,
            beam_ticks: secs(3),
            beam_length: 2000.0,
            beam_width: 5.0,
            beam_phantom_margin: 20.0,

            asteroid_min_speed: 0.5,
            asteroid_max_speed: 2.0,
            fragment_jitter: 10.0,
            level_base_asteroids: 4,

            saucer_radius: 15.0,
            saucer_min_speed: 2.0,
            saucer_max_speed: 4.0,
            saucer_jitter_chance: 0.02,
            saucer_shot_speed: 5.0,
            saucer_aim_error: 0.5,
            saucer_shot_delay_min: 60,
            saucer_shot_delay_max: 120,
            saucer_spawn_min_ticks: u64::from(secs(10)),
            saucer_spawn_max_ticks: u64::from(secs(20)),
            saucer_entry_offset: 20.0,
            saucer_cull_margin: 50.0,
            saucer_shots_hit_ships: false,

            powerup_radius: 10.0,
            powerup_lifetime: 500,
            powerup_spawn_ticks: u64::from(secs(10)),
            max_powerups: 2,
            powerup_spawn_inset: 50.0,

            safe_spawn_distance: 100.0,
            safe_spawn_attempts: 100,

            max_debris: 512,
        }
    }
}

impl Tuning {
    /// Arena size as a vector
    pub fn bounds(&self) -> glam::Vec2 {
        glam::Vec2::new(self.arena_width, self.arena_height)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |field, reason| Err(TuningError::Invalid { field, reason });

        if !(self.arena_width > 0.0) {
            return invalid("arena_width", "must be positive");
        }
        if !(self.arena_height > 0.0) {
            return invalid("arena_height", "must be positive");
        }
        if self.starting_lives == 0 {
            return invalid("starting_lives", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.ship_friction) {
            return invalid("ship_friction", "must be within 0.0..=1.0");
        }
        if self.projectile_lifetime == 0 {
            return invalid("projectile_lifetime", "must be at least 1 tick");
        }
        if self.bomb_fuse_lifetime > self.bomb_arm_lifetime {
            return invalid("bomb_fuse_lifetime", "must not exceed bomb_arm_lifetime");
        }
        if self.asteroid_min_speed > self.asteroid_max_speed {
            return invalid("asteroid_min_speed", "must not exceed asteroid_max_speed");
        }
        if self.saucer_min_speed > self.saucer_max_speed {
            return invalid("saucer_min_speed", "must not exceed saucer_max_speed");
        }
        if self.saucer_shot_delay_min > self.saucer_shot_delay_max {
            return invalid("saucer_shot_delay_min", "must not exceed saucer_shot_delay_max");
        }
        if self.saucer_spawn_min_ticks > self.saucer_spawn_max_ticks {
            return invalid("saucer_spawn_min_ticks", "must not exceed saucer_spawn_max_ticks");
        }
        if !(0.0..=1.0).contains(&self.saucer_jitter_chance) {
            return invalid("saucer_jitter_chance", "must be a probability");
        }
        if self.rapid_fire_ammo == 0 {
            return invalid("rapid_fire_ammo", "must be at least 1");
        }
        Ok(())
    }

    /// Load and validate a tuning file (JSON)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = fs::read_to_string(path.as_ref())?;
        let tuning: Tuning = serde_json::from_str(&json)?;
        tuning.validate()?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Save tuning as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TuningError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Tuning saved to {}", path.as_ref().display());
        Ok(())
    }
}
