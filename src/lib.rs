//! Wrapfield - an asteroid shooter in a screen-wrapping arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, power-ups, spawning)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Leaderboard handed the final scores of a match
//! - `autopilot`: Demo-mode pilot that produces ship intents

pub mod autopilot;
pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use error::{HighScoreError, SimError, TuningError};
pub use highscores::HighScores;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation rate; all timers and velocities are expressed per tick
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Length of one tick in seconds (for real-time frame pacing)
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Time step handed to entity updates (velocities are units per tick)
    pub const TICK_DT: f32 = 1.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Flat reward for any saucer kill
    pub const SAUCER_SCORE: u64 = 1000;

    /// Particles per burst, indexed by asteroid tier (1..=3)
    pub const BURST_SMALL: usize = 10;
    pub const BURST_MEDIUM: usize = 20;
    pub const BURST_LARGE: usize = 30;
    /// Particles scattered over the arena by a heavy projectile detonation
    pub const DETONATION_PARTICLES: usize = 100;

    /// Debris tints (0xRRGGBB)
    pub const WHITE: u32 = 0xFF_FF_FF;
    pub const RED: u32 = 0xFF_00_00;
    pub const YELLOW: u32 = 0xFF_FF_00;
    pub const GREY: u32 = 0xC0_C0_C0;
    pub const PURPLE: u32 = 0x80_00_80;
    pub const CYAN: u32 = 0x00_FF_FF;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit vector for a heading in degrees (0 = +x, 90 = +y, screen space)
#[inline]
pub fn heading_vector(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Heading in degrees [0, 360) pointing along `dir`
#[inline]
pub fn vector_heading(dir: Vec2) -> f32 {
    normalize_degrees(dir.y.atan2(dir.x).to_degrees())
}
