//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod entities;
pub mod geometry;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod weapons;

pub use clock::FrameClock;
pub use entities::{
    Asteroid, AsteroidTier, Beam, DebrisParticle, EntityId, Owner, PowerUpToken, Projectile,
    Saucer, Ship,
};
pub use state::{GameEvent, GamePhase, GameState, ShipHud, ShipScore, WorldSnapshot};
pub use tick::{ShipIntent, TickInput, tick};
pub use weapons::{FireResult, PowerUpKind, PowerUpState, WeaponSlot};
