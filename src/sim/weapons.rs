//! Power-up state machine and ship firing
//!
//! A ship carries at most one weapon power-up at a time (the `WeaponSlot`),
//! plus an independent shield timer. Picking up a weapon replaces whatever
//! was equipped; picking up a shield only refreshes the shield timer.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{Beam, EntityId, EntityIds, Owner, Projectile, Ship};
use crate::consts::{CYAN, PURPLE, RED, YELLOW};
use crate::error::SimError;
use crate::tuning::Tuning;

/// Kinds of collectible power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    Beam,
    AreaBomb,
    RapidFire,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Shield,
        PowerUpKind::Beam,
        PowerUpKind::AreaBomb,
        PowerUpKind::RapidFire,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Token colour (0xRRGGBB)
    pub fn tint(self) -> u32 {
        match self {
            PowerUpKind::Shield => PURPLE,
            PowerUpKind::Beam => YELLOW,
            PowerUpKind::AreaBomb => RED,
            PowerUpKind::RapidFire => CYAN,
        }
    }
}

/// The single exclusive weapon slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponSlot {
    #[default]
    Unequipped,
    BeamReady,
    BombReady,
    /// Ammo is always at least 1 while in this state
    RapidFire { ammo: u32 },
}

/// Per-ship power-up state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerUpState {
    pub slot: WeaponSlot,
    /// Tick at which the shield drops
    pub shield_until: Option<u64>,
}

impl PowerUpState {
    /// Apply a pickup. Shield never touches the weapon slot.
    pub fn collect(&mut self, kind: PowerUpKind, now: u64, tuning: &Tuning) {
        match kind {
            PowerUpKind::Shield => {
                self.shield_until = Some(now + u64::from(tuning.shield_ticks));
            }
            PowerUpKind::Beam => self.slot = WeaponSlot::BeamReady,
            PowerUpKind::AreaBomb => self.slot = WeaponSlot::BombReady,
            PowerUpKind::RapidFire => {
                self.slot = WeaponSlot::RapidFire {
                    ammo: tuning.rapid_fire_ammo,
                }
            }
        }
    }

    #[inline]
    pub fn shield_active(&self, now: u64) -> bool {
        self.shield_until.is_some_and(|until| now < until)
    }

    /// Ticks of shield left (0 when down)
    pub fn shield_remaining(&self, now: u64) -> u64 {
        self.shield_until.map_or(0, |until| until.saturating_sub(now))
    }

    /// Drop the shield once its time is up
    pub fn expire(&mut self, now: u64) {
        if self.shield_until.is_some_and(|until| now >= until) {
            self.shield_until = None;
        }
    }

    pub fn check(&self) -> Result<(), SimError> {
        if self.slot == (WeaponSlot::RapidFire { ammo: 0 }) {
            return Err(SimError::InvariantViolation(
                "rapid fire equipped with zero ammo".into(),
            ));
        }
        Ok(())
    }
}

/// What a fire attempt produced
#[derive(Debug, Clone)]
pub enum FireResult {
    NoFire,
    SpawnedProjectile(Projectile),
    SpawnedBeam(Beam),
}

impl Ship {
    /// Resolve this tick's fire intent against cooldowns and the weapon slot.
    ///
    /// Standard shots, the beam and the bomb need a fresh press and respect the
    /// standard cooldown. Rapid fire keeps firing while held on its own,
    /// faster cooldown. Nothing fires while the ship's own beam is live.
    pub fn fire(
        &mut self,
        fire_held: bool,
        beam_live: bool,
        ids: &mut EntityIds,
        tuning: &Tuning,
    ) -> Result<FireResult, SimError> {
        let pressed = fire_held && !self.fire_latch;
        self.fire_latch = fire_held;

        if !self.is_alive() || beam_live || !fire_held {
            return Ok(FireResult::NoFire);
        }

        let slot = self.powerup.slot;
        match slot {
            WeaponSlot::RapidFire { ammo: 0 } => Err(SimError::InvariantViolation(format!(
                "ship {} tried to fire rapid fire with zero ammo",
                self.id
            ))),
            WeaponSlot::RapidFire { ammo } => {
                if self.rapid_cooldown > 0 {
                    return Ok(FireResult::NoFire);
                }
                let left = ammo - 1;
                self.powerup.slot = if left == 0 {
                    WeaponSlot::Unequipped
                } else {
                    WeaponSlot::RapidFire { ammo: left }
                };
                self.rapid_cooldown = tuning.rapid_fire_cooldown_ticks;
                Ok(FireResult::SpawnedProjectile(self.shot(
                    ids.next_id(),
                    tuning.rapid_bullet_speed,
                    false,
                    tuning,
                )))
            }
            _ if !pressed || self.fire_cooldown > 0 => Ok(FireResult::NoFire),
            WeaponSlot::BeamReady => {
                self.powerup.slot = WeaponSlot::Unequipped;
                self.fire_cooldown = tuning.fire_cooldown_ticks;
                Ok(FireResult::SpawnedBeam(Beam::new(ids.next_id(), self, tuning)))
            }
            WeaponSlot::BombReady => {
                self.powerup.slot = WeaponSlot::Unequipped;
                self.fire_cooldown = tuning.fire_cooldown_ticks;
                Ok(FireResult::SpawnedProjectile(self.shot(
                    ids.next_id(),
                    tuning.bomb_speed,
                    true,
                    tuning,
                )))
            }
            WeaponSlot::Unequipped => {
                self.fire_cooldown = tuning.fire_cooldown_ticks;
                Ok(FireResult::SpawnedProjectile(self.shot(
                    ids.next_id(),
                    tuning.bullet_speed,
                    false,
                    tuning,
                )))
            }
        }
    }

    /// Tick both weapon cooldowns down
    pub fn cool_down(&mut self) {
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        self.rapid_cooldown = self.rapid_cooldown.saturating_sub(1);
    }

    fn shot(&self, id: EntityId, speed: f32, heavy: bool, tuning: &Tuning) -> Projectile {
        let vel: Vec2 = self.facing() * speed + self.vel * tuning.shot_velocity_inherit;
        Projectile::new(id, self.nose(), vel, heavy, Owner::Ship(self.id), tuning)
    }
}
