//! Entity models and their per-tick motion
//!
//! Each entity advances from its own state only; nothing here knows about
//! collisions. Wrap policies:
//! - ships and projectiles wrap exactly at the arena edge
//! - asteroids and power-up tokens wrap once fully past the edge (radius margin)
//! - saucers never wrap: they bounce off top/bottom and are culled off the sides
//! - debris does not wrap at all

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::wrap_position;
use super::weapons::{PowerUpKind, PowerUpState};
use crate::consts::{BURST_LARGE, BURST_MEDIUM, BURST_SMALL};
use crate::tuning::Tuning;
use crate::{heading_vector, normalize_degrees};

pub type EntityId = u32;

/// Monotonic entity ID source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next: EntityId,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Who fired a projectile (and who gets the points)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Ship(EntityId),
    Saucer(EntityId),
}

/// Uniform sample that tolerates an empty or inverted range
#[inline]
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Ticks between shield after-images
pub const TRAIL_INTERVAL: u32 = 5;
/// Lifetime of one after-image in ticks
pub const TRAIL_LIFETIME: u32 = 30;

/// After-image left behind while shielded (cosmetic)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub heading: f32,
    pub life: u32,
}

/// A player ship. Ships persist for the whole match; only `lives` changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Degrees in [0, 360)
    pub heading: f32,
    pub radius: f32,
    pub lives: u32,
    pub score: u64,
    /// Where this ship reappears after losing a life
    pub spawn_point: Vec2,
    /// Post-respawn grace period end (tick)
    pub invulnerable_until: Option<u64>,
    pub powerup: PowerUpState,
    /// Ticks until the standard weapon may fire again
    pub fire_cooldown: u32,
    /// Ticks until rapid fire may fire again
    pub rapid_cooldown: u32,
    /// Fire was held last tick (standard shots need a fresh press)
    pub fire_latch: bool,
    /// Thrusting this tick (for the flame)
    pub thrusting: bool,
    pub tint: u32,
    /// Shield after-images (newest last)
    pub trail: Vec<TrailPoint>,
    trail_counter: u32,
}

impl Ship {
    pub fn new(id: EntityId, spawn_point: Vec2, tint: u32, tuning: &Tuning) -> Self {
        Self {
            id,
            pos: spawn_point,
            vel: Vec2::ZERO,
            heading: 0.0,
            radius: tuning.ship_radius,
            lives: tuning.starting_lives,
            score: 0,
            spawn_point,
            invulnerable_until: None,
            powerup: PowerUpState::default(),
            fire_cooldown: 0,
            rapid_cooldown: 0,
            fire_latch: false,
            thrusting: false,
            tint,
            trail: Vec::new(),
            trail_counter: 0,
        }
    }

    /// Still in the match (has lives left)
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    #[inline]
    pub fn respawn_invulnerable(&self, now: u64) -> bool {
        self.invulnerable_until.is_some_and(|until| now < until)
    }

    /// Shielded or in the post-respawn grace period
    #[inline]
    pub fn is_protected(&self, now: u64) -> bool {
        self.powerup.shield_active(now) || self.respawn_invulnerable(now)
    }

    /// Unit vector along the heading
    #[inline]
    pub fn facing(&self) -> Vec2 {
        heading_vector(self.heading)
    }

    /// Tip of the ship, where shots leave from
    #[inline]
    pub fn nose(&self) -> Vec2 {
        self.pos + self.facing() * self.radius
    }

    /// Turn by `direction` (-1 left, +1 right) steps
    pub fn rotate(&mut self, direction: f32, tuning: &Tuning) {
        self.heading = normalize_degrees(self.heading + direction * tuning.ship_turn_degrees);
    }

    /// Accelerate along the heading, clamped to max speed
    pub fn thrust(&mut self, tuning: &Tuning) {
        self.thrusting = true;
        self.vel += self.facing() * tuning.ship_thrust;
        self.vel = self.vel.clamp_length_max(tuning.ship_max_speed);
    }

    /// Friction, movement, wrap, timers and after-images
    pub fn advance(&mut self, dt: f32, now: u64, tuning: &Tuning) {
        self.vel *= tuning.ship_friction.powf(dt);
        self.pos = wrap_position(self.pos + self.vel * dt, tuning.bounds(), 0.0);

        if self.invulnerable_until.is_some_and(|until| now >= until) {
            self.invulnerable_until = None;
        }
        self.powerup.expire(now);

        if self.powerup.shield_active(now) {
            self.trail_counter += 1;
            if self.trail_counter >= TRAIL_INTERVAL {
                self.record_trail();
                self.trail_counter = 0;
            }
        }
        for point in &mut self.trail {
            point.life = point.life.saturating_sub(1);
        }
        self.trail.retain(|p| p.life > 0);
    }

    /// Record current position as an after-image
    pub fn record_trail(&mut self) {
        self.trail.push(TrailPoint {
            pos: self.pos,
            heading: self.heading,
            life: TRAIL_LIFETIME,
        });
    }

    /// Clear after-images (on shield pickup)
    pub fn clear_trail(&mut self) {
        self.trail.clear();
        self.trail_counter = 0;
    }

    /// Back to the spawn point with a fresh grace period
    pub fn respawn(&mut self, now: u64, tuning: &Tuning) {
        self.pos = self.spawn_point;
        self.vel = Vec2::ZERO;
        self.heading = 0.0;
        self.invulnerable_until = Some(now + u64::from(tuning.respawn_invulnerable_ticks));
    }

    /// Apply a power-up pickup
    pub fn collect(&mut self, kind: PowerUpKind, now: u64, tuning: &Tuning) {
        self.powerup.collect(kind, now, tuning);
        if kind == PowerUpKind::Shield {
            self.clear_trail();
        }
    }
}

/// Asteroid size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsteroidTier {
    Small = 1,
    Medium = 2,
    Large = 3,
}

impl AsteroidTier {
    /// Numeric tier (1 = small, 3 = large)
    #[inline]
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Small),
            2 => Some(Self::Medium),
            3 => Some(Self::Large),
            _ => None,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            Self::Small => 10.0,
            Self::Medium => 20.0,
            Self::Large => 40.0,
        }
    }

    /// Speed multiplier: smaller rocks move faster
    #[inline]
    pub fn speed_factor(self) -> f32 {
        f32::from(4 - self.level())
    }

    /// Points for destroying one
    #[inline]
    pub fn score(self) -> u64 {
        u64::from(4 - self.level()) * 100
    }

    /// Tier of the fragments, if any
    pub fn smaller(self) -> Option<Self> {
        Self::from_level(self.level() - 1)
    }

    /// Debris particles released on destruction
    pub fn burst_size(self) -> usize {
        match self {
            Self::Small => BURST_SMALL,
            Self::Medium => BURST_MEDIUM,
            Self::Large => BURST_LARGE,
        }
    }
}

/// A drifting rock with a fixed jagged outline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub tier: AsteroidTier,
    pub radius: f32,
    /// Outline offsets from the centre, generated once at creation
    pub vertices: Vec<Vec2>,
    #[serde(skip)]
    pub dead: bool,
}

impl Asteroid {
    /// Create an asteroid at `pos`, or on a random arena edge when `None`
    pub fn spawn<R: Rng + ?Sized>(
        id: EntityId,
        pos: Option<Vec2>,
        tier: AsteroidTier,
        rng: &mut R,
        tuning: &Tuning,
    ) -> Self {
        let pos = pos.unwrap_or_else(|| random_edge_position(rng, tuning.bounds()));

        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = uniform(rng, tuning.asteroid_min_speed, tuning.asteroid_max_speed)
            * tier.speed_factor();
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed;

        let radius = tier.radius();
        let count = rng.random_range(8..=12);
        let vertices = (0..count)
            .map(|i| {
                let theta = std::f32::consts::TAU * i as f32 / count as f32;
                let r = radius * rng.random_range(0.8f32..=1.2);
                Vec2::new(theta.cos(), theta.sin()) * r
            })
            .collect();

        Self {
            id,
            pos,
            vel,
            tier,
            radius,
            vertices,
            dead: false,
        }
    }

    /// Move and wrap once fully off-screen
    pub fn advance(&mut self, dt: f32, bounds: Vec2) {
        self.pos = wrap_position(self.pos + self.vel * dt, bounds, self.radius);
    }

    /// Two next-tier fragments near this asteroid's position, or none for the smallest tier
    pub fn break_apart<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ids: &mut EntityIds,
        tuning: &Tuning,
    ) -> Vec<Asteroid> {
        let Some(tier) = self.tier.smaller() else {
            return Vec::new();
        };
        let jitter = tuning.fragment_jitter;
        (0..2)
            .map(|_| {
                let offset = Vec2::new(
                    uniform(rng, -jitter, jitter),
                    uniform(rng, -jitter, jitter),
                );
                let pos = wrap_position(self.pos + offset, tuning.bounds(), tier.radius());
                Asteroid::spawn(ids.next_id(), Some(pos), tier, rng, tuning)
            })
            .collect()
    }
}

/// A point on one of the four arena edges, edge chosen uniformly
pub fn random_edge_position<R: Rng + ?Sized>(rng: &mut R, bounds: Vec2) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(uniform(rng, 0.0, bounds.x), 0.0),
        1 => Vec2::new(bounds.x, uniform(rng, 0.0, bounds.y)),
        2 => Vec2::new(uniform(rng, 0.0, bounds.x), bounds.y),
        _ => Vec2::new(0.0, uniform(rng, 0.0, bounds.y)),
    }
}

/// A bullet or a heavy (area-effect) bomb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    /// Position one tick ago, unwrapped, for swept tests
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Ticks left before it fizzles
    pub lifetime: u32,
    pub heavy: bool,
    pub owner: Owner,
    #[serde(skip)]
    pub dead: bool,
}

impl Projectile {
    /// Shots leaving from past an edge start on the far side
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, heavy: bool, owner: Owner, tuning: &Tuning) -> Self {
        let pos = wrap_position(pos, tuning.bounds(), 0.0);
        Self {
            id,
            pos,
            prev_pos: pos,
            vel,
            radius: tuning.projectile_radius,
            lifetime: tuning.projectile_lifetime,
            heavy,
            owner,
            dead: false,
        }
    }

    /// Move, wrap and age one tick
    pub fn advance(&mut self, dt: f32, bounds: Vec2) {
        let step = self.vel * dt;
        let moved = self.pos + step;
        let wrapped = wrap_position(moved, bounds, 0.0);
        // Keep the swept segment local when crossing the seam
        self.prev_pos = if wrapped == moved { self.pos } else { wrapped - step };
        self.pos = wrapped;

        self.lifetime = self.lifetime.saturating_sub(1);
        if self.lifetime == 0 {
            self.dead = true;
        }
    }

    #[inline]
    pub fn ship_owner(&self) -> Option<EntityId> {
        match self.owner {
            Owner::Ship(id) => Some(id),
            Owner::Saucer(_) => None,
        }
    }
}

/// Continuous laser anchored to its owner's nose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub id: EntityId,
    pub owner: EntityId,
    pub origin: Vec2,
    /// Unit direction
    pub dir: Vec2,
    pub length: f32,
    pub width: f32,
    pub remaining: u32,
    pub tint: u32,
    #[serde(skip)]
    pub dead: bool,
}

impl Beam {
    pub fn new(id: EntityId, ship: &Ship, tuning: &Tuning) -> Self {
        Self {
            id,
            owner: ship.id,
            origin: ship.pos,
            dir: ship.facing(),
            length: tuning.beam_length,
            width: tuning.beam_width,
            remaining: tuning.beam_ticks,
            tint: ship.tint,
            dead: false,
        }
    }

    /// Re-anchor to the owner's current position and heading
    pub fn follow(&mut self, ship: &Ship) {
        self.origin = ship.pos;
        self.dir = ship.facing();
    }

    pub fn advance(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.dead = true;
        }
    }

    /// Far end of the beam segment
    #[inline]
    pub fn end(&self) -> Vec2 {
        self.origin + self.dir * self.length
    }
}

/// Enemy craft that crosses the arena and shoots at ships
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saucer {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub shot_timer: u32,
    pub shot_delay: u32,
    #[serde(skip)]
    pub dead: bool,
}

impl Saucer {
    /// Enter from a random side just off the arena
    pub fn spawn<R: Rng + ?Sized>(id: EntityId, rng: &mut R, tuning: &Tuning) -> Self {
        let bounds = tuning.bounds();
        let y = uniform(rng, 50.0, bounds.y - 50.0);
        let speed = uniform(rng, tuning.saucer_min_speed, tuning.saucer_max_speed);
        let vy = uniform(rng, -1.0, 1.0);
        let (x, vx) = if rng.random_bool(0.5) {
            (-tuning.saucer_entry_offset, speed)
        } else {
            (bounds.x + tuning.saucer_entry_offset, -speed)
        };

        Self {
            id,
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            radius: tuning.saucer_radius,
            shot_timer: 0,
            shot_delay: roll_shot_delay(rng, tuning),
            dead: false,
        }
    }

    /// Move, bounce vertically, occasionally swerve, tick the gun timer
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R, tuning: &Tuning) {
        self.pos += self.vel * dt;

        let height = tuning.arena_height;
        if self.pos.y < self.radius {
            self.vel.y = self.vel.y.abs();
        } else if self.pos.y > height - self.radius {
            self.vel.y = -self.vel.y.abs();
        }

        if rng.random_bool(tuning.saucer_jitter_chance) {
            self.vel.y = uniform(rng, -1.0, 1.0);
        }

        self.shot_timer += 1;

        if self.is_off_arena(tuning) {
            self.dead = true;
        }
    }

    pub fn is_off_arena(&self, tuning: &Tuning) -> bool {
        let m = tuning.saucer_cull_margin;
        self.pos.x < -m
            || self.pos.x > tuning.arena_width + m
            || self.pos.y < -m
            || self.pos.y > tuning.arena_height + m
    }

    #[inline]
    pub fn ready_to_fire(&self) -> bool {
        self.shot_timer >= self.shot_delay
    }

    /// Shoot at `target` with a random aim error, then re-roll the delay
    pub fn fire_at<R: Rng + ?Sized>(
        &mut self,
        target: Vec2,
        id: EntityId,
        rng: &mut R,
        tuning: &Tuning,
    ) -> Projectile {
        self.shot_timer = 0;
        self.shot_delay = roll_shot_delay(rng, tuning);

        let to_target = target - self.pos;
        let error = uniform(rng, -tuning.saucer_aim_error, tuning.saucer_aim_error);
        let angle = to_target.y.atan2(to_target.x) + error;
        let vel = Vec2::new(angle.cos(), angle.sin()) * tuning.saucer_shot_speed;
        Projectile::new(id, self.pos, vel, false, Owner::Saucer(self.id), tuning)
    }
}

fn roll_shot_delay<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> u32 {
    rng.random_range(tuning.saucer_shot_delay_min..=tuning.saucer_shot_delay_max)
}

/// Largest radius added by the pulse ring
const PULSE_MAX: f32 = 4.0;
const PULSE_STEP: f32 = 0.2;

/// A collectible power-up drifting through the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpToken {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: PowerUpKind,
    pub radius: f32,
    pub lifetime: u32,
    /// Pulse ring size (cosmetic)
    pub pulse: f32,
    pulse_growing: bool,
    #[serde(skip)]
    pub dead: bool,
}

impl PowerUpToken {
    pub fn new(id: EntityId, pos: Vec2, kind: PowerUpKind, vel: Vec2, tuning: &Tuning) -> Self {
        Self {
            id,
            pos,
            vel,
            kind,
            radius: tuning.powerup_radius,
            lifetime: tuning.powerup_lifetime,
            pulse: 0.0,
            pulse_growing: true,
            dead: false,
        }
    }

    /// Random kind and drift
    pub fn spawn<R: Rng + ?Sized>(id: EntityId, pos: Vec2, rng: &mut R, tuning: &Tuning) -> Self {
        let kind = PowerUpKind::random(rng);
        let vel = Vec2::new(uniform(rng, -1.0, 1.0), uniform(rng, -1.0, 1.0));
        Self::new(id, pos, kind, vel, tuning)
    }

    pub fn advance(&mut self, dt: f32, bounds: Vec2) {
        self.pos = wrap_position(self.pos + self.vel * dt, bounds, self.radius);

        if self.pulse_growing {
            self.pulse += PULSE_STEP;
            if self.pulse > PULSE_MAX {
                self.pulse_growing = false;
            }
        } else {
            self.pulse -= PULSE_STEP;
            if self.pulse < 0.0 {
                self.pulse_growing = true;
            }
        }

        self.lifetime = self.lifetime.saturating_sub(1);
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifetime == 0
    }
}

/// Per-tick velocity decay of debris
const DEBRIS_DRAG: f32 = 0.95;

/// A cosmetic spark (not gameplay-affecting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebrisParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub size: f32,
    pub tint: u32,
}

impl DebrisParticle {
    /// One spark flying off in a random direction from `pos`
    pub fn spark<R: Rng + ?Sized>(pos: Vec2, tint: u32, rng: &mut R) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed: f32 = rng.random_range(1.0..3.0);
        Self {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            life: rng.random_range(10..=30),
            size: rng.random_range(1..=3) as f32,
            tint,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= DEBRIS_DRAG.powf(dt);
        self.life = self.life.saturating_sub(1);
    }
}
