//! Collision resolution
//!
//! Runs once per tick after every entity has moved. The steps run in a fixed
//! order and each one only considers entities that are still alive: a hit marks
//! its entities `dead` and [`GameState::prune`] drops them at the end of the
//! tick. Whatever a hit creates (fragments, saucer shots, debris) is collected
//! in [`Effects`] and joins the world only after the last step, so nothing
//! spawned this tick can be hit this tick.

use glam::Vec2;
use rand::Rng;

use super::entities::{AsteroidTier, DebrisParticle, EntityId, Owner, Projectile, Ship, uniform};
use super::geometry::{circles_overlap, distance, line_sweep_hit, shortest_delta, swept_circle_hit};
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::tuning::Tuning;

/// Tints used by detonation sparks
const DETONATION_TINTS: [u32; 3] = [RED, YELLOW, WHITE];

#[derive(Debug, Clone, Copy)]
struct Burst {
    pos: Vec2,
    count: usize,
    tint: u32,
}

/// Entities produced during resolution, applied once every step has run
#[derive(Debug, Default)]
struct Effects {
    /// Indices of asteroids destroyed this tick that should break apart
    shattered: Vec<usize>,
    bursts: Vec<Burst>,
    /// Detonation sparks scattered over the whole arena
    scatter: usize,
    shots: Vec<Projectile>,
}

impl Effects {
    fn burst(&mut self, pos: Vec2, count: usize, tint: u32) {
        self.bursts.push(Burst { pos, count, tint });
    }

    fn shatter(&mut self, index: usize, pos: Vec2, tier: AsteroidTier, tint: u32) {
        self.shattered.push(index);
        self.burst(pos, tier.burst_size(), tint);
    }

    fn apply(self, state: &mut GameState) {
        let GameState {
            tuning,
            rng,
            ids,
            asteroids,
            projectiles,
            debris,
            ..
        } = state;

        let mut fragments = Vec::new();
        for &i in &self.shattered {
            if let Some(parent) = asteroids.get(i) {
                fragments.extend(parent.break_apart(rng, ids, tuning));
            }
        }
        asteroids.extend(fragments);
        projectiles.extend(self.shots);

        for burst in &self.bursts {
            for _ in 0..burst.count {
                debris.push(DebrisParticle::spark(burst.pos, burst.tint, rng));
            }
        }
        for _ in 0..self.scatter {
            let pos = Vec2::new(
                uniform(rng, 0.0, tuning.arena_width),
                uniform(rng, 0.0, tuning.arena_height),
            );
            let tint = DETONATION_TINTS[rng.random_range(0..DETONATION_TINTS.len())];
            debris.push(DebrisParticle::spark(pos, tint, rng));
        }
    }
}

/// Resolve every interaction for this tick
pub fn resolve(state: &mut GameState) {
    let mut fx = Effects::default();

    detonate_heavy_projectiles(state, &mut fx);
    beams_vs_targets(state, &mut fx);
    collect_powerups(state, &mut fx);
    asteroids_vs_ships(state, &mut fx);
    asteroids_vs_projectiles(state, &mut fx);
    saucers_vs_ships_and_projectiles(state, &mut fx);
    saucer_shots_vs_ships(state, &mut fx);
    fire_saucers(state, &mut fx);

    fx.apply(state);
    end_match_if_over(state);
}

#[inline]
fn overlap(tuning: &Tuning, a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    circles_overlap(a, ra, b, rb, tuning.bounds(), tuning.wrap_aware_collisions)
}

/// Credit points to a ship; saucer-owned or unknown owners get nothing
fn award(ships: &mut [Ship], owner: Option<EntityId>, points: u64) {
    let Some(id) = owner else { return };
    if let Some(ship) = ships.iter_mut().find(|s| s.id == id) {
        ship.score += points;
    }
}

/// Take a life from an unprotected ship and respawn it if any remain
fn hit_ship(
    ship: &mut Ship,
    now: u64,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
    fx: &mut Effects,
) {
    ship.lives = ship.lives.saturating_sub(1);
    fx.burst(ship.pos, BURST_MEDIUM, ship.tint);
    events.push(GameEvent::ShipHit {
        ship: ship.id,
        lives_left: ship.lives,
    });

    if ship.is_alive() {
        log::debug!("Ship {} hit, {} lives left", ship.id, ship.lives);
        ship.respawn(now, tuning);
    } else {
        log::info!("Ship {} lost its last life", ship.id);
        ship.vel = Vec2::ZERO;
        ship.powerup = Default::default();
        ship.clear_trail();
        events.push(GameEvent::ShipDestroyedFinalLife { ship: ship.id });
    }
}

/// Step 1: an armed heavy projectile touching a target, or one about to
/// expire, clears every asteroid, saucer and projectile in the arena
fn detonate_heavy_projectiles(state: &mut GameState, fx: &mut Effects) {
    let detonation = {
        let tuning = &state.tuning;
        let touching = |p: &Projectile| {
            state
                .asteroids
                .iter()
                .filter(|a| !a.dead)
                .any(|a| overlap(tuning, p.pos, p.radius, a.pos, a.radius))
                || state
                    .saucers
                    .iter()
                    .filter(|s| !s.dead)
                    .any(|s| overlap(tuning, p.pos, p.radius, s.pos, s.radius))
        };
        state
            .projectiles
            .iter()
            .find(|p| {
                !p.dead
                    && p.heavy
                    && (p.lifetime < tuning.bomb_fuse_lifetime
                        || (p.lifetime < tuning.bomb_arm_lifetime && touching(*p)))
            })
            .map(|p| (p.ship_owner(), p.pos))
    };
    let Some((owner, pos)) = detonation else {
        return;
    };

    let GameState {
        ships,
        asteroids,
        saucers,
        projectiles,
        events,
        ..
    } = state;

    let mut points = 0;
    for a in asteroids.iter_mut().filter(|a| !a.dead) {
        a.dead = true;
        points += a.tier.score();
        events.push(GameEvent::AsteroidDestroyed { tier: a.tier });
        fx.burst(a.pos, a.tier.burst_size(), WHITE);
    }
    for s in saucers.iter_mut().filter(|s| !s.dead) {
        s.dead = true;
        points += SAUCER_SCORE;
        events.push(GameEvent::SaucerDestroyed);
        fx.burst(s.pos, BURST_MEDIUM, RED);
    }
    for p in projectiles.iter_mut() {
        p.dead = true;
    }

    award(ships, owner, points);
    fx.scatter += DETONATION_PARTICLES;
    if let Some(ship) = owner {
        events.push(GameEvent::NukeDetonated { ship });
    }
    log::debug!("Heavy projectile detonated at {pos} for {points} points");
}

/// Step 2: every live beam against every asteroid and saucer
fn beams_vs_targets(state: &mut GameState, fx: &mut Effects) {
    let GameState {
        tuning,
        ships,
        asteroids,
        saucers,
        beams,
        events,
        ..
    } = state;
    let tuning = &*tuning;
    let bounds = tuning.bounds();

    for beam in beams.iter().filter(|b| !b.dead) {
        for (i, a) in asteroids.iter_mut().enumerate() {
            if a.dead {
                continue;
            }
            // Only the smallest rocks are checked across the seam
            let wrap = (a.tier == AsteroidTier::Small).then_some((bounds, tuning.beam_phantom_margin));
            if line_sweep_hit(beam.origin, beam.dir, beam.length, a.pos, a.radius, beam.width, wrap) {
                a.dead = true;
                award(ships, Some(beam.owner), a.tier.score());
                events.push(GameEvent::AsteroidDestroyed { tier: a.tier });
                fx.shatter(i, a.pos, a.tier, beam.tint);
            }
        }

        for s in saucers.iter_mut().filter(|s| !s.dead) {
            if line_sweep_hit(beam.origin, beam.dir, beam.length, s.pos, s.radius, beam.width, None) {
                s.dead = true;
                award(ships, Some(beam.owner), SAUCER_SCORE);
                events.push(GameEvent::SaucerDestroyed);
                fx.burst(s.pos, BURST_MEDIUM, beam.tint);
            }
        }
    }
}

/// Step 3: expired tokens vanish, otherwise the first overlapping ship takes it
fn collect_powerups(state: &mut GameState, fx: &mut Effects) {
    let GameState {
        tuning,
        ships,
        tokens,
        events,
        time_ticks,
        ..
    } = state;
    let tuning = &*tuning;
    let now = *time_ticks;

    for token in tokens.iter_mut() {
        if token.dead {
            continue;
        }
        if token.is_expired() {
            token.dead = true;
            continue;
        }

        let Some(ship) = ships
            .iter_mut()
            .find(|s| s.is_alive() && overlap(tuning, s.pos, s.radius, token.pos, token.radius))
        else {
            continue;
        };

        ship.collect(token.kind, now, tuning);
        token.dead = true;
        events.push(GameEvent::PowerUpCollected {
            ship: ship.id,
            kind: token.kind,
        });
        fx.burst(token.pos, BURST_MEDIUM, token.kind.tint());
        log::debug!("Ship {} collected {:?}", ship.id, token.kind);
    }
}

/// Step 4: ships against asteroids. A protected ship rams and scores,
/// an unprotected one loses a life.
fn asteroids_vs_ships(state: &mut GameState, fx: &mut Effects) {
    let GameState {
        tuning,
        ships,
        asteroids,
        events,
        time_ticks,
        ..
    } = state;
    let tuning = &*tuning;
    let now = *time_ticks;

    for ship in ships.iter_mut() {
        for (i, a) in asteroids.iter_mut().enumerate() {
            if !ship.is_alive() {
                break;
            }
            if a.dead || !overlap(tuning, ship.pos, ship.radius, a.pos, a.radius) {
                continue;
            }

            a.dead = true;
            events.push(GameEvent::AsteroidDestroyed { tier: a.tier });
            if ship.is_protected(now) {
                ship.score += a.tier.score();
                fx.shatter(i, a.pos, a.tier, PURPLE);
            } else {
                fx.shatter(i, a.pos, a.tier, WHITE);
                hit_ship(ship, now, tuning, events, fx);
            }
        }
    }
}

/// Step 5: at most one projectile per asteroid. Small rocks use the swept
/// test so fast shots cannot tunnel through them.
fn asteroids_vs_projectiles(state: &mut GameState, fx: &mut Effects) {
    let GameState {
        tuning,
        ships,
        asteroids,
        projectiles,
        events,
        ..
    } = state;
    let tuning = &*tuning;

    for (i, a) in asteroids.iter_mut().enumerate() {
        if a.dead {
            continue;
        }
        let hit = projectiles.iter_mut().find(|p| {
            if p.dead || p.heavy {
                return false;
            }
            if a.tier == AsteroidTier::Small {
                // Nearest image of the rock when overlaps are measured across the seam
                let center = if tuning.wrap_aware_collisions {
                    p.pos + shortest_delta(p.pos, a.pos, tuning.bounds())
                } else {
                    a.pos
                };
                swept_circle_hit(p.prev_pos, p.pos, p.radius, center, a.radius)
            } else {
                overlap(tuning, p.pos, p.radius, a.pos, a.radius)
            }
        });
        let Some(p) = hit else {
            continue;
        };

        p.dead = true;
        a.dead = true;
        award(ships, p.ship_owner(), a.tier.score());
        events.push(GameEvent::AsteroidDestroyed { tier: a.tier });
        fx.shatter(i, a.pos, a.tier, WHITE);
    }
}

/// Step 6: saucers against ships (like step 4) and ship-owned projectiles
fn saucers_vs_ships_and_projectiles(state: &mut GameState, fx: &mut Effects) {
    let GameState {
        tuning,
        ships,
        saucers,
        projectiles,
        events,
        time_ticks,
        ..
    } = state;
    let tuning = &*tuning;
    let now = *time_ticks;

    for saucer in saucers.iter_mut() {
        if saucer.dead {
            continue;
        }

        let rammed = ships.iter_mut().find(|s| {
            s.is_alive() && overlap(tuning, s.pos, s.radius, saucer.pos, saucer.radius)
        });
        if let Some(ship) = rammed {
            saucer.dead = true;
            events.push(GameEvent::SaucerDestroyed);
            fx.burst(saucer.pos, BURST_MEDIUM, RED);
            if ship.is_protected(now) {
                ship.score += SAUCER_SCORE;
            } else {
                hit_ship(ship, now, tuning, events, fx);
            }
            continue;
        }

        let shot = projectiles.iter_mut().find(|p| {
            !p.dead
                && !p.heavy
                && matches!(p.owner, Owner::Ship(_))
                && overlap(tuning, p.pos, p.radius, saucer.pos, saucer.radius)
        });
        if let Some(p) = shot {
            p.dead = true;
            saucer.dead = true;
            award(ships, p.ship_owner(), SAUCER_SCORE);
            events.push(GameEvent::SaucerDestroyed);
            fx.burst(saucer.pos, BURST_MEDIUM, RED);
        }
    }
}

/// Saucer shots against ships, only with `saucer_shots_hit_ships`:
/// unprotected ships lose a life, protected ships absorb the shot
fn saucer_shots_vs_ships(state: &mut GameState, fx: &mut Effects) {
    if !state.tuning.saucer_shots_hit_ships {
        return;
    }
    let GameState {
        tuning,
        ships,
        projectiles,
        events,
        time_ticks,
        ..
    } = state;
    let tuning = &*tuning;
    let now = *time_ticks;

    for p in projectiles.iter_mut() {
        if p.dead || !matches!(p.owner, Owner::Saucer(_)) {
            continue;
        }
        let Some(ship) = ships
            .iter_mut()
            .find(|s| s.is_alive() && overlap(tuning, s.pos, s.radius, p.pos, p.radius))
        else {
            continue;
        };

        p.dead = true;
        if !ship.is_protected(now) {
            hit_ship(ship, now, tuning, events, fx);
        }
    }
}

/// Step 7: saucers whose gun timer elapsed shoot at the nearest living ship
fn fire_saucers(state: &mut GameState, fx: &mut Effects) {
    let GameState {
        tuning,
        rng,
        ids,
        ships,
        saucers,
        ..
    } = state;

    for saucer in saucers.iter_mut() {
        if saucer.dead || !saucer.ready_to_fire() {
            continue;
        }
        // min_by keeps the first of equals, so ties go to the earlier ship
        let target = ships
            .iter()
            .filter(|s| s.is_alive())
            .min_by(|a, b| {
                distance(a.pos, saucer.pos).total_cmp(&distance(b.pos, saucer.pos))
            });
        let Some(target) = target else {
            continue;
        };

        let shot = saucer.fire_at(target.pos, ids.next_id(), rng, tuning);
        fx.shots.push(shot);
    }
}

/// Every ship out of lives ends the match
fn end_match_if_over(state: &mut GameState) {
    if state.phase != GamePhase::Playing || state.ships.iter().any(|s| s.is_alive()) {
        return;
    }
    state.phase = GamePhase::AwaitingNameEntry;
    let final_scores = state.final_scores();
    log::info!(
        "Match ended at level {} after {} ticks: {:?}",
        state.level,
        state.time_ticks,
        final_scores
    );
    state.events.push(GameEvent::MatchEnded { final_scores });
}
