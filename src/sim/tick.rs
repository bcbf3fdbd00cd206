//! Fixed timestep simulation tick
//!
//! One tick: apply intents, advance entities, resolve collisions, burn down
//! beams, run the spawn director, prune the dead.

use serde::{Deserialize, Serialize};

use super::collision;
use super::spawn;
use super::state::{GamePhase, GameState};
use super::weapons::{FireResult, WeaponSlot};

/// What one ship wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipIntent {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
    pub fire: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// One intent per ship in spawn order; missing entries mean "do nothing"
    pub ships: Vec<ShipIntent>,
}

impl TickInput {
    pub fn single(intent: ShipIntent) -> Self {
        Self {
            ships: vec![intent],
        }
    }

    pub fn intent(&self, index: usize) -> ShipIntent {
        self.ships.get(index).copied().unwrap_or_default()
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    // Nothing moves once the match is over
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    apply_intents(state, input);
    advance_entities(state, dt);
    collision::resolve(state);
    age_beams(state);

    if state.phase == GamePhase::Playing {
        spawn::run(state);
    }

    state.prune();
}

fn apply_intents(state: &mut GameState, input: &TickInput) {
    let GameState {
        tuning,
        ids,
        ships,
        beams,
        projectiles,
        ..
    } = state;
    let tuning = &*tuning;

    for (index, ship) in ships.iter_mut().enumerate() {
        ship.thrusting = false;
        ship.cool_down();
        if !ship.is_alive() {
            continue;
        }

        let intent = input.intent(index);
        if intent.rotate_left {
            ship.rotate(-1.0, tuning);
        }
        if intent.rotate_right {
            ship.rotate(1.0, tuning);
        }
        if intent.thrust {
            ship.thrust(tuning);
        }

        let beam_live = beams.iter().any(|b| !b.dead && b.owner == ship.id);
        match ship.fire(intent.fire, beam_live, ids, tuning) {
            Ok(FireResult::NoFire) => {}
            Ok(FireResult::SpawnedProjectile(p)) => projectiles.push(p),
            Ok(FireResult::SpawnedBeam(b)) => beams.push(b),
            Err(err) => {
                log::error!("{err}; unequipping ship {}", ship.id);
                ship.powerup.slot = WeaponSlot::Unequipped;
            }
        }
    }
}

fn advance_entities(state: &mut GameState, dt: f32) {
    let GameState {
        tuning,
        rng,
        time_ticks,
        ships,
        asteroids,
        projectiles,
        beams,
        saucers,
        tokens,
        debris,
        ..
    } = state;
    let tuning = &*tuning;
    let now = *time_ticks;
    let bounds = tuning.bounds();

    for ship in ships.iter_mut().filter(|s| s.is_alive()) {
        ship.advance(dt, now, tuning);
    }

    // Beams stay pinned to their owner
    for beam in beams.iter_mut() {
        if let Some(owner) = ships.iter().find(|s| s.id == beam.owner) {
            beam.follow(owner);
        }
    }

    for asteroid in asteroids.iter_mut() {
        asteroid.advance(dt, bounds);
    }
    for p in projectiles.iter_mut().filter(|p| !p.dead) {
        p.advance(dt, bounds);
    }
    for saucer in saucers.iter_mut() {
        saucer.advance(dt, rng, tuning);
    }
    for token in tokens.iter_mut() {
        token.advance(dt, bounds);
    }
    for d in debris.iter_mut() {
        d.advance(dt);
    }
}

/// Beams burn down after the resolver has used them this tick
fn age_beams(state: &mut GameState) {
    for beam in state.beams.iter_mut() {
        beam.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_DT;
    use crate::sim::entities::{Asteroid, AsteroidTier};
    use crate::sim::geometry::distance;
    use crate::sim::state::GameEvent;
    use crate::sim::weapons::PowerUpKind;
    use glam::Vec2;
    use proptest::prelude::*;

    fn still_asteroid(state: &mut GameState, pos: Vec2, tier: AsteroidTier) {
        let id = state.next_entity_id();
        let mut a = Asteroid::spawn(id, Some(pos), tier, &mut state.rng, &state.tuning);
        a.vel = Vec2::ZERO;
        state.asteroids.push(a);
    }

    fn fire() -> TickInput {
        TickInput::single(ShipIntent {
            fire: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_ship_hit_end_to_end() {
        let mut state = GameState::new(12345, 1);
        state.asteroids.clear();
        state.ships[0].pos = Vec2::new(200.0, 200.0);
        still_asteroid(&mut state, Vec2::new(200.0, 200.0), AsteroidTier::Large);

        tick(&mut state, &TickInput::default(), TICK_DT);

        let ship = &state.ships[0];
        assert_eq!(ship.lives, 2);
        assert_eq!(state.asteroids.len(), 2);
        assert!(state.asteroids.iter().all(|a| a.tier == AsteroidTier::Medium));
        let hits = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::ShipHit { .. }))
            .count();
        assert_eq!(hits, 1);
        assert_eq!(ship.pos, ship.spawn_point);
        assert!(ship.respawn_invulnerable(state.time_ticks));
    }

    #[test]
    fn test_level_advance_end_to_end() {
        let mut state = GameState::new(777, 1);
        state.asteroids.clear();

        tick(&mut state, &TickInput::default(), TICK_DT);

        assert_eq!(state.level, 2);
        assert_eq!(state.asteroids.len(), 4 + 2);
        for a in &state.asteroids {
            assert_eq!(a.tier, AsteroidTier::Large);
            for ship in state.living_ships() {
                assert!(distance(a.pos, ship.pos) > state.tuning.safe_spawn_distance);
            }
        }
        assert!(state.events.contains(&GameEvent::LevelAdvanced { level: 2 }));
    }

    #[test]
    fn test_last_asteroid_destroyed_advances_next_tick() {
        let mut state = GameState::new(31, 1);
        state.asteroids.clear();
        let ship_id = state.ships[0].id;
        still_asteroid(&mut state, Vec2::new(100.0, 100.0), AsteroidTier::Small);
        let id = state.next_entity_id();
        let shot = crate::sim::entities::Projectile::new(
            id,
            Vec2::new(100.0, 100.0),
            Vec2::ZERO,
            false,
            crate::sim::entities::Owner::Ship(ship_id),
            &state.tuning,
        );
        state.projectiles.push(shot);

        tick(&mut state, &TickInput::default(), TICK_DT);

        // Destroyed and replaced within the same tick
        assert_eq!(state.level, 2);
        assert_eq!(state.ships[0].score, 300);
        assert_eq!(state.asteroids.len(), 6);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(99999, 2);
        let mut state2 = GameState::new(99999, 2);

        for i in 0..900u32 {
            let input = TickInput {
                ships: vec![
                    ShipIntent {
                        rotate_left: i % 7 < 3,
                        thrust: i % 5 == 0,
                        fire: i % 3 == 0,
                        ..Default::default()
                    },
                    ShipIntent {
                        rotate_right: i % 11 < 4,
                        thrust: i % 4 == 0,
                        fire: i % 2 == 0,
                        ..Default::default()
                    },
                ],
            };
            tick(&mut state1, &input, TICK_DT);
            tick(&mut state2, &input, TICK_DT);
            assert_eq!(state1.events, state2.events);
        }

        let a = serde_json::to_string(&state1.snapshot()).unwrap();
        let b = serde_json::to_string(&state2.snapshot()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fire_needs_release_between_shots() {
        let mut state = GameState::new(5, 1);
        state.asteroids.clear();
        still_asteroid(&mut state, Vec2::new(790.0, 20.0), AsteroidTier::Large);

        tick(&mut state, &fire(), TICK_DT);
        assert_eq!(state.projectiles.len(), 1);

        // Holding fire past the cooldown adds nothing
        for _ in 0..30 {
            tick(&mut state, &fire(), TICK_DT);
        }
        assert_eq!(state.projectiles.len(), 1);

        tick(&mut state, &TickInput::default(), TICK_DT);
        tick(&mut state, &fire(), TICK_DT);
        assert_eq!(state.projectiles.len(), 2);
    }

    #[test]
    fn test_beam_lifecycle_blocks_fire() {
        let mut state = GameState::new(6, 1);
        let tuning = state.tuning.clone();
        state.asteroids.clear();
        still_asteroid(&mut state, Vec2::new(400.0, 40.0), AsteroidTier::Large);
        state.ships[0].collect(PowerUpKind::Beam, 0, &tuning);

        tick(&mut state, &fire(), TICK_DT);
        assert_eq!(state.beams.len(), 1);

        // Fresh presses while the beam is live do nothing
        for i in 0..tuning.beam_ticks - 1 {
            let input = if i % 2 == 0 { TickInput::default() } else { fire() };
            tick(&mut state, &input, TICK_DT);
            assert!(state.projectiles.is_empty());
        }
        assert!(state.beams.is_empty());
    }

    #[test]
    fn test_beam_cuts_for_its_full_duration() {
        let mut state = GameState::new(6, 1);
        let tuning = state.tuning.clone();
        state.asteroids.clear();
        still_asteroid(&mut state, Vec2::new(400.0, 40.0), AsteroidTier::Large);
        state.ships[0].collect(PowerUpKind::Beam, 0, &tuning);

        // The firing tick already counts as a resolver pass
        tick(&mut state, &fire(), TICK_DT);
        assert_eq!(state.beams[0].remaining, tuning.beam_ticks - 1);
        let mut live_ticks = 1;

        while state.beams[0].remaining > 1 {
            tick(&mut state, &TickInput::default(), TICK_DT);
            live_ticks += 1;
        }

        // Something drifting into the beam on its last tick is still cut
        still_asteroid(&mut state, Vec2::new(600.0, 300.0), AsteroidTier::Large);
        tick(&mut state, &TickInput::default(), TICK_DT);
        live_ticks += 1;

        assert!(state.beams.is_empty());
        assert_eq!(state.ships[0].score, 100);
        assert_eq!(live_ticks, tuning.beam_ticks);
    }

    #[test]
    fn test_invariant_violation_is_repaired() {
        let mut state = GameState::new(8, 1);
        state.ships[0].powerup.slot = WeaponSlot::RapidFire { ammo: 0 };
        tick(&mut state, &fire(), TICK_DT);
        assert_eq!(state.ships[0].powerup.slot, WeaponSlot::Unequipped);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_no_ticks_after_match_end() {
        let mut state = GameState::new(10, 1);
        state.asteroids.clear();
        state.ships[0].lives = 1;
        state.ships[0].pos = Vec2::new(200.0, 200.0);
        still_asteroid(&mut state, Vec2::new(200.0, 200.0), AsteroidTier::Small);

        tick(&mut state, &TickInput::default(), TICK_DT);
        assert_eq!(state.phase, GamePhase::AwaitingNameEntry);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::MatchEnded { .. }))
        );
        // The spawn director did not run on the final tick
        assert_eq!(state.level, 1);

        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), TICK_DT);
        assert_eq!(state.time_ticks, ticks);
        assert!(state.events.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_invariants_hold_under_random_input(
            seed in any::<u64>(),
            ships in 1usize..=2,
            script in proptest::collection::vec(any::<(bool, bool, bool, bool)>(), 1..400),
        ) {
            let mut state = GameState::new(seed, ships);
            for &(left, right, thrust, fire) in &script {
                let intent = ShipIntent { rotate_left: left, rotate_right: right, thrust, fire };
                let input = TickInput { ships: vec![intent; ships] };
                tick(&mut state, &input, TICK_DT);
                prop_assert!(state.validate().is_ok(), "{:?}", state.validate());
            }
        }
    }
}
