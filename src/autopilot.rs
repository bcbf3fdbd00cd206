//! Demo-mode pilot
//!
//! Produces ship intents from the current state so the simulation can run
//! headless (attract mode, soak tests). Uses no randomness.

use glam::Vec2;

use crate::sim::geometry::{shortest_delta, toroidal_distance};
use crate::sim::{GameState, Ship, ShipIntent, TickInput, WeaponSlot};
use crate::vector_heading;

/// Fire when the target bearing is within this many degrees of the heading
const AIM_TOLERANCE: f32 = 10.0;
/// Only thrust toward targets farther than this
const CHASE_DISTANCE: f32 = 250.0;
/// Hold position while anything is this close
const THREAT_DISTANCE: f32 = 120.0;

/// Intents for every ship in spawn order
pub fn intents(state: &GameState) -> TickInput {
    TickInput {
        ships: state.ships.iter().map(|ship| pilot(state, ship)).collect(),
    }
}

/// Signed smallest turn from `from` to `to`, in (-180, 180]
fn turn_toward(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

fn pilot(state: &GameState, ship: &Ship) -> ShipIntent {
    if !ship.is_alive() {
        return ShipIntent::default();
    }
    let bounds = state.tuning.bounds();

    // Asteroids and saucers are both fair game
    let targets = state
        .asteroids
        .iter()
        .map(|a| a.pos)
        .chain(state.saucers.iter().map(|s| s.pos));
    let nearest = targets.min_by(|a, b| {
        toroidal_distance(ship.pos, *a, bounds).total_cmp(&toroidal_distance(ship.pos, *b, bounds))
    });
    let Some(target) = nearest else {
        return ShipIntent::default();
    };

    let delta: Vec2 = shortest_delta(ship.pos, target, bounds);
    let distance = delta.length();
    let turn = turn_toward(ship.heading, vector_heading(delta));
    let half_step = state.tuning.ship_turn_degrees / 2.0;
    let aligned = turn.abs() < AIM_TOLERANCE;

    let threatened = state
        .asteroids
        .iter()
        .any(|a| toroidal_distance(ship.pos, a.pos, bounds) < THREAT_DISTANCE + a.radius);

    // Rapid fire works while held; everything else needs a fresh press
    let fire = aligned
        && match ship.powerup.slot {
            WeaponSlot::RapidFire { .. } => true,
            _ => !ship.fire_latch,
        };

    ShipIntent {
        rotate_left: turn < -half_step,
        rotate_right: turn > half_step,
        thrust: aligned && distance > CHASE_DISTANCE && !threatened,
        fire,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_DT;
    use crate::sim::{AsteroidTier, GamePhase, tick};

    fn lone_target(state: &mut GameState, pos: Vec2) {
        state.asteroids.clear();
        let id = state.next_entity_id();
        let mut a = crate::sim::Asteroid::spawn(id, Some(pos), AsteroidTier::Large, &mut state.rng, &state.tuning);
        a.vel = Vec2::ZERO;
        state.asteroids.push(a);
    }

    #[test]
    fn test_turn_toward() {
        assert_eq!(turn_toward(0.0, 90.0), 90.0);
        assert_eq!(turn_toward(350.0, 10.0), 20.0);
        assert_eq!(turn_toward(10.0, 350.0), -20.0);
        assert_eq!(turn_toward(0.0, 180.0), 180.0);
    }

    #[test]
    fn test_turns_toward_target() {
        let mut state = GameState::new(1, 1);
        // Straight below the ship (screen y grows downward)
        lone_target(&mut state, Vec2::new(400.0, 500.0));
        let intent = intents(&state).intent(0);
        assert!(intent.rotate_right);
        assert!(!intent.rotate_left);
        assert!(!intent.fire);
    }

    #[test]
    fn test_fires_when_aligned() {
        let mut state = GameState::new(1, 1);
        lone_target(&mut state, Vec2::new(600.0, 300.0));
        let intent = intents(&state).intent(0);
        assert!(intent.fire);
        assert!(!intent.rotate_left && !intent.rotate_right);
        // Too close to chase
        assert!(!intent.thrust);
    }

    #[test]
    fn test_aims_across_the_seam() {
        let mut state = GameState::new(1, 1);
        state.ships[0].pos = Vec2::new(780.0, 300.0);
        // Nearer through the right edge than straight across
        lone_target(&mut state, Vec2::new(60.0, 300.0));
        let intent = intents(&state).intent(0);
        assert!(intent.fire);
    }

    #[test]
    fn test_downed_ship_idles() {
        let mut state = GameState::new(1, 2);
        state.ships[1].lives = 0;
        let input = intents(&state);
        assert_eq!(input.ships.len(), 2);
        assert_eq!(input.intent(1), ShipIntent::default());
    }

    #[test]
    fn test_demo_match_keeps_invariants() {
        let mut state = GameState::new(2025, 2);
        for _ in 0..3000 {
            let input = intents(&state);
            tick(&mut state, &input, TICK_DT);
            assert!(state.validate().is_ok(), "{:?}", state.validate());
            if state.phase == GamePhase::AwaitingNameEntry {
                break;
            }
        }
        assert!(state.ships.iter().any(|s| s.score > 0));
    }
}
