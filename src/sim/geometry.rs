//! Toroidal geometry helpers
//!
//! Pure functions with no game state: wrapping, wrap-aware distance,
//! point/segment distance, swept circle tests and the beam line test.
//! Every position in the arena lives on a torus of size `bounds`.

use glam::Vec2;

/// Segments shorter than this (squared) are treated as a point
const DEGENERATE_SEGMENT_SQ: f32 = 1e-6;

/// Reduce a position into the wrap band `[-margin, bound + margin)` on each axis.
///
/// With `margin == 0` this is a plain modulo into `[0, bound)`. A positive
/// margin lets entities drift fully off-screen before reappearing on the
/// opposite side.
#[inline]
pub fn wrap_position(p: Vec2, bounds: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        wrap_axis(p.x, bounds.x, margin),
        wrap_axis(p.y, bounds.y, margin),
    )
}

#[inline]
fn wrap_axis(v: f32, bound: f32, margin: f32) -> f32 {
    let span = bound + 2.0 * margin;
    let wrapped = (v + margin).rem_euclid(span) - margin;
    // Float rounding can land exactly on the upper edge
    if wrapped >= bound + margin { -margin } else { wrapped }
}

/// True if the position lies inside the wrap band
#[inline]
pub fn in_wrap_band(p: Vec2, bounds: Vec2, margin: f32) -> bool {
    p.x >= -margin && p.x <= bounds.x + margin && p.y >= -margin && p.y <= bounds.y + margin
}

/// Plain Euclidean distance (not wrap-aware)
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Shortest signed offset from `a` to `b` on a torus of size `bounds`
#[inline]
pub fn shortest_delta(a: Vec2, b: Vec2, bounds: Vec2) -> Vec2 {
    Vec2::new(
        shortest_axis_delta(a.x, b.x, bounds.x),
        shortest_axis_delta(a.y, b.y, bounds.y),
    )
}

#[inline]
fn shortest_axis_delta(a: f32, b: f32, bound: f32) -> f32 {
    let mut d = (b - a).rem_euclid(bound);
    if d > bound / 2.0 {
        d -= bound;
    }
    d
}

/// Wrap-aware distance (minimum over the wrapped translations of `b`)
#[inline]
pub fn toroidal_distance(a: Vec2, b: Vec2, bounds: Vec2) -> f32 {
    shortest_delta(a, b, bounds).length()
}

/// Circle overlap, optionally measured across the wrap seam
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32, bounds: Vec2, wrap_aware: bool) -> bool {
    let d = if wrap_aware {
        toroidal_distance(a, b, bounds)
    } else {
        distance(a, b)
    };
    d < ra + rb
}

/// Distance from `p` to the segment `start..end` (projection clamped to the segment)
pub fn point_to_segment_distance(p: Vec2, start: Vec2, end: Vec2) -> f32 {
    let seg = end - start;
    let len_sq = seg.length_squared();
    if len_sq < DEGENERATE_SEGMENT_SQ {
        return p.distance(start);
    }
    let t = ((p - start).dot(seg) / len_sq).clamp(0.0, 1.0);
    p.distance(start + seg * t)
}

/// Continuous circle-vs-circle test for a moving circle A against a static circle B.
///
/// Parametrizes A's centre along `prev_a + t * (cur_a - prev_a)` and solves
/// `|P(t) - center_b| = radius_a + radius_b`. Hits when A starts inside the
/// combined radius or the first root lies in `[0, 1]`. A zero-length motion
/// falls back to the static overlap test.
pub fn swept_circle_hit(
    prev_a: Vec2,
    cur_a: Vec2,
    radius_a: f32,
    center_b: Vec2,
    radius_b: f32,
) -> bool {
    let r = radius_a + radius_b;
    let motion = cur_a - prev_a;
    let a = motion.length_squared();
    if a < DEGENERATE_SEGMENT_SQ {
        return cur_a.distance(center_b) < r;
    }

    let d = prev_a - center_b;
    let c = d.length_squared() - r * r;
    if c <= 0.0 {
        return true;
    }

    let b = 2.0 * d.dot(motion);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }

    // Starting outside means both roots share a sign; the smaller one is the entry
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t)
}

/// Beam test: a ray from `origin` along the unit vector `dir`, `max_len` long
/// and `extra_width` wide, against a circle.
///
/// The target counts as hit when its centre projects onto the ray within
/// `[0, max_len]` and lies within `target_radius + extra_width / 2` of it.
/// With `wrap_candidates`, up to three phantom copies of a target sitting near
/// an edge or corner are tested as well, so a beam that runs across the seam
/// still catches it.
pub fn line_sweep_hit(
    origin: Vec2,
    dir: Vec2,
    max_len: f32,
    target_center: Vec2,
    target_radius: f32,
    extra_width: f32,
    wrap_candidates: Option<(Vec2, f32)>,
) -> bool {
    let reach = target_radius + extra_width / 2.0;
    if ray_hits(origin, dir, max_len, target_center, reach) {
        return true;
    }

    match wrap_candidates {
        Some((bounds, edge_margin)) => phantom_positions(target_center, bounds, edge_margin)
            .into_iter()
            .any(|phantom| ray_hits(origin, dir, max_len, phantom, reach)),
        None => false,
    }
}

fn ray_hits(origin: Vec2, dir: Vec2, max_len: f32, center: Vec2, reach: f32) -> bool {
    let t = (center - origin).dot(dir);
    if !(0.0..=max_len).contains(&t) {
        return false;
    }
    let closest = origin + dir * t;
    center.distance(closest) < reach
}

/// Wrapped copies of `p` for each edge it is within `edge_margin` of.
///
/// Near one edge that is a single copy; near a corner it is three (both
/// single-axis shifts plus the diagonal).
pub fn phantom_positions(p: Vec2, bounds: Vec2, edge_margin: f32) -> Vec<Vec2> {
    let shift_x = if p.x < edge_margin {
        Some(bounds.x)
    } else if p.x > bounds.x - edge_margin {
        Some(-bounds.x)
    } else {
        None
    };
    let shift_y = if p.y < edge_margin {
        Some(bounds.y)
    } else if p.y > bounds.y - edge_margin {
        Some(-bounds.y)
    } else {
        None
    };

    let mut phantoms = Vec::with_capacity(3);
    if let Some(dx) = shift_x {
        phantoms.push(Vec2::new(p.x + dx, p.y));
    }
    if let Some(dy) = shift_y {
        phantoms.push(Vec2::new(p.x, p.y + dy));
    }
    if let (Some(dx), Some(dy)) = (shift_x, shift_y) {
        phantoms.push(Vec2::new(p.x + dx, p.y + dy));
    }
    phantoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_wrap_position_exact_edges() {
        let p = wrap_position(Vec2::new(-1.0, 601.0), BOUNDS, 0.0);
        assert!((p.x - 799.0).abs() < 1e-3);
        assert!((p.y - 1.0).abs() < 1e-3);

        let p = wrap_position(Vec2::new(800.0, 0.0), BOUNDS, 0.0);
        assert_eq!(p, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_wrap_position_with_margin() {
        // Inside the margin band: untouched
        let p = wrap_position(Vec2::new(-30.0, 620.0), BOUNDS, 40.0);
        assert_eq!(p, Vec2::new(-30.0, 620.0));

        // Past the band: reappears on the far side
        let p = wrap_position(Vec2::new(-41.0, 300.0), BOUNDS, 40.0);
        assert!((p.x - 839.0).abs() < 1e-3);
    }

    #[test]
    fn test_toroidal_distance_across_seam() {
        let a = Vec2::new(5.0, 300.0);
        let b = Vec2::new(795.0, 300.0);
        assert!((toroidal_distance(a, b, BOUNDS) - 10.0).abs() < 1e-3);
        assert!((distance(a, b) - 790.0).abs() < 1e-3);
    }

    #[test]
    fn test_circles_overlap_wrap_modes() {
        let a = Vec2::new(2.0, 2.0);
        let b = Vec2::new(798.0, 598.0);
        assert!(!circles_overlap(a, 5.0, b, 5.0, BOUNDS, false));
        assert!(circles_overlap(a, 5.0, b, 5.0, BOUNDS, true));
    }

    #[test]
    fn test_point_to_segment_clamps() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        assert!((point_to_segment_distance(Vec2::new(5.0, 3.0), start, end) - 3.0).abs() < 1e-5);
        // Beyond the end: distance to the endpoint, not the infinite line
        assert!((point_to_segment_distance(Vec2::new(13.0, 4.0), start, end) - 5.0).abs() < 1e-5);
        // Degenerate segment
        assert!((point_to_segment_distance(Vec2::new(3.0, 4.0), start, start) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_swept_hit_catches_tunneling() {
        // Small asteroid at the origin; projectile jumps from +3r to -3r in one tick
        let r = 10.0;
        let prev = Vec2::new(3.0 * r, 0.0);
        let cur = Vec2::new(-3.0 * r, 0.0);
        assert!(swept_circle_hit(prev, cur, 2.0, Vec2::ZERO, r));
        // The endpoint-only test misses it
        assert!(!circles_overlap(cur, 2.0, Vec2::ZERO, r, BOUNDS, false));
    }

    #[test]
    fn test_swept_hit_misses() {
        // Passing well above the target
        assert!(!swept_circle_hit(
            Vec2::new(-50.0, 30.0),
            Vec2::new(50.0, 30.0),
            2.0,
            Vec2::ZERO,
            10.0
        ));
        // Moving away, ending short of the target
        assert!(!swept_circle_hit(
            Vec2::new(30.0, 0.0),
            Vec2::new(60.0, 0.0),
            2.0,
            Vec2::ZERO,
            10.0
        ));
        // Heading toward the target but stopping before it
        assert!(!swept_circle_hit(
            Vec2::new(60.0, 0.0),
            Vec2::new(30.0, 0.0),
            2.0,
            Vec2::ZERO,
            10.0
        ));
    }

    #[test]
    fn test_swept_hit_degenerate_and_inside() {
        assert!(swept_circle_hit(
            Vec2::new(5.0, 0.0),
            Vec2::new(5.0, 0.0),
            2.0,
            Vec2::ZERO,
            10.0
        ));
        // Starts inside the combined radius
        assert!(swept_circle_hit(
            Vec2::new(1.0, 0.0),
            Vec2::new(40.0, 0.0),
            2.0,
            Vec2::ZERO,
            10.0
        ));
    }

    #[test]
    fn test_line_sweep_hit_forward_only() {
        let origin = Vec2::new(400.0, 300.0);
        let dir = Vec2::X;
        assert!(line_sweep_hit(origin, dir, 2000.0, Vec2::new(600.0, 305.0), 10.0, 5.0, None));
        // Behind the ship
        assert!(!line_sweep_hit(origin, dir, 2000.0, Vec2::new(200.0, 300.0), 10.0, 5.0, None));
        // Too far to the side
        assert!(!line_sweep_hit(origin, dir, 2000.0, Vec2::new(600.0, 320.0), 10.0, 5.0, None));
    }

    #[test]
    fn test_line_sweep_hit_phantom_across_seam() {
        // Beam fired straight down from near the bottom; target hugging the top edge
        let origin = Vec2::new(400.0, 590.0);
        let dir = Vec2::Y;
        let target = Vec2::new(400.0, 5.0);
        assert!(!line_sweep_hit(origin, dir, 2000.0, target, 10.0, 5.0, None));
        assert!(line_sweep_hit(
            origin,
            dir,
            2000.0,
            target,
            10.0,
            5.0,
            Some((BOUNDS, 20.0))
        ));
    }

    #[test]
    fn test_phantom_positions_counts() {
        assert!(phantom_positions(Vec2::new(400.0, 300.0), BOUNDS, 20.0).is_empty());
        assert_eq!(phantom_positions(Vec2::new(5.0, 300.0), BOUNDS, 20.0).len(), 1);
        let corner = phantom_positions(Vec2::new(795.0, 3.0), BOUNDS, 20.0);
        assert_eq!(corner.len(), 3);
        assert!(corner.contains(&Vec2::new(-5.0, 603.0)));
    }

    proptest! {
        #[test]
        fn prop_wrap_stays_in_band(
            x in -5000.0f32..5000.0,
            y in -5000.0f32..5000.0,
            margin in 0.0f32..60.0,
        ) {
            let p = wrap_position(Vec2::new(x, y), BOUNDS, margin);
            prop_assert!(in_wrap_band(p, BOUNDS, margin), "{p:?} margin {margin}");
        }

        #[test]
        fn prop_toroidal_never_exceeds_euclidean(
            ax in 0.0f32..800.0, ay in 0.0f32..600.0,
            bx in 0.0f32..800.0, by in 0.0f32..600.0,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            prop_assert!(toroidal_distance(a, b, BOUNDS) <= distance(a, b) + 1e-3);
        }

        #[test]
        fn prop_segment_distance_bounded_by_endpoints(
            px in -100.0f32..100.0, py in -100.0f32..100.0,
            ex in -100.0f32..100.0, ey in -100.0f32..100.0,
        ) {
            let p = Vec2::new(px, py);
            let end = Vec2::new(ex, ey);
            let d = point_to_segment_distance(p, Vec2::ZERO, end);
            prop_assert!(d <= p.length() + 1e-3);
            prop_assert!(d <= p.distance(end) + 1e-3);
        }
    }
}
