/// Vertical kinematics — shared by the player and the mobs.
///
/// Discrete time: each tick advances `delta = v·t + ½·a·t²` and
/// accumulates `v += a·t`, clamped to terminal velocity. Velocity is
/// positive downward; the jump impulse is negative.
///
/// The two consumers apply the delta differently:
///   - Player: as a negative camera-shift-y mutation (the world scrolls
///     up past the fixed screen anchor). That path lives in `sim::step`
///     because it goes through the validated shift mutator.
///   - Mobs: directly to the shifted y, then `settle` snaps the entity
///     to rest exactly on the first obstacle's top edge.

use super::entity::{bounds_of, Entity};
use super::geometry::{Rect, Vec2};
use crate::config::PhysicsConfig;

/// One tick of the kinematic equations: returns the fall delta for this
/// tick and the accumulated (clamped) velocity for the next.
pub fn fall_step(velocity: f64, cfg: &PhysicsConfig) -> (f64, f64) {
    let t = cfg.time_step;
    let a = cfg.gravity;
    let delta = velocity * t + 0.5 * a * t * t;
    let next = (velocity + a * t).min(cfg.terminal_velocity());
    (delta, next)
}

/// The one-pixel-below probe box for a bounding box: tests for a
/// standable surface without moving the entity.
pub fn below_probe(r: &Rect) -> Rect {
    Rect::new(r.x, r.y + 1.0, r.w, r.h)
}

/// Is there a standable surface directly beneath this box?
pub fn standing_on(r: &Rect, obstacles: &[Rect]) -> bool {
    below_probe(r).hits_any(obstacles)
}

/// Jump impulse for this press; the modifier turns it into a short hop.
pub fn jump_impulse(cfg: &PhysicsConfig, modifier: bool) -> f64 {
    if modifier {
        cfg.jump_velocity / 2.0 - 2.0
    } else {
        cfg.jump_velocity
    }
}

/// Apply one gravity tick to a mob and settle it onto whatever it
/// lands on. `obstacles` are shifted-space rects excluding the mob
/// itself. Returns true when the mob came to rest this tick.
pub fn mob_fall(e: &mut Entity, shift: Vec2, obstacles: &[Rect], cfg: &PhysicsConfig) -> bool {
    let Some(v) = e.velocity else { return false };
    let (delta, next) = fall_step(v, cfg);
    e.velocity = Some(next);
    e.pos.y += delta;

    let r = bounds_of(e, shift);
    if let Some(hit) = below_probe(&r).first_hit(obstacles) {
        // Rest exactly on the obstacle's top edge (world coordinates:
        // the obstacle rect is shifted, the entity position is not).
        e.pos.y = (obstacles[hit].y - shift.y) - e.size.y;
        e.velocity = Some(0.0);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EntityKind;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    #[test]
    fn fall_step_matches_kinematics() {
        let (delta, next) = fall_step(0.0, &cfg());
        // v·t + ½·a·t² with v=0, t=0.1, a=9.81
        assert!((delta - 0.04905).abs() < 1e-9);
        assert!((next - 0.981).abs() < 1e-9);

        let (delta, _) = fall_step(10.0, &cfg());
        assert!((delta - 1.04905).abs() < 1e-9);
    }

    #[test]
    fn velocity_clamps_at_terminal() {
        let c = cfg();
        let terminal = c.terminal_velocity();
        let mut v = 0.0;
        for _ in 0..500 {
            let (_, next) = fall_step(v, &c);
            v = next;
        }
        assert_eq!(v, terminal);
        assert_eq!(terminal, 130.0);
    }

    #[test]
    fn jump_impulse_modifier_halves() {
        let c = cfg();
        assert_eq!(jump_impulse(&c, false), -65.0);
        assert_eq!(jump_impulse(&c, true), -34.5);
    }

    #[test]
    fn mob_settles_exactly_on_obstacle_top() {
        let c = cfg();
        let shift = Vec2::new(30.0, -10.0);
        let mut e = Entity::new(EntityKind::Boulder, Vec2::new(100.0, 0.0), Vec2::new(50.0, 50.0));
        // Floor whose shifted top edge sits at y = 290.
        let floor = [Rect::new(0.0, 290.0, 1000.0, 50.0)];

        let mut landed = false;
        for _ in 0..400 {
            if mob_fall(&mut e, shift, &floor, &c) {
                landed = true;
                break;
            }
        }
        assert!(landed, "mob never landed");
        assert_eq!(e.velocity, Some(0.0));
        // Shifted bottom edge == floor top edge, exactly.
        let r = bounds_of(&e, shift);
        assert_eq!(r.y + r.h, 290.0);
    }

    #[test]
    fn mob_keeps_falling_through_open_space() {
        let c = cfg();
        let mut e = Entity::new(EntityKind::Boulder, Vec2::new(100.0, 0.0), Vec2::new(50.0, 50.0));
        let before = e.pos.y;
        assert!(!mob_fall(&mut e, Vec2::ZERO, &[], &c));
        assert!(e.pos.y > before - 1e-9);
        assert!(e.velocity.unwrap() > 0.0);
    }

    #[test]
    fn standing_probe_detects_surface_without_moving() {
        let r = Rect::new(0.0, 52.0, 30.0, 48.0);
        let floor = [Rect::new(0.0, 100.0, 100.0, 10.0)];
        // Bottom edge at 100 touches the floor top: the entity itself
        // does not collide, the one-pixel probe does.
        assert!(!r.hits_any(&floor));
        assert!(standing_on(&r, &floor));
    }
}
