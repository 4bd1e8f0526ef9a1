/// Mob behavior: reversing patrol walkers and the boulder crush rule.

use super::entity::{bounds_of, Entity, Facing};
use super::geometry::{Rect, Vec2};
use super::physics::below_probe;

/// One patrol tick: step in the stored direction; if the step collides
/// or there is no floor under the next step, undo it and reverse.
/// `obstacles` are shifted-space rects excluding the mob itself.
pub fn patrol(e: &mut Entity, shift: Vec2, obstacles: &[Rect]) {
    e.pos.x += e.patrol_step;

    let r = bounds_of(e, shift);
    let dir = if e.patrol_step < 0.0 {
        -1.0
    } else if e.patrol_step > 0.0 {
        1.0
    } else {
        0.0
    };
    // Floor probe one body-width ahead, one pixel down.
    let ahead = Rect::new(r.x + e.size.x * dir, r.y + 1.0, r.w, r.h);
    let would_fall = !ahead.hits_any(obstacles);

    if r.hits_any(obstacles) || would_fall {
        e.pos.x -= e.patrol_step;
        e.patrol_step = -e.patrol_step;
    }

    e.facing = if e.patrol_step < 0.0 { Facing::Left } else { Facing::Right };
}

/// Crush rule: a falling boulder directly above another movable kills
/// it. `velocity` is the boulder's speed going into this tick — a
/// boulder that lands on its victim this very tick still crushes, even
/// though settling zeroed its stored velocity. `others` are
/// shifted-space rects of the candidates (the boulder itself excluded);
/// returns the index of the victim, if any.
pub fn crush_victim(boulder: &Entity, velocity: f64, shift: Vec2, others: &[Rect]) -> Option<usize> {
    if velocity == 0.0 {
        return None;
    }
    below_probe(&bounds_of(boulder, shift)).first_hit(others)
}
