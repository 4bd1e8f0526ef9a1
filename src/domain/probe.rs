/// Line-sampled collision probe.
///
/// A per-frame position delta can exceed the thickness of a wall, so a
/// plain before/after overlap test lets fast drags tunnel straight
/// through geometry. This probe reconstructs the travelled segment and
/// re-checks it: walk the segment at a fixed stride, place a probe box
/// at each sample, and report whether anything in the obstacle set was
/// crossed.
///
/// The walk always follows whichever axis has the larger absolute
/// delta, which keeps the gap between consecutive samples at most one
/// stride for any slope.

use super::geometry::{Rect, Vec2};

/// Divisors below this are treated as zero.
const CLOSE_TO_ZERO: f64 = 0.00001;

/// Slope stand-in for an effectively vertical segment.
const VERTICAL_GRADIENT: f64 = 9999.0;

/// Does a probe box of `probe` size, swept along the segment from
/// `from` to `to`, intersect any rect in `obstacles`?
pub fn blocks_between(obstacles: &[Rect], probe: Vec2, from: Vec2, to: Vec2, stride: f64) -> bool {
    let gradient = if (to.x - from.x).abs() > CLOSE_TO_ZERO {
        (to.y - from.y) / (to.x - from.x)
    } else {
        VERTICAL_GRADIENT
    };
    let c = to.y - gradient * to.x;

    let (z1, z2, along_x) = if (to.x - from.x).abs() > (to.y - from.y).abs() {
        (from.x, to.x, true)
    } else {
        (from.y, to.y, false)
    };

    let step = if z1 > z2 { -(stride as i64) } else { stride as i64 };
    let stop = z2 as i64 + 1;
    let mut z = z1 as i64;

    while if step > 0 { z < stop } else { z > stop } {
        let (x, y) = if along_x {
            let x = z as f64;
            (x, gradient * x + c)
        } else {
            let y = z as f64;
            let x = if gradient.abs() > CLOSE_TO_ZERO { (y - c) / gradient } else { to.x };
            (x, y)
        };

        if Rect::new(x, y, probe.x, probe.y).hits_any(obstacles) {
            return true;
        }
        z += step;
    }

    false
}
