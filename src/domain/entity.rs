/// Entities and static blocks.
///
/// One `Entity` struct covers the player, enemies, and goals; behavior
/// differences are carried by `EntityKind` plus the `Caps` flags
/// (draggable / patrolling / gravity-affected), not by a type hierarchy.
/// Static geometry is the bare `Block`; whether a block acts as a wall,
/// a no-drag zone, a door, or a sensor is decided by which world list
/// it lives in.
///
/// ## Coordinates
///
/// Entity positions are world-space. The *shifted* position — world plus
/// the camera shift — is what rendering and most collision tests use.
/// The player is the one exception: it anchors the screen, so its world
/// and shifted positions coincide and the world scrolls around it.
/// `bounds_of` is the single place that rule lives.

use super::geometry::{Rect, Vec2};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoalKind {
    Stationary,
    Portable,
    Final,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Player,
    Guard,
    Spikes,
    Boulder,
    Goal(GoalKind),
}

/// Movement capabilities. Which systems touch an entity each tick.
#[derive(Clone, Copy, Debug)]
pub struct Caps {
    pub can_drag: bool,
    pub can_move: bool,
    pub can_fall: bool,
}

/// Hover feedback on a draggable entity. Purely visual.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tint {
    Ready,
    Cooldown,
    Obstructed,
}

/// Stable reference to a movable entity across the world's lists.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Handle {
    Player,
    Enemy(usize),
    Goal(usize),
}

// ══════════════════════════════════════════════════════════════
// Opacity mask
// ══════════════════════════════════════════════════════════════

/// Per-pixel opacity for precise click and overlap tests.
/// Entities without a mask are treated as fully opaque.
#[derive(Clone, Debug)]
pub struct Mask {
    w: i32,
    h: i32,
    bits: Vec<bool>,
}

impl Mask {
    /// Fully opaque mask.
    #[allow(dead_code)]
    pub fn solid(w: usize, h: usize) -> Self {
        Mask { w: w as i32, h: h as i32, bits: vec![true; w * h] }
    }

    /// Build from ASCII rows: '#' = opaque, anything else transparent.
    #[allow(dead_code)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let h = rows.len() as i32;
        let w = rows.first().map_or(0, |r| r.len()) as i32;
        let mut bits = Vec::with_capacity((w * h) as usize);
        for row in rows {
            for ch in row.chars() {
                bits.push(ch == '#');
            }
        }
        Mask { w, h, bits }
    }

    /// Filled disc inscribed in a size × size square (boulder shape).
    pub fn disc(size: usize) -> Self {
        let s = size as i32;
        let r = size as f64 / 2.0;
        let mut bits = Vec::with_capacity(size * size);
        for y in 0..s {
            for x in 0..s {
                let dx = x as f64 + 0.5 - r;
                let dy = y as f64 + 0.5 - r;
                bits.push(dx * dx + dy * dy <= r * r);
            }
        }
        Mask { w: s, h: s, bits }
    }

    /// Opacity at a local pixel. Out of range is transparent.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.w || y >= self.h {
            return false;
        }
        self.bits[(y * self.w + x) as usize]
    }

    /// Does any opaque pixel of `self` coincide with an opaque pixel of
    /// `other`, where `other`'s origin sits at (ox, oy) in self-local
    /// coordinates?
    pub fn overlaps(&self, other: &Mask, ox: i32, oy: i32) -> bool {
        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (ox + other.w).min(self.w);
        let y1 = (oy + other.h).min(self.h);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - ox, y - oy) {
                    return true;
                }
            }
        }
        false
    }

    /// Does any opaque pixel fall inside the given local-coordinate
    /// region? Used when the counterpart has no mask (fully opaque).
    pub fn any_in(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        for y in y0.max(0)..y1.min(self.h) {
            for x in x0.max(0)..x1.min(self.w) {
                if self.get(x, y) {
                    return true;
                }
            }
        }
        false
    }
}

// ══════════════════════════════════════════════════════════════
// Entity
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    /// World-space top-left corner.
    pub pos: Vec2,
    pub size: Vec2,
    pub caps: Caps,
    /// Vertical speed, positive = downward. None for non-physical entities.
    pub velocity: Option<f64>,
    /// Signed patrol step per tick (world units).
    pub patrol_step: f64,
    pub facing: Facing,
    /// Last drag-verified legal shifted position. Mutated only by the
    /// drag resolver.
    pub last_eligible: Option<Vec2>,
    pub mask: Option<Mask>,
    pub tint: Option<Tint>,
    /// Shifted position of a rejected drag candidate, shown translucent.
    pub ghost: Option<Vec2>,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2, size: Vec2) -> Self {
        let (caps, velocity) = match kind {
            EntityKind::Player => (Caps { can_drag: true, can_move: true, can_fall: true }, Some(0.0)),
            EntityKind::Guard => (Caps { can_drag: true, can_move: true, can_fall: true }, Some(0.0)),
            EntityKind::Boulder => (Caps { can_drag: true, can_move: false, can_fall: true }, Some(0.0)),
            EntityKind::Spikes => (Caps { can_drag: false, can_move: false, can_fall: false }, None),
            EntityKind::Goal(GoalKind::Portable) => {
                (Caps { can_drag: true, can_move: false, can_fall: true }, Some(0.0))
            }
            EntityKind::Goal(_) => (Caps { can_drag: false, can_move: false, can_fall: false }, None),
        };
        let mask = match kind {
            EntityKind::Boulder => Some(Mask::disc(size.x as usize)),
            _ => None,
        };
        Entity {
            kind,
            pos,
            size,
            caps,
            velocity,
            patrol_step: 1.0,
            facing: Facing::Right,
            last_eligible: None,
            mask,
            tint: None,
            ghost: None,
        }
    }

    /// Position with the camera shift applied. The player anchors the
    /// screen and ignores the shift.
    pub fn shifted_pos(&self, shift: Vec2) -> Vec2 {
        if self.kind == EntityKind::Player {
            self.pos
        } else {
            self.pos + shift
        }
    }

    /// Place the entity so its shifted position equals `v`.
    pub fn set_shifted_pos(&mut self, v: Vec2, shift: Vec2) {
        self.pos = if self.kind == EntityKind::Player { v } else { v - shift };
    }

    /// Opacity test at a bounds-local point. No mask = opaque.
    pub fn mask_hit(&self, local_x: f64, local_y: f64) -> bool {
        match &self.mask {
            Some(m) => m.get(local_x as i32, local_y as i32),
            None => true,
        }
    }
}

/// Bounding box of an entity under a given camera shift.
pub fn bounds_of(e: &Entity, shift: Vec2) -> Rect {
    let p = e.shifted_pos(shift);
    Rect::new(p.x, p.y, e.size.x, e.size.y)
}

/// Pixel-precise overlap between two entities whose bounding boxes
/// already intersect at `ar` / `br`.
pub fn masks_collide(a: &Entity, ar: &Rect, b: &Entity, br: &Rect) -> bool {
    let ox = (br.x - ar.x) as i32;
    let oy = (br.y - ar.y) as i32;
    match (&a.mask, &b.mask) {
        (None, None) => true,
        (Some(ma), Some(mb)) => ma.overlaps(mb, ox, oy),
        (Some(ma), None) => ma.any_in(ox, oy, ox + br.w as i32, oy + br.h as i32),
        (None, Some(mb)) => {
            let rx = (ar.x - br.x) as i32;
            let ry = (ar.y - br.y) as i32;
            mb.any_in(rx, ry, rx + ar.w as i32, ry + ar.h as i32)
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Static blocks
// ══════════════════════════════════════════════════════════════

/// Axis-aligned static geometry. Always rendered and collided at
/// world + shift.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Block {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Block { pos, size }
    }

    pub fn rect(&self, shift: Vec2) -> Rect {
        Rect::new(self.pos.x + shift.x, self.pos.y + shift.y, self.size.x, self.size.y)
    }
}

// ══════════════════════════════════════════════════════════════
// Frame input snapshot
// ══════════════════════════════════════════════════════════════

/// Named button set the core reads once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Buttons {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    pub modifier: bool,
    pub confirm: bool,
    pub cancel: bool,
    pub primary: bool,
    pub secondary: bool,
}

/// Immutable per-frame input: current + previous button state and the
/// pointer in world units. The core reads, never writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub held: Buttons,
    pub prev: Buttons,
    pub pointer: Vec2,
    pub quit: bool,
}

impl FrameInput {
    pub fn jump_pressed(&self) -> bool {
        self.held.jump && !self.prev.jump
    }

    pub fn confirm_pressed(&self) -> bool {
        self.held.confirm && !self.prev.confirm
    }

    pub fn cancel_pressed(&self) -> bool {
        self.held.cancel && !self.prev.cancel
    }

    pub fn up_pressed(&self) -> bool {
        self.held.up && !self.prev.up
    }

    pub fn down_pressed(&self) -> bool {
        self.held.down && !self.prev.down
    }
}
