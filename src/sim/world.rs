/// WorldState: the complete snapshot of a running game.
///
/// ## Zone lists
///
/// Static geometry is grouped by behavior, not by subtype:
///   - `walls`          — block everything
///   - `no_drag_zones`  — dragged entities may not be placed inside
///   - `no_move_zones`  — block dragging and passive movement
///   - `doors.locked` / `doors.unlocked` — swapped by sensor state;
///     only the locked list collides
///   - `sensors`        — trigger the door swap
///
/// ## Camera shift
///
/// One shared offset added to every non-player bounding box. The player
/// anchors the screen; "movement" scrolls the world past it. Validated
/// mutations go through `try_shift`, which rolls the mutated axis back
/// if it would push a wall into the player, and fires the landing check
/// on the player's fall probe. `hard_reset` bypasses validation and is
/// reserved for level loads and the error path.
///
/// ## Modes
///
/// Pause / game-over / level-complete are a stack of `Mode` values
/// processed by the one scheduler loop, not nested event pumps.
/// Suspension is data: pushing a mode freezes the simulation, popping
/// resumes it.

use crate::config::{DragConfig, PhysicsConfig};
use crate::domain::drag::{DragAbility, DragGesture};
use crate::domain::entity::{bounds_of, Block, Entity, EntityKind, GoalKind, Handle};
use crate::domain::geometry::{Rect, Vec2};
use crate::domain::physics::below_probe;
use crate::sim::event::GameEvent;

/// View extent in world units.
pub const VIEW_W: f64 = 1000.0;
pub const VIEW_H: f64 = 600.0;

/// Fixed screen anchor for the player (top-left corner).
pub const PLAYER_SIZE: Vec2 = Vec2 { x: 30.0, y: 48.0 };
pub const PLAYER_ANCHOR: Vec2 = Vec2 { x: VIEW_W / 2.0 - PLAYER_SIZE.x, y: VIEW_H / 2.0 };

/// Steps of the recenter animation before acceleration takes over.
const RECENTER_SUBDIVISION: f64 = 600.0;

/// Below this remaining offset the recenter animation finishes at once.
const RECENTER_DONE_EPS: f64 = 0.1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    LevelSelect,
    Playing,
    Paused,
    LevelComplete,
    GameOver { error: bool },
    GameComplete,
}

impl Mode {
    /// Menu entries for the overlay modes; empty elsewhere.
    pub fn menu_options(self) -> &'static [&'static str] {
        match self {
            Mode::Paused => &["Resume Game", "Restart Level", "Level Select", "Quit Game"],
            Mode::LevelComplete => &["Next Level", "Replay Level", "Level Select"],
            Mode::GameOver { .. } => &["Replay Level", "Level Select", "Quit Game"],
            _ => &[],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShiftAxis {
    X,
    Y,
    Both,
}

/// The shared camera offset.
#[derive(Clone, Copy, Debug)]
pub struct ScreenShift {
    pub amount: Vec2,
    /// Set when the mutation retry loop faulted; cleared by the
    /// recenter animation or a level load.
    pub error: bool,
}

impl ScreenShift {
    pub fn new() -> Self {
        ScreenShift { amount: Vec2::ZERO, error: false }
    }

    /// Unvalidated set. Level load and the error path only.
    pub fn hard_reset(&mut self, v: Vec2) {
        self.amount = v;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Doors {
    pub locked: Vec<Block>,
    pub unlocked: Vec<Block>,
}

#[derive(Clone, Debug)]
pub struct SignPost {
    pub body: Block,
    pub text: String,
    pub activated: bool,
}

/// Camera recenter after a player drag: the world scrolls with
/// accelerating steps until the player is back on its anchor.
#[derive(Clone, Copy, Debug)]
pub struct RecenterAnim {
    anchor: Vec2,
    diff: Vec2,
    base: Vec2,
    step: Vec2,
    start_shift: Vec2,
    prev_gap: Option<f64>,
}

pub struct WorldState {
    // ── Static geometry ──
    pub walls: Vec<Block>,
    pub no_drag_zones: Vec<Block>,
    pub no_move_zones: Vec<Block>,
    pub doors: Doors,
    pub sensors: Vec<Block>,
    pub signs: Vec<SignPost>,

    // ── Movables ──
    pub player: Entity,
    pub enemies: Vec<Entity>,
    pub goals: Vec<Entity>,

    // ── Camera ──
    pub shift: ScreenShift,
    pub starting_shift: Vec2,
    pub recenter: Option<RecenterAnim>,

    // ── Drag ──
    pub ability: DragAbility,
    pub drag: Option<DragGesture>,

    // ── Tuning ──
    pub physics: PhysicsConfig,
    pub drag_cfg: DragConfig,

    // ── Modes / meta ──
    pub modes: Vec<Mode>,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub level_names: Vec<String>,
    pub select_cursor: usize,
    pub menu_cursor: usize,
    pub message: String,
    pub message_timer: u32,
}

// ── Construction ──

impl WorldState {
    pub fn new() -> Self {
        WorldState {
            walls: vec![],
            no_drag_zones: vec![],
            no_move_zones: vec![],
            doors: Doors::default(),
            sensors: vec![],
            signs: vec![],
            player: Entity::new(EntityKind::Player, PLAYER_ANCHOR, PLAYER_SIZE),
            enemies: vec![],
            goals: vec![],
            shift: ScreenShift::new(),
            starting_shift: Vec2::ZERO,
            recenter: None,
            ability: DragAbility::new(),
            drag: None,
            physics: PhysicsConfig::default(),
            drag_cfg: DragConfig::default(),
            modes: vec![Mode::LevelSelect],
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            level_names: vec![],
            select_cursor: 0,
            menu_cursor: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}

// ── Mode stack ──

impl WorldState {
    pub fn mode(&self) -> Mode {
        *self.modes.last().unwrap_or(&Mode::LevelSelect)
    }

    pub fn push_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    pub fn pop_mode(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    pub fn reset_modes(&mut self, mode: Mode) {
        self.modes.clear();
        self.modes.push(mode);
    }
}

// ── Entity access ──

impl WorldState {
    pub fn entity(&self, h: Handle) -> &Entity {
        match h {
            Handle::Player => &self.player,
            Handle::Enemy(i) => &self.enemies[i],
            Handle::Goal(i) => &self.goals[i],
        }
    }

    pub fn entity_mut(&mut self, h: Handle) -> &mut Entity {
        match h {
            Handle::Player => &mut self.player,
            Handle::Enemy(i) => &mut self.enemies[i],
            Handle::Goal(i) => &mut self.goals[i],
        }
    }

    /// Draggable movables in grab-priority order: player first, then
    /// enemies, then goals.
    pub fn draggable_handles(&self) -> Vec<Handle> {
        let mut out = vec![Handle::Player];
        out.extend((0..self.enemies.len()).map(Handle::Enemy));
        out.extend((0..self.goals.len()).map(Handle::Goal));
        out.retain(|&h| self.entity(h).caps.can_drag);
        out
    }
}

// ── Obstacle-set builders (all in shifted coordinates) ──

impl WorldState {
    fn push_blocks(&self, blocks: &[Block], out: &mut Vec<Rect>) {
        out.extend(blocks.iter().map(|b| b.rect(self.shift.amount)));
    }

    fn push_enemies_except(&self, except: Handle, out: &mut Vec<Rect>) {
        for (i, e) in self.enemies.iter().enumerate() {
            if Handle::Enemy(i) != except {
                out.push(bounds_of(e, self.shift.amount));
            }
        }
    }

    /// Walls + locked doors + no-move zones + enemies: what the camera
    /// validator and the jump probe consider solid.
    pub fn solid_rects(&self) -> Vec<Rect> {
        self.solid_rects_except(Handle::Player)
    }

    /// `solid_rects` with one enemy excluded (its own gravity/patrol).
    pub fn solid_rects_except(&self, except: Handle) -> Vec<Rect> {
        let mut out = Vec::new();
        self.push_blocks(&self.walls, &mut out);
        self.push_blocks(&self.doors.locked, &mut out);
        self.push_blocks(&self.no_move_zones, &mut out);
        self.push_enemies_except(except, &mut out);
        out
    }

    /// Everything a drag candidate may not overlap.
    pub fn drag_blockers(&self, except: Handle) -> Vec<Rect> {
        let mut out = Vec::new();
        self.push_blocks(&self.walls, &mut out);
        self.push_blocks(&self.doors.locked, &mut out);
        self.push_blocks(&self.no_drag_zones, &mut out);
        self.push_blocks(&self.no_move_zones, &mut out);
        self.push_enemies_except(except, &mut out);
        out
    }

    /// Soft-restriction set for the ghost-preview probe.
    pub fn zone_blockers(&self, except: Handle) -> Vec<Rect> {
        let mut out = Vec::new();
        self.push_blocks(&self.no_move_zones, &mut out);
        self.push_enemies_except(except, &mut out);
        out
    }

    /// Hard barriers for the corridor / last-eligible probes.
    pub fn barrier_rects(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.push_blocks(&self.walls, &mut out);
        self.push_blocks(&self.doors.locked, &mut out);
        self.push_blocks(&self.no_drag_zones, &mut out);
        out
    }

    /// Surfaces a goal activation can stand on.
    pub fn goal_standing_rects(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.push_blocks(&self.walls, &mut out);
        self.push_blocks(&self.doors.locked, &mut out);
        out
    }
}

// ── Validated camera mutation ──

impl WorldState {
    /// Set the shift (whole axes at once) with collision validation.
    ///
    /// On player overlap the mutated axis reverts to its prior value
    /// bit-for-bit. Afterwards — rolled back or not — the fall-probe
    /// landing check runs.
    pub fn try_shift(&mut self, axis: ShiftAxis, target: Vec2, events: &mut Vec<GameEvent>) {
        let old = self.shift.amount;
        match axis {
            ShiftAxis::X => self.shift.amount.x = target.x,
            ShiftAxis::Y => self.shift.amount.y = target.y,
            ShiftAxis::Both => self.shift.amount = target,
        }

        if self.player_overlaps_solid() {
            match axis {
                ShiftAxis::X => self.shift.amount.x = old.x,
                ShiftAxis::Y => self.shift.amount.y = old.y,
                ShiftAxis::Both => self.shift.amount = old,
            }
        }

        // Landing check on every validated mutation.
        let solids = self.solid_rects();
        let pr = bounds_of(&self.player, self.shift.amount);
        if below_probe(&pr).hits_any(&solids) {
            if let Some(v) = self.player.velocity {
                if v > 1.0 || v < 0.0 {
                    events.push(GameEvent::Land);
                }
                self.player.velocity = Some(0.0);
            }
        }
    }

    /// Additive validated mutation of both axes at once.
    pub fn try_shift_add(&mut self, delta: Vec2, events: &mut Vec<GameEvent>) {
        let target = self.shift.amount + delta;
        self.try_shift(ShiftAxis::Both, target, events);
    }

    fn player_overlaps_solid(&self) -> bool {
        let solids = self.solid_rects();
        bounds_of(&self.player, self.shift.amount).hits_any(&solids)
    }

    /// The mutation retry loop exceeded its safety bound without
    /// resolving: surface the distinguishable error game-over and snap
    /// the camera back to the level's starting value.
    pub fn shift_fault(&mut self, events: &mut Vec<GameEvent>) {
        self.shift.error = true;
        self.shift.hard_reset(self.starting_shift);
        events.push(GameEvent::PlayerKilled { error: true });
    }
}

// ── Recenter animation ──

impl WorldState {
    /// Begin scrolling the world so the player returns to `anchor`
    /// (its pre-drag world position).
    pub fn start_recenter(&mut self, anchor: Vec2) {
        let diff = self.player.pos - anchor;
        let base = Vec2::new(diff.x / RECENTER_SUBDIVISION, diff.y / RECENTER_SUBDIVISION);
        self.recenter = Some(RecenterAnim {
            anchor,
            diff,
            base,
            step: base,
            start_shift: self.shift.amount,
            prev_gap: None,
        });
    }

    /// One animation frame. Finishes when the player's remaining gap
    /// stops shrinking, then snaps everything into place.
    pub fn tick_recenter(&mut self, events: &mut Vec<GameEvent>) {
        let Some(mut anim) = self.recenter.take() else { return };

        let mut done = anim.diff.x.abs().max(anim.diff.y.abs()) <= RECENTER_DONE_EPS;

        if !done {
            self.try_shift_add(-anim.step, events);
            self.player.pos -= anim.step;
            // Accelerate: each frame moves one base step further.
            anim.step += anim.base;

            let gap = self.player.pos.manhattan(anim.anchor);
            if let Some(prev) = anim.prev_gap {
                if prev < gap {
                    done = true;
                }
            }
            anim.prev_gap = Some(gap);
        }

        if done {
            self.player.pos = anim.anchor;
            let target = anim.start_shift - anim.diff;
            self.try_shift(ShiftAxis::Both, target, events);
            self.player.last_eligible = Some(anim.anchor);
            if self.shift.error {
                self.shift.hard_reset(self.starting_shift);
                self.shift.error = false;
            }
        } else {
            self.recenter = Some(anim);
        }
    }
}

// ── Tracked movables for sensors ──

impl WorldState {
    /// Rects of everything a sensor reacts to: the player, enemies,
    /// and portable goals.
    pub fn sensor_tracked_rects(&self) -> Vec<Rect> {
        let mut out = vec![bounds_of(&self.player, self.shift.amount)];
        out.extend(self.enemies.iter().map(|e| bounds_of(e, self.shift.amount)));
        out.extend(
            self.goals
                .iter()
                .filter(|g| g.kind == EntityKind::Goal(GoalKind::Portable))
                .map(|g| bounds_of(g, self.shift.amount)),
        );
        out
    }
}
