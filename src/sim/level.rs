/// Level data: typed tile records and the wholesale world rebuild.
///
/// The loader consumes already-parsed records — grid coordinates in
/// tile units, converted to world units here. Text parsing lives with
/// whatever produced the records; the built-in set below is constructed
/// directly.
///
/// A load discards every previous entity and zone and rebuilds from the
/// record list. Nothing survives a level switch.

use crate::domain::drag::DragAbility;
use crate::domain::entity::{Block, Entity, EntityKind, GoalKind};
use crate::domain::geometry::Vec2;
use crate::sim::world::{Mode, ScreenShift, SignPost, WorldState, PLAYER_ANCHOR, PLAYER_SIZE};

/// World units per grid cell.
pub const TILE: f64 = 50.0;

pub const GUARD_SIZE: Vec2 = Vec2 { x: 30.0, y: 48.0 };
pub const BOULDER_SIZE: Vec2 = Vec2 { x: 50.0, y: 50.0 };
pub const SPIKES_SIZE: Vec2 = Vec2 { x: 50.0, y: 20.0 };
pub const GOAL_SIZE: Vec2 = Vec2 { x: 50.0, y: 50.0 };

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    Guard,
    Spikes,
    Boulder,
}

#[derive(Clone, Debug)]
pub enum RecordKind {
    Wall,
    NoDrag,
    NoMove,
    Door,
    Sensor,
    Sign(String),
    Goal(GoalKind),
    Enemy(EnemyKind),
}

/// One typed tile record. `x`/`y` are the grid position; `w`/`h` span
/// block records (entities carry their own size).
#[derive(Clone, Debug)]
pub struct TileRecord {
    pub kind: RecordKind,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl TileRecord {
    pub fn block(kind: RecordKind, x: f64, y: f64, w: f64, h: f64) -> Self {
        TileRecord { kind, x, y, w, h }
    }

    /// Single-tile record (sensors, goals, signs, enemies).
    pub fn at(kind: RecordKind, x: f64, y: f64) -> Self {
        TileRecord { kind, x, y, w: 1.0, h: 1.0 }
    }
}

#[derive(Clone, Debug)]
pub struct LevelData {
    pub name: String,
    /// Starting camera offset, grid units.
    pub start_shift: (f64, f64),
    pub records: Vec<TileRecord>,
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Rebuild the world from a level. The previous level is discarded
/// first, so a failed load leaves no entities rather than a partial
/// mix. Out-of-range means the set is exhausted: the game is complete.
pub fn load_level(world: &mut WorldState, idx: usize, levels: &[LevelData]) -> bool {
    world.walls.clear();
    world.no_drag_zones.clear();
    world.no_move_zones.clear();
    world.doors.locked.clear();
    world.doors.unlocked.clear();
    world.sensors.clear();
    world.signs.clear();
    world.enemies.clear();
    world.goals.clear();
    world.player = Entity::new(EntityKind::Player, PLAYER_ANCHOR, PLAYER_SIZE);
    world.drag = None;
    world.recenter = None;
    world.ability = DragAbility::new();

    let Some(def) = levels.get(idx) else {
        world.reset_modes(Mode::GameComplete);
        return false;
    };

    for rec in &def.records {
        let pos = Vec2::new(rec.x * TILE, rec.y * TILE);
        let span = Vec2::new(rec.w * TILE, rec.h * TILE);
        match &rec.kind {
            RecordKind::Wall => world.walls.push(Block::new(pos, span)),
            RecordKind::NoDrag => world.no_drag_zones.push(Block::new(pos, span)),
            RecordKind::NoMove => world.no_move_zones.push(Block::new(pos, span)),
            RecordKind::Door => world.doors.locked.push(Block::new(pos, span)),
            RecordKind::Sensor => world.sensors.push(Block::new(pos, Vec2::new(TILE, TILE))),
            RecordKind::Sign(text) => world.signs.push(SignPost {
                body: Block::new(pos, Vec2::new(TILE, TILE)),
                text: text.clone(),
                activated: false,
            }),
            RecordKind::Goal(kind) => {
                world.goals.push(Entity::new(EntityKind::Goal(*kind), pos, GOAL_SIZE));
            }
            RecordKind::Enemy(kind) => {
                let e = match kind {
                    EnemyKind::Guard => Entity::new(EntityKind::Guard, pos, GUARD_SIZE),
                    EnemyKind::Spikes => Entity::new(EntityKind::Spikes, pos, SPIKES_SIZE),
                    EnemyKind::Boulder => Entity::new(EntityKind::Boulder, pos, BOULDER_SIZE),
                };
                world.enemies.push(e);
            }
        }
    }

    let shift = Vec2::new(def.start_shift.0 * TILE, def.start_shift.1 * TILE);
    world.shift = ScreenShift::new();
    world.shift.hard_reset(shift);
    world.starting_shift = shift;

    world.current_level = idx;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();
    world.set_message(&def.name, 150);
    world.reset_modes(Mode::Playing);
    true
}

// ══════════════════════════════════════════════════════════════
// Built-in levels
// ══════════════════════════════════════════════════════════════

/// The bundled level set. Geometry is laid out around the player's
/// fixed anchor (grid ~9.4, 6 at zero shift).
pub fn builtin_levels() -> Vec<LevelData> {
    use EnemyKind::*;
    use RecordKind::*;

    vec![
        LevelData {
            name: "A1 L1".to_string(),
            start_shift: (0.0, 0.0),
            records: vec![
                TileRecord::block(Wall, -2.0, 7.0, 24.0, 1.0),
                TileRecord::block(Wall, -2.0, -4.0, 1.0, 11.0),
                TileRecord::block(Wall, 21.0, -4.0, 1.0, 11.0),
                TileRecord::at(Sign("Drag yourself to the flag, then hold up.".to_string()), 11.0, 6.0),
                TileRecord::at(Goal(GoalKind::Stationary), 17.0, 6.0),
            ],
        },
        LevelData {
            name: "A1 L2".to_string(),
            start_shift: (0.0, 0.0),
            records: vec![
                TileRecord::block(Wall, -2.0, 7.0, 26.0, 1.0),
                TileRecord::block(Wall, -2.0, -4.0, 1.0, 11.0),
                TileRecord::block(Wall, 23.0, -4.0, 1.0, 11.0),
                // A pillar with a drag-restricted channel over it.
                TileRecord::block(Wall, 13.0, 4.0, 1.0, 3.0),
                TileRecord::block(NoDrag, 13.0, 0.0, 1.0, 3.0),
                TileRecord::block(NoMove, 6.0, 5.0, 2.0, 2.0),
                TileRecord::at(Sign("The carried beacon must rest before it counts.".to_string()), 3.0, 6.0),
                TileRecord::at(Goal(GoalKind::Portable), 17.0, 2.0),
            ],
        },
        LevelData {
            name: "A1 L3".to_string(),
            start_shift: (0.0, 0.0),
            records: vec![
                TileRecord::block(Wall, -2.0, 7.0, 28.0, 1.0),
                TileRecord::block(Wall, -2.0, -4.0, 1.0, 11.0),
                TileRecord::block(Wall, 25.0, -4.0, 1.0, 11.0),
                // A doorway in a dividing wall, opened by the pressure
                // sensor on the left.
                TileRecord::block(Wall, 16.0, -4.0, 1.0, 9.0),
                TileRecord::block(Door, 16.0, 5.0, 1.0, 2.0),
                TileRecord::at(Sensor, 5.0, 6.0),
                TileRecord::at(Enemy(Boulder), 3.0, 2.0),
                TileRecord::at(Enemy(Guard), 20.0, 6.04),
                TileRecord::at(Goal(GoalKind::Stationary), 23.0, 6.0),
            ],
        },
        LevelData {
            name: "A2 L1".to_string(),
            start_shift: (0.0, 0.0),
            records: vec![
                TileRecord::block(Wall, -2.0, 7.0, 30.0, 1.0),
                TileRecord::block(Wall, -2.0, -4.0, 1.0, 11.0),
                TileRecord::block(Wall, 27.0, -4.0, 1.0, 11.0),
                TileRecord::block(Wall, 14.0, 5.0, 3.0, 2.0),
                TileRecord::at(Enemy(Spikes), 12.0, 6.6),
                TileRecord::at(Enemy(Spikes), 18.0, 6.6),
                TileRecord::at(Sign("The one true bagel lies beyond the spikes.".to_string()), 9.0, 6.0),
                TileRecord::at(Goal(GoalKind::Final), 15.0, 4.0),
            ],
        },
    ]
}
