/// The step function: advances the world by one frame of play.
///
/// Processing order:
///   1. Recenter animation (exclusive while active)
///   2. Active drag gesture (exclusive while the button is held)
///   3. Cooldown tick + hover / grab
///   4. Walking + enemy contact
///   5. Player gravity and jumping
///   6. Signs
///   7. Mob gravity, patrol, crush
///   8. Door / sensor state
///   9. Goal completion
///
/// Steps 1 and 2 return early: a drag (and the recenter that follows a
/// player drag) suspends the rest of the simulation, the frame-loop
/// equivalent of the original modal gesture. Kill outcomes also return
/// early — the scheduler switches modes off the emitted events.

use crate::domain::ai;
use crate::domain::drag::{DragGesture, DragObstacles};
use crate::domain::entity::{bounds_of, EntityKind, FrameInput, Handle, Tint};
use crate::domain::geometry::{Rect, Vec2};
use crate::domain::physics;
use crate::domain::rules::{self, GoalVerdict};
use crate::sim::event::GameEvent;
use crate::sim::world::{Mode, ShiftAxis, WorldState, VIEW_H, VIEW_W};

/// Upper bound on the reject-and-decrement shift retry. Documented
/// error path: give up on the frame's mutation when exhausted.
const MAX_SHIFT_RETRIES: usize = 200;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: &FrameInput, dt: f64) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if world.mode() != Mode::Playing {
        return events;
    }

    world.tick_message();

    if world.recenter.is_some() {
        world.tick_recenter(&mut events);
        return events;
    }

    if world.drag.is_some() {
        resolve_drag(world, input, &mut events);
        return events;
    }

    world.ability.tick(dt);
    resolve_hover_and_grab(world, input, &mut events);
    if world.drag.is_some() {
        return events;
    }

    if resolve_walking(world, input, &mut events) {
        return events;
    }
    resolve_player_gravity(world, input, &mut events);
    resolve_signs(world, input);
    resolve_mobs(world, &mut events);
    if resolve_doors(world, &mut events) {
        return events;
    }
    resolve_goals(world, input, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Drag gesture
// ══════════════════════════════════════════════════════════════

fn resolve_drag(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    let Some(mut gesture) = world.drag.take() else { return };

    if input.held.primary {
        drag_update(world, &mut gesture, input.pointer);
        world.drag = Some(gesture);
        return;
    }

    // Released: charge the cooldown and, for the player, scroll the
    // world back to the anchor.
    let cooldown = gesture
        .cooldown_secs(world.drag_cfg.recharge_min_secs, world.drag_cfg.recharge_max_secs);
    world.entity_mut(gesture.target).ghost = None;
    if gesture.target == Handle::Player {
        world.start_recenter(gesture.origin_world);
    }
    world.ability.start_cooldown(cooldown);
    world.ability.in_use = false;
    events.push(GameEvent::DragEnded);
}

fn drag_update(world: &mut WorldState, gesture: &mut DragGesture, pointer: Vec2) {
    let target = gesture.target;
    let blockers = world.drag_blockers(target);
    let zones = world.zone_blockers(target);
    let barriers = world.barrier_rects();
    let obs = DragObstacles { blockers: &blockers, zones: &zones, barriers: &barriers };
    let shift = world.shift.amount;
    let stride = world.drag_cfg.probe_stride;
    gesture.update(world.entity_mut(target), shift, pointer, &obs, stride);
}

fn resolve_hover_and_grab(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    let pointer = input.pointer;
    let shift = world.shift.amount;
    let handles = world.draggable_handles();

    if input.held.primary && world.ability.ready() {
        for &h in &handles {
            let gesture = DragGesture::begin(
                world.entity_mut(h),
                h,
                shift,
                pointer,
                Vec2::new(VIEW_W, VIEW_H),
            );
            if let Some(mut gesture) = gesture {
                world.ability.in_use = true;
                events.push(GameEvent::DragStarted);
                drag_update(world, &mut gesture, pointer);
                world.drag = Some(gesture);
                return;
            }
        }
    }

    // Hover affordance: green when a grab would work, red on cooldown.
    let in_use = world.ability.in_use;
    let on_cooldown = world.ability.recharge_left > 0.0;
    for &h in &handles {
        let e = world.entity_mut(h);
        let r = bounds_of(e, shift);
        let over = r.contains(pointer) && e.mask_hit(pointer.x - r.x, pointer.y - r.y);
        e.tint = if over && !in_use {
            Some(if on_cooldown { Tint::Cooldown } else { Tint::Ready })
        } else {
            None
        };
    }
}

// ══════════════════════════════════════════════════════════════
// Player movement
// ══════════════════════════════════════════════════════════════

/// Reject-and-decrement retry for a camera mutation: when the full
/// delta is refused, creep toward zero one unit at a time until some
/// part of it fits or the delta becomes negligible. A delta that never
/// resolves within the bound (squeezed between obstacles, the decrement
/// ping-pongs across zero) is the fatal camera fault.
fn shift_retry(world: &mut WorldState, axis: ShiftAxis, mut delta: f64, events: &mut Vec<GameEvent>) {
    for _ in 0..MAX_SHIFT_RETRIES {
        let old = world.shift.amount;
        let target = match axis {
            ShiftAxis::X => Vec2::new(old.x + delta, old.y),
            _ => Vec2::new(old.x, old.y + delta),
        };
        world.try_shift(axis, target, events);

        let applied = match axis {
            ShiftAxis::X => world.shift.amount.x != old.x,
            _ => world.shift.amount.y != old.y,
        };
        if applied || delta.abs() <= world.physics.shift_epsilon {
            return;
        }
        delta -= delta.signum();
    }
    world.shift_fault(events);
}

/// Horizontal movement scrolls the world, then the enemy-contact check
/// runs. Returns true when the player died.
fn resolve_walking(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) -> bool {
    let mut to_move = 0.0;
    if input.held.right {
        to_move = if input.held.modifier { -world.physics.creep_speed } else { -world.physics.walk_speed };
    }
    if input.held.left {
        to_move = if input.held.modifier { world.physics.creep_speed } else { world.physics.walk_speed };
    }
    if to_move != 0.0 {
        shift_retry(world, ShiftAxis::X, to_move, events);
    }

    if let Some(contact) = rules::enemy_contact(&world.player, &world.enemies, world.shift.amount) {
        if contact.crush {
            events.push(GameEvent::Crush);
        }
        events.push(GameEvent::PlayerKilled { error: false });
        return true;
    }
    false
}

fn resolve_player_gravity(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    if input.jump_pressed() {
        let solids = world.solid_rects();
        let pr = bounds_of(&world.player, world.shift.amount);
        if physics::standing_on(&pr, &solids) {
            events.push(GameEvent::Jump);
            world.player.velocity = Some(physics::jump_impulse(&world.physics, input.held.modifier));
        }
    }

    let Some(v) = world.player.velocity else { return };
    let (to_fall, next) = physics::fall_step(v, &world.physics);
    world.player.velocity = Some(next);
    // Falling scrolls the world up past the fixed anchor.
    shift_retry(world, ShiftAxis::Y, -to_fall, events);
}

fn resolve_signs(world: &mut WorldState, input: &FrameInput) {
    let shift = world.shift.amount;
    let pr = bounds_of(&world.player, shift);
    for sign in &mut world.signs {
        if sign.body.rect(shift).intersects(&pr) {
            if input.held.up {
                sign.activated = true;
            }
        } else {
            sign.activated = false;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Mobs
// ══════════════════════════════════════════════════════════════

fn resolve_mobs(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut i = 0;
    while i < world.enemies.len() {
        let handle = Handle::Enemy(i);
        // Capture the speed going into this tick: a boulder that lands
        // on its victim still crushes even though settling zeroes the
        // stored velocity.
        let falling_speed = world.enemies[i].velocity.unwrap_or(0.0);

        if world.enemies[i].caps.can_fall {
            let obstacles = world.solid_rects_except(handle);
            physics::mob_fall(
                &mut world.enemies[i],
                world.shift.amount,
                &obstacles,
                &world.physics,
            );
        }
        if world.enemies[i].caps.can_move {
            let obstacles = world.solid_rects_except(handle);
            ai::patrol(&mut world.enemies[i], world.shift.amount, &obstacles);
        }

        if world.enemies[i].kind == EntityKind::Boulder {
            let shift = world.shift.amount;
            let mut indices: Vec<usize> = Vec::new();
            let mut rects: Vec<Rect> = Vec::new();
            for (j, other) in world.enemies.iter().enumerate() {
                if j != i {
                    indices.push(j);
                    rects.push(bounds_of(other, shift));
                }
            }
            if let Some(hit) = ai::crush_victim(&world.enemies[i], falling_speed, shift, &rects) {
                let victim = indices[hit];
                world.enemies.remove(victim);
                events.push(GameEvent::Crush);
                if victim < i {
                    i -= 1;
                }
            }
        }

        i += 1;
    }

    // Portable goals feel gravity too; they patrol and crush nothing.
    for gi in 0..world.goals.len() {
        if world.goals[gi].caps.can_fall {
            let obstacles = world.solid_rects_except(Handle::Goal(gi));
            physics::mob_fall(
                &mut world.goals[gi],
                world.shift.amount,
                &obstacles,
                &world.physics,
            );
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Doors & goals
// ══════════════════════════════════════════════════════════════

/// Sensor-driven door swap. Returns true when a reverting door caught
/// the player.
fn resolve_doors(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let shift = world.shift.amount;
    let sensors: Vec<Rect> = world.sensors.iter().map(|b| b.rect(shift)).collect();
    let tracked = world.sensor_tracked_rects();
    let sensed = rules::sensor_active(&sensors, &tracked);

    if sensed && !world.doors.locked.is_empty() {
        let mut opened = std::mem::take(&mut world.doors.locked);
        world.doors.unlocked.append(&mut opened);
        events.push(GameEvent::DoorsOpened);
    } else if !sensed && !world.doors.unlocked.is_empty() {
        let mut closed = std::mem::take(&mut world.doors.unlocked);
        world.doors.locked.append(&mut closed);
        events.push(GameEvent::DoorsClosed);

        let pr = bounds_of(&world.player, shift);
        let locked: Vec<Rect> = world.doors.locked.iter().map(|b| b.rect(shift)).collect();
        if pr.hits_any(&locked) {
            events.push(GameEvent::PlayerKilled { error: false });
            return true;
        }
    }
    false
}

fn resolve_goals(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    for goal in &mut world.goals {
        goal.tint = None;
    }

    let standing = world.goal_standing_rects();
    let verdict = rules::goal_verdict(
        &world.player,
        &world.goals,
        &world.enemies,
        &standing,
        world.shift.amount,
        input.held.up,
    );
    match verdict {
        GoalVerdict::Obstructed(i) => world.goals[i].tint = Some(Tint::Obstructed),
        GoalVerdict::Cleared(_) => events.push(GameEvent::LevelCleared),
        GoalVerdict::Finished(_) => events.push(GameEvent::GameCompleted),
        GoalVerdict::None => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Block, Entity};
    use crate::sim::world::{PLAYER_ANCHOR, PLAYER_SIZE};

    const DT: f64 = 0.008;

    fn playing_world() -> WorldState {
        let mut w = WorldState::new();
        w.reset_modes(Mode::Playing);
        w
    }

    /// Floor `gap` units below the player's feet, spanning the view.
    fn add_floor(w: &mut WorldState, gap: f64) {
        let top = PLAYER_ANCHOR.y + PLAYER_SIZE.y + gap;
        w.walls.push(Block::new(Vec2::new(-2000.0, top), Vec2::new(5000.0, 100.0)));
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    #[test]
    fn gravity_converges_onto_floor_top() {
        let mut w = playing_world();
        add_floor(&mut w, 120.0);

        for _ in 0..600 {
            step(&mut w, &idle(), DT);
        }

        let pr = bounds_of(&w.player, w.shift.amount);
        let floor_top = w.walls[0].rect(w.shift.amount).y;
        let gap = floor_top - (pr.y + pr.h);
        assert!(gap >= 0.0, "player sank into the floor by {gap}");
        assert!(gap <= w.physics.shift_epsilon + 1e-9, "player floats {gap} above the floor");
        assert_eq!(w.player.velocity, Some(0.0));
    }

    #[test]
    fn jump_fires_once_per_press_edge() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);

        let mut input = idle();
        input.held.jump = true;

        let events = step(&mut w, &input, DT);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Jump).count(), 1);
        // The impulse was applied; gravity has already integrated one
        // tick on top of it.
        let v = w.player.velocity.unwrap();
        assert!(v < 0.0 && (v - (w.physics.jump_velocity + 0.981)).abs() < 1e-9);

        // Still held next frame: no second impulse.
        input.prev.jump = true;
        let events = step(&mut w, &input, DT);
        assert!(!events.contains(&GameEvent::Jump));
    }

    #[test]
    fn jump_needs_footing() {
        let mut w = playing_world();
        add_floor(&mut w, 200.0); // far below, airborne

        let mut input = idle();
        input.held.jump = true;
        let events = step(&mut w, &input, DT);
        assert!(!events.contains(&GameEvent::Jump));
    }

    #[test]
    fn walking_scrolls_the_world() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        let mut input = idle();
        input.held.right = true;

        step(&mut w, &input, DT);
        assert_eq!(w.shift.amount.x, -w.physics.walk_speed);

        input.held.modifier = true;
        step(&mut w, &input, DT);
        assert_eq!(w.shift.amount.x, -w.physics.walk_speed - w.physics.creep_speed);
    }

    #[test]
    fn blocked_walk_creeps_to_the_wall() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        // Wall 2 units right of the player.
        let wall_x = PLAYER_ANCHOR.x + PLAYER_SIZE.x + 2.0;
        w.walls.push(Block::new(Vec2::new(wall_x, 0.0), Vec2::new(50.0, VIEW_H)));

        let mut input = idle();
        input.held.right = true;
        step(&mut w, &input, DT);

        // Full 3-unit scroll is refused; the retry settles on 2.
        assert_eq!(w.shift.amount.x, -2.0);
    }

    #[test]
    fn touching_a_guard_is_game_over() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        w.enemies.push(Entity::new(
            EntityKind::Guard,
            PLAYER_ANCHOR + Vec2::new(10.0, 0.0),
            Vec2::new(30.0, 48.0),
        ));

        let events = step(&mut w, &idle(), DT);
        assert!(events.contains(&GameEvent::PlayerKilled { error: false }));
    }

    #[test]
    fn falling_boulder_crushes_guard_once() {
        let mut w = playing_world();
        add_floor(&mut w, 500.0);

        // Guard on the floor, boulder falling directly above it.
        let floor_top = PLAYER_ANCHOR.y + PLAYER_SIZE.y + 500.0;
        w.enemies.push(Entity::new(
            EntityKind::Guard,
            Vec2::new(700.0, floor_top - 48.0),
            Vec2::new(30.0, 48.0),
        ));
        w.enemies[0].caps.can_move = false;
        let mut boulder = Entity::new(
            EntityKind::Boulder,
            Vec2::new(695.0, floor_top - 48.0 - 60.0),
            Vec2::new(50.0, 50.0),
        );
        boulder.velocity = Some(5.0);
        w.enemies.push(boulder);

        let mut crushes = 0;
        for _ in 0..200 {
            let events = step(&mut w, &idle(), DT);
            crushes += events.iter().filter(|e| **e == GameEvent::Crush).count();
        }

        assert_eq!(crushes, 1, "crush cue must fire exactly once");
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.enemies[0].kind, EntityKind::Boulder);
    }

    #[test]
    fn door_cycle_opens_reverts_and_catches_player() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        w.doors.locked.push(Block::new(Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0)));
        // Sensor under the player.
        w.sensors.push(Block::new(PLAYER_ANCHOR, Vec2::new(50.0, 50.0)));

        let events = step(&mut w, &idle(), DT);
        assert!(events.contains(&GameEvent::DoorsOpened));
        assert!(w.doors.locked.is_empty());
        assert_eq!(w.doors.unlocked.len(), 1);

        // Sensor cleared; the door reverts and is harmless over there.
        w.sensors[0].pos = Vec2::new(-900.0, -900.0);
        let events = step(&mut w, &idle(), DT);
        assert!(events.contains(&GameEvent::DoorsClosed));
        assert_eq!(w.doors.locked.len(), 1);

        // Same cycle, but the door reverts on top of the player.
        w.doors.locked[0].pos = PLAYER_ANCHOR;
        w.sensors[0].pos = PLAYER_ANCHOR;
        let events = step(&mut w, &idle(), DT);
        assert!(events.contains(&GameEvent::DoorsOpened));
        w.sensors[0].pos = Vec2::new(-900.0, -900.0);
        let events = step(&mut w, &idle(), DT);
        assert!(events.contains(&GameEvent::DoorsClosed));
        assert!(events.contains(&GameEvent::PlayerKilled { error: false }));
    }

    #[test]
    fn standing_on_goal_and_activating_clears_level() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        w.goals.push(Entity::new(
            EntityKind::Goal(crate::domain::entity::GoalKind::Stationary),
            PLAYER_ANCHOR + Vec2::new(-10.0, 10.0),
            Vec2::new(50.0, 50.0),
        ));

        let mut input = idle();
        input.held.up = true;
        let events = step(&mut w, &input, DT);
        assert!(events.contains(&GameEvent::LevelCleared));
    }

    #[test]
    fn hover_tints_follow_cooldown_state() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        let mut input = idle();
        input.pointer = PLAYER_ANCHOR + Vec2::new(5.0, 5.0);

        step(&mut w, &input, DT);
        assert_eq!(w.player.tint, Some(Tint::Ready));

        w.ability.start_cooldown(1.0);
        step(&mut w, &input, DT);
        assert_eq!(w.player.tint, Some(Tint::Cooldown));

        input.pointer = Vec2::new(0.0, 0.0);
        step(&mut w, &input, DT);
        assert_eq!(w.player.tint, None);
    }

    #[test]
    fn drag_gesture_lifecycle_suspends_world_and_charges_cooldown() {
        let mut w = playing_world();
        add_floor(&mut w, 0.0);
        // A fallable enemy far away, to observe suspension.
        let mut bystander =
            Entity::new(EntityKind::Guard, Vec2::new(100.0, 0.0), Vec2::new(30.0, 48.0));
        bystander.caps.can_move = false;
        w.enemies.push(bystander);

        let mut input = idle();
        input.held.primary = true;
        input.pointer = PLAYER_ANCHOR + Vec2::new(5.0, 5.0);

        let events = step(&mut w, &input, DT);
        assert!(events.contains(&GameEvent::DragStarted));
        assert!(w.drag.is_some());
        assert!(w.ability.in_use);

        // While dragging, nothing else advances.
        let bystander_y = w.enemies[0].pos.y;
        input.pointer = PLAYER_ANCHOR + Vec2::new(25.0, 5.0);
        step(&mut w, &input, DT);
        assert_eq!(w.enemies[0].pos.y, bystander_y, "gravity ran during a drag");

        // Release: cooldown charged, recenter pending for the player.
        input.held.primary = false;
        let events = step(&mut w, &input, DT);
        assert!(events.contains(&GameEvent::DragEnded));
        assert!(!w.ability.in_use);
        assert!(w.ability.recharge_left >= w.drag_cfg.recharge_min_secs);
        assert!(w.recenter.is_some());

        // Recenter runs exclusively until done.
        let mut guard = 0;
        while w.recenter.is_some() {
            step(&mut w, &idle(), DT);
            guard += 1;
            assert!(guard < 10_000);
        }
        assert_eq!(w.player.pos, PLAYER_ANCHOR);
    }

    #[test]
    fn squeezed_player_faults_the_camera() {
        // Sub-unit clearance above and below: the decrement retry
        // ping-pongs across zero until the bound trips.
        let mut w = playing_world();
        let feet = PLAYER_ANCHOR.y + PLAYER_SIZE.y;
        w.walls.push(Block::new(Vec2::new(-2000.0, feet + 0.2), Vec2::new(5000.0, 100.0)));
        w.walls.push(Block::new(Vec2::new(-2000.0, PLAYER_ANCHOR.y - 100.3), Vec2::new(5000.0, 100.0)));
        w.starting_shift = Vec2::new(1.0, 2.0);
        w.player.velocity = Some(14.0);

        let events = step(&mut w, &idle(), DT);

        assert!(events.contains(&GameEvent::PlayerKilled { error: true }));
        assert!(w.shift.error);
        assert_eq!(w.shift.amount, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn non_playing_modes_do_not_step() {
        let mut w = playing_world();
        add_floor(&mut w, 50.0);
        w.push_mode(Mode::Paused);
        let before = w.shift.amount;
        let events = step(&mut w, &idle(), DT);
        assert!(events.is_empty());
        assert_eq!(w.shift.amount, before);
    }
}
