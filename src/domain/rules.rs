/// Contact rules — what counts as a hit, and what it means.
///
/// Pure queries over pre-built rects and entities; the mutations they
/// imply (door swaps, mode changes, entity removal) happen in
/// `sim::step`.

use super::entity::{bounds_of, masks_collide, Entity, EntityKind, GoalKind};
use super::geometry::{Rect, Vec2};
use super::physics::standing_on;

/// Is any sensor overlapped by any tracked movable?
pub fn sensor_active(sensors: &[Rect], tracked: &[Rect]) -> bool {
    sensors.iter().any(|s| tracked.iter().any(|t| s.intersects(t)))
}

/// Outcome of touching an enemy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Contact {
    pub index: usize,
    /// A moving boulder did it: play the crush cue too.
    pub crush: bool,
}

/// Pixel-precise player/enemy contact. Only the first enemy whose
/// bounding box overlaps is considered; a boulder at rest is harmless.
pub fn enemy_contact(player: &Entity, enemies: &[Entity], shift: Vec2) -> Option<Contact> {
    let pr = bounds_of(player, shift);
    let enemy_rects: Vec<Rect> = enemies.iter().map(|e| bounds_of(e, shift)).collect();
    let index = pr.first_hit(&enemy_rects)?;

    let enemy = &enemies[index];
    if !masks_collide(enemy, &enemy_rects[index], player, &pr) {
        return None;
    }

    if enemy.kind != EntityKind::Boulder {
        Some(Contact { index, crush: false })
    } else if enemy.velocity != Some(0.0) {
        Some(Contact { index, crush: true })
    } else {
        None
    }
}

/// What activating a goal would do right now.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoalVerdict {
    /// Not on a goal, not activating, or not standing.
    None,
    /// On a goal but an enemy sits on it.
    Obstructed(usize),
    /// Level cleared through this goal.
    Cleared(usize),
    /// The final goal: the whole game is done.
    Finished(usize),
}

/// Goal activation check: the player must overlap the goal, hold the
/// activation input, and be standing on something solid; the goal must
/// be free of enemies; a portable goal still in flight does not count.
pub fn goal_verdict(
    player: &Entity,
    goals: &[Entity],
    enemies: &[Entity],
    standing_set: &[Rect],
    shift: Vec2,
    activate: bool,
) -> GoalVerdict {
    let pr = bounds_of(player, shift);
    let goal_rects: Vec<Rect> = goals.iter().map(|g| bounds_of(g, shift)).collect();
    let Some(gi) = pr.first_hit(&goal_rects) else {
        return GoalVerdict::None;
    };
    if !activate || !standing_on(&pr, standing_set) {
        return GoalVerdict::None;
    }

    let enemy_rects: Vec<Rect> = enemies.iter().map(|e| bounds_of(e, shift)).collect();
    if goal_rects[gi].hits_any(&enemy_rects) {
        return GoalVerdict::Obstructed(gi);
    }

    match goals[gi].kind {
        EntityKind::Goal(GoalKind::Portable) if goals[gi].velocity != Some(0.0) => GoalVerdict::None,
        EntityKind::Goal(GoalKind::Final) => GoalVerdict::Finished(gi),
        _ => GoalVerdict::Cleared(gi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Mask;

    fn player_at(x: f64, y: f64) -> Entity {
        Entity::new(EntityKind::Player, Vec2::new(x, y), Vec2::new(30.0, 48.0))
    }

    fn goal(kind: GoalKind, x: f64, y: f64) -> Entity {
        Entity::new(EntityKind::Goal(kind), Vec2::new(x, y), Vec2::new(50.0, 50.0))
    }

    #[test]
    fn sensor_triggers_on_any_overlap() {
        let sensors = [Rect::new(100.0, 100.0, 50.0, 50.0)];
        let clear = [Rect::new(500.0, 500.0, 30.0, 48.0)];
        let touching = [Rect::new(120.0, 120.0, 30.0, 48.0)];
        assert!(!sensor_active(&sensors, &clear));
        assert!(sensor_active(&sensors, &touching));
        assert!(!sensor_active(&[], &touching));
    }

    #[test]
    fn guard_contact_kills() {
        let player = player_at(100.0, 100.0);
        let guard = Entity::new(EntityKind::Guard, Vec2::new(110.0, 110.0), Vec2::new(30.0, 48.0));
        assert_eq!(
            enemy_contact(&player, &[guard], Vec2::ZERO),
            Some(Contact { index: 0, crush: false })
        );
    }

    #[test]
    fn resting_boulder_is_harmless_but_falling_one_crushes() {
        let player = player_at(100.0, 100.0);
        let mut boulder =
            Entity::new(EntityKind::Boulder, Vec2::new(110.0, 110.0), Vec2::new(50.0, 50.0));
        boulder.mask = None;

        boulder.velocity = Some(0.0);
        assert_eq!(enemy_contact(&player, &[boulder.clone()], Vec2::ZERO), None);

        boulder.velocity = Some(12.0);
        assert_eq!(
            enemy_contact(&player, &[boulder], Vec2::ZERO),
            Some(Contact { index: 0, crush: true })
        );
    }

    #[test]
    fn transparent_pixels_do_not_kill() {
        let player = player_at(100.0, 100.0);
        let mut guard = Entity::new(EntityKind::Guard, Vec2::new(128.0, 100.0), Vec2::new(30.0, 48.0));
        // Boxes overlap by 2 pixels on the left of the guard, but the
        // guard is transparent there.
        let mut rows = vec![];
        let row: String = "..".to_string() + &"#".repeat(28);
        for _ in 0..48 {
            rows.push(row.clone());
        }
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        guard.mask = Some(Mask::from_rows(&refs));
        assert_eq!(enemy_contact(&player, &[guard], Vec2::ZERO), None);
    }

    #[test]
    fn goal_needs_activation_and_footing() {
        let floor = [Rect::new(0.0, 148.0, 1000.0, 50.0)];
        let player = player_at(100.0, 100.0); // feet at 148, standing
        let goals = [goal(GoalKind::Stationary, 90.0, 98.0)];

        assert_eq!(
            goal_verdict(&player, &goals, &[], &floor, Vec2::ZERO, true),
            GoalVerdict::Cleared(0)
        );
        assert_eq!(
            goal_verdict(&player, &goals, &[], &floor, Vec2::ZERO, false),
            GoalVerdict::None
        );
        // Airborne: same geometry, no floor.
        assert_eq!(
            goal_verdict(&player, &goals, &[], &[], Vec2::ZERO, true),
            GoalVerdict::None
        );
    }

    #[test]
    fn occupied_goal_is_obstructed() {
        let floor = [Rect::new(0.0, 148.0, 1000.0, 50.0)];
        let player = player_at(100.0, 100.0);
        let goals = [goal(GoalKind::Stationary, 90.0, 98.0)];
        let squatter = Entity::new(EntityKind::Guard, Vec2::new(95.0, 100.0), Vec2::new(30.0, 48.0));

        assert_eq!(
            goal_verdict(&player, &goals, &[squatter], &floor, Vec2::ZERO, true),
            GoalVerdict::Obstructed(0)
        );
    }

    #[test]
    fn portable_goal_must_be_at_rest() {
        let floor = [Rect::new(0.0, 148.0, 1000.0, 50.0)];
        let player = player_at(100.0, 100.0);
        let mut g = goal(GoalKind::Portable, 90.0, 98.0);

        g.velocity = Some(4.0);
        assert_eq!(
            goal_verdict(&player, &[g.clone()], &[], &floor, Vec2::ZERO, true),
            GoalVerdict::None
        );

        g.velocity = Some(0.0);
        assert_eq!(
            goal_verdict(&player, &[g], &[], &floor, Vec2::ZERO, true),
            GoalVerdict::Cleared(0)
        );
    }

    #[test]
    fn final_goal_finishes_the_game() {
        let floor = [Rect::new(0.0, 148.0, 1000.0, 50.0)];
        let player = player_at(100.0, 100.0);
        let goals = [goal(GoalKind::Final, 90.0, 98.0)];
        assert_eq!(
            goal_verdict(&player, &goals, &[], &floor, Vec2::ZERO, true),
            GoalVerdict::Finished(0)
        );
    }
}
