#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic path follower that walks enemies along their waypoints.

use std::time::Duration;

use pop_defence_core::{Enemy, EnemyId};
use pop_defence_system_status_effects::StatusEffectTracker;

/// Outcome of advancing a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The enemy moved along its current segment.
    Moved,
    /// The enemy snapped onto the next waypoint.
    ReachedWaypoint,
    /// A freeze or stun kept the enemy in place.
    Held,
    /// The enemy stands on the final waypoint and should leak.
    AtEnd,
}

/// Advances `enemy` by `dt` along its path.
///
/// When the remaining distance to the next waypoint is within this step's
/// travel the enemy snaps onto the waypoint; leftover travel is discarded.
pub fn advance(enemy: &mut Enemy, dt: Duration, tracker: &StatusEffectTracker) -> Step {
    if enemy.at_path_end() {
        return Step::AtEnd;
    }
    if tracker.is_immobilised(enemy) {
        return Step::Held;
    }

    let index = enemy.waypoint_index();
    let Some(next) = enemy.path().point(index + 1) else {
        return Step::AtEnd;
    };

    let travel = tracker.effective_speed(enemy) * dt.as_secs_f32();
    let offset = next - enemy.position();
    let remaining = offset.length();

    if remaining <= travel {
        enemy.relocate(next, index + 1);
        if enemy.at_path_end() {
            return Step::AtEnd;
        }
        return Step::ReachedWaypoint;
    }

    let position = enemy.position() + offset / remaining * travel;
    enemy.relocate(position, index);
    Step::Moved
}

/// Pure system that walks every live enemy once per tick.
#[derive(Debug, Default)]
pub struct Movement {
    held: usize,
}

impl Movement {
    /// Advances every enemy and reports, in order, those standing on the final
    /// waypoint afterwards.
    pub fn handle(
        &mut self,
        enemies: &mut [Enemy],
        dt: Duration,
        tracker: &StatusEffectTracker,
        out: &mut Vec<EnemyId>,
    ) {
        self.held = 0;
        for enemy in enemies.iter_mut() {
            match advance(enemy, dt, tracker) {
                Step::AtEnd => out.push(enemy.id()),
                Step::Held => self.held += 1,
                Step::Moved | Step::ReachedWaypoint => {}
            }
        }
    }

    /// Number of enemies held in place during the latest tick.
    #[must_use]
    pub fn held_last_tick(&self) -> usize {
        self.held
    }
}
