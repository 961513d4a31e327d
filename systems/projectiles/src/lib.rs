#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projectile simulator for travelling and hitscan shots.
//!
//! Travelling projectiles advance once per tick and run a swept test from
//! their previous to their new position, so fast projectiles never tunnel
//! through enemies. Hitscan shots skip the travel phase and resolve at fire
//! time. Both share one impact resolution: direct damage and on-hit effects,
//! an optional explosion pass and an optional secondary burst. Secondaries are
//! queued and join the tower's list after the current pass, so they first move
//! on the following tick.

use std::{f32::consts::TAU, time::Duration};

use pop_defence_core::{
    Enemy, EnemyId, EngineConfig, Projectile, Tower, TowerId, Vec2, VisualDrawRequest,
};
use pop_defence_system_status_effects::StatusEffectTracker;
use rand::Rng;

/// Cosmetic spin applied to spinning projectile kinds, in radians per second.
const SPIN_RATE: f32 = 4.0 * TAU;

/// Length of a hitscan ray fired by a tower with unlimited range.
const HITSCAN_REACH: f32 = 2_000.0;

/// Closest point to `point` on the segment from `start` to `end`.
#[must_use]
pub fn closest_point_on_segment(point: Vec2, start: Vec2, end: Vec2) -> Vec2 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return start;
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    start + segment * t
}

/// Reports whether `projectile` may strike `enemy`.
#[must_use]
pub fn can_strike(projectile: &Projectile, enemy: &Enemy) -> bool {
    !projectile.has_hit(enemy.id())
        && enemy.is_vulnerable_to(projectile.can_pop_camo(), projectile.can_pop_lead())
}

/// First enemy, in slice order, whose circle touches the swept segment.
///
/// Returns the enemy's index together with the closest point on the segment,
/// which serves as the impact point.
#[must_use]
pub fn first_contact(
    projectile: &Projectile,
    start: Vec2,
    end: Vec2,
    enemies: &[Enemy],
) -> Option<(usize, Vec2)> {
    enemies.iter().enumerate().find_map(|(index, enemy)| {
        if !can_strike(projectile, enemy) {
            return None;
        }
        let contact = closest_point_on_segment(enemy.position(), start, end);
        let reach = enemy.radius() + projectile.radius();
        (contact.distance_squared(enemy.position()) <= reach * reach).then_some((index, contact))
    })
}

/// Advances projectiles and resolves their hits.
#[derive(Debug)]
pub struct ProjectileSimulator {
    tracker: StatusEffectTracker,
    spawned: Vec<Projectile>,
    chain: Vec<(f32, usize)>,
}

impl ProjectileSimulator {
    /// Creates a simulator whose on-hit effects follow `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tracker: StatusEffectTracker::new(config),
            spawned: Vec::new(),
            chain: Vec::new(),
        }
    }

    /// Advances every projectile owned by `tower` by `dt`.
    ///
    /// Each projectile resolves at most one hit per tick. Terminal projectiles
    /// are removed and a draw request is pushed for every survivor. Returns the
    /// number of hits resolved.
    pub fn tick<R>(
        &mut self,
        tower: &mut Tower,
        enemies: &mut [Enemy],
        now: Duration,
        dt: Duration,
        rng: &mut R,
        visuals: &mut Vec<VisualDrawRequest>,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let impact = Impact {
            source: tower.id(),
            now,
            tracker: &self.tracker,
        };
        let dt_secs = dt.as_secs_f32();
        let projectiles = tower.projectiles_mut();
        let mut hits = 0;
        self.spawned.clear();

        for projectile in projectiles.iter_mut() {
            if projectile.is_terminal() {
                continue;
            }

            projectile.age_by(dt);
            if projectile.is_homing() {
                steer(projectile, enemies, dt_secs);
            }

            let step = (projectile.velocity() * dt_secs)
                .clamp_length_max(projectile.remaining_distance());
            projectile.step_to(projectile.position() + step);
            if projectile.kind().spins() {
                projectile.spin_by(SPIN_RATE * dt_secs);
            }

            let (start, end) = (projectile.previous_position(), projectile.position());
            if let Some((index, contact)) = first_contact(projectile, start, end, enemies) {
                let enemy = enemies[index].id();
                impact.resolve(projectile, index, contact, enemies, rng, &mut self.spawned, visuals);
                projectile.record_hit(enemy);
                hits += 1;
            }

            if !projectile.is_terminal() {
                visuals.push(sprite(projectile));
            }
        }

        projectiles.retain(|projectile| !projectile.is_terminal());
        projectiles.append(&mut self.spawned);
        hits
    }

    /// Resolves a hitscan shot from `tower` at `target`.
    ///
    /// The shot checks lead and camo eligibility, damages the target once and
    /// then runs the explosion and secondary passes at the target's position.
    /// Pierce above one lets the ray continue and strike the next enemies along
    /// its line. Returns `false` when the target is missing or immune.
    pub fn apply_hit<R>(
        &mut self,
        tower: &mut Tower,
        target: EnemyId,
        enemies: &mut [Enemy],
        now: Duration,
        rng: &mut R,
        visuals: &mut Vec<VisualDrawRequest>,
    ) -> bool
    where
        R: Rng + ?Sized,
    {
        let Some(index) = enemies.iter().position(|enemy| enemy.id() == target) else {
            return false;
        };

        let origin = tower.position();
        let point = enemies[index].position();
        let loadout = tower.loadout();
        let shot = Projectile::launch(
            loadout.projectile_kind,
            &loadout.projectile,
            origin,
            point,
            Some(target),
        );
        if !can_strike(&shot, &enemies[index]) {
            return false;
        }

        let impact = Impact {
            source: tower.id(),
            now,
            tracker: &self.tracker,
        };
        self.spawned.clear();
        impact.resolve(&shot, index, point, enemies, rng, &mut self.spawned, visuals);

        let mut tracer_end = point;
        let extra = usize::try_from(shot.pierce().saturating_sub(1)).unwrap_or(0);
        if extra > 0 {
            let direction = (point - origin).normalize_or_zero();
            let reach = if tower.range().is_finite() {
                tower.range()
            } else {
                HITSCAN_REACH
            };
            let end = origin + direction * reach.max(origin.distance(point));

            self.chain.clear();
            for (candidate, enemy) in enemies.iter().enumerate() {
                if candidate == index || !can_strike(&shot, enemy) {
                    continue;
                }
                let along = (enemy.position() - origin).dot(direction);
                if along <= 0.0 {
                    continue;
                }
                let closest = closest_point_on_segment(enemy.position(), origin, end);
                let reach = enemy.radius() + shot.radius();
                if closest.distance_squared(enemy.position()) <= reach * reach {
                    self.chain.push((along, candidate));
                }
            }
            self.chain
                .sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));

            for &(_, candidate) in self.chain.iter().take(extra) {
                impact.strike(&mut enemies[candidate], &shot);
                tracer_end = enemies[candidate].position();
            }
        }

        visuals.push(VisualDrawRequest::Tracer {
            from: origin,
            to: tracer_end,
            color: shot.color(),
        });
        tower.projectiles_mut().append(&mut self.spawned);
        true
    }
}

struct Impact<'a> {
    source: TowerId,
    now: Duration,
    tracker: &'a StatusEffectTracker,
}

impl Impact<'_> {
    #[allow(clippy::too_many_arguments)]
    fn resolve<R>(
        &self,
        projectile: &Projectile,
        index: usize,
        contact: Vec2,
        enemies: &mut [Enemy],
        rng: &mut R,
        spawned: &mut Vec<Projectile>,
        visuals: &mut Vec<VisualDrawRequest>,
    ) where
        R: Rng + ?Sized,
    {
        let struck = enemies[index].id();
        self.strike(&mut enemies[index], projectile);

        if projectile.aoe_radius() > 0.0 {
            self.explode(projectile, contact, enemies);
            visuals.push(VisualDrawRequest::Explosion {
                center: contact,
                radius: projectile.aoe_radius(),
            });
        }

        if let Some(burst) = projectile.secondary() {
            for _ in 0..burst.count {
                let direction = Vec2::from_angle(rng.gen_range(0.0..TAU));
                spawned.push(Projectile::fragment(
                    projectile,
                    burst,
                    contact,
                    direction,
                    Some(struck),
                ));
            }
        }
    }

    fn strike(&self, enemy: &mut Enemy, projectile: &Projectile) {
        let _ = enemy.take_damage(projectile.damage());
        self.tracker
            .apply_tags(enemy, projectile.on_hit(), self.source, self.now);
    }

    /// Damages every live enemy whose centre lies within the blast radius.
    /// Explosions respect camo but shatter lead.
    fn explode(&self, projectile: &Projectile, center: Vec2, enemies: &mut [Enemy]) {
        let radius = projectile.aoe_radius();
        let radius_sq = radius * radius;
        for enemy in enemies.iter_mut() {
            if !enemy.is_vulnerable_to(projectile.can_pop_camo(), true) {
                continue;
            }
            if enemy.position().distance_squared(center) > radius_sq {
                continue;
            }
            self.strike(enemy, projectile);
        }
    }
}

/// Rotates a homing projectile toward its live target by at most
/// `turn_rate * dt` radians. Lost targets leave the heading untouched.
fn steer(projectile: &mut Projectile, enemies: &[Enemy], dt_secs: f32) {
    let Some(target) = projectile.target() else {
        return;
    };
    let Some(enemy) = enemies
        .iter()
        .find(|enemy| enemy.id() == target && !enemy.is_dead())
    else {
        return;
    };
    let Some(desired) = (enemy.position() - projectile.position()).try_normalize() else {
        return;
    };

    let heading = projectile.velocity().try_normalize().unwrap_or(desired);
    let max_turn = projectile.turn_rate() * dt_secs;
    let turn = heading.angle_between(desired).clamp(-max_turn, max_turn);
    projectile.set_velocity(Vec2::from_angle(turn).rotate(heading) * projectile.speed());
}

fn sprite(projectile: &Projectile) -> VisualDrawRequest {
    let rotation = if projectile.kind().spins() {
        projectile.rotation()
    } else {
        let velocity = projectile.velocity();
        velocity.y.atan2(velocity.x)
    };
    VisualDrawRequest::Projectile {
        kind: projectile.kind(),
        position: projectile.position(),
        radius: projectile.radius(),
        rotation,
        color: projectile.color(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_clamps_to_segment_ends() {
        let start = Vec2::ZERO;
        let end = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(Vec2::new(-5.0, 3.0), start, end), start);
        assert_eq!(closest_point_on_segment(Vec2::new(15.0, 3.0), start, end), end);
        assert_eq!(
            closest_point_on_segment(Vec2::new(4.0, 3.0), start, end),
            Vec2::new(4.0, 0.0)
        );
    }

    #[test]
    fn degenerate_segment_collapses_to_start() {
        let point = Vec2::new(1.0, 1.0);
        assert_eq!(closest_point_on_segment(Vec2::ZERO, point, point), point);
    }
}
