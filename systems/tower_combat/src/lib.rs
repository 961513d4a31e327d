#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tower combat controller.
//!
//! Each tick a ready tower asks the targeting system for a firing solution,
//! turns it into projectiles or a hitscan hit, advances its projectile list and
//! finally runs its passive ability on that ability's own cooldown. Dead
//! enemies are left in place for the world's end-of-tick sweep.

use std::time::Duration;

use pop_defence_core::{
    Delivery, Enemy, EnemyId, EngineConfig, Passive, Projectile, Tower, Vec2, VisualDrawRequest,
};
use pop_defence_system_projectiles::ProjectileSimulator;
use pop_defence_system_status_effects::StatusEffectTracker;
use pop_defence_system_tower_targeting::{
    can_affect, in_range, radial_directions, FiringSolution, TowerTargeting,
};
use rand::Rng;

/// Income produced by an economy tower during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncomeTick {
    /// Money produced.
    pub amount: u64,
    /// Whether the money was banked on the tower instead of credited.
    pub banked: bool,
}

/// What one tower did during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Whether the tower fired.
    pub fired: bool,
    /// Hits resolved by the tower's travelling projectiles.
    pub hits: usize,
    /// Income produced by the tower's passive.
    pub income: Option<IncomeTick>,
}

/// Tower combat system.
#[derive(Debug)]
pub struct TowerCombat {
    targeting: TowerTargeting,
    simulator: ProjectileSimulator,
    tracker: StatusEffectTracker,
}

impl TowerCombat {
    /// Creates the controller and the systems it orchestrates.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            targeting: TowerTargeting::new(config),
            simulator: ProjectileSimulator::new(config),
            tracker: StatusEffectTracker::new(config),
        }
    }

    /// Runs one tick of combat for `tower`.
    pub fn handle<R>(
        &mut self,
        tower: &mut Tower,
        enemies: &mut [Enemy],
        now: Duration,
        dt: Duration,
        rng: &mut R,
        visuals: &mut Vec<VisualDrawRequest>,
    ) -> CombatOutcome
    where
        R: Rng + ?Sized,
    {
        let fired = self.fire(tower, enemies, now, rng, visuals);
        let hits = self.simulator.tick(tower, enemies, now, dt, rng, visuals);
        let income = self.run_passive(tower, enemies, now, visuals);
        CombatOutcome {
            fired,
            hits,
            income,
        }
    }

    fn fire<R>(
        &mut self,
        tower: &mut Tower,
        enemies: &mut [Enemy],
        now: Duration,
        rng: &mut R,
        visuals: &mut Vec<VisualDrawRequest>,
    ) -> bool
    where
        R: Rng + ?Sized,
    {
        if !tower.is_ready(now) {
            return false;
        }
        let Some(solution) = self.targeting.solve(tower, enemies, rng) else {
            return false;
        };

        let origin = tower.position();
        let fired = match solution {
            FiringSolution::Enemy { enemy, point } => {
                match tower.loadout().projectile_kind.delivery() {
                    Delivery::Hitscan => {
                        self.simulator
                            .apply_hit(tower, enemy, enemies, now, rng, visuals)
                    }
                    Delivery::Travel => {
                        launch(tower, point, Some(enemy), f32::INFINITY);
                        true
                    }
                }
            }
            FiringSolution::Radial { directions } => {
                for direction in radial_directions(directions) {
                    launch(tower, origin + direction, None, f32::INFINITY);
                }
                true
            }
            FiringSolution::Aimed { point } => {
                launch(tower, point, None, origin.distance(point));
                true
            }
        };

        if fired {
            tower.mark_fired(now);
        }
        fired
    }

    fn run_passive(
        &self,
        tower: &mut Tower,
        enemies: &mut [Enemy],
        now: Duration,
        visuals: &mut Vec<VisualDrawRequest>,
    ) -> Option<IncomeTick> {
        if !tower.passive_due(now) {
            return None;
        }

        let income = match tower.loadout().passive {
            Passive::None => None,
            Passive::Aura { damage, radius, .. } => {
                self.pulse(tower, enemies, damage, radius, now, visuals);
                None
            }
            Passive::Income { amount, .. } => {
                let banked = !tower.loadout().auto_collect;
                if banked {
                    tower.bank(amount);
                }
                Some(IncomeTick { amount, banked })
            }
        };

        tower.mark_passive(now);
        income
    }

    /// Damages every eligible enemy around the tower, slowing them when the
    /// tower has the area-slow capability.
    fn pulse(
        &self,
        tower: &Tower,
        enemies: &mut [Enemy],
        damage: f32,
        radius: f32,
        now: Duration,
        visuals: &mut Vec<VisualDrawRequest>,
    ) {
        let loadout = tower.loadout();
        let radius = if radius > 0.0 { radius } else { tower.range() };
        for enemy in enemies.iter_mut() {
            if !can_affect(&loadout.projectile, enemy) || !in_range(tower.position(), radius, enemy)
            {
                continue;
            }
            let _ = enemy.take_damage(damage);
            if loadout.area_slow {
                self.tracker
                    .apply(enemy, self.tracker.slow_from(tower.id(), now));
            }
        }

        visuals.push(VisualDrawRequest::Pulse {
            center: tower.position(),
            radius,
            color: loadout.projectile.color,
        });
    }
}

/// Adds a travelling projectile aimed at `point` to the tower's list. The
/// projectile expires once it has flown `reach`.
fn launch(tower: &mut Tower, point: Vec2, target: Option<EnemyId>, reach: f32) {
    let origin = tower.position();
    let (loadout, projectiles) = tower.split_projectiles();
    let mut projectile = Projectile::launch(
        loadout.projectile_kind,
        &loadout.projectile,
        origin,
        point,
        target,
    );
    projectile.limit_distance(reach);
    projectiles.push(projectile);
}
