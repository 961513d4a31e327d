#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides where a tower fires.
//!
//! The default rule picks the eligible enemy in range that is furthest along
//! the path. Radial towers ignore individual enemies and fire a fixed ring
//! whenever anything they can affect is in range; aimed towers ignore enemies
//! entirely and fire at an operator-supplied point.

use std::f32::consts::TAU;

use pop_defence_core::{Enemy, EnemyId, EngineConfig, ProjectileConfig, Targeting, Tower, Vec2};
use rand::Rng;

/// Where a ready tower should fire this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FiringSolution {
    /// Fire at an enemy's current position.
    Enemy {
        /// Enemy the shot is aimed at.
        enemy: EnemyId,
        /// Position of the enemy at the moment of firing.
        point: Vec2,
    },
    /// Fire a ring of equally spaced shots.
    Radial {
        /// Number of directions in the ring.
        directions: u32,
    },
    /// Fire at a point on the ground.
    Aimed {
        /// Point after accuracy deviation.
        point: Vec2,
    },
}

/// Reports whether a projectile built from `config` may affect `enemy`.
///
/// Dead enemies awaiting removal are never eligible.
#[must_use]
pub fn can_affect(config: &ProjectileConfig, enemy: &Enemy) -> bool {
    enemy.is_vulnerable_to(config.can_pop_camo, config.can_pop_lead)
}

/// Normalized progress `t` in `[0, 1]` along the enemy's current segment.
#[must_use]
pub fn segment_progress(enemy: &Enemy) -> f32 {
    let Some((start, end)) = enemy.path().segment(enemy.waypoint_index()) else {
        return 1.0;
    };
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return 0.0;
    }
    ((enemy.position() - start).dot(segment) / length_sq).clamp(0.0, 1.0)
}

/// Reports whether `enemy` sits within `range` of `origin`. Infinite ranges
/// skip the distance check.
#[must_use]
pub fn in_range(origin: Vec2, range: f32, enemy: &Enemy) -> bool {
    if range.is_infinite() {
        return true;
    }
    origin.distance_squared(enemy.position()) <= range * range
}

/// Unit vectors of a ring with `count` equally spaced directions starting at
/// angle zero.
pub fn radial_directions(count: u32) -> impl Iterator<Item = Vec2> {
    let step = if count == 0 { 0.0 } else { TAU / count as f32 };
    (0..count).map(move |index| Vec2::from_angle(step * index as f32))
}

/// Tower targeting system.
#[derive(Clone, Debug)]
pub struct TowerTargeting {
    max_aim_spread: f32,
}

impl TowerTargeting {
    /// Creates a targeting system using the aim spread from `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_aim_spread: config.max_aim_spread.max(0.0),
        }
    }

    /// Picks the eligible enemy in range that is furthest along the path.
    ///
    /// Ties on waypoint index fall back to segment progress and then to the
    /// lower identifier, so the choice is independent of slice order.
    #[must_use]
    pub fn select<'a>(&self, tower: &Tower, enemies: &'a [Enemy]) -> Option<&'a Enemy> {
        let config = &tower.loadout().projectile;
        let mut best: Option<BestCandidate<'a>> = None;

        for enemy in enemies {
            if !can_affect(config, enemy) || !in_range(tower.position(), tower.range(), enemy) {
                continue;
            }

            let current = BestCandidate {
                waypoint_index: enemy.waypoint_index(),
                progress: segment_progress(enemy),
                enemy,
            };

            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.enemy)
    }

    /// Resolves the tower's targeting behaviour into a firing solution.
    ///
    /// Returns `None` when the tower has nothing to shoot at this tick.
    pub fn solve<R>(&self, tower: &Tower, enemies: &[Enemy], rng: &mut R) -> Option<FiringSolution>
    where
        R: Rng + ?Sized,
    {
        match tower.loadout().targeting {
            Targeting::First => self.select(tower, enemies).map(|enemy| FiringSolution::Enemy {
                enemy: enemy.id(),
                point: enemy.position(),
            }),
            Targeting::Radial { directions } => {
                if directions == 0 {
                    return None;
                }
                let config = &tower.loadout().projectile;
                enemies
                    .iter()
                    .any(|enemy| {
                        can_affect(config, enemy) && in_range(tower.position(), tower.range(), enemy)
                    })
                    .then_some(FiringSolution::Radial { directions })
            }
            Targeting::Aimed { accuracy } => {
                let aim = tower.aim_point()?;
                Some(FiringSolution::Aimed {
                    point: self.deviate(tower.position(), aim, accuracy, rng),
                })
            }
            Targeting::Hold => None,
        }
    }

    /// Rotates `aim` around `origin` by a random angle scaled by inaccuracy.
    fn deviate<R>(&self, origin: Vec2, aim: Vec2, accuracy: f32, rng: &mut R) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let spread = (1.0 - accuracy.clamp(0.0, 1.0)) * self.max_aim_spread;
        if spread <= 0.0 {
            return aim;
        }
        let angle = rng.gen_range(-spread..=spread);
        origin + Vec2::from_angle(angle).rotate(aim - origin)
    }
}

#[derive(Clone, Copy, Debug)]
struct BestCandidate<'a> {
    waypoint_index: usize,
    progress: f32,
    enemy: &'a Enemy,
}

impl BestCandidate<'_> {
    fn precedes(&self, other: &Self) -> bool {
        if self.waypoint_index != other.waypoint_index {
            return self.waypoint_index > other.waypoint_index;
        }

        if self.progress != other.progress {
            return self.progress > other.progress;
        }

        self.enemy.id() < other.enemy.id()
    }
}
