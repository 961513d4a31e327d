use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    duration_from_secs, Projectile, ProjectileConfig, ProjectileKind, TowerId, UpgradeState,
};

/// Closed set of tower archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Basic dart thrower.
    Arrow,
    /// Bomb launcher with splash damage.
    Cannon,
    /// Rapid-fire hitscan beam.
    Laser,
    /// Tower that slows enemies.
    Ice,
    /// Ring shooter that fires in fixed radial directions.
    Tack,
    /// Hitscan marksman with unlimited range.
    Sniper,
    /// Operator-aimed artillery.
    Mortar,
    /// Aura tower that periodically burns nearby enemies.
    Inferno,
    /// Economy tower that produces money.
    Farm,
}

impl TowerKind {
    /// Every tower archetype in catalog order.
    pub const ALL: [TowerKind; 9] = [
        TowerKind::Arrow,
        TowerKind::Cannon,
        TowerKind::Laser,
        TowerKind::Ice,
        TowerKind::Tack,
        TowerKind::Sniper,
        TowerKind::Mortar,
        TowerKind::Inferno,
        TowerKind::Farm,
    ];

    /// Position of the archetype within [`TowerKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Arrow => 0,
            Self::Cannon => 1,
            Self::Laser => 2,
            Self::Ice => 3,
            Self::Tack => 4,
            Self::Sniper => 5,
            Self::Mortar => 6,
            Self::Inferno => 7,
            Self::Farm => 8,
        }
    }
}

/// How a tower chooses where to fire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targeting {
    /// Fires at the eligible enemy in range that is furthest along the path.
    First,
    /// Fires in equally spaced directions whenever an eligible enemy is in range.
    Radial {
        /// Number of directions.
        directions: u32,
    },
    /// Fires at an operator-supplied point with accuracy-scaled deviation.
    Aimed {
        /// Accuracy in `[0, 1]`; one means no deviation.
        accuracy: f32,
    },
    /// Never fires.
    Hold,
}

/// Periodic ability that runs on its own cooldown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Passive {
    /// No passive ability.
    #[default]
    None,
    /// Damages every eligible enemy around the tower.
    Aura {
        /// Damage dealt per pulse.
        damage: f32,
        /// Pulse radius; zero falls back to the tower's range.
        radius: f32,
        /// Seconds between pulses.
        interval_secs: f32,
    },
    /// Produces money.
    Income {
        /// Money produced per interval.
        amount: u64,
        /// Seconds between payouts.
        interval_secs: f32,
    },
}

impl Passive {
    /// Time between activations, or `None` when there is nothing to run.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        let seconds = match self {
            Self::None => return None,
            Self::Aura { interval_secs, .. } | Self::Income { interval_secs, .. } => *interval_secs,
        };
        let interval = duration_from_secs(seconds);
        (!interval.is_zero()).then_some(interval)
    }
}

/// Mutable combat parameters of a tower, rewritten by upgrades.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerLoadout {
    /// Targeting range in world units.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Radius of the tower's footprint.
    pub footprint_radius: f32,
    /// Variant of projectile fired.
    pub projectile_kind: ProjectileKind,
    /// Parameters copied into each new projectile.
    pub projectile: ProjectileConfig,
    /// Targeting behaviour.
    pub targeting: Targeting,
    /// Periodic passive ability.
    pub passive: Passive,
    /// Whether aura pulses also slow the enemies they touch.
    pub area_slow: bool,
    /// Whether produced income is credited immediately instead of banked.
    pub auto_collect: bool,
}

/// A placed tower with its upgrades and in-flight projectiles.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    kind: TowerKind,
    position: Vec2,
    base_fire_rate: f32,
    loadout: TowerLoadout,
    upgrades: UpgradeState,
    last_fired: Option<Duration>,
    last_passive: Duration,
    aim_point: Option<Vec2>,
    projectiles: Vec<Projectile>,
    banked: u64,
    invested: u64,
}

impl Tower {
    /// Creates a tower placed at `placed_at` for `price`.
    #[must_use]
    pub fn new(
        id: TowerId,
        kind: TowerKind,
        position: Vec2,
        loadout: TowerLoadout,
        price: u64,
        placed_at: Duration,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            base_fire_rate: loadout.fire_rate,
            loadout,
            upgrades: UpgradeState::default(),
            last_fired: None,
            last_passive: placed_at,
            aim_point: None,
            projectiles: Vec::new(),
            banked: 0,
            invested: price,
        }
    }

    /// Identifier of the tower.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Archetype of the tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Centre of the tower.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current targeting range.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.loadout.range
    }

    /// Fire rate before any upgrade.
    #[must_use]
    pub const fn base_fire_rate(&self) -> f32 {
        self.base_fire_rate
    }

    /// Fire rate after upgrades.
    #[must_use]
    pub const fn fire_rate(&self) -> f32 {
        self.loadout.fire_rate
    }

    /// Current combat parameters.
    #[must_use]
    pub const fn loadout(&self) -> &TowerLoadout {
        &self.loadout
    }

    /// Mutable combat parameters, for the upgrade engine.
    pub fn loadout_mut(&mut self) -> &mut TowerLoadout {
        &mut self.loadout
    }

    /// Purchased upgrade tiers.
    #[must_use]
    pub const fn upgrades(&self) -> &UpgradeState {
        &self.upgrades
    }

    /// Mutable upgrade tiers, for the upgrade engine.
    pub fn upgrades_mut(&mut self) -> &mut UpgradeState {
        &mut self.upgrades
    }

    /// Time of the latest shot, if the tower has fired.
    #[must_use]
    pub const fn last_fired(&self) -> Option<Duration> {
        self.last_fired
    }

    /// Minimum time between shots, or `None` when the tower cannot fire.
    #[must_use]
    pub fn cooldown(&self) -> Option<Duration> {
        let rate = self.loadout.fire_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }
        Some(duration_from_secs(1.0 / rate))
    }

    /// Reports whether the shot cooldown has elapsed at `now`.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        let Some(cooldown) = self.cooldown() else {
            return false;
        };
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_sub(last) >= cooldown,
        }
    }

    /// Records a shot taken at `now`.
    pub fn mark_fired(&mut self, now: Duration) {
        self.last_fired = Some(now);
    }

    /// Reports whether the passive's interval has elapsed at `now`.
    #[must_use]
    pub fn passive_due(&self, now: Duration) -> bool {
        self.loadout
            .passive
            .interval()
            .is_some_and(|interval| now.saturating_sub(self.last_passive) >= interval)
    }

    /// Records a passive activation at `now`.
    pub fn mark_passive(&mut self, now: Duration) {
        self.last_passive = now;
    }

    /// Operator-supplied aim point.
    #[must_use]
    pub const fn aim_point(&self) -> Option<Vec2> {
        self.aim_point
    }

    /// Replaces the operator-supplied aim point.
    pub fn set_aim_point(&mut self, point: Vec2) {
        self.aim_point = Some(point);
    }

    /// Projectiles currently in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Mutable projectile list, for the projectile simulator.
    pub fn projectiles_mut(&mut self) -> &mut Vec<Projectile> {
        &mut self.projectiles
    }

    /// Splits the tower into its read-only loadout and its projectile list.
    pub fn split_projectiles(&mut self) -> (&TowerLoadout, &mut Vec<Projectile>) {
        (&self.loadout, &mut self.projectiles)
    }

    /// Income banked on the tower and not yet collected.
    #[must_use]
    pub const fn banked_income(&self) -> u64 {
        self.banked
    }

    /// Adds produced income to the tower's bank.
    pub fn bank(&mut self, amount: u64) {
        self.banked = self.banked.saturating_add(amount);
    }

    /// Empties the bank, returning what it held.
    pub fn take_banked(&mut self) -> u64 {
        std::mem::take(&mut self.banked)
    }

    /// Total money spent on the tower, including upgrades.
    #[must_use]
    pub const fn invested(&self) -> u64 {
        self.invested
    }

    /// Adds an upgrade purchase to the invested total.
    pub fn add_investment(&mut self, amount: u64) {
        self.invested = self.invested.saturating_add(amount);
    }
}
