use serde::{Deserialize, Serialize};

use crate::{OnHitEffect, ProjectileKind, SecondaryBurst, TowerId};

/// Highest tier on any upgrade path.
pub const MAX_TIER: u8 = 3;

/// Number of paths that may hold a tier above zero at the same time.
pub const MAX_ACTIVE_PATHS: usize = 2;

/// One of the three independent upgrade tracks of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradePath {
    /// First track.
    Top,
    /// Second track.
    Middle,
    /// Third track.
    Bottom,
}

impl UpgradePath {
    /// Every path in catalog order.
    pub const ALL: [UpgradePath; 3] = [UpgradePath::Top, UpgradePath::Middle, UpgradePath::Bottom];

    /// Position of the path within [`UpgradePath::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Middle => 1,
            Self::Bottom => 2,
        }
    }
}

/// Tiers purchased on each path, plus the path locked out by cross-pathing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpgradeState {
    tiers: [u8; 3],
    locked: Option<UpgradePath>,
}

impl UpgradeState {
    /// Tier currently held on `path`.
    #[must_use]
    pub const fn tier(&self, path: UpgradePath) -> u8 {
        self.tiers[path.index()]
    }

    /// Path that can no longer be upgraded, if any.
    #[must_use]
    pub const fn locked(&self) -> Option<UpgradePath> {
        self.locked
    }

    /// Reports whether `path` holds a tier above zero.
    #[must_use]
    pub const fn is_active(&self, path: UpgradePath) -> bool {
        self.tier(path) > 0
    }

    /// Number of paths holding a tier above zero.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tiers.iter().filter(|&&tier| tier > 0).count()
    }

    /// Records a purchased tier.
    pub fn set_tier(&mut self, path: UpgradePath, tier: u8) {
        self.tiers[path.index()] = tier.min(MAX_TIER);
    }

    /// Locks the first path with tier zero once the active limit is reached.
    ///
    /// Returns the newly locked path.
    pub fn lock_remaining(&mut self) -> Option<UpgradePath> {
        if self.locked.is_some() || self.active_count() < MAX_ACTIVE_PATHS {
            return None;
        }
        let remaining = UpgradePath::ALL
            .into_iter()
            .find(|&path| !self.is_active(path))?;
        self.locked = Some(remaining);
        self.locked
    }
}

/// Special capability toggled by an upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeFlag {
    /// Projectiles damage lead enemies.
    CanPopLead,
    /// Projectiles and targeting see camo enemies.
    CanPopCamo,
    /// Projectiles re-steer toward their target.
    Homing,
    /// Aura pulses slow the enemies they touch.
    AreaSlow,
    /// Income is credited as soon as it is produced.
    AutoCollect,
}

/// Single stat change applied by an upgrade tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Multiplies the fire rate.
    FireRate(f32),
    /// Multiplies the projectile speed.
    ProjectileSpeed(f32),
    /// Multiplies the projectile lifespan.
    Lifespan(f32),
    /// Multiplies the projectile maximum distance.
    MaxDistance(f32),
    /// Adds projectile damage.
    Damage(f32),
    /// Adds projectile pierce.
    Pierce(u32),
    /// Adds targeting range.
    Range(f32),
    /// Adds explosion radius.
    AoeRadius(f32),
    /// Adds projectile collision radius.
    Radius(f32),
    /// Adds radial directions.
    Directions(u32),
    /// Adds aiming accuracy, capped at one.
    Accuracy(f32),
    /// Adds aura damage.
    AuraDamage(f32),
    /// Adds aura radius.
    AuraRadius(f32),
    /// Adds income per payout.
    Income(u64),
    /// Sets a capability flag.
    Flag(UpgradeFlag),
    /// Adds an on-hit effect.
    OnHit(OnHitEffect),
    /// Sets the secondary burst scattered on impact.
    Secondary(SecondaryBurst),
    /// Replaces the projectile variant.
    Projectile(ProjectileKind),
}

/// Reasons an upgrade request is rejected. Rejection never mutates state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum UpgradeError {
    /// Tiers run from one to three.
    #[error("tier {tier} is outside 1..=3")]
    InvalidTier {
        /// Tier named in the request.
        tier: u8,
    },
    /// The path is locked, or opening it would activate a third path.
    #[error("the {path:?} path is locked")]
    PathLocked {
        /// Path named in the request.
        path: UpgradePath,
    },
    /// Tiers must be bought in order.
    #[error("tier {requested} on the {path:?} path requires tier {current} + 1")]
    NotSequential {
        /// Path named in the request.
        path: UpgradePath,
        /// Tier currently held on the path.
        current: u8,
        /// Tier named in the request.
        requested: u8,
    },
    /// The path already holds its final tier.
    #[error("the {path:?} path is already at its final tier")]
    AlreadyMaxed {
        /// Path named in the request.
        path: UpgradePath,
    },
    /// The treasury cannot cover the upgrade.
    #[error("upgrade costs {price} but only {balance} is available")]
    InsufficientFunds {
        /// Price of the tier.
        price: u64,
        /// Balance at the time of the request.
        balance: u64,
    },
    /// No tower with the requested identifier exists.
    #[error("tower {tower:?} does not exist")]
    MissingTower {
        /// Identifier named in the request.
        tower: TowerId,
    },
}

/// What a menu needs to show for one upgrade tier.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradePreview {
    /// Display name of the tier.
    pub name: String,
    /// Price of the tier.
    pub price: u64,
    /// Whether the tier can be bought right now.
    pub eligible: bool,
    /// Why the tier cannot be bought, when it cannot.
    pub rejection: Option<UpgradeError>,
}
