#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pop Defence combat engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the combat systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing what
//! happened. The entity types (enemies, towers, projectiles) live here so that
//! every system crate operates on the same representation.

mod config;
mod enemy;
mod projectile;
mod status;
mod tower;
mod upgrade;

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::EngineConfig;
pub use enemy::{ChildEnemy, Enemy, EnemyKind, Path, PathError};
pub use projectile::{
    Delivery, OnHitEffect, Projectile, ProjectileConfig, ProjectileConfigError, ProjectileKind,
    SecondaryBurst,
};
pub use status::{StatusEffect, StatusEffects, StatusKind};
pub use tower::{Passive, Targeting, Tower, TowerKind, TowerLoadout};
pub use upgrade::{
    UpgradeEffect, UpgradeError, UpgradeFlag, UpgradePath, UpgradePreview, UpgradeState,
    MAX_ACTIVE_PATHS, MAX_TIER,
};

/// Converts a floating point number of seconds into a [`Duration`].
///
/// Negative, infinite and NaN inputs collapse to [`Duration::ZERO`] instead of
/// panicking.
#[must_use]
pub fn duration_from_secs(seconds: f32) -> Duration {
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO)
}

/// Source of truth for the player's currency, owned outside the engine.
///
/// The engine never stores a balance of its own. Placement, selling, upgrades
/// and pop rewards all flow through this trait so the owning collaborator can
/// audit every transaction.
pub trait Treasury {
    /// Returns the currently available balance.
    fn balance(&self) -> u64;

    /// Removes the provided amount from the balance.
    ///
    /// Callers check [`Treasury::balance`] before debiting; implementations may
    /// saturate at zero.
    fn debit(&mut self, amount: u64);

    /// Adds the provided amount to the balance.
    fn credit(&mut self, amount: u64);
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a tower centred on the provided position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// World-space position of the tower's centre.
        position: Vec2,
    },
    /// Requests that an existing tower be sold back for a partial refund.
    SellTower {
        /// Identifier of the tower being sold.
        tower: TowerId,
    },
    /// Requests purchase of the next tier on one of a tower's upgrade paths.
    UpgradeTower {
        /// Identifier of the tower being upgraded.
        tower: TowerId,
        /// Path that receives the upgrade.
        path: UpgradePath,
        /// Tier being purchased, in `1..=3`.
        tier: u8,
    },
    /// Points an aimed tower at a world-space location.
    AimTower {
        /// Identifier of the tower being aimed.
        tower: TowerId,
        /// Location the tower should fire towards.
        point: Vec2,
    },
    /// Moves any income a tower has banked into the treasury.
    CollectIncome {
        /// Identifier of the income-generating tower.
        tower: TowerId,
    },
    /// Requests that a new enemy enter the path at its first waypoint.
    SpawnEnemy {
        /// Archetype of the enemy to create.
        kind: EnemyKind,
        /// Whether the enemy is hidden from towers lacking camo detection.
        camo: bool,
        /// Whether the enemy carries the regrowth trait.
        regrowth: bool,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyLeaked {
        /// Identifier of the enemy that escaped.
        enemy: EnemyId,
        /// Archetype of the enemy that escaped.
        kind: EnemyKind,
        /// Lives the player loses because of the leak.
        lives: u32,
    },
    /// Reports that an enemy's health was exhausted and it was removed.
    EnemyPopped {
        /// Identifier of the popped enemy.
        enemy: EnemyId,
        /// Archetype of the popped enemy.
        kind: EnemyKind,
        /// Money credited to the treasury for the pop.
        reward: u64,
        /// Identifiers of the child enemies spawned in its place.
        children: Vec<EnemyId>,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Price debited from the treasury.
        price: u64,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Money credited back to the treasury.
        refund: u64,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that an upgrade tier was purchased and applied.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Path that received the tier.
        path: UpgradePath,
        /// Tier that is now active on the path.
        tier: u8,
        /// Price debited from the treasury.
        price: u64,
    },
    /// Reports that an upgrade request was rejected without side effects.
    UpgradeRejected {
        /// Identifier of the tower named in the request.
        tower: TowerId,
        /// Path named in the request.
        path: UpgradePath,
        /// Tier named in the request.
        tier: u8,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports that an upgrade asked for a projectile variant that could not be
    /// configured, so the tower kept its previous variant.
    ProjectileSwapRejected {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Variant the upgrade asked for.
        requested: ProjectileKind,
        /// Variant the tower kept.
        kept: ProjectileKind,
    },
    /// Reports income produced by a tower's passive.
    IncomeGenerated {
        /// Identifier of the producing tower.
        tower: TowerId,
        /// Amount produced.
        amount: u64,
        /// Whether the amount was banked on the tower instead of credited.
        banked: bool,
    },
    /// Confirms that banked income was moved into the treasury.
    IncomeCollected {
        /// Identifier of the tower whose bank was emptied.
        tower: TowerId,
        /// Amount credited.
        amount: u64,
    },
    /// Summarises the outcome of a full tick.
    TickResolved {
        /// Net money credited to the treasury during the tick.
        money_delta: i64,
        /// Lives lost to leaks during the tick.
        lives_lost: u32,
    },
}

/// Unique identifier assigned to each enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to each tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Colour expressed as 8-bit RGB channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Creates a new colour from its channels.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red channel.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green channel.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue channel.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::from_rgb(red, green, blue)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        [color.red, color.green, color.blue]
    }
}

/// Draw request produced for an external renderer.
///
/// The engine never draws. Towers and projectiles describe what should appear
/// on screen and the presentation layer decides how.
#[derive(Clone, Debug, PartialEq)]
pub enum VisualDrawRequest {
    /// A travelling projectile sprite.
    Projectile {
        /// Variant of the projectile, used to pick a sprite.
        kind: ProjectileKind,
        /// Current centre of the projectile.
        position: Vec2,
        /// Collision radius of the projectile.
        radius: f32,
        /// Rotation in radians, for spinning variants.
        rotation: f32,
        /// Tint applied to the sprite.
        color: Rgb,
    },
    /// A hitscan tracer drawn between the tower and its target.
    Tracer {
        /// Tower end of the tracer.
        from: Vec2,
        /// Target end of the tracer.
        to: Vec2,
        /// Tint applied to the tracer.
        color: Rgb,
    },
    /// An explosion ring.
    Explosion {
        /// Centre of the explosion.
        center: Vec2,
        /// Radius of the blast.
        radius: f32,
    },
    /// A pulse emitted by an aura passive.
    Pulse {
        /// Centre of the aura.
        center: Vec2,
        /// Radius of the aura.
        radius: f32,
        /// Tint applied to the pulse.
        color: Rgb,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The loaded catalog holds no blueprint for the requested kind.
    #[error("no blueprint is available for {kind:?}")]
    Unavailable {
        /// Kind named in the request.
        kind: TowerKind,
    },
    /// The treasury cannot cover the tower's price.
    #[error("tower costs {price} but only {balance} is available")]
    InsufficientFunds {
        /// Price of the requested tower.
        price: u64,
        /// Balance at the time of the request.
        balance: u64,
    },
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    #[error("no tower with the requested identifier exists")]
    MissingTower,
}
