#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Upgrade engine that validates and applies tiered tower upgrades.
//!
//! A request is validated completely, including affordability, before the
//! treasury is debited or the tower touched, so a rejected request never
//! leaves partial changes behind. Accepted tiers apply their effects in
//! declaration order and then lock the remaining path once two are active.

use pop_defence_catalog::{Catalog, UpgradeTier};
use pop_defence_core::{
    duration_from_secs, EngineConfig, Passive, ProjectileConfigError, ProjectileKind, Targeting,
    Tower, TowerLoadout, Treasury, UpgradeEffect, UpgradeError, UpgradeFlag, UpgradePath,
    UpgradePreview, MAX_ACTIVE_PATHS, MAX_TIER,
};
use tracing::warn;

/// Seconds between pulses of an aura created by an upgrade.
const DEFAULT_AURA_INTERVAL_SECS: f32 = 1.0;

/// Seconds between payouts of an income passive created by an upgrade.
const DEFAULT_INCOME_INTERVAL_SECS: f32 = 6.0;

/// Projectile swap that could not be honoured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapRejection {
    /// Variant named by the upgrade.
    pub requested: ProjectileKind,
    /// Variant the tower kept firing.
    pub kept: ProjectileKind,
    /// Why the requested profile was unusable.
    pub reason: ProjectileConfigError,
}

/// Summary of an accepted upgrade.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeReceipt {
    /// Display name of the purchased tier.
    pub name: String,
    /// Price debited from the treasury.
    pub price: u64,
    /// Path locked as a consequence of the purchase.
    pub locked: Option<UpgradePath>,
    /// Projectile swap that fell back to the previous variant.
    pub swap_rejected: Option<SwapRejection>,
}

/// Validates and applies upgrades against the catalog's upgrade tables.
#[derive(Debug)]
pub struct UpgradeEngine {
    catalog: Catalog,
    homing_turn_rate: f32,
}

impl UpgradeEngine {
    /// Creates an engine that reads tier tables from `catalog`.
    #[must_use]
    pub fn new(catalog: Catalog, config: &EngineConfig) -> Self {
        Self {
            catalog,
            homing_turn_rate: config.homing_turn_rate,
        }
    }

    /// Catalog backing the engine.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Reports whether the tier may be bought, ignoring affordability.
    #[must_use]
    pub fn can_upgrade(&self, tower: &Tower, path: UpgradePath, tier: u8) -> bool {
        self.check(tower, path, tier).is_ok()
    }

    /// Validates the structural upgrade rules and returns the requested tier.
    pub fn check(
        &self,
        tower: &Tower,
        path: UpgradePath,
        tier: u8,
    ) -> Result<&UpgradeTier, UpgradeError> {
        if tier == 0 || tier > MAX_TIER {
            return Err(UpgradeError::InvalidTier { tier });
        }

        let state = tower.upgrades();
        if state.locked() == Some(path) {
            return Err(UpgradeError::PathLocked { path });
        }

        let current = state.tier(path);
        if current == MAX_TIER {
            return Err(UpgradeError::AlreadyMaxed { path });
        }
        if current + 1 != tier {
            return Err(UpgradeError::NotSequential {
                path,
                current,
                requested: tier,
            });
        }
        if !state.is_active(path) && state.active_count() >= MAX_ACTIVE_PATHS {
            return Err(UpgradeError::PathLocked { path });
        }

        self.catalog
            .tower(tower.kind())
            .and_then(|blueprint| blueprint.tier(path, tier))
            .ok_or(UpgradeError::InvalidTier { tier })
    }

    /// Describes the tier for an upgrade menu given the current `balance`.
    ///
    /// Returns `None` when the catalog has no such tier.
    #[must_use]
    pub fn preview(
        &self,
        tower: &Tower,
        path: UpgradePath,
        tier: u8,
        balance: u64,
    ) -> Option<UpgradePreview> {
        let entry = self
            .catalog
            .tower(tower.kind())
            .and_then(|blueprint| blueprint.tier(path, tier))?;

        let rejection = match self.check(tower, path, tier) {
            Err(error) => Some(error),
            Ok(_) if entry.price > balance => Some(UpgradeError::InsufficientFunds {
                price: entry.price,
                balance,
            }),
            Ok(_) => None,
        };

        Some(UpgradePreview {
            name: entry.name.clone(),
            price: entry.price,
            eligible: rejection.is_none(),
            rejection,
        })
    }

    /// Buys `tier` on `path`, debiting `treasury` and rewriting the tower.
    ///
    /// Every rejection happens before any state is mutated.
    pub fn apply_upgrade<T>(
        &self,
        tower: &mut Tower,
        path: UpgradePath,
        tier: u8,
        treasury: &mut T,
    ) -> Result<UpgradeReceipt, UpgradeError>
    where
        T: Treasury + ?Sized,
    {
        let entry = self.check(tower, path, tier)?;
        let balance = treasury.balance();
        if entry.price > balance {
            return Err(UpgradeError::InsufficientFunds {
                price: entry.price,
                balance,
            });
        }

        treasury.debit(entry.price);

        let mut swap_rejected = None;
        for effect in &entry.effects {
            if let Some(rejection) = self.apply_effect(tower.loadout_mut(), effect) {
                warn!(
                    tower = tower.id().get(),
                    requested = ?rejection.requested,
                    kept = ?rejection.kept,
                    reason = %rejection.reason,
                    "projectile swap rejected, keeping previous kind"
                );
                swap_rejected = Some(rejection);
            }
        }

        tower.upgrades_mut().set_tier(path, tier);
        tower.add_investment(entry.price);
        let locked = tower.upgrades_mut().lock_remaining();

        Ok(UpgradeReceipt {
            name: entry.name.clone(),
            price: entry.price,
            locked,
            swap_rejected,
        })
    }

    fn apply_effect(
        &self,
        loadout: &mut TowerLoadout,
        effect: &UpgradeEffect,
    ) -> Option<SwapRejection> {
        let projectile = &mut loadout.projectile;
        match *effect {
            UpgradeEffect::FireRate(factor) => loadout.fire_rate *= factor,
            UpgradeEffect::ProjectileSpeed(factor) => projectile.speed *= factor,
            UpgradeEffect::Lifespan(factor) => {
                let seconds = projectile.lifespan.as_secs_f32() * factor;
                projectile.lifespan = duration_from_secs(seconds);
            }
            UpgradeEffect::MaxDistance(factor) => projectile.max_distance *= factor,
            UpgradeEffect::Damage(amount) => projectile.damage += amount,
            UpgradeEffect::Pierce(amount) => {
                projectile.pierce = projectile.pierce.saturating_add(amount);
            }
            UpgradeEffect::Range(amount) => loadout.range += amount,
            UpgradeEffect::AoeRadius(amount) => projectile.aoe_radius += amount,
            UpgradeEffect::Radius(amount) => projectile.radius += amount,
            UpgradeEffect::Directions(amount) => {
                if let Targeting::Radial { directions } = &mut loadout.targeting {
                    *directions = directions.saturating_add(amount);
                }
            }
            UpgradeEffect::Accuracy(amount) => {
                if let Targeting::Aimed { accuracy } = &mut loadout.targeting {
                    *accuracy = (*accuracy + amount).clamp(0.0, 1.0);
                }
            }
            UpgradeEffect::AuraDamage(amount) => match &mut loadout.passive {
                Passive::Aura { damage, .. } => *damage += amount,
                Passive::None => {
                    loadout.passive = Passive::Aura {
                        damage: amount,
                        radius: 0.0,
                        interval_secs: DEFAULT_AURA_INTERVAL_SECS,
                    };
                }
                Passive::Income { .. } => {}
            },
            UpgradeEffect::AuraRadius(amount) => match &mut loadout.passive {
                Passive::Aura { radius, .. } => *radius += amount,
                Passive::None => {
                    loadout.passive = Passive::Aura {
                        damage: 0.0,
                        radius: amount,
                        interval_secs: DEFAULT_AURA_INTERVAL_SECS,
                    };
                }
                Passive::Income { .. } => {}
            },
            UpgradeEffect::Income(amount) => match &mut loadout.passive {
                Passive::Income { amount: current, .. } => {
                    *current = current.saturating_add(amount);
                }
                Passive::None => {
                    loadout.passive = Passive::Income {
                        amount,
                        interval_secs: DEFAULT_INCOME_INTERVAL_SECS,
                    };
                }
                Passive::Aura { .. } => {}
            },
            UpgradeEffect::Flag(flag) => match flag {
                UpgradeFlag::CanPopLead => projectile.can_pop_lead = true,
                UpgradeFlag::CanPopCamo => projectile.can_pop_camo = true,
                UpgradeFlag::Homing => {
                    projectile.homing = true;
                    if projectile.turn_rate <= 0.0 {
                        projectile.turn_rate = self.homing_turn_rate;
                    }
                }
                UpgradeFlag::AreaSlow => loadout.area_slow = true,
                UpgradeFlag::AutoCollect => loadout.auto_collect = true,
            },
            UpgradeEffect::OnHit(tag) => {
                if !projectile.on_hit.contains(&tag) {
                    projectile.on_hit.push(tag);
                }
            }
            UpgradeEffect::Secondary(burst) => projectile.secondary = Some(burst),
            UpgradeEffect::Projectile(kind) => return self.swap_projectile(loadout, kind),
        }
        None
    }

    /// Replaces the projectile profile, carrying over granted capabilities.
    fn swap_projectile(
        &self,
        loadout: &mut TowerLoadout,
        kind: ProjectileKind,
    ) -> Option<SwapRejection> {
        let profile = match self.catalog.projectile(kind) {
            Ok(profile) => profile,
            Err(reason) => {
                return Some(SwapRejection {
                    requested: kind,
                    kept: loadout.projectile_kind,
                    reason,
                });
            }
        };

        let previous = &loadout.projectile;
        let mut next = profile.clone();
        next.can_pop_lead |= previous.can_pop_lead;
        next.can_pop_camo |= previous.can_pop_camo;
        if previous.homing && !next.homing {
            next.homing = true;
            next.turn_rate = previous.turn_rate;
        }
        if next.homing && next.turn_rate <= 0.0 {
            next.turn_rate = self.homing_turn_rate;
        }
        for tag in &previous.on_hit {
            if !next.on_hit.contains(tag) {
                next.on_hit.push(*tag);
            }
        }
        if next.secondary.is_none() {
            next.secondary = previous.secondary;
        }

        loadout.projectile = next;
        loadout.projectile_kind = kind;
        None
    }
}
