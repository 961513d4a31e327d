#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable balance tables for towers, projectiles and upgrades.
//!
//! The catalog is parsed once from a TOML document and then only read. Lookups
//! are keyed by the closed enums from the core crate, so the rest of the engine
//! never resolves anything by name at runtime.

use std::collections::BTreeMap;

use pop_defence_core::{
    duration_from_secs, OnHitEffect, Passive, ProjectileConfig, ProjectileConfigError,
    ProjectileKind, Rgb, SecondaryBurst, Targeting, TowerKind, TowerLoadout, UpgradeEffect,
    UpgradePath, MAX_TIER,
};
use serde::Deserialize;

/// Catalog version understood by this crate.
pub const CATALOG_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");
const DEFAULT_FOOTPRINT_RADIUS: f32 = 20.0;

/// Failures raised while loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse catalog document")]
    Parse(#[from] toml::de::Error),
    /// The document declares a version this build cannot read.
    #[error("unsupported catalog version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
    /// Two entries describe the same tower kind.
    #[error("tower {kind:?} is declared more than once")]
    DuplicateTower {
        /// Repeated kind.
        kind: TowerKind,
    },
    /// Two entries describe the same projectile kind.
    #[error("projectile {kind:?} is declared more than once")]
    DuplicateProjectile {
        /// Repeated kind.
        kind: ProjectileKind,
    },
    /// A tower does not declare exactly three upgrade paths.
    #[error("tower {kind:?} declares {found} upgrade paths, expected 3")]
    PathCount {
        /// Offending tower.
        kind: TowerKind,
        /// Number of paths declared.
        found: usize,
    },
    /// An upgrade path does not declare exactly three tiers.
    #[error("tower {kind:?} path {path:?} declares {found} tiers, expected 3")]
    TierCount {
        /// Offending tower.
        kind: TowerKind,
        /// Offending path.
        path: UpgradePath,
        /// Number of tiers declared.
        found: usize,
    },
    /// A tower stat holds a value the engine cannot use.
    #[error("tower {kind:?} has an invalid {field}")]
    InvalidTower {
        /// Offending tower.
        kind: TowerKind,
        /// Name of the offending field.
        field: &'static str,
    },
    /// A tower's base projectile cannot be configured.
    #[error("tower {kind:?} has an unusable base projectile")]
    BaseProjectile {
        /// Offending tower.
        kind: TowerKind,
        /// Underlying projectile failure.
        #[source]
        source: ProjectileConfigError,
    },
}

/// One purchasable tier of an upgrade path.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeTier {
    /// Display name.
    pub name: String,
    /// Price debited from the treasury.
    pub price: u64,
    /// Stat changes, applied in order.
    pub effects: Vec<UpgradeEffect>,
}

/// One of a tower's three upgrade paths.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeTrack {
    /// Display name.
    pub name: String,
    /// Tiers one to three, in order.
    pub tiers: [UpgradeTier; 3],
}

/// Everything needed to place and upgrade one tower kind.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerBlueprint {
    kind: TowerKind,
    name: String,
    price: u64,
    loadout: TowerLoadout,
    tracks: [UpgradeTrack; 3],
}

impl TowerBlueprint {
    /// Kind described by the blueprint.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement price.
    #[must_use]
    pub const fn price(&self) -> u64 {
        self.price
    }

    /// Combat parameters of a freshly placed tower.
    #[must_use]
    pub const fn loadout(&self) -> &TowerLoadout {
        &self.loadout
    }

    /// Upgrade path table.
    #[must_use]
    pub fn track(&self, path: UpgradePath) -> &UpgradeTrack {
        &self.tracks[path.index()]
    }

    /// Tier `tier` of `path`, for tiers in `1..=3`.
    #[must_use]
    pub fn tier(&self, path: UpgradePath, tier: u8) -> Option<&UpgradeTier> {
        if tier == 0 || tier > MAX_TIER {
            return None;
        }
        self.track(path).tiers.get(usize::from(tier - 1))
    }
}

/// Immutable lookup of tower blueprints and projectile profiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    towers: BTreeMap<TowerKind, TowerBlueprint>,
    projectiles: BTreeMap<ProjectileKind, ProjectileConfig>,
}

impl Catalog {
    /// Loads the balance tables shipped with the engine.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parses and validates a catalog document.
    pub fn from_toml_str(document: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(document)?;
        if raw.version != CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: raw.version,
                expected: CATALOG_VERSION,
            });
        }

        let mut projectiles = BTreeMap::new();
        for profile in raw.projectiles {
            let kind = profile.kind;
            if projectiles.insert(kind, profile.into_config()).is_some() {
                return Err(CatalogError::DuplicateProjectile { kind });
            }
        }

        let mut towers = BTreeMap::new();
        for tower in raw.towers {
            let kind = tower.kind;
            let blueprint = tower.into_blueprint(&projectiles)?;
            if towers.insert(kind, blueprint).is_some() {
                return Err(CatalogError::DuplicateTower { kind });
            }
        }

        Ok(Self {
            towers,
            projectiles,
        })
    }

    /// Blueprint for `kind`, when the catalog provides one.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> Option<&TowerBlueprint> {
        self.towers.get(&kind)
    }

    /// Every blueprint in kind order.
    pub fn towers(&self) -> impl Iterator<Item = &TowerBlueprint> + '_ {
        self.towers.values()
    }

    /// Validated profile for `kind`.
    pub fn projectile(
        &self,
        kind: ProjectileKind,
    ) -> Result<&ProjectileConfig, ProjectileConfigError> {
        let config = self
            .projectiles
            .get(&kind)
            .ok_or(ProjectileConfigError::MissingProfile { kind })?;
        config.validate(kind)?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    version: u32,
    #[serde(default)]
    projectiles: Vec<RawProjectile>,
    #[serde(default)]
    towers: Vec<RawTower>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProjectile {
    kind: ProjectileKind,
    damage: f32,
    #[serde(default = "default_pierce")]
    pierce: u32,
    #[serde(default)]
    speed: f32,
    #[serde(default)]
    lifespan_secs: f32,
    #[serde(default = "unbounded")]
    max_distance: f32,
    #[serde(default)]
    aoe_radius: f32,
    #[serde(default)]
    radius: f32,
    #[serde(default)]
    can_pop_lead: bool,
    #[serde(default)]
    can_pop_camo: bool,
    #[serde(default)]
    homing: bool,
    #[serde(default)]
    turn_rate: f32,
    #[serde(default)]
    on_hit: Vec<OnHitEffect>,
    #[serde(default)]
    secondary: Option<SecondaryBurst>,
    color: Rgb,
}

fn default_pierce() -> u32 {
    1
}

fn unbounded() -> f32 {
    f32::INFINITY
}

impl RawProjectile {
    fn into_config(self) -> ProjectileConfig {
        ProjectileConfig {
            damage: self.damage,
            pierce: self.pierce,
            speed: self.speed,
            lifespan: duration_from_secs(self.lifespan_secs),
            max_distance: self.max_distance,
            aoe_radius: self.aoe_radius,
            radius: self.radius,
            can_pop_lead: self.can_pop_lead,
            can_pop_camo: self.can_pop_camo,
            homing: self.homing,
            turn_rate: self.turn_rate,
            on_hit: self.on_hit,
            secondary: self.secondary,
            color: self.color,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTower {
    kind: TowerKind,
    name: String,
    price: u64,
    range: f32,
    fire_rate: f32,
    #[serde(default = "default_footprint")]
    footprint_radius: f32,
    projectile: ProjectileKind,
    #[serde(default = "default_targeting")]
    targeting: Targeting,
    #[serde(default)]
    passive: Passive,
    #[serde(default)]
    paths: Vec<RawTrack>,
}

fn default_footprint() -> f32 {
    DEFAULT_FOOTPRINT_RADIUS
}

fn default_targeting() -> Targeting {
    Targeting::First
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTrack {
    name: String,
    tiers: Vec<UpgradeTier>,
}

impl RawTower {
    fn into_blueprint(
        self,
        projectiles: &BTreeMap<ProjectileKind, ProjectileConfig>,
    ) -> Result<TowerBlueprint, CatalogError> {
        let kind = self.kind;
        let invalid = |field| CatalogError::InvalidTower { kind, field };

        if self.range.is_nan() || self.range < 0.0 {
            return Err(invalid("range"));
        }
        if !self.fire_rate.is_finite() || self.fire_rate < 0.0 {
            return Err(invalid("fire_rate"));
        }
        if !self.footprint_radius.is_finite() || self.footprint_radius < 0.0 {
            return Err(invalid("footprint_radius"));
        }
        if let Targeting::Aimed { accuracy } = self.targeting {
            if !(0.0..=1.0).contains(&accuracy) {
                return Err(invalid("accuracy"));
            }
        }

        let projectile = projectiles
            .get(&self.projectile)
            .ok_or(ProjectileConfigError::MissingProfile {
                kind: self.projectile,
            })
            .and_then(|config| config.validate(self.projectile).map(|()| config.clone()))
            .map_err(|source| CatalogError::BaseProjectile { kind, source })?;

        let found = self.paths.len();
        let tracks: [RawTrack; 3] = self
            .paths
            .try_into()
            .map_err(|_| CatalogError::PathCount { kind, found })?;
        let [top, middle, bottom] = tracks;
        let tracks = [
            top.into_track(kind, UpgradePath::Top)?,
            middle.into_track(kind, UpgradePath::Middle)?,
            bottom.into_track(kind, UpgradePath::Bottom)?,
        ];

        Ok(TowerBlueprint {
            kind,
            name: self.name,
            price: self.price,
            loadout: TowerLoadout {
                range: self.range,
                fire_rate: self.fire_rate,
                footprint_radius: self.footprint_radius,
                projectile_kind: self.projectile,
                projectile,
                targeting: self.targeting,
                passive: self.passive,
                area_slow: false,
                auto_collect: false,
            },
            tracks,
        })
    }
}

impl RawTrack {
    fn into_track(self, kind: TowerKind, path: UpgradePath) -> Result<UpgradeTrack, CatalogError> {
        let found = self.tiers.len();
        let tiers = self
            .tiers
            .try_into()
            .map_err(|_| CatalogError::TierCount { kind, path, found })?;
        Ok(UpgradeTrack {
            name: self.name,
            tiers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version = 1

[[projectiles]]
kind = "dart"
damage = 1.0
speed = 300.0
lifespan_secs = 1.0
color = [0, 0, 0]

[[towers]]
kind = "arrow"
name = "Arrow"
price = 75
range = 100.0
fire_rate = 1.0
projectile = "dart"

[[towers.paths]]
name = "A"
tiers = [
    { name = "A1", price = 10, effects = [{ pierce = 1 }] },
    { name = "A2", price = 20, effects = [] },
    { name = "A3", price = 30, effects = [{ projectile = "heavy_dart" }] },
]

[[towers.paths]]
name = "B"
tiers = [
    { name = "B1", price = 10, effects = [{ fire_rate = 1.5 }] },
    { name = "B2", price = 20, effects = [] },
    { name = "B3", price = 30, effects = [] },
]

[[towers.paths]]
name = "C"
tiers = [
    { name = "C1", price = 10, effects = [{ flag = "can_pop_camo" }] },
    { name = "C2", price = 20, effects = [] },
    { name = "C3", price = 30, effects = [] },
]
"#;

    #[test]
    fn builtin_catalog_covers_every_tower() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        for kind in TowerKind::ALL {
            let blueprint = catalog.tower(kind).expect("blueprint present");
            assert_eq!(blueprint.kind(), kind);
            for path in UpgradePath::ALL {
                for tier in 1..=MAX_TIER {
                    assert!(blueprint.tier(path, tier).is_some());
                }
            }
        }
    }

    #[test]
    fn builtin_profiles_are_valid() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        for blueprint in catalog.towers() {
            for path in UpgradePath::ALL {
                for tier in &blueprint.track(path).tiers {
                    for effect in &tier.effects {
                        if let UpgradeEffect::Projectile(kind) = effect {
                            assert!(catalog.projectile(*kind).is_ok(), "{kind:?} profile");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn sniper_range_is_unbounded() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let sniper = catalog.tower(TowerKind::Sniper).expect("sniper present");
        assert!(sniper.loadout().range.is_infinite());
    }

    #[test]
    fn tack_fires_radially() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let tack = catalog.tower(TowerKind::Tack).expect("tack present");
        assert_eq!(tack.loadout().targeting, Targeting::Radial { directions: 8 });
    }

    #[test]
    fn effects_parse_as_tagged_variants() {
        let catalog = Catalog::from_toml_str(MINIMAL).expect("minimal catalog parses");
        let arrow = catalog.tower(TowerKind::Arrow).expect("arrow present");
        let tier = arrow.tier(UpgradePath::Top, 1).expect("tier present");
        assert_eq!(tier.effects, vec![UpgradeEffect::Pierce(1)]);
        let tier = arrow.tier(UpgradePath::Bottom, 1).expect("tier present");
        assert_eq!(
            tier.effects,
            vec![UpgradeEffect::Flag(pop_defence_core::UpgradeFlag::CanPopCamo)]
        );
        assert!(arrow.tier(UpgradePath::Top, 0).is_none());
        assert!(arrow.tier(UpgradePath::Top, 4).is_none());
    }

    #[test]
    fn missing_profiles_surface_as_config_errors() {
        let catalog = Catalog::from_toml_str(MINIMAL).expect("minimal catalog parses");
        assert_eq!(
            catalog.projectile(ProjectileKind::HeavyDart),
            Err(ProjectileConfigError::MissingProfile {
                kind: ProjectileKind::HeavyDart
            })
        );
        assert!(catalog.tower(TowerKind::Cannon).is_none());
    }

    #[test]
    fn rejects_unsupported_version() {
        let document = MINIMAL.replacen("version = 1", "version = 7", 1);
        assert!(matches!(
            Catalog::from_toml_str(&document),
            Err(CatalogError::UnsupportedVersion { found: 7, expected: 1 })
        ));
    }

    #[test]
    fn rejects_short_upgrade_paths() {
        let document = MINIMAL.replacen("    { name = \"A2\", price = 20, effects = [] },\n", "", 1);
        assert!(matches!(
            Catalog::from_toml_str(&document),
            Err(CatalogError::TierCount {
                kind: TowerKind::Arrow,
                path: UpgradePath::Top,
                found: 2
            })
        ));
    }

    #[test]
    fn rejects_unknown_base_projectile() {
        let document = MINIMAL.replacen("projectile = \"dart\"", "projectile = \"bomb\"", 1);
        assert!(matches!(
            Catalog::from_toml_str(&document),
            Err(CatalogError::BaseProjectile {
                kind: TowerKind::Arrow,
                ..
            })
        ));
    }
}
