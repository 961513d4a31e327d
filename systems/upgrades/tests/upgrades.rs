use std::time::Duration;

use pop_defence_catalog::Catalog;
use pop_defence_core::{
    EngineConfig, OnHitEffect, Projectile, ProjectileConfigError, ProjectileKind, Tower, TowerId,
    TowerKind, Treasury, UpgradeError, UpgradePath, Vec2,
};
use pop_defence_system_upgrades::{SwapRejection, UpgradeEngine};

const CATALOG: &str = r#"
version = 1

[[projectiles]]
kind = "dart"
damage = 1.0
speed = 300.0
lifespan_secs = 1.0
radius = 4.0
color = [10, 10, 10]

[[projectiles]]
kind = "heavy_dart"
damage = 2.0
pierce = 4
speed = 450.0
lifespan_secs = 1.5
radius = 6.0
color = [20, 20, 20]

[[towers]]
kind = "arrow"
name = "Arrow"
price = 75
range = 100.0
fire_rate = 1.0
projectile = "dart"

[[towers.paths]]
name = "Sharp"
tiers = [
    { name = "Sharp Darts", price = 10, effects = [{ pierce = 1 }] },
    { name = "Heavy Tips", price = 20, effects = [{ damage = 1.0 }] },
    { name = "Heavy Darts", price = 30, effects = [{ projectile = "heavy_dart" }] },
]

[[towers.paths]]
name = "Quick"
tiers = [
    { name = "Quick Hands", price = 10, effects = [{ fire_rate = 1.5 }] },
    { name = "Long Arms", price = 20, effects = [{ range = 20.0 }] },
    { name = "Blade Storm", price = 30, effects = [{ projectile = "blade" }] },
]

[[towers.paths]]
name = "Sight"
tiers = [
    { name = "Keen Eyes", price = 10, effects = [{ flag = "can_pop_camo" }] },
    { name = "Seeker", price = 20, effects = [{ flag = "homing" }] },
    { name = "Frost Tips", price = 30, effects = [{ on_hit = "slow" }, { secondary = { count = 4, damage = 1.0, pierce = 1, speed = 200.0, lifespan_secs = 0.3, radius = 3.0 } }] },
]
"#;

struct Purse(u64);

impl Treasury for Purse {
    fn balance(&self) -> u64 {
        self.0
    }

    fn debit(&mut self, amount: u64) {
        self.0 = self.0.saturating_sub(amount);
    }

    fn credit(&mut self, amount: u64) {
        self.0 += amount;
    }
}

fn engine() -> UpgradeEngine {
    let catalog = Catalog::from_toml_str(CATALOG).expect("test catalog parses");
    UpgradeEngine::new(catalog, &EngineConfig::default())
}

fn arrow(engine: &UpgradeEngine) -> Tower {
    let blueprint = engine
        .catalog()
        .tower(TowerKind::Arrow)
        .expect("arrow blueprint");
    Tower::new(
        TowerId::new(3),
        TowerKind::Arrow,
        Vec2::ZERO,
        blueprint.loadout().clone(),
        blueprint.price(),
        Duration::ZERO,
    )
}

fn launch(tower: &Tower) -> Projectile {
    let loadout = tower.loadout();
    Projectile::launch(
        loadout.projectile_kind,
        &loadout.projectile,
        tower.position(),
        Vec2::new(100.0, 0.0),
        None,
    )
}

#[test]
fn tiers_must_be_bought_in_order() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);

    assert_eq!(
        engine.apply_upgrade(&mut tower, UpgradePath::Top, 2, &mut purse),
        Err(UpgradeError::NotSequential {
            path: UpgradePath::Top,
            current: 0,
            requested: 2,
        })
    );
    assert_eq!(purse.balance(), 1_000);

    assert!(engine
        .apply_upgrade(&mut tower, UpgradePath::Top, 1, &mut purse)
        .is_ok());
    assert!(engine
        .apply_upgrade(&mut tower, UpgradePath::Top, 2, &mut purse)
        .is_ok());
    assert_eq!(tower.upgrades().tier(UpgradePath::Top), 2);
    assert_eq!(purse.balance(), 970);
}

#[test]
fn tiers_outside_the_table_are_invalid() {
    let engine = engine();
    let tower = arrow(&engine);

    assert_eq!(
        engine.check(&tower, UpgradePath::Top, 0).err(),
        Some(UpgradeError::InvalidTier { tier: 0 })
    );
    assert_eq!(
        engine.check(&tower, UpgradePath::Top, 4).err(),
        Some(UpgradeError::InvalidTier { tier: 4 })
    );
}

#[test]
fn second_active_path_locks_the_third_for_good() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);

    let first = engine
        .apply_upgrade(&mut tower, UpgradePath::Top, 1, &mut purse)
        .expect("first path opens");
    assert_eq!(first.locked, None);
    let second = engine
        .apply_upgrade(&mut tower, UpgradePath::Middle, 1, &mut purse)
        .expect("second path opens");
    assert_eq!(second.locked, Some(UpgradePath::Bottom));

    for tier in 1..=3 {
        assert!(!engine.can_upgrade(&tower, UpgradePath::Bottom, tier));
    }

    let _ = engine
        .apply_upgrade(&mut tower, UpgradePath::Top, 2, &mut purse)
        .expect("active path keeps upgrading");
    assert_eq!(
        engine.apply_upgrade(&mut tower, UpgradePath::Bottom, 1, &mut purse),
        Err(UpgradeError::PathLocked {
            path: UpgradePath::Bottom
        })
    );
    assert_eq!(tower.upgrades().locked(), Some(UpgradePath::Bottom));
}

#[test]
fn insufficient_funds_rejects_without_mutation() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let before = tower.loadout().clone();
    let mut purse = Purse(5);

    assert_eq!(
        engine.apply_upgrade(&mut tower, UpgradePath::Top, 1, &mut purse),
        Err(UpgradeError::InsufficientFunds {
            price: 10,
            balance: 5,
        })
    );
    assert_eq!(purse.balance(), 5);
    assert_eq!(tower.loadout(), &before);
    assert_eq!(tower.upgrades().tier(UpgradePath::Top), 0);
    assert_eq!(tower.invested(), 75);
}

#[test]
fn maxed_paths_reject_further_tiers() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);
    for tier in 1..=3 {
        let _ = engine
            .apply_upgrade(&mut tower, UpgradePath::Top, tier, &mut purse)
            .expect("sequential tiers succeed");
    }

    assert_eq!(
        engine.check(&tower, UpgradePath::Top, 3).err(),
        Some(UpgradeError::AlreadyMaxed {
            path: UpgradePath::Top
        })
    );
    assert_eq!(tower.invested(), 135);
}

#[test]
fn effects_compose_multiplicatively_and_additively() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);

    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Top, 1, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Top, 2, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Middle, 1, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Middle, 2, &mut purse);

    let loadout = tower.loadout();
    assert_eq!(loadout.projectile.pierce, 2);
    assert_eq!(loadout.projectile.damage, 2.0);
    assert_eq!(loadout.fire_rate, 1.5);
    assert_eq!(loadout.range, 120.0);
    assert_eq!(tower.base_fire_rate(), 1.0);
}

#[test]
fn capstone_swap_changes_only_new_projectiles() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);

    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Bottom, 1, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Top, 1, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Top, 2, &mut purse);
    let in_flight = launch(&tower);
    tower.projectiles_mut().push(in_flight);

    let receipt = engine
        .apply_upgrade(&mut tower, UpgradePath::Top, 3, &mut purse)
        .expect("capstone applies");
    assert_eq!(receipt.swap_rejected, None);
    assert_eq!(tower.loadout().projectile_kind, ProjectileKind::HeavyDart);
    assert!(tower.loadout().projectile.can_pop_camo);

    let old = &tower.projectiles()[0];
    assert_eq!(old.kind(), ProjectileKind::Dart);
    assert_eq!(old.pierce(), 2);
    assert_eq!(old.speed(), 300.0);
    assert_eq!(old.radius(), 4.0);

    let fresh = launch(&tower);
    assert_eq!(fresh.kind(), ProjectileKind::HeavyDart);
    assert_eq!(fresh.pierce(), 4);
    assert_eq!(fresh.speed(), 450.0);
    assert_eq!(fresh.radius(), 6.0);
    assert!(fresh.can_pop_camo());
}

#[test]
fn missing_profile_keeps_the_previous_projectile() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);
    for tier in 1..=2 {
        let _ = engine.apply_upgrade(&mut tower, UpgradePath::Middle, tier, &mut purse);
    }

    let receipt = engine
        .apply_upgrade(&mut tower, UpgradePath::Middle, 3, &mut purse)
        .expect("tier is still bought");
    assert_eq!(
        receipt.swap_rejected,
        Some(SwapRejection {
            requested: ProjectileKind::Blade,
            kept: ProjectileKind::Dart,
            reason: ProjectileConfigError::MissingProfile {
                kind: ProjectileKind::Blade
            },
        })
    );
    assert_eq!(tower.loadout().projectile_kind, ProjectileKind::Dart);
    assert_eq!(tower.upgrades().tier(UpgradePath::Middle), 3);
    assert_eq!(purse.balance(), 940);
}

#[test]
fn homing_without_a_turn_rate_uses_the_engine_default() {
    let engine = engine();
    let mut tower = arrow(&engine);
    let mut purse = Purse(1_000);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Bottom, 1, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Bottom, 2, &mut purse);
    let _ = engine.apply_upgrade(&mut tower, UpgradePath::Bottom, 3, &mut purse);

    let projectile = &tower.loadout().projectile;
    assert!(projectile.homing);
    assert_eq!(projectile.turn_rate, EngineConfig::default().homing_turn_rate);
    assert_eq!(projectile.on_hit, vec![OnHitEffect::Slow]);
}

#[test]
fn swap_keeps_purchased_tags_and_bursts_in_any_order() {
    let engine = engine();
    let mut purse = Purse(1_000);

    let mut sight_first = arrow(&engine);
    for path in [UpgradePath::Bottom, UpgradePath::Top] {
        for tier in 1..=3 {
            let _ = engine
                .apply_upgrade(&mut sight_first, path, tier, &mut purse)
                .expect("tier applies");
        }
    }

    let mut capstone_first = arrow(&engine);
    for path in [UpgradePath::Top, UpgradePath::Bottom] {
        for tier in 1..=3 {
            let _ = engine
                .apply_upgrade(&mut capstone_first, path, tier, &mut purse)
                .expect("tier applies");
        }
    }

    let projectile = &sight_first.loadout().projectile;
    assert_eq!(sight_first.loadout().projectile_kind, ProjectileKind::HeavyDart);
    assert_eq!(projectile.on_hit, vec![OnHitEffect::Slow]);
    assert_eq!(projectile.secondary.map(|burst| burst.count), Some(4));
    assert!(projectile.can_pop_camo);
    assert!(projectile.homing);
    assert_eq!(sight_first.loadout(), capstone_first.loadout());
}

#[test]
fn preview_reports_price_and_eligibility() {
    let engine = engine();
    let tower = arrow(&engine);

    let preview = engine
        .preview(&tower, UpgradePath::Top, 1, 100)
        .expect("tier exists");
    assert_eq!(preview.name, "Sharp Darts");
    assert_eq!(preview.price, 10);
    assert!(preview.eligible);

    let broke = engine
        .preview(&tower, UpgradePath::Top, 1, 3)
        .expect("tier exists");
    assert!(!broke.eligible);
    assert_eq!(
        broke.rejection,
        Some(UpgradeError::InsufficientFunds {
            price: 10,
            balance: 3,
        })
    );

    let skipped = engine
        .preview(&tower, UpgradePath::Top, 3, 100)
        .expect("tier exists");
    assert!(!skipped.eligible);
    assert!(engine.preview(&tower, UpgradePath::Top, 4, 100).is_none());
}
