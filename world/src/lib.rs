#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Pop Defence.
//!
//! The world owns every enemy and tower. Adapters mutate it exclusively through
//! [`apply`], which executes a [`Command`] and reports the outcome as
//! [`Event`] values, and read it through the [`query`] module. A tick runs in a
//! fixed order: status expiry, movement, leaks, per-tower combat in identifier
//! order and finally the death sweep.

mod towers;

use std::{sync::Arc, time::Duration};

use pop_defence_catalog::Catalog;
use pop_defence_core::{
    Command, Enemy, EnemyId, EnemyKind, EngineConfig, Event, Path, PlacementError, RemovalError,
    Tower, TowerId, TowerKind, Treasury, UpgradeError, UpgradePath, Vec2, VisualDrawRequest,
};
use pop_defence_system_movement::Movement;
use pop_defence_system_status_effects::StatusEffectTracker;
use pop_defence_system_tower_combat::TowerCombat;
use pop_defence_system_upgrades::UpgradeEngine;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::towers::TowerRegistry;

/// Represents the authoritative Pop Defence world state.
#[derive(Debug)]
pub struct World {
    config: EngineConfig,
    upgrades: UpgradeEngine,
    path: Arc<Path>,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    next_enemy_id: EnemyId,
    clock: Duration,
    lives_lost: u32,
    rng: ChaCha8Rng,
    tracker: StatusEffectTracker,
    movement: Movement,
    combat: TowerCombat,
    visuals: Vec<VisualDrawRequest>,
    leaked: Vec<EnemyId>,
}

impl World {
    /// Creates an empty world whose enemies walk `path`.
    #[must_use]
    pub fn new(catalog: Catalog, config: EngineConfig, path: Path) -> Self {
        Self {
            upgrades: UpgradeEngine::new(catalog, &config),
            path: Arc::new(path),
            enemies: Vec::new(),
            towers: TowerRegistry::new(),
            next_enemy_id: EnemyId::new(0),
            clock: Duration::ZERO,
            lives_lost: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tracker: StatusEffectTracker::new(&config),
            movement: Movement::default(),
            combat: TowerCombat::new(&config),
            visuals: Vec::new(),
            leaked: Vec::new(),
            config,
        }
    }

    fn allocate_enemy(&mut self) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().wrapping_add(1));
        id
    }

    fn place_tower<T>(
        &mut self,
        kind: TowerKind,
        position: Vec2,
        treasury: &mut T,
        out_events: &mut Vec<Event>,
    ) where
        T: Treasury + ?Sized,
    {
        let Some(blueprint) = self.upgrades.catalog().tower(kind) else {
            out_events.push(Event::TowerPlacementRejected {
                kind,
                reason: PlacementError::Unavailable { kind },
            });
            return;
        };

        let price = blueprint.price();
        let balance = treasury.balance();
        if price > balance {
            debug!(?kind, price, balance, "tower placement rejected");
            out_events.push(Event::TowerPlacementRejected {
                kind,
                reason: PlacementError::InsufficientFunds { price, balance },
            });
            return;
        }

        treasury.debit(price);
        let id = self.towers.allocate();
        let loadout = blueprint.loadout().clone();
        self.towers
            .insert(Tower::new(id, kind, position, loadout, price, self.clock));
        debug!(tower = id.get(), ?kind, price, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower: id,
            kind,
            price,
        });
    }

    fn sell_tower<T>(&mut self, tower: TowerId, treasury: &mut T, out_events: &mut Vec<Event>)
    where
        T: Treasury + ?Sized,
    {
        let Some(mut sold) = self.towers.remove(tower) else {
            out_events.push(Event::TowerRemovalRejected {
                tower,
                reason: RemovalError::MissingTower,
            });
            return;
        };

        let banked = sold.take_banked();
        if banked > 0 {
            treasury.credit(banked);
            out_events.push(Event::IncomeCollected {
                tower,
                amount: banked,
            });
        }

        let refund = self.config.refund_for(sold.invested());
        treasury.credit(refund);
        debug!(
            tower = tower.get(),
            refund,
            dropped = sold.projectiles().len(),
            "tower sold"
        );
        out_events.push(Event::TowerSold { tower, refund });
    }

    fn upgrade_tower<T>(
        &mut self,
        tower: TowerId,
        path: UpgradePath,
        tier: u8,
        treasury: &mut T,
        out_events: &mut Vec<Event>,
    ) where
        T: Treasury + ?Sized,
    {
        let result = match self.towers.get_mut(tower) {
            Some(target) => self.upgrades.apply_upgrade(target, path, tier, treasury),
            None => Err(UpgradeError::MissingTower { tower }),
        };

        match result {
            Ok(receipt) => {
                debug!(
                    tower = tower.get(),
                    ?path,
                    tier,
                    price = receipt.price,
                    name = %receipt.name,
                    "upgrade applied"
                );
                out_events.push(Event::TowerUpgraded {
                    tower,
                    path,
                    tier,
                    price: receipt.price,
                });
                if let Some(rejection) = receipt.swap_rejected {
                    out_events.push(Event::ProjectileSwapRejected {
                        tower,
                        requested: rejection.requested,
                        kept: rejection.kept,
                    });
                }
            }
            Err(reason) => {
                debug!(tower = tower.get(), ?path, tier, %reason, "upgrade rejected");
                out_events.push(Event::UpgradeRejected {
                    tower,
                    path,
                    tier,
                    reason,
                });
            }
        }
    }

    fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        camo: bool,
        regrowth: bool,
        out_events: &mut Vec<Event>,
    ) {
        let id = self.allocate_enemy();
        self.enemies
            .push(Enemy::spawn(id, kind, Arc::clone(&self.path), camo, regrowth));
        out_events.push(Event::EnemySpawned { enemy: id, kind });
    }

    fn tick<T>(&mut self, dt: Duration, treasury: &mut T, out_events: &mut Vec<Event>)
    where
        T: Treasury + ?Sized,
    {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        self.visuals.clear();

        for enemy in &mut self.enemies {
            let _ = self.tracker.expire_check(enemy, self.clock);
        }

        self.leaked.clear();
        self.movement
            .handle(&mut self.enemies, dt, &self.tracker, &mut self.leaked);
        let lives_lost = self.resolve_leaks(out_events);

        let mut money: u64 = 0;
        for tower in self.towers.iter_mut() {
            let outcome = self.combat.handle(
                tower,
                &mut self.enemies,
                self.clock,
                dt,
                &mut self.rng,
                &mut self.visuals,
            );
            if let Some(income) = outcome.income {
                if !income.banked {
                    treasury.credit(income.amount);
                    money = money.saturating_add(income.amount);
                }
                out_events.push(Event::IncomeGenerated {
                    tower: tower.id(),
                    amount: income.amount,
                    banked: income.banked,
                });
            }
        }

        money = money.saturating_add(self.sweep_dead(treasury, out_events));
        self.lives_lost = self.lives_lost.saturating_add(lives_lost);
        trace!(
            clock = ?self.clock,
            enemies = self.enemies.len(),
            held = self.movement.held_last_tick(),
            money,
            lives_lost,
            "tick resolved"
        );
        out_events.push(Event::TickResolved {
            money_delta: i64::try_from(money).unwrap_or(i64::MAX),
            lives_lost,
        });
    }

    /// Removes enemies that reached the end of the path, returning the lives lost.
    fn resolve_leaks(&mut self, out_events: &mut Vec<Event>) -> u32 {
        if self.leaked.is_empty() {
            return 0;
        }

        let mut lives_lost = 0u32;
        let leaked = &self.leaked;
        self.enemies.retain(|enemy| {
            if !leaked.contains(&enemy.id()) {
                return true;
            }
            let lives = enemy.leak_damage();
            lives_lost = lives_lost.saturating_add(lives);
            debug!(enemy = enemy.id().get(), kind = ?enemy.kind(), lives, "enemy leaked");
            out_events.push(Event::EnemyLeaked {
                enemy: enemy.id(),
                kind: enemy.kind(),
                lives,
            });
            false
        });
        lives_lost
    }

    /// Replaces popped enemies with their children, in place, and credits
    /// their rewards. Returns the money credited.
    fn sweep_dead<T>(&mut self, treasury: &mut T, out_events: &mut Vec<Event>) -> u64
    where
        T: Treasury + ?Sized,
    {
        if !self.enemies.iter().any(Enemy::is_dead) {
            return 0;
        }

        let mut rewards: u64 = 0;
        let previous = std::mem::take(&mut self.enemies);
        self.enemies.reserve(previous.len());
        for enemy in previous {
            if !enemy.is_dead() {
                self.enemies.push(enemy);
                continue;
            }

            let mut children = Vec::new();
            for child in enemy.on_death() {
                let id = self.allocate_enemy();
                self.enemies
                    .push(Enemy::from_child(id, child, Arc::clone(&self.path)));
                children.push(id);
            }

            let reward = enemy.money();
            treasury.credit(reward);
            rewards = rewards.saturating_add(reward);
            debug!(
                enemy = enemy.id().get(),
                kind = ?enemy.kind(),
                reward,
                children = children.len(),
                "enemy popped"
            );
            out_events.push(Event::EnemyPopped {
                enemy: enemy.id(),
                kind: enemy.kind(),
                reward,
                children,
            });
        }
        rewards
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply<T>(world: &mut World, command: Command, treasury: &mut T, out_events: &mut Vec<Event>)
where
    T: Treasury + ?Sized,
{
    match command {
        Command::PlaceTower { kind, position } => {
            world.place_tower(kind, position, treasury, out_events);
        }
        Command::SellTower { tower } => world.sell_tower(tower, treasury, out_events),
        Command::UpgradeTower { tower, path, tier } => {
            world.upgrade_tower(tower, path, tier, treasury, out_events);
        }
        Command::AimTower { tower, point } => match world.towers.get_mut(tower) {
            Some(target) => target.set_aim_point(point),
            None => debug!(tower = tower.get(), "aim ignored for missing tower"),
        },
        Command::CollectIncome { tower } => {
            let amount = world
                .towers
                .get_mut(tower)
                .map_or(0, |target| target.take_banked());
            if amount > 0 {
                treasury.credit(amount);
                out_events.push(Event::IncomeCollected { tower, amount });
            }
        }
        Command::SpawnEnemy {
            kind,
            camo,
            regrowth,
        } => world.spawn_enemy(kind, camo, regrowth, out_events),
        Command::Tick { dt } => world.tick(dt, treasury, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use pop_defence_catalog::Catalog;
    use pop_defence_core::{
        Enemy, EngineConfig, Path, Tower, TowerId, UpgradePath, UpgradePreview, VisualDrawRequest,
    };

    use super::World;

    /// Live enemies in spawn order, children taking their parent's slot.
    #[must_use]
    pub fn enemies(world: &World) -> &[Enemy] {
        &world.enemies
    }

    /// Placed towers in identifier order.
    #[must_use]
    pub fn towers(world: &World) -> &[Tower] {
        world.towers.as_slice()
    }

    /// Looks up a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<&Tower> {
        world.towers.get(tower)
    }

    /// Describes an upgrade tier for a menu, given the player's `balance`.
    #[must_use]
    pub fn upgrade_preview(
        world: &World,
        tower: TowerId,
        path: UpgradePath,
        tier: u8,
        balance: u64,
    ) -> Option<UpgradePreview> {
        let target = world.towers.get(tower)?;
        world.upgrades.preview(target, path, tier, balance)
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Lives lost to leaks since the world was created.
    #[must_use]
    pub fn lives_lost(world: &World) -> u32 {
        world.lives_lost
    }

    /// Draw requests produced by the most recent tick.
    #[must_use]
    pub fn visuals(world: &World) -> &[VisualDrawRequest] {
        &world.visuals
    }

    /// Balance tables the world was built with.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        world.upgrades.catalog()
    }

    /// Path every enemy walks.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Tunables the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &EngineConfig {
        &world.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_defence_core::ProjectileKind;

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

    fn world() -> World {
        let path = Path::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1_000.0, 0.0)])
            .expect("valid path");
        World::new(
            Catalog::builtin().expect("builtin catalog parses"),
            EngineConfig::default(),
            path,
        )
    }

    fn place(world: &mut World, kind: TowerKind, purse: &mut Purse) -> TowerId {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceTower {
                kind,
                position: Vec2::new(100.0, 50.0),
            },
            purse,
            &mut events,
        );
        match events.as_slice() {
            [Event::TowerPlaced { tower, .. }] => *tower,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn placement_debits_the_price() {
        let mut world = world();
        let mut purse = Purse(500);
        let price = query::catalog(&world)
            .tower(TowerKind::Arrow)
            .expect("arrow blueprint")
            .price();

        let tower = place(&mut world, TowerKind::Arrow, &mut purse);
        assert_eq!(purse.0, 500 - price);
        assert_eq!(query::towers(&world).len(), 1);
        assert_eq!(query::tower(&world, tower).map(Tower::invested), Some(price));
    }

    #[test]
    fn placement_without_funds_is_rejected() {
        let mut world = world();
        let mut purse = Purse(10);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Sniper,
                position: Vec2::ZERO,
            },
            &mut purse,
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::TowerPlacementRejected {
                kind: TowerKind::Sniper,
                reason: PlacementError::InsufficientFunds { balance: 10, .. },
            }]
        ));
        assert_eq!(purse.0, 10);
        assert!(query::towers(&world).is_empty());
    }

    #[test]
    fn selling_refunds_a_share_of_the_investment() {
        let mut world = world();
        let mut purse = Purse(1_000);
        let tower = place(&mut world, TowerKind::Arrow, &mut purse);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UpgradeTower {
                tower,
                path: UpgradePath::Top,
                tier: 1,
            },
            &mut purse,
            &mut events,
        );
        let invested = query::tower(&world, tower)
            .map(Tower::invested)
            .expect("tower present");
        let before = purse.0;

        events.clear();
        apply(&mut world, Command::SellTower { tower }, &mut purse, &mut events);

        let refund = EngineConfig::default().refund_for(invested);
        assert_eq!(events, vec![Event::TowerSold { tower, refund }]);
        assert_eq!(purse.0, before + refund);
        assert!(query::tower(&world, tower).is_none());
    }

    #[test]
    fn selling_a_missing_tower_is_rejected() {
        let mut world = world();
        let mut purse = Purse(0);
        let mut events = Vec::new();
        let tower = TowerId::new(9);

        apply(&mut world, Command::SellTower { tower }, &mut purse, &mut events);

        assert_eq!(
            events,
            vec![Event::TowerRemovalRejected {
                tower,
                reason: RemovalError::MissingTower,
            }]
        );
    }

    #[test]
    fn upgrading_a_missing_tower_is_rejected() {
        let mut world = world();
        let mut purse = Purse(1_000);
        let mut events = Vec::new();
        let tower = TowerId::new(3);

        apply(
            &mut world,
            Command::UpgradeTower {
                tower,
                path: UpgradePath::Middle,
                tier: 1,
            },
            &mut purse,
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UpgradeRejected {
                tower,
                path: UpgradePath::Middle,
                tier: 1,
                reason: UpgradeError::MissingTower { tower },
            }]
        );
        assert_eq!(purse.0, 1_000);
    }

    #[test]
    fn capstone_upgrade_swaps_the_projectile() {
        let mut world = world();
        let mut purse = Purse(10_000);
        let tower = place(&mut world, TowerKind::Arrow, &mut purse);
        let mut events = Vec::new();
        for tier in 1..=3 {
            apply(
                &mut world,
                Command::UpgradeTower {
                    tower,
                    path: UpgradePath::Top,
                    tier,
                },
                &mut purse,
                &mut events,
            );
        }

        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::UpgradeRejected { .. })));
        let kind = query::tower(&world, tower).map(|tower| tower.loadout().projectile_kind);
        assert_eq!(kind, Some(ProjectileKind::HeavyDart));
    }

    #[test]
    fn farm_income_banks_until_collected() {
        let mut world = world();
        let mut purse = Purse(1_000);
        let farm = place(&mut world, TowerKind::Farm, &mut purse);
        let after_placement = purse.0;
        let mut events = Vec::new();

        for _ in 0..60 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(100),
                },
                &mut purse,
                &mut events,
            );
        }
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::IncomeGenerated { banked: true, .. })));
        assert_eq!(purse.0, after_placement);
        let banked = query::tower(&world, farm)
            .map(Tower::banked_income)
            .expect("farm present");
        assert!(banked > 0);

        events.clear();
        apply(
            &mut world,
            Command::CollectIncome { tower: farm },
            &mut purse,
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::IncomeCollected {
                tower: farm,
                amount: banked,
            }]
        );
        assert_eq!(purse.0, after_placement + banked);
    }

    #[test]
    fn every_tick_ends_with_a_report() {
        let mut world = world();
        let mut purse = Purse(0);
        let mut events = Vec::new();
        let dt = Duration::from_millis(16);

        apply(&mut world, Command::Tick { dt }, &mut purse, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced { dt },
                Event::TickResolved {
                    money_delta: 0,
                    lives_lost: 0,
                },
            ]
        );
        assert_eq!(query::clock(&world), dt);
    }
}
