//! Drives the world through a scenario and tallies the outcome.

use std::{fmt, time::Duration};

use anyhow::Result;
use pop_defence_catalog::Catalog;
use pop_defence_core::{
    duration_from_secs, Command, Event, TowerId, TowerKind, Treasury, UpgradePath, Vec2,
};
use pop_defence_system_spawning::Spawning;
use pop_defence_world::{self as world, query, World};
use tracing::{info, warn};

use crate::scenario::Scenario;

/// Operator balance held outside the engine.
#[derive(Debug)]
struct Purse {
    cash: u64,
}

impl Treasury for Purse {
    fn balance(&self) -> u64 {
        self.cash
    }

    fn debit(&mut self, amount: u64) {
        self.cash = self.cash.saturating_sub(amount);
    }

    fn credit(&mut self, amount: u64) {
        self.cash = self.cash.saturating_add(amount);
    }
}

#[derive(Clone, Copy, Debug)]
enum Order {
    Place {
        slot: usize,
        kind: TowerKind,
        position: Vec2,
    },
    Aim {
        slot: usize,
        point: Vec2,
    },
    Upgrade {
        slot: usize,
        path: UpgradePath,
        tier: u8,
    },
}

#[derive(Clone, Copy, Debug)]
struct TimedOrder {
    at: Duration,
    order: Order,
}

/// Totals reported once a run ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) elapsed: Duration,
    pub(crate) spawned: usize,
    pub(crate) pops: usize,
    pub(crate) leaks: usize,
    pub(crate) lives: u32,
    pub(crate) lives_lost: u32,
    pub(crate) cash: u64,
    pub(crate) income: u64,
    pub(crate) towers: usize,
    pub(crate) upgrades: usize,
    pub(crate) rejected: usize,
}

impl Summary {
    pub(crate) fn lives_left(&self) -> u32 {
        self.lives.saturating_sub(self.lives_lost)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks    {} ({:.1?} simulated)", self.ticks, self.elapsed)?;
        writeln!(
            f,
            "enemies  spawned {}, popped {}, leaked {}",
            self.spawned, self.pops, self.leaks
        )?;
        writeln!(f, "lives    {}/{}", self.lives_left(), self.lives)?;
        writeln!(f, "cash     {} (income {})", self.cash, self.income)?;
        write!(
            f,
            "towers   placed {}, upgrades {}, rejected orders {}",
            self.towers, self.upgrades, self.rejected
        )
    }
}

/// Headless loop that feeds orders and spawns into the world.
#[derive(Debug)]
pub(crate) struct Runner {
    world: World,
    spawning: Spawning,
    purse: Purse,
    orders: Vec<TimedOrder>,
    next_order: usize,
    placed: Vec<Option<TowerId>>,
    uncollected: Vec<TowerId>,
    tick: Duration,
    max_ticks: u64,
    summary: Summary,
}

impl Runner {
    pub(crate) fn new(scenario: &Scenario, catalog: Catalog) -> Result<Self> {
        let path = scenario.enemy_path()?;
        let world = World::new(catalog, scenario.engine.clone(), path);
        let spawning = Spawning::from_waves(scenario.wave_groups(), scenario.wave_gap());

        Ok(Self {
            world,
            spawning,
            purse: Purse {
                cash: scenario.starting_cash,
            },
            orders: schedule(scenario),
            next_order: 0,
            placed: vec![None; scenario.towers.len()],
            uncollected: Vec::new(),
            tick: scenario.tick(),
            max_ticks: scenario.max_ticks,
            summary: Summary {
                lives: scenario.lives,
                ..Summary::default()
            },
        })
    }

    /// Runs until the waves drain, the lives run out or the tick budget ends.
    pub(crate) fn run(mut self) -> Summary {
        let mut events = Vec::new();
        let mut spawns = Vec::new();
        self.spawning.handle(&[], &mut spawns);

        while self.summary.ticks < self.max_ticks {
            self.issue_orders(&mut events);
            for tower in self.uncollected.drain(..) {
                world::apply(
                    &mut self.world,
                    Command::CollectIncome { tower },
                    &mut self.purse,
                    &mut events,
                );
            }
            for command in spawns.drain(..) {
                world::apply(&mut self.world, command, &mut self.purse, &mut events);
            }
            world::apply(
                &mut self.world,
                Command::Tick { dt: self.tick },
                &mut self.purse,
                &mut events,
            );
            self.summary.ticks += 1;

            self.spawning.handle(&events, &mut spawns);
            self.tally(&events);
            events.clear();

            if self.summary.lives_lost >= self.summary.lives {
                info!(ticks = self.summary.ticks, "out of lives");
                break;
            }
            if self.is_settled(&spawns) {
                break;
            }
        }

        self.summary.elapsed = query::clock(&self.world);
        self.summary.cash = self.purse.cash;
        info!(
            ticks = self.summary.ticks,
            pops = self.summary.pops,
            leaks = self.summary.leaks,
            cash = self.summary.cash,
            "scenario finished"
        );
        self.summary
    }

    fn issue_orders(&mut self, events: &mut Vec<Event>) {
        let now = query::clock(&self.world);
        while let Some(timed) = self.orders.get(self.next_order).copied() {
            if timed.at > now {
                break;
            }
            self.next_order += 1;

            let command = match timed.order {
                Order::Place { kind, position, .. } => Command::PlaceTower { kind, position },
                Order::Aim { slot, point } => {
                    let Some(tower) = self.placed[slot] else {
                        continue;
                    };
                    Command::AimTower { tower, point }
                }
                Order::Upgrade { slot, path, tier } => {
                    let Some(tower) = self.placed[slot] else {
                        warn!(slot, ?path, tier, "upgrade skipped, tower was never placed");
                        self.summary.rejected += 1;
                        continue;
                    };
                    Command::UpgradeTower { tower, path, tier }
                }
            };

            let start = events.len();
            world::apply(&mut self.world, command, &mut self.purse, events);
            for event in &events[start..] {
                match (timed.order, event) {
                    (Order::Place { slot, .. }, Event::TowerPlaced { tower, .. }) => {
                        self.placed[slot] = Some(*tower);
                    }
                    (_, Event::TowerPlacementRejected { kind, reason }) => {
                        warn!(?kind, %reason, "tower placement rejected");
                    }
                    (_, Event::UpgradeRejected { tower, reason, .. }) => {
                        warn!(tower = tower.get(), %reason, "upgrade rejected");
                    }
                    _ => {}
                }
            }
        }
    }

    fn tally(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemySpawned { .. } => self.summary.spawned += 1,
                Event::EnemyPopped { .. } => self.summary.pops += 1,
                Event::EnemyLeaked { lives, .. } => {
                    self.summary.leaks += 1;
                    self.summary.lives_lost = self.summary.lives_lost.saturating_add(*lives);
                }
                Event::TowerPlaced { .. } => self.summary.towers += 1,
                Event::TowerUpgraded { .. } => self.summary.upgrades += 1,
                Event::TowerPlacementRejected { .. } | Event::UpgradeRejected { .. } => {
                    self.summary.rejected += 1;
                }
                Event::IncomeGenerated {
                    tower,
                    amount,
                    banked,
                } => {
                    if *banked {
                        self.uncollected.push(*tower);
                    } else {
                        self.summary.income += amount;
                    }
                }
                Event::IncomeCollected { amount, .. } => self.summary.income += amount,
                _ => {}
            }
        }
    }

    fn is_settled(&self, spawns: &[Command]) -> bool {
        self.next_order >= self.orders.len()
            && self.spawning.is_exhausted()
            && spawns.is_empty()
            && query::enemies(&self.world).is_empty()
    }
}

/// Flattens tower orders into a time-ordered list. Ties keep declaration
/// order, so a tower is placed before it is aimed or upgraded.
fn schedule(scenario: &Scenario) -> Vec<TimedOrder> {
    let mut orders = Vec::new();
    for (slot, tower) in scenario.towers.iter().enumerate() {
        let placed_at = duration_from_secs(tower.at_secs);
        orders.push(TimedOrder {
            at: placed_at,
            order: Order::Place {
                slot,
                kind: tower.kind,
                position: Vec2::from(tower.position),
            },
        });
        if let Some(point) = tower.aim {
            orders.push(TimedOrder {
                at: placed_at,
                order: Order::Aim {
                    slot,
                    point: Vec2::from(point),
                },
            });
        }
        for upgrade in &tower.upgrades {
            orders.push(TimedOrder {
                at: duration_from_secs(upgrade.at_secs).max(placed_at),
                order: Order::Upgrade {
                    slot,
                    path: upgrade.path,
                    tier: upgrade.tier,
                },
            });
        }
    }
    orders.sort_by_key(|timed| timed.at);
    orders
}
