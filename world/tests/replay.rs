use std::time::Duration;

use pop_defence_catalog::Catalog;
use pop_defence_core::{
    Command, EngineConfig, EnemyKind, Event, Path, TowerId, TowerKind, Treasury, UpgradePath,
    Vec2,
};
use pop_defence_world::{self as world, query, World};

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

fn path() -> Path {
    Path::new(vec![
        Vec2::new(0.0, 200.0),
        Vec2::new(400.0, 200.0),
        Vec2::new(400.0, 500.0),
        Vec2::new(900.0, 500.0),
    ])
    .expect("valid path")
}

fn script() -> Vec<Command> {
    let mut commands = vec![
        Command::PlaceTower {
            kind: TowerKind::Arrow,
            position: Vec2::new(200.0, 150.0),
        },
        Command::PlaceTower {
            kind: TowerKind::Mortar,
            position: Vec2::new(600.0, 700.0),
        },
        Command::PlaceTower {
            kind: TowerKind::Cannon,
            position: Vec2::new(450.0, 350.0),
        },
        Command::AimTower {
            tower: TowerId::new(1),
            point: Vec2::new(400.0, 350.0),
        },
        Command::UpgradeTower {
            tower: TowerId::new(2),
            path: UpgradePath::Bottom,
            tier: 1,
        },
        Command::UpgradeTower {
            tower: TowerId::new(2),
            path: UpgradePath::Bottom,
            tier: 2,
        },
        Command::UpgradeTower {
            tower: TowerId::new(1),
            path: UpgradePath::Bottom,
            tier: 1,
        },
    ];

    let kinds = [
        EnemyKind::Red,
        EnemyKind::Blue,
        EnemyKind::Green,
        EnemyKind::Yellow,
        EnemyKind::Ceramic,
    ];
    for step in 0..400u32 {
        if step % 10 == 0 {
            let index = (step / 10) as usize % kinds.len();
            commands.push(Command::SpawnEnemy {
                kind: kinds[index],
                camo: false,
                regrowth: step % 30 == 0,
            });
        }
        commands.push(Command::Tick {
            dt: Duration::from_millis(50),
        });
    }
    commands
}

fn run(config: EngineConfig) -> (Vec<Event>, u64, u32) {
    let catalog = Catalog::builtin().expect("builtin catalog parses");
    let mut world = World::new(catalog, config, path());
    let mut purse = Purse(5_000);
    let mut events = Vec::new();
    for command in script() {
        world::apply(&mut world, command, &mut purse, &mut events);
    }
    (events, purse.0, query::lives_lost(&world))
}

#[test]
fn identical_scripts_replay_identically() {
    let first = run(EngineConfig::default());
    let second = run(EngineConfig::default());

    assert!(first
        .0
        .iter()
        .any(|event| matches!(event, Event::EnemyPopped { .. })));
    assert_eq!(first, second);
}

#[test]
fn the_script_exercises_upgrades_and_aimed_fire() {
    let (events, _, _) = run(EngineConfig::default());

    let upgrades = events
        .iter()
        .filter(|event| matches!(event, Event::TowerUpgraded { .. }))
        .count();
    assert_eq!(upgrades, 3);
    let placed = events
        .iter()
        .filter(|event| matches!(event, Event::TowerPlaced { .. }))
        .count();
    assert_eq!(placed, 3);
}
