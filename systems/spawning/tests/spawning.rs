use std::time::Duration;

use pop_defence_catalog::Catalog;
use pop_defence_core::{Command, EngineConfig, EnemyKind, Event, Path, Treasury, Vec2};
use pop_defence_system_spawning::{Spawning, WaveDescriptor};
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

fn world() -> World {
    let path = Path::new(vec![Vec2::ZERO, Vec2::new(5_000.0, 0.0)]).expect("valid path");
    World::new(
        Catalog::builtin().expect("builtin catalog parses"),
        EngineConfig::default(),
        path,
    )
}

fn descriptor(kind: EnemyKind, start_ms: u64, count: u32, interval_ms: u64) -> WaveDescriptor {
    WaveDescriptor {
        kind,
        start_offset: Duration::from_millis(start_ms),
        count,
        interval: Duration::from_millis(interval_ms),
        camo: false,
        regrowth: false,
    }
}

/// Runs the world with the spawner fed by the world's own events.
fn drive(spawning: &mut Spawning, ticks: usize, dt: Duration) -> (World, Vec<Event>) {
    let mut world = world();
    let mut purse = Purse(0);
    let mut log = Vec::new();
    let mut events = Vec::new();
    let mut commands = Vec::new();

    spawning.handle(&[], &mut commands);
    for _ in 0..ticks {
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut purse, &mut events);
        }
        world::apply(&mut world, Command::Tick { dt }, &mut purse, &mut events);
        spawning.handle(&events, &mut commands);
        log.append(&mut events);
    }
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut purse, &mut log);
    }
    (world, log)
}

fn spawned(events: &[Event]) -> Vec<EnemyKind> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn waves_materialize_as_enemies_in_time_order() {
    let mut spawning = Spawning::new(vec![
        descriptor(EnemyKind::Red, 0, 3, 400),
        descriptor(EnemyKind::Blue, 200, 2, 400),
    ]);

    let (world, events) = drive(&mut spawning, 20, Duration::from_millis(100));

    assert_eq!(
        spawned(&events),
        vec![
            EnemyKind::Red,
            EnemyKind::Blue,
            EnemyKind::Red,
            EnemyKind::Blue,
            EnemyKind::Red,
        ]
    );
    assert!(spawning.is_exhausted());
    assert_eq!(query::enemies(&world).len(), 5);
}

#[test]
fn large_ticks_release_every_due_spawn_at_once() {
    let mut spawning = Spawning::new(vec![descriptor(EnemyKind::Green, 0, 4, 500)]);

    let (world, events) = drive(&mut spawning, 1, Duration::from_secs(2));

    assert_eq!(spawned(&events).len(), 4);
    assert_eq!(query::enemies(&world).len(), 4);
}

#[test]
fn camo_and_regrowth_reach_the_spawned_enemies() {
    let mut spawning = Spawning::new(vec![WaveDescriptor {
        camo: true,
        regrowth: true,
        ..descriptor(EnemyKind::Pink, 0, 2, 100)
    }]);

    let (world, _) = drive(&mut spawning, 3, Duration::from_millis(100));

    let enemies = query::enemies(&world);
    assert_eq!(enemies.len(), 2);
    assert!(enemies
        .iter()
        .all(|enemy| enemy.is_camo() && enemy.is_regrowth()));
}

#[test]
fn wave_groups_wait_for_the_gap() {
    let mut spawning = Spawning::from_waves(
        vec![
            vec![descriptor(EnemyKind::Red, 0, 2, 500)],
            vec![descriptor(EnemyKind::Yellow, 0, 1, 0)],
        ],
        Duration::from_secs(3),
    );

    let (_, early) = drive(&mut spawning, 30, Duration::from_millis(100));
    assert_eq!(spawned(&early), vec![EnemyKind::Red, EnemyKind::Red]);
    assert_eq!(spawning.remaining(), 1);

    let mut spawning = Spawning::from_waves(
        vec![
            vec![descriptor(EnemyKind::Red, 0, 2, 500)],
            vec![descriptor(EnemyKind::Yellow, 0, 1, 0)],
        ],
        Duration::from_secs(3),
    );
    let (_, late) = drive(&mut spawning, 36, Duration::from_millis(100));
    assert_eq!(
        spawned(&late),
        vec![EnemyKind::Red, EnemyKind::Red, EnemyKind::Yellow]
    );
}
