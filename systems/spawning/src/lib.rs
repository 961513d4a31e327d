#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that materializes wave descriptors into
//! enemy spawn commands as simulated time advances.

use std::time::Duration;

use pop_defence_core::{Command, EnemyKind, Event};

/// A run of identical enemies released at a fixed cadence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveDescriptor {
    /// Archetype of every enemy in the run.
    pub kind: EnemyKind,
    /// Offset of the first spawn from the start of the schedule.
    pub start_offset: Duration,
    /// Number of enemies released.
    pub count: u32,
    /// Time between consecutive spawns.
    pub interval: Duration,
    /// Whether the enemies are camo.
    pub camo: bool,
    /// Whether the enemies carry the regrowth trait.
    pub regrowth: bool,
}

impl WaveDescriptor {
    /// Offset of the last spawn in the run.
    #[must_use]
    pub fn end_offset(&self) -> Duration {
        let repeats = self.count.saturating_sub(1);
        self.start_offset
            .saturating_add(self.interval.saturating_mul(repeats))
    }
}

#[derive(Clone, Copy, Debug)]
struct ScheduledSpawn {
    at: Duration,
    order: usize,
    repeat: u32,
    kind: EnemyKind,
    camo: bool,
    regrowth: bool,
}

/// Pure system that emits `SpawnEnemy` commands from a wave schedule.
#[derive(Debug)]
pub struct Spawning {
    schedule: Vec<ScheduledSpawn>,
    next: usize,
    elapsed: Duration,
}

impl Spawning {
    /// Creates a spawner for descriptors whose offsets share one origin.
    #[must_use]
    pub fn new(descriptors: Vec<WaveDescriptor>) -> Self {
        let mut schedule = Vec::new();
        for (order, descriptor) in descriptors.iter().enumerate() {
            for repeat in 0..descriptor.count {
                schedule.push(ScheduledSpawn {
                    at: descriptor
                        .start_offset
                        .saturating_add(descriptor.interval.saturating_mul(repeat)),
                    order,
                    repeat,
                    kind: descriptor.kind,
                    camo: descriptor.camo,
                    regrowth: descriptor.regrowth,
                });
            }
        }
        schedule.sort_by_key(|spawn| (spawn.at, spawn.order, spawn.repeat));

        Self {
            schedule,
            next: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Chains wave groups, starting each group `gap` after the previous
    /// group's final spawn. Offsets inside a group are relative to its start.
    #[must_use]
    pub fn from_waves(waves: Vec<Vec<WaveDescriptor>>, gap: Duration) -> Self {
        let mut descriptors = Vec::new();
        let mut origin = Duration::ZERO;
        for (index, wave) in waves.into_iter().enumerate() {
            if index > 0 {
                origin = origin.saturating_add(gap);
            }
            let mut end = origin;
            for descriptor in wave {
                let shifted = WaveDescriptor {
                    start_offset: origin.saturating_add(descriptor.start_offset),
                    ..descriptor
                };
                if shifted.count > 0 {
                    end = end.max(shifted.end_offset());
                }
                descriptors.push(shifted);
            }
            origin = end;
        }
        Self::new(descriptors)
    }

    /// Consumes time events and emits the spawns that have come due.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.elapsed = self.elapsed.saturating_add(*dt);
            }
        }

        while let Some(spawn) = self.schedule.get(self.next) {
            if spawn.at > self.elapsed {
                break;
            }
            out.push(Command::SpawnEnemy {
                kind: spawn.kind,
                camo: spawn.camo,
                regrowth: spawn.regrowth,
            });
            self.next += 1;
        }
    }

    /// Number of spawns not yet emitted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.schedule.len() - self.next
    }

    /// Reports whether every scheduled spawn has been emitted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}
