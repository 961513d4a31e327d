//! Scenario files describing a headless run.

use std::{fs, path::Path as FilePath, time::Duration};

use anyhow::{ensure, Context, Result};
use pop_defence_core::{
    duration_from_secs, EngineConfig, EnemyKind, Path, TowerKind, UpgradePath, Vec2,
};
use pop_defence_system_spawning::WaveDescriptor;
use serde::Deserialize;

const DEFAULT_TICK_MS: u64 = 16;
const DEFAULT_MAX_TICKS: u64 = 36_000;

/// Everything needed to drive one run: the map, the economy, the operator's
/// orders and the wave schedule.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default = "default_tick_ms")]
    pub(crate) tick_ms: u64,
    #[serde(default = "default_max_ticks")]
    pub(crate) max_ticks: u64,
    pub(crate) starting_cash: u64,
    pub(crate) lives: u32,
    #[serde(default)]
    pub(crate) wave_gap_secs: f32,
    pub(crate) path: Vec<[f32; 2]>,
    #[serde(default)]
    pub(crate) engine: EngineConfig,
    #[serde(default)]
    pub(crate) towers: Vec<TowerOrder>,
    #[serde(default)]
    pub(crate) waves: Vec<Wave>,
}

/// A tower the operator builds, optionally aimed, with its upgrade schedule.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerOrder {
    pub(crate) kind: TowerKind,
    pub(crate) position: [f32; 2],
    #[serde(default)]
    pub(crate) at_secs: f32,
    #[serde(default)]
    pub(crate) aim: Option<[f32; 2]>,
    #[serde(default)]
    pub(crate) upgrades: Vec<UpgradeOrder>,
}

/// One upgrade tier bought at a fixed time.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UpgradeOrder {
    pub(crate) at_secs: f32,
    pub(crate) path: UpgradePath,
    pub(crate) tier: u8,
}

/// A group of runs released together.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Wave {
    pub(crate) runs: Vec<Run>,
}

/// Identical enemies released at a fixed cadence.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Run {
    pub(crate) kind: EnemyKind,
    pub(crate) count: u32,
    #[serde(default)]
    pub(crate) start_secs: f32,
    #[serde(default)]
    pub(crate) interval_secs: f32,
    #[serde(default)]
    pub(crate) camo: bool,
    #[serde(default)]
    pub(crate) regrowth: bool,
}

impl Scenario {
    /// Reads and validates a scenario file.
    pub(crate) fn load(file: &FilePath) -> Result<Self> {
        let document = fs::read_to_string(file)
            .with_context(|| format!("failed to read scenario {}", file.display()))?;
        Self::from_toml_str(&document)
            .with_context(|| format!("invalid scenario {}", file.display()))
    }

    pub(crate) fn from_toml_str(document: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(document).context("failed to parse scenario")?;
        ensure!(scenario.tick_ms > 0, "tick_ms must be positive");
        ensure!(scenario.lives > 0, "lives must be positive");
        let _ = scenario.enemy_path()?;
        Ok(scenario)
    }

    /// Path enemies walk, built from the scenario's waypoints.
    pub(crate) fn enemy_path(&self) -> Result<Path> {
        let waypoints = self.path.iter().copied().map(Vec2::from).collect();
        Path::new(waypoints).context("scenario path is invalid")
    }

    pub(crate) fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub(crate) fn wave_gap(&self) -> Duration {
        duration_from_secs(self.wave_gap_secs)
    }

    /// Wave groups in the form the spawner chains them.
    pub(crate) fn wave_groups(&self) -> Vec<Vec<WaveDescriptor>> {
        self.waves
            .iter()
            .map(|wave| wave.runs.iter().map(Run::descriptor).collect())
            .collect()
    }
}

impl Run {
    fn descriptor(&self) -> WaveDescriptor {
        WaveDescriptor {
            kind: self.kind,
            start_offset: duration_from_secs(self.start_secs),
            count: self.count,
            interval: duration_from_secs(self.interval_secs),
            camo: self.camo,
            regrowth: self.regrowth,
        }
    }
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}
