use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{EnemyId, StatusEffects};

/// Closed set of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Weakest archetype with no children.
    Red,
    /// Pops into a red.
    Blue,
    /// Pops into a blue.
    Green,
    /// Pops into a green.
    Yellow,
    /// Pops into a yellow.
    Pink,
    /// Pops into two yellows.
    Black,
    /// Pops into two yellows.
    White,
    /// Pops into a pink.
    Purple,
    /// Armoured archetype that only lead-capable damage can hurt.
    Lead,
    /// Pops into a black and a white.
    Zebra,
    /// Pops into two zebras.
    Rainbow,
    /// Ten-health shell that pops into two rainbows.
    Ceramic,
    /// Massive airship that pops into four ceramics.
    Moab,
}

const NO_CHILDREN: &[EnemyKind] = &[];

impl EnemyKind {
    /// Every archetype in ascending order of strength.
    pub const ALL: [EnemyKind; 13] = [
        EnemyKind::Red,
        EnemyKind::Blue,
        EnemyKind::Green,
        EnemyKind::Yellow,
        EnemyKind::Pink,
        EnemyKind::Black,
        EnemyKind::White,
        EnemyKind::Purple,
        EnemyKind::Lead,
        EnemyKind::Zebra,
        EnemyKind::Rainbow,
        EnemyKind::Ceramic,
        EnemyKind::Moab,
    ];

    /// Health assigned at spawn.
    #[must_use]
    pub const fn health(self) -> f32 {
        match self {
            Self::Ceramic => 10.0,
            Self::Moab => 200.0,
            _ => 1.0,
        }
    }

    /// Base movement speed in world units per second.
    #[must_use]
    pub const fn speed(self) -> f32 {
        match self {
            Self::Red | Self::Lead | Self::Moab => 60.0,
            Self::Blue => 84.0,
            Self::Green | Self::Black | Self::Zebra => 108.0,
            Self::Yellow => 192.0,
            Self::Pink => 210.0,
            Self::White => 120.0,
            Self::Purple => 180.0,
            Self::Rainbow => 132.0,
            Self::Ceramic => 150.0,
        }
    }

    /// Money credited when the archetype is popped.
    #[must_use]
    pub const fn money(self) -> u64 {
        match self {
            Self::Red => 10,
            Self::Blue => 20,
            Self::Green => 30,
            Self::Yellow => 50,
            Self::Ceramic => 100,
            Self::Moab => 500,
            _ => 60,
        }
    }

    /// Archetypes spawned in place of this one when it pops.
    #[must_use]
    pub const fn children(self) -> &'static [EnemyKind] {
        match self {
            Self::Red => NO_CHILDREN,
            Self::Blue => &[Self::Red],
            Self::Green => &[Self::Blue],
            Self::Yellow => &[Self::Green],
            Self::Pink => &[Self::Yellow],
            Self::Black | Self::White => &[Self::Yellow, Self::Yellow],
            Self::Purple => &[Self::Pink],
            Self::Lead => &[Self::Black, Self::Black],
            Self::Zebra => &[Self::Black, Self::White],
            Self::Rainbow => &[Self::Zebra, Self::Zebra],
            Self::Ceramic => &[Self::Rainbow, Self::Rainbow],
            Self::Moab => &[Self::Ceramic, Self::Ceramic, Self::Ceramic, Self::Ceramic],
        }
    }

    /// Reports whether only lead-capable damage affects the archetype.
    #[must_use]
    pub const fn is_lead(self) -> bool {
        matches!(self, Self::Lead)
    }

    /// Reports whether the archetype belongs to the MOAB class.
    #[must_use]
    pub const fn is_moab_class(self) -> bool {
        matches!(self, Self::Moab)
    }

    /// Collision radius in world units.
    #[must_use]
    pub const fn radius(self) -> f32 {
        if self.is_moab_class() {
            40.0
        } else {
            20.0
        }
    }
}

/// Failure raised when constructing a waypoint path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A path needs a start and an end.
    #[error("a path needs at least two waypoints, found {found}")]
    TooShort {
        /// Number of waypoints supplied.
        found: usize,
    },
    /// Waypoints must be finite coordinates.
    #[error("waypoint {index} is not a finite coordinate")]
    NonFinite {
        /// Index of the offending waypoint.
        index: usize,
    },
}

/// Ordered, immutable waypoint polyline walked by enemies.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec2>,
}

impl Path {
    /// Validates and wraps the provided waypoints.
    pub fn new(waypoints: Vec<Vec2>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooShort {
                found: waypoints.len(),
            });
        }

        if let Some(index) = waypoints.iter().position(|point| !point.is_finite()) {
            return Err(PathError::NonFinite { index });
        }

        Ok(Self { waypoints })
    }

    /// All waypoints in walking order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Index of the final waypoint.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// First waypoint, where enemies enter.
    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.waypoints[0]
    }

    /// Waypoint at the provided index.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<Vec2> {
        self.waypoints.get(index).copied()
    }

    /// Segment leaving the waypoint at `index`, if one exists.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<(Vec2, Vec2)> {
        let start = self.point(index)?;
        let end = self.point(index + 1)?;
        Some((start, end))
    }
}

/// Description of an enemy spawned by a parent's death.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChildEnemy {
    /// Archetype of the child.
    pub kind: EnemyKind,
    /// Position inherited from the parent.
    pub position: Vec2,
    /// Waypoint index inherited from the parent.
    pub waypoint_index: usize,
    /// Camo flag inherited from the parent.
    pub camo: bool,
    /// Regrowth flag inherited from the parent.
    pub regrowth: bool,
}

/// Runtime state of an enemy walking the path.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    path: Arc<Path>,
    position: Vec2,
    waypoint_index: usize,
    base_speed: f32,
    speed: f32,
    health: f32,
    camo: bool,
    regrowth: bool,
    status: StatusEffects,
}

impl Enemy {
    /// Creates an enemy standing on the first waypoint of `path`.
    #[must_use]
    pub fn spawn(id: EnemyId, kind: EnemyKind, path: Arc<Path>, camo: bool, regrowth: bool) -> Self {
        let position = path.start();
        Self::build(id, kind, path, position, 0, camo, regrowth)
    }

    /// Creates an enemy from a child description produced by [`Enemy::on_death`].
    #[must_use]
    pub fn from_child(id: EnemyId, child: ChildEnemy, path: Arc<Path>) -> Self {
        let waypoint_index = child.waypoint_index.min(path.last_index());
        Self::build(
            id,
            child.kind,
            path,
            child.position,
            waypoint_index,
            child.camo,
            child.regrowth,
        )
    }

    fn build(
        id: EnemyId,
        kind: EnemyKind,
        path: Arc<Path>,
        position: Vec2,
        waypoint_index: usize,
        camo: bool,
        regrowth: bool,
    ) -> Self {
        Self {
            id,
            kind,
            path,
            position,
            waypoint_index,
            base_speed: kind.speed(),
            speed: kind.speed(),
            health: kind.health(),
            camo,
            regrowth,
            status: StatusEffects::default(),
        }
    }

    /// Identifier of the enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Archetype of the enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Path the enemy walks.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current centre of the enemy.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Index of the waypoint the enemy most recently reached.
    #[must_use]
    pub const fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    /// Archetype speed before status effects.
    #[must_use]
    pub const fn base_speed(&self) -> f32 {
        self.base_speed
    }

    /// Speed after status effects, as last computed by the status tracker.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Money credited when the enemy pops.
    #[must_use]
    pub const fn money(&self) -> u64 {
        self.kind.money()
    }

    /// Collision radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.kind.radius()
    }

    /// Reports whether the enemy is hidden from towers without camo detection.
    #[must_use]
    pub const fn is_camo(&self) -> bool {
        self.camo
    }

    /// Reports whether the enemy carries the regrowth trait.
    #[must_use]
    pub const fn is_regrowth(&self) -> bool {
        self.regrowth
    }

    /// Reports whether only lead-capable damage affects the enemy.
    #[must_use]
    pub const fn is_lead(&self) -> bool {
        self.kind.is_lead()
    }

    /// Reports whether damage with the given capabilities may affect the enemy.
    ///
    /// Dead enemies awaiting removal are never vulnerable.
    #[must_use]
    pub fn is_vulnerable_to(&self, can_pop_camo: bool, can_pop_lead: bool) -> bool {
        if self.is_dead() {
            return false;
        }
        if self.camo && !can_pop_camo {
            return false;
        }
        !(self.is_lead() && !can_pop_lead)
    }

    /// Reports whether the enemy's health is exhausted.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Reports whether the enemy stands on the final waypoint.
    #[must_use]
    pub fn at_path_end(&self) -> bool {
        self.waypoint_index >= self.path.last_index()
    }

    /// Lives lost when the enemy leaks.
    #[must_use]
    pub fn leak_damage(&self) -> u32 {
        self.health.max(0.0).ceil() as u32
    }

    /// Active status effects.
    #[must_use]
    pub const fn status(&self) -> &StatusEffects {
        &self.status
    }

    /// Mutable access to the status effects, for the status tracker.
    pub fn status_mut(&mut self) -> &mut StatusEffects {
        &mut self.status
    }

    /// Stores the speed derived from the active status effects.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Moves the enemy, recording the waypoint it most recently reached.
    pub fn relocate(&mut self, position: Vec2, waypoint_index: usize) {
        self.position = position;
        self.waypoint_index = waypoint_index.min(self.path.last_index());
    }

    /// Subtracts `amount` from the enemy's health and reports whether it popped.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount.max(0.0);
        self.is_dead()
    }

    /// Describes the children that replace the enemy when it pops.
    #[must_use]
    pub fn on_death(&self) -> Vec<ChildEnemy> {
        self.kind
            .children()
            .iter()
            .map(|&kind| ChildEnemy {
                kind,
                position: self.position,
                waypoint_index: self.waypoint_index,
                camo: self.camo,
                regrowth: self.regrowth,
            })
            .collect()
    }
}
