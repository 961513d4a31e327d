use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{duration_from_secs, EnemyId, Rgb};

/// Closed set of projectile variants a tower can fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Basic single-target dart.
    Dart,
    /// Heavy dart with high pierce.
    HeavyDart,
    /// Spinning blade that slices through lines of enemies.
    Blade,
    /// Explosive bomb.
    Bomb,
    /// Bomb that scatters secondary fragments on impact.
    ClusterBomb,
    /// Homing missile.
    Missile,
    /// Shard that slows the enemies it touches.
    FrostShard,
    /// Short-lived tack thrown in a ring.
    Tack,
    /// Instant sniper round.
    Bullet,
    /// Instant laser beam.
    Beam,
    /// Mortar shell thrown at an aim point.
    Shell,
    /// Burning fireball.
    Fireball,
}

/// How a projectile reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// The projectile flies through the world and collides along the way.
    Travel,
    /// The hit resolves at fire time with no travel phase.
    Hitscan,
}

impl ProjectileKind {
    /// Delivery model of the variant.
    #[must_use]
    pub const fn delivery(self) -> Delivery {
        match self {
            Self::Bullet | Self::Beam => Delivery::Hitscan,
            _ => Delivery::Travel,
        }
    }

    /// Reports whether the sprite spins while travelling. Purely cosmetic.
    #[must_use]
    pub const fn spins(self) -> bool {
        matches!(self, Self::Blade | Self::Tack | Self::Shell)
    }
}

/// Effect applied to every enemy a projectile damages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnHitEffect {
    /// Slows the enemy.
    Slow,
    /// Stops the enemy.
    Freeze,
    /// Stuns the enemy.
    Stun,
}

/// Fragments scattered from an impact point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecondaryBurst {
    /// Number of fragments.
    pub count: u32,
    /// Damage dealt by each fragment.
    pub damage: f32,
    /// Pierce of each fragment.
    pub pierce: u32,
    /// Speed of each fragment in world units per second.
    pub speed: f32,
    /// Lifespan of each fragment in seconds.
    pub lifespan_secs: f32,
    /// Collision radius of each fragment.
    pub radius: f32,
}

/// Reasons a projectile configuration cannot be used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ProjectileConfigError {
    /// The catalog holds no profile for the requested variant.
    #[error("no projectile profile exists for {kind:?}")]
    MissingProfile {
        /// Variant that was requested.
        kind: ProjectileKind,
    },
    /// A profile field holds a value the simulator cannot use.
    #[error("projectile profile for {kind:?} has an invalid {field}")]
    InvalidValue {
        /// Variant whose profile is invalid.
        kind: ProjectileKind,
        /// Name of the offending field.
        field: String,
    },
}

/// Combat parameters copied into every projectile a tower creates.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileConfig {
    /// Damage dealt per hit.
    pub damage: f32,
    /// Number of enemies the projectile may hit.
    pub pierce: u32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Time after which the projectile expires.
    pub lifespan: Duration,
    /// Distance after which the projectile expires.
    pub max_distance: f32,
    /// Explosion radius; zero disables the explosion pass.
    pub aoe_radius: f32,
    /// Collision radius.
    pub radius: f32,
    /// Whether the projectile damages lead enemies.
    pub can_pop_lead: bool,
    /// Whether the projectile damages camo enemies.
    pub can_pop_camo: bool,
    /// Whether the projectile re-steers toward its live target.
    pub homing: bool,
    /// Maximum homing turn rate in radians per second.
    pub turn_rate: f32,
    /// Effects applied to every damaged enemy.
    pub on_hit: Vec<OnHitEffect>,
    /// Fragments scattered on impact.
    pub secondary: Option<SecondaryBurst>,
    /// Tint forwarded to the renderer.
    pub color: Rgb,
}

impl ProjectileConfig {
    /// Checks that every field can drive the simulator for the given variant.
    pub fn validate(&self, kind: ProjectileKind) -> Result<(), ProjectileConfigError> {
        let invalid = |field: &str| ProjectileConfigError::InvalidValue {
            kind,
            field: field.to_owned(),
        };

        if !self.damage.is_finite() || self.damage < 0.0 {
            return Err(invalid("damage"));
        }
        if self.pierce == 0 {
            return Err(invalid("pierce"));
        }
        if self.aoe_radius.is_nan() || self.aoe_radius < 0.0 {
            return Err(invalid("aoe_radius"));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(invalid("radius"));
        }
        if !self.turn_rate.is_finite() || self.turn_rate < 0.0 {
            return Err(invalid("turn_rate"));
        }

        if kind.delivery() == Delivery::Travel {
            if !self.speed.is_finite() || self.speed <= 0.0 {
                return Err(invalid("speed"));
            }
            if self.lifespan.is_zero() {
                return Err(invalid("lifespan"));
            }
            if self.max_distance.is_nan() || self.max_distance <= 0.0 {
                return Err(invalid("max_distance"));
            }
        }

        if let Some(burst) = &self.secondary {
            let positive = |value: f32| value.is_finite() && value > 0.0;
            if burst.pierce == 0 || !positive(burst.speed) || !positive(burst.lifespan_secs) {
                return Err(invalid("secondary"));
            }
        }

        Ok(())
    }
}

/// A projectile in flight, owned by the tower that fired it.
///
/// Every combat parameter is copied from the tower's [`ProjectileConfig`] at
/// creation time, so later upgrades never alter projectiles already in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    kind: ProjectileKind,
    origin: Vec2,
    target_point: Vec2,
    target: Option<EnemyId>,
    position: Vec2,
    previous_position: Vec2,
    velocity: Vec2,
    speed: f32,
    rotation: f32,
    damage: f32,
    pierce: u32,
    aoe_radius: f32,
    radius: f32,
    lifespan: Duration,
    age: Duration,
    distance_traveled: f32,
    max_distance: f32,
    can_pop_lead: bool,
    can_pop_camo: bool,
    homing: bool,
    turn_rate: f32,
    on_hit: Vec<OnHitEffect>,
    secondary: Option<SecondaryBurst>,
    color: Rgb,
    hits: Vec<EnemyId>,
}

impl Projectile {
    /// Launches a projectile from `origin` toward the fixed `target_point`.
    ///
    /// `target` is only consulted by homing projectiles.
    #[must_use]
    pub fn launch(
        kind: ProjectileKind,
        config: &ProjectileConfig,
        origin: Vec2,
        target_point: Vec2,
        target: Option<EnemyId>,
    ) -> Self {
        let direction = (target_point - origin).try_normalize().unwrap_or(Vec2::X);
        Self {
            kind,
            origin,
            target_point,
            target,
            position: origin,
            previous_position: origin,
            velocity: direction * config.speed,
            speed: config.speed,
            rotation: 0.0,
            damage: config.damage,
            pierce: config.pierce,
            aoe_radius: config.aoe_radius,
            radius: config.radius,
            lifespan: config.lifespan,
            age: Duration::ZERO,
            distance_traveled: 0.0,
            max_distance: config.max_distance,
            can_pop_lead: config.can_pop_lead,
            can_pop_camo: config.can_pop_camo,
            homing: config.homing,
            turn_rate: config.turn_rate,
            on_hit: config.on_hit.clone(),
            secondary: config.secondary,
            color: config.color,
            hits: Vec::new(),
        }
    }

    /// Creates a fragment of a secondary burst.
    ///
    /// Fragments inherit the parent's kind, capabilities, on-hit effects and
    /// colour, never burst again, and skip `excluded`.
    #[must_use]
    pub fn fragment(
        parent: &Projectile,
        burst: &SecondaryBurst,
        origin: Vec2,
        direction: Vec2,
        excluded: Option<EnemyId>,
    ) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec2::X);
        Self {
            kind: parent.kind,
            origin,
            target_point: origin + direction,
            target: None,
            position: origin,
            previous_position: origin,
            velocity: direction * burst.speed,
            speed: burst.speed,
            rotation: 0.0,
            damage: burst.damage,
            pierce: burst.pierce,
            aoe_radius: 0.0,
            radius: burst.radius,
            lifespan: duration_from_secs(burst.lifespan_secs),
            age: Duration::ZERO,
            distance_traveled: 0.0,
            max_distance: f32::INFINITY,
            can_pop_lead: parent.can_pop_lead,
            can_pop_camo: parent.can_pop_camo,
            homing: false,
            turn_rate: 0.0,
            on_hit: parent.on_hit.clone(),
            secondary: None,
            color: parent.color,
            hits: excluded.into_iter().collect(),
        }
    }

    /// Variant of the projectile.
    #[must_use]
    pub const fn kind(&self) -> ProjectileKind {
        self.kind
    }

    /// Point the projectile was launched from.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Fixed point captured at fire time.
    #[must_use]
    pub const fn target_point(&self) -> Vec2 {
        self.target_point
    }

    /// Enemy tracked by homing projectiles.
    #[must_use]
    pub const fn target(&self) -> Option<EnemyId> {
        self.target
    }

    /// Current centre.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Centre at the start of the latest step.
    #[must_use]
    pub const fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    /// Current velocity in world units per second.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Constant travel speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Cosmetic rotation in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Damage dealt per hit.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Remaining pierce.
    #[must_use]
    pub const fn pierce(&self) -> u32 {
        self.pierce
    }

    /// Explosion radius.
    #[must_use]
    pub const fn aoe_radius(&self) -> f32 {
        self.aoe_radius
    }

    /// Collision radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Time since launch.
    #[must_use]
    pub const fn age(&self) -> Duration {
        self.age
    }

    /// Distance covered since launch.
    #[must_use]
    pub const fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    /// Whether lead enemies can be damaged.
    #[must_use]
    pub const fn can_pop_lead(&self) -> bool {
        self.can_pop_lead
    }

    /// Whether camo enemies can be damaged.
    #[must_use]
    pub const fn can_pop_camo(&self) -> bool {
        self.can_pop_camo
    }

    /// Whether the projectile re-steers toward its target.
    #[must_use]
    pub const fn is_homing(&self) -> bool {
        self.homing
    }

    /// Maximum homing turn rate in radians per second.
    #[must_use]
    pub const fn turn_rate(&self) -> f32 {
        self.turn_rate
    }

    /// Effects applied to damaged enemies.
    #[must_use]
    pub fn on_hit(&self) -> &[OnHitEffect] {
        &self.on_hit
    }

    /// Fragments scattered on impact.
    #[must_use]
    pub const fn secondary(&self) -> Option<&SecondaryBurst> {
        self.secondary.as_ref()
    }

    /// Tint forwarded to the renderer.
    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    /// Distance left before the projectile expires by travel.
    #[must_use]
    pub fn remaining_distance(&self) -> f32 {
        (self.max_distance - self.distance_traveled).max(0.0)
    }

    /// Reports whether the projectile already hit, or must skip, the enemy.
    #[must_use]
    pub fn has_hit(&self, enemy: EnemyId) -> bool {
        self.hits.contains(&enemy)
    }

    /// Reports whether the projectile must be removed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.pierce == 0 || self.age >= self.lifespan || self.distance_traveled >= self.max_distance
    }

    /// Adds `dt` to the projectile's age.
    pub fn age_by(&mut self, dt: Duration) {
        self.age = self.age.saturating_add(dt);
    }

    /// Caps the distance the projectile may travel at `limit`.
    pub fn limit_distance(&mut self, limit: f32) {
        self.max_distance = self.max_distance.min(limit);
    }

    /// Replaces the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Moves the projectile, remembering the previous position for the swept test.
    pub fn step_to(&mut self, position: Vec2) {
        self.previous_position = self.position;
        self.distance_traveled += self.position.distance(position);
        self.position = position;
    }

    /// Advances the cosmetic rotation.
    pub fn spin_by(&mut self, radians: f32) {
        self.rotation = (self.rotation + radians) % std::f32::consts::TAU;
    }

    /// Records a resolved hit and consumes one pierce.
    pub fn record_hit(&mut self, enemy: EnemyId) {
        self.pierce = self.pierce.saturating_sub(1);
        self.hits.push(enemy);
    }
}
