use std::time::Duration;

use crate::TowerId;

/// Category of a timed status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKind {
    /// Multiplies movement speed by a factor below one.
    Slow,
    /// Halts movement entirely.
    Freeze,
    /// Halts movement independently of any slow.
    Stun,
}

/// Timed effect attached to an enemy by a specific tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEffect {
    kind: StatusKind,
    multiplier: f32,
    expires_at: Duration,
    source: TowerId,
}

impl StatusEffect {
    /// Creates a slow effect that scales speed by `multiplier`.
    #[must_use]
    pub fn slow(multiplier: f32, expires_at: Duration, source: TowerId) -> Self {
        Self {
            kind: StatusKind::Slow,
            multiplier: multiplier.clamp(0.0, 1.0),
            expires_at,
            source,
        }
    }

    /// Creates a freeze effect.
    #[must_use]
    pub const fn freeze(expires_at: Duration, source: TowerId) -> Self {
        Self {
            kind: StatusKind::Freeze,
            multiplier: 0.0,
            expires_at,
            source,
        }
    }

    /// Creates a stun effect.
    ///
    /// Stuns gate movement without contributing a speed multiplier.
    #[must_use]
    pub const fn stun(expires_at: Duration, source: TowerId) -> Self {
        Self {
            kind: StatusKind::Stun,
            multiplier: 1.0,
            expires_at,
            source,
        }
    }

    /// Category of the effect.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        self.kind
    }

    /// Speed multiplier contributed by the effect.
    #[must_use]
    pub const fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Simulation time at which the effect stops applying.
    #[must_use]
    pub const fn expires_at(&self) -> Duration {
        self.expires_at
    }

    /// Tower that applied the effect.
    #[must_use]
    pub const fn source(&self) -> TowerId {
        self.source
    }

    /// Reports whether the effect has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Duration) -> bool {
        now >= self.expires_at
    }

    /// Replaces the expiry and magnitude with those of a fresh application.
    pub fn refresh(&mut self, other: &StatusEffect) {
        self.expires_at = other.expires_at;
        self.multiplier = other.multiplier;
    }

    /// Reports whether `other` shares this effect's kind and source.
    #[must_use]
    pub fn same_slot(&self, other: &StatusEffect) -> bool {
        self.kind == other.kind && self.source == other.source
    }
}

/// Set of status effects attached to a single enemy.
///
/// Entries are unique per `(kind, source)` pair; the status tracker refreshes
/// an existing entry instead of adding a duplicate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffects {
    entries: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Iterates over the active entries in application order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> + '_ {
        self.entries.iter()
    }

    /// Number of active entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no effect is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry occupying the same slot as `effect`, if any.
    pub fn slot_mut(&mut self, effect: &StatusEffect) -> Option<&mut StatusEffect> {
        self.entries.iter_mut().find(|entry| entry.same_slot(effect))
    }

    /// Appends a new entry.
    pub fn push(&mut self, effect: StatusEffect) {
        self.entries.push(effect);
    }

    /// Drops every entry that has lapsed at `now`, returning how many were removed.
    pub fn remove_expired(&mut self, now: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Reports whether an entry of the provided kind is attached.
    #[must_use]
    pub fn contains(&self, kind: StatusKind) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    /// Lowest multiplier across slow and freeze entries, or one when none is attached.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.entries
            .iter()
            .map(StatusEffect::multiplier)
            .fold(1.0, f32::min)
    }
}
