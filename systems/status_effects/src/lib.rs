#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Status-effect tracker that attaches slows, freezes and stuns to enemies.
//!
//! Effects are keyed by `(kind, source tower)`. Re-applying an effect from the
//! same source refreshes its expiry instead of stacking; effects from distinct
//! sources coexist and the strongest multiplier wins. Source towers are only
//! referenced by identifier, so selling a tower leaves its effects to lapse on
//! their own.

use std::time::Duration;

use pop_defence_core::{Enemy, EngineConfig, OnHitEffect, StatusEffect, StatusKind, TowerId};

/// Builds, applies and expires status effects.
#[derive(Clone, Debug)]
pub struct StatusEffectTracker {
    slow_multiplier: f32,
    slow_duration: Duration,
    freeze_duration: Duration,
    stun_duration: Duration,
}

impl StatusEffectTracker {
    /// Creates a tracker using the effect strengths from `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            slow_multiplier: config.slow_multiplier,
            slow_duration: config.slow_duration(),
            freeze_duration: config.freeze_duration(),
            stun_duration: config.stun_duration(),
        }
    }

    /// Builds the effect an on-hit tag from `source` produces at `now`.
    #[must_use]
    pub fn effect_for(&self, tag: OnHitEffect, source: TowerId, now: Duration) -> StatusEffect {
        match tag {
            OnHitEffect::Slow => self.slow_from(source, now),
            OnHitEffect::Freeze => StatusEffect::freeze(now + self.freeze_duration, source),
            OnHitEffect::Stun => StatusEffect::stun(now + self.stun_duration, source),
        }
    }

    /// Builds a slow from `source` starting at `now`.
    #[must_use]
    pub fn slow_from(&self, source: TowerId, now: Duration) -> StatusEffect {
        StatusEffect::slow(self.slow_multiplier, now + self.slow_duration, source)
    }

    /// Attaches `effect`, refreshing the entry already held for its slot.
    pub fn apply(&self, enemy: &mut Enemy, effect: StatusEffect) {
        match enemy.status_mut().slot_mut(&effect) {
            Some(existing) => existing.refresh(&effect),
            None => enemy.status_mut().push(effect),
        }
        let speed = self.effective_speed(enemy);
        enemy.set_speed(speed);
    }

    /// Applies every on-hit tag from `source` to `enemy`.
    pub fn apply_tags(
        &self,
        enemy: &mut Enemy,
        tags: &[OnHitEffect],
        source: TowerId,
        now: Duration,
    ) {
        for &tag in tags {
            self.apply(enemy, self.effect_for(tag, source, now));
        }
    }

    /// Drops lapsed effects and restores the cached speed accordingly.
    ///
    /// Returns the number of effects removed.
    pub fn expire_check(&self, enemy: &mut Enemy, now: Duration) -> usize {
        let removed = enemy.status_mut().remove_expired(now);
        if removed > 0 {
            let speed = self.effective_speed(enemy);
            enemy.set_speed(speed);
        }
        removed
    }

    /// Base speed scaled by the strongest active slow or freeze.
    #[must_use]
    pub fn effective_speed(&self, enemy: &Enemy) -> f32 {
        enemy.base_speed() * enemy.status().speed_multiplier()
    }

    /// Reports whether a freeze or stun keeps the enemy in place.
    #[must_use]
    pub fn is_immobilised(&self, enemy: &Enemy) -> bool {
        let status = enemy.status();
        status.contains(StatusKind::Freeze) || status.contains(StatusKind::Stun)
    }
}
