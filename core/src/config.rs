use std::time::Duration;

use serde::Deserialize;

use crate::duration_from_secs;

/// Tunable parameters shared by every combat system.
///
/// Every field has a default so scenario files only need to name the values
/// they override.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Seed for the deterministic random stream used by spread and secondaries.
    pub seed: u64,
    /// Speed multiplier applied by a slow effect.
    pub slow_multiplier: f32,
    /// Seconds a slow effect lasts before it expires.
    pub slow_secs: f32,
    /// Seconds a freeze effect lasts before it expires.
    pub freeze_secs: f32,
    /// Seconds a stun effect lasts before it expires.
    pub stun_secs: f32,
    /// Fraction of the invested money returned when a tower is sold.
    pub refund_ratio: f32,
    /// Largest angular deviation, in radians, of an aimed tower with zero accuracy.
    pub max_aim_spread: f32,
    /// Turn rate in radians per second granted to projectiles that become
    /// homing without a turn rate of their own.
    pub homing_turn_rate: f32,
}

impl EngineConfig {
    /// Duration of a slow effect.
    #[must_use]
    pub fn slow_duration(&self) -> Duration {
        duration_from_secs(self.slow_secs)
    }

    /// Duration of a freeze effect.
    #[must_use]
    pub fn freeze_duration(&self) -> Duration {
        duration_from_secs(self.freeze_secs)
    }

    /// Duration of a stun effect.
    #[must_use]
    pub fn stun_duration(&self) -> Duration {
        duration_from_secs(self.stun_secs)
    }

    /// Money returned when selling a tower that cost `invested` in total.
    #[must_use]
    pub fn refund_for(&self, invested: u64) -> u64 {
        let ratio = f64::from(self.refund_ratio.clamp(0.0, 1.0));
        (invested as f64 * ratio).floor() as u64
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_ba11_00f0_0d00,
            slow_multiplier: 0.5,
            slow_secs: 2.0,
            freeze_secs: 1.0,
            stun_secs: 1.0,
            refund_ratio: 0.7,
            max_aim_spread: std::f32::consts::FRAC_PI_6,
            homing_turn_rate: 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;

    #[test]
    fn refund_rounds_down() {
        let config = EngineConfig::default();
        assert_eq!(config.refund_for(75), 52);
        assert_eq!(config.refund_for(0), 0);
    }

    #[test]
    fn refund_ratio_is_clamped() {
        let config = EngineConfig {
            refund_ratio: 3.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.refund_for(100), 100);
    }
}
